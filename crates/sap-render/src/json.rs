use std::fs;
use std::path::Path;

use sap_core::errors::SapError;
use sap_core::serde::to_canonical_json_pretty;
use sap_engine::PipelineRunResult;

/// Run result as sorted-key JSON indented by two spaces.
pub fn render_json(run: &PipelineRunResult) -> Result<Vec<u8>, SapError> {
    to_canonical_json_pretty(run)
}

/// Writes [`render_json`] output to `path`, creating parent directories.
pub fn write_json(path: &Path, run: &PipelineRunResult) -> Result<(), SapError> {
    let bytes = render_json(run)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| SapError::io("sap_render.out_dir", parent, err))?;
    }
    fs::write(path, bytes).map_err(|err| SapError::io("sap_render.json_write", path, err))
}
