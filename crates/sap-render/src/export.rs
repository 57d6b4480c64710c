use std::fs;
use std::path::{Path, PathBuf};

use sap_core::errors::SapError;
use sap_core::load_transcript;
use sap_decode::DecoderRegistry;
use sap_engine::{run_pipeline, PipelineRunResult, RunConfig, RunInputs, RunOpts};
use sap_matrix::load_matrix;

use crate::csv::write_applicability_csv;
use crate::json::write_json;
use crate::markdown::{render_markdown, write_markdown};

/// Run result file name.
pub const RUN_JSON_FILE: &str = "pipeline_run.json";
/// Markdown report file name.
pub const REPORT_FILE: &str = "report.md";
/// Applicability table file name.
pub const APPLICABILITY_CSV_FILE: &str = "applicability.csv";

/// Locations of the exported artefacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    /// Pretty canonical JSON of the run.
    pub json: PathBuf,
    /// Markdown report.
    pub markdown: PathBuf,
    /// Applicability CSV.
    pub csv: PathBuf,
}

/// Writes every artefact for a finished run into `out_dir`.
pub fn export_run(
    run: &PipelineRunResult,
    out_dir: &Path,
    title: &str,
) -> Result<ExportPaths, SapError> {
    fs::create_dir_all(out_dir).map_err(|err| SapError::io("sap_render.out_dir", out_dir, err))?;
    let paths = ExportPaths {
        json: out_dir.join(RUN_JSON_FILE),
        markdown: out_dir.join(REPORT_FILE),
        csv: out_dir.join(APPLICABILITY_CSV_FILE),
    };
    write_json(&paths.json, run)?;
    write_markdown(&paths.markdown, &render_markdown(run, title))?;
    write_applicability_csv(&paths.csv, run)?;
    tracing::info!(out_dir = %out_dir.display(), "exported run artefacts");
    Ok(paths)
}

/// Loads inputs named by `config`, runs the pipeline and exports the result.
pub fn run_and_export(
    config: &RunConfig,
    registry: &DecoderRegistry,
) -> Result<(PipelineRunResult, ExportPaths), SapError> {
    run_and_export_with_opts(config, registry, &config.run_opts())
}

/// [`run_and_export`] with caller supplied dispatch options.
pub fn run_and_export_with_opts(
    config: &RunConfig,
    registry: &DecoderRegistry,
    opts: &RunOpts,
) -> Result<(PipelineRunResult, ExportPaths), SapError> {
    config.validate()?;
    let transcript = load_transcript(config.transcript_path())?;
    let matrix = load_matrix(config.matrix_path())?;
    let run = run_pipeline(
        RunInputs {
            transcript: &transcript,
            matrix: &matrix,
            params: &config.applicability,
            registry,
            decoder_params: &config.decoders,
        },
        opts,
    )?;
    let paths = export_run(&run, &config.out_dir_path(), &config.report_title)?;
    Ok((run, paths))
}
