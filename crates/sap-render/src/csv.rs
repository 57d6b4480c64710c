use std::fs;
use std::path::Path;

use sap_core::errors::{ErrorInfo, SapError};
use sap_engine::PipelineRunResult;

const HEADER: [&str; 6] = [
    "method_id",
    "channel",
    "status",
    "missing_inputs",
    "unstable_inputs",
    "experiment_status",
];

fn csv_error(err: impl ToString) -> SapError {
    SapError::Serde(ErrorInfo::new("sap_render.csv", err.to_string()))
}

/// One row per (method, channel) report, ordered by `method_id` then channel.
///
/// Kinds are joined with `;`; unstable kinds carry their shortfall as `kind: reason`.
pub fn render_applicability_csv(run: &PipelineRunResult) -> Result<Vec<u8>, SapError> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER).map_err(csv_error)?;
    for report in run.reports_by_method() {
        let missing = report
            .missing_inputs
            .keys()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(";");
        let unstable = report
            .unstable_inputs
            .iter()
            .map(|(kind, reason)| format!("{kind}: {reason}"))
            .collect::<Vec<_>>()
            .join(";");
        let experiment = run
            .experiment(&report.channel, &report.method_id)
            .map(|experiment| experiment.status.as_str())
            .unwrap_or_default();
        writer
            .write_record([
                report.method_id.as_str(),
                report.channel.as_str(),
                report.status.as_str(),
                missing.as_str(),
                unstable.as_str(),
                experiment,
            ])
            .map_err(csv_error)?;
    }
    writer.into_inner().map_err(csv_error)
}

/// Writes [`render_applicability_csv`] output to `path`.
pub fn write_applicability_csv(path: &Path, run: &PipelineRunResult) -> Result<(), SapError> {
    let bytes = render_applicability_csv(run)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| SapError::io("sap_render.out_dir", parent, err))?;
    }
    fs::write(path, bytes).map_err(|err| SapError::io("sap_render.csv_write", path, err))
}
