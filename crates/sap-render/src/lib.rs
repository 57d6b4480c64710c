#![deny(missing_docs)]
#![doc = "Deterministic JSON, markdown and CSV exports of frozen SAP² run results."]

/// Applicability CSV export.
pub mod csv;
/// End-to-end run and export.
pub mod export;
/// Canonical JSON export.
pub mod json;
pub mod markdown;

pub use self::csv::{render_applicability_csv, write_applicability_csv};
pub use export::{
    export_run, run_and_export, run_and_export_with_opts, ExportPaths, APPLICABILITY_CSV_FILE,
    REPORT_FILE, RUN_JSON_FILE,
};
pub use json::{render_json, write_json};
pub use markdown::{render_markdown, write_markdown};
