#![deny(missing_docs)]
#![doc = "Applicability matrix model and evaluator: decides, per channel and method, whether a decoder may run."]

/// Per-channel, per-method applicability evaluation.
pub mod evaluate;
/// Matrix model, validation and loading.
pub mod matrix;
/// Global thresholds and per-method overrides.
pub mod params;
/// Applicability report and status.
pub mod report;

pub use evaluate::{evaluate, evaluate_channel, MISSING_REASON};
pub use matrix::{load_matrix, parse_matrix, ApplicabilityMatrix, MethodSpec, MATRIX_INDEX_FILE};
pub use params::{ApplicabilityParams, ThresholdOverrides};
pub use report::{ApplicabilityReport, ApplicabilityStatus};
