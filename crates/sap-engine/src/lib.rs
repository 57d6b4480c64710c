#![deny(missing_docs)]
#![doc = "Decoding orchestration, concurrent dispatch and result aggregation for SAP² runs."]

/// Channel and run assembly.
pub mod aggregate;
/// YAML run configuration.
pub mod config;
/// Bounded worker pool dispatch with cancellation.
pub mod dispatch;
/// Single-unit decoder invocation with fault containment.
pub mod orchestrate;
/// Experiment and run result records.
pub mod result;

pub use aggregate::{aggregate, finalize, RunAssembler};
pub use config::{load_run_config, ExecutionConfig, RunConfig};
pub use dispatch::{
    check_decoder_overrides, run_pipeline, run_pipeline_with_observer, CancelToken,
    ChannelObserver, RunInputs, RunOpts,
};
pub use orchestrate::{Orchestrator, PartialPolicy};
pub use result::{
    ExperimentArtifacts, ExperimentResult, ExperimentStatus, PipelineChannelResult,
    PipelineRunResult, RunProvenance,
};
