use std::collections::{BTreeMap, BTreeSet};

use sap_core::errors::{ErrorInfo, SapError};
use sap_matrix::ApplicabilityReport;

use crate::result::{ExperimentResult, PipelineChannelResult, PipelineRunResult, RunProvenance};

fn consistency(code: &str, message: &str, channel: &str, method_id: &str) -> SapError {
    SapError::Consistency(
        ErrorInfo::new(code, message)
            .with_context("channel", channel.to_string())
            .with_context("method_id", method_id.to_string()),
    )
}

/// Assembles one channel's reports and experiments.
///
/// No filtering: every report is kept under `applicability`. Records that name
/// another channel, and experiments without a matching report, are rejected.
pub fn aggregate(
    channel_name: &str,
    applicability_reports: impl IntoIterator<Item = ApplicabilityReport>,
    experiment_results: impl IntoIterator<Item = ExperimentResult>,
) -> Result<PipelineChannelResult, SapError> {
    let mut applicability = BTreeMap::new();
    for report in applicability_reports {
        if report.channel != channel_name {
            return Err(consistency(
                "sap_engine.foreign_report",
                "report belongs to another channel",
                &report.channel,
                &report.method_id,
            ));
        }
        if applicability.contains_key(&report.method_id) {
            return Err(consistency(
                "sap_engine.duplicate_report",
                "method evaluated twice for one channel",
                channel_name,
                &report.method_id,
            ));
        }
        applicability.insert(report.method_id.clone(), report);
    }

    let mut experiments = BTreeMap::new();
    for result in experiment_results {
        if result.channel != channel_name {
            return Err(consistency(
                "sap_engine.foreign_experiment",
                "experiment belongs to another channel",
                &result.channel,
                &result.method_id,
            ));
        }
        if !applicability.contains_key(&result.method_id) {
            return Err(consistency(
                "sap_engine.unevaluated_experiment",
                "experiment has no applicability report",
                channel_name,
                &result.method_id,
            ));
        }
        if experiments.contains_key(&result.method_id) {
            return Err(consistency(
                "sap_engine.duplicate_experiment",
                "method executed twice for one channel",
                channel_name,
                &result.method_id,
            ));
        }
        experiments.insert(result.method_id.clone(), result);
    }

    Ok(PipelineChannelResult {
        channel: channel_name.to_string(),
        applicability,
        experiments,
    })
}

/// Incremental builder for a [`PipelineRunResult`].
///
/// Channels may be inserted in any order as they complete; the result is
/// frozen by [`RunAssembler::finalize`].
#[derive(Debug, Clone)]
pub struct RunAssembler {
    provenance: RunProvenance,
    declared: Option<BTreeSet<String>>,
    interrupted: bool,
    channels: BTreeMap<String, PipelineChannelResult>,
}

impl RunAssembler {
    /// Starts an empty run.
    pub fn new(provenance: RunProvenance) -> Self {
        Self {
            provenance,
            declared: None,
            interrupted: false,
            channels: BTreeMap::new(),
        }
    }

    /// Restricts inserted channels to these method identifiers.
    pub fn with_declared_methods<I, S>(mut self, method_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declared = Some(method_ids.into_iter().map(Into::into).collect());
        self
    }

    /// Adds a completed channel.
    pub fn insert_channel(&mut self, channel: PipelineChannelResult) -> Result<(), SapError> {
        if let Some(declared) = &self.declared {
            if let Some(method_id) = channel
                .applicability
                .keys()
                .chain(channel.experiments.keys())
                .find(|method_id| !declared.contains(*method_id))
            {
                return Err(consistency(
                    "sap_engine.undeclared_method",
                    "method is not declared in the applicability matrix",
                    &channel.channel,
                    method_id,
                ));
            }
        }
        if self.channels.contains_key(&channel.channel) {
            return Err(SapError::Consistency(
                ErrorInfo::new("sap_engine.duplicate_channel", "channel assembled twice")
                    .with_context("channel", channel.channel.clone()),
            ));
        }
        self.channels.insert(channel.channel.clone(), channel);
        Ok(())
    }

    /// Flags the run as cut short.
    pub fn mark_interrupted(&mut self) {
        self.interrupted = true;
    }

    /// Number of channels assembled so far.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// True before any channel is inserted.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Freezes the run.
    pub fn finalize(self) -> PipelineRunResult {
        PipelineRunResult::from_parts(self.provenance, self.interrupted, self.channels)
    }
}

/// Freezes a run from already assembled channels.
pub fn finalize(
    sat_source: &str,
    matrix_schema_version: &str,
    per_channel: impl IntoIterator<Item = PipelineChannelResult>,
) -> Result<PipelineRunResult, SapError> {
    let mut assembler = RunAssembler::new(RunProvenance::new(sat_source, matrix_schema_version));
    for channel in per_channel {
        assembler.insert_channel(channel)?;
    }
    Ok(assembler.finalize())
}
