use std::collections::BTreeMap;

use sap_core::errors::SapError;
use sap_core::hash::stable_hash_string;
use sap_decode::{DecoderParams, Hypothesis};
use sap_matrix::ApplicabilityReport;
use serde::{Deserialize, Serialize};

/// Outcome of attempting one decoder on one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentStatus {
    /// Decoder ran and returned (possibly zero) hypotheses.
    Ok,
    /// Decoder reported a fault or panicked.
    Failed,
    /// No decoder is registered for the method.
    Skipped,
}

impl ExperimentStatus {
    /// Wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            ExperimentStatus::Ok => "ok",
            ExperimentStatus::Failed => "failed",
            ExperimentStatus::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for ExperimentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Artefacts attached to an experiment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExperimentArtifacts {
    /// Hypotheses in the order the decoder ranked them.
    #[serde(default)]
    pub hypotheses: Vec<Hypothesis>,
}

/// Outcome record of one (channel, method) decoder invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentResult {
    /// Channel the decoder ran on.
    pub channel: String,
    /// Method identifier.
    pub method_id: String,
    /// Invocation outcome.
    pub status: ExperimentStatus,
    /// Version of the decoder that produced the result.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub decoder_version: Option<String>,
    /// Decoder defaults merged with the run's overrides.
    #[serde(default)]
    pub parameters: DecoderParams,
    /// Ordered diagnostic notes.
    #[serde(default)]
    pub diagnostics: Vec<String>,
    /// Produced artefacts.
    #[serde(default)]
    pub artifacts: ExperimentArtifacts,
}

impl ExperimentResult {
    /// Hypotheses carried by the result.
    pub fn hypotheses(&self) -> &[Hypothesis] {
        &self.artifacts.hypotheses
    }
}

/// Reports and executed experiments for one channel, keyed by `method_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineChannelResult {
    /// Channel name.
    pub channel: String,
    /// Every evaluated method.
    pub applicability: BTreeMap<String, ApplicabilityReport>,
    /// Only methods that were dispatched.
    #[serde(default)]
    pub experiments: BTreeMap<String, ExperimentResult>,
}

/// Provenance carried by every run result.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunProvenance {
    /// Transcript source identifier.
    pub sat_source: String,
    /// Schema version of the matrix that produced the run.
    pub matrix_schema_version: String,
    /// Canonical hash of the matrix.
    #[serde(default)]
    pub matrix_hash: String,
    /// Canonical hash of the transcript.
    #[serde(default)]
    pub transcript_hash: String,
    /// Registered decoders as `method_id -> version`.
    #[serde(default)]
    pub decoders: BTreeMap<String, String>,
}

impl RunProvenance {
    /// Provenance with only the source and schema version set.
    pub fn new(sat_source: impl Into<String>, matrix_schema_version: impl Into<String>) -> Self {
        Self {
            sat_source: sat_source.into(),
            matrix_schema_version: matrix_schema_version.into(),
            ..Self::default()
        }
    }
}

/// Frozen result of a full pipeline run; the sole input to rendering.
///
/// Fields are only reachable through accessors once the run is finalised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRunResult {
    #[serde(flatten)]
    provenance: RunProvenance,
    #[serde(default)]
    interrupted: bool,
    channels: BTreeMap<String, PipelineChannelResult>,
}

impl PipelineRunResult {
    pub(crate) fn from_parts(
        provenance: RunProvenance,
        interrupted: bool,
        channels: BTreeMap<String, PipelineChannelResult>,
    ) -> Self {
        Self {
            provenance,
            interrupted,
            channels,
        }
    }

    /// Full provenance block.
    pub fn provenance(&self) -> &RunProvenance {
        &self.provenance
    }

    /// Transcript source identifier.
    pub fn sat_source(&self) -> &str {
        &self.provenance.sat_source
    }

    /// Schema version of the matrix that produced the run.
    pub fn matrix_schema_version(&self) -> &str {
        &self.provenance.matrix_schema_version
    }

    /// Registered decoders as `method_id -> version`.
    pub fn decoders(&self) -> &BTreeMap<String, String> {
        &self.provenance.decoders
    }

    /// True when cancellation or a timeout left some units unrun.
    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    /// Per-channel results keyed by channel name.
    pub fn channels(&self) -> &BTreeMap<String, PipelineChannelResult> {
        &self.channels
    }

    /// Looks up one channel.
    pub fn channel(&self, name: &str) -> Option<&PipelineChannelResult> {
        self.channels.get(name)
    }

    /// Looks up one experiment.
    pub fn experiment(&self, channel: &str, method_id: &str) -> Option<&ExperimentResult> {
        self.channels
            .get(channel)
            .and_then(|result| result.experiments.get(method_id))
    }

    /// Every report ordered by `method_id`, then channel.
    pub fn reports_by_method(&self) -> Vec<&ApplicabilityReport> {
        let mut reports: Vec<&ApplicabilityReport> = self
            .channels
            .values()
            .flat_map(|channel| channel.applicability.values())
            .collect();
        reports.sort_by(|a, b| {
            a.method_id
                .cmp(&b.method_id)
                .then_with(|| a.channel.cmp(&b.channel))
        });
        reports
    }

    /// Every experiment ordered by `method_id`, then channel.
    pub fn experiments_by_method(&self) -> Vec<&ExperimentResult> {
        let mut experiments: Vec<&ExperimentResult> = self
            .channels
            .values()
            .flat_map(|channel| channel.experiments.values())
            .collect();
        experiments.sort_by(|a, b| {
            a.method_id
                .cmp(&b.method_id)
                .then_with(|| a.channel.cmp(&b.channel))
        });
        experiments
    }

    /// Deterministic hash of the whole result.
    pub fn result_hash(&self) -> Result<String, SapError> {
        stable_hash_string(self)
    }
}
