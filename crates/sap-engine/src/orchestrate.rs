use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use sap_core::errors::{ErrorInfo, SapError};
use sap_core::Channel;
use sap_decode::{ChannelView, DecoderParams, DecoderRegistry};
use sap_matrix::{ApplicabilityReport, ApplicabilityStatus, MethodSpec};

use crate::result::{ExperimentArtifacts, ExperimentResult, ExperimentStatus};

/// Whether `partially_applicable` units are handed to their decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartialPolicy {
    /// Only `applicable` units run.
    #[default]
    Skip,
    /// `partially_applicable` units run with their degraded kinds flagged.
    Invoke,
}

impl PartialPolicy {
    /// Maps the boolean configuration switch onto a policy.
    pub fn from_flag(invoke: bool) -> Self {
        if invoke {
            PartialPolicy::Invoke
        } else {
            PartialPolicy::Skip
        }
    }

    /// True when a unit with `status` is dispatched under this policy.
    pub fn admits(self, status: ApplicabilityStatus) -> bool {
        match status {
            ApplicabilityStatus::Applicable => true,
            ApplicabilityStatus::PartiallyApplicable => self == PartialPolicy::Invoke,
            ApplicabilityStatus::NotApplicable => false,
        }
    }
}

/// Runs one decoder on one channel and contains any fault it raises.
#[derive(Debug, Clone, Copy)]
pub struct Orchestrator<'a> {
    registry: &'a DecoderRegistry,
    policy: PartialPolicy,
}

impl<'a> Orchestrator<'a> {
    /// Creates an orchestrator over a read-only registry.
    pub fn new(registry: &'a DecoderRegistry, policy: PartialPolicy) -> Self {
        Self { registry, policy }
    }

    /// Active partial policy.
    pub fn policy(&self) -> PartialPolicy {
        self.policy
    }

    /// Produces the experiment for an admitted (channel, method) unit.
    ///
    /// Errors only on consistency violations: a report that does not belong
    /// to `channel`/`spec`, or a status the policy does not admit. Decoder
    /// faults and panics become `failed` results.
    ///
    /// No `ApplicabilityParams` are taken: `report` already holds the
    /// evaluator's verdict under those thresholds, and the orchestrator never
    /// re-evaluates. Only the pairing and the admitted status are checked.
    pub fn run(
        &self,
        channel: &Channel,
        spec: &MethodSpec,
        report: &ApplicabilityReport,
        overrides: Option<&DecoderParams>,
    ) -> Result<ExperimentResult, SapError> {
        if report.channel != channel.name || report.method_id != spec.method_id {
            return Err(SapError::Consistency(
                ErrorInfo::new(
                    "sap_engine.report_mismatch",
                    "applicability report does not belong to this channel and method",
                )
                .with_context("channel", channel.name.clone())
                .with_context("method_id", spec.method_id.clone())
                .with_context("report_channel", report.channel.clone())
                .with_context("report_method_id", report.method_id.clone()),
            ));
        }
        if !self.policy.admits(report.status) {
            return Err(SapError::Consistency(
                ErrorInfo::new(
                    "sap_engine.unit_not_admitted",
                    format!("method is {} for this channel", report.status),
                )
                .with_context("channel", channel.name.clone())
                .with_context("method_id", spec.method_id.clone()),
            ));
        }

        let mut result = ExperimentResult {
            channel: channel.name.clone(),
            method_id: spec.method_id.clone(),
            status: ExperimentStatus::Skipped,
            decoder_version: None,
            parameters: overrides.cloned().unwrap_or_default(),
            diagnostics: Vec::new(),
            artifacts: ExperimentArtifacts::default(),
        };

        let Some(decoder) = self.registry.lookup(&spec.method_id) else {
            tracing::debug!(
                channel = %channel.name,
                method_id = %spec.method_id,
                "no decoder registered; unit skipped"
            );
            result
                .diagnostics
                .push(format!("no decoder registered for method `{}`", spec.method_id));
            return Ok(result);
        };

        let mut parameters = decoder.default_params();
        if let Some(overrides) = overrides {
            parameters.extend(overrides.iter().map(|(key, value)| (key.clone(), value.clone())));
        }
        result.parameters = parameters;
        result.decoder_version = Some(decoder.version().to_string());

        let degraded = report.degraded_kinds();
        for (kind, reason) in &report.unstable_inputs {
            result
                .diagnostics
                .push(format!("degraded input `{kind}`: {reason}"));
        }
        let view = ChannelView::restrict(channel, &spec.declared_kinds()).with_degraded(degraded);

        let outcome = catch_unwind(AssertUnwindSafe(|| decoder.decode(&view, &result.parameters)));
        match outcome {
            Ok(Ok(hypotheses)) => {
                result.status = ExperimentStatus::Ok;
                result.artifacts.hypotheses = hypotheses;
            }
            Ok(Err(err)) => {
                tracing::warn!(
                    channel = %channel.name,
                    method_id = %spec.method_id,
                    code = %err.info().code,
                    "decoder reported a fault"
                );
                result.status = ExperimentStatus::Failed;
                result.diagnostics.push(err.to_string());
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::warn!(
                    channel = %channel.name,
                    method_id = %spec.method_id,
                    "decoder panicked: {message}"
                );
                result.status = ExperimentStatus::Failed;
                result.diagnostics.push(format!("decoder panicked: {message}"));
            }
        }
        Ok(result)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
