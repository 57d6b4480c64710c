use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use sap_core::errors::{ErrorInfo, SapError};
use sap_core::{Channel, Transcript};
use sap_decode::{DecoderParams, DecoderRegistry};
use sap_matrix::{evaluate_channel, ApplicabilityMatrix, ApplicabilityParams, ApplicabilityReport};

use crate::aggregate::{aggregate, RunAssembler};
use crate::orchestrate::{Orchestrator, PartialPolicy};
use crate::result::{ExperimentResult, PipelineChannelResult, PipelineRunResult, RunProvenance};

/// Cloneable external abort signal.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that has not fired.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that no further units start.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// True once [`CancelToken::cancel`] was called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options governing a pipeline run.
#[derive(Debug, Clone)]
pub struct RunOpts {
    /// Number of worker threads.
    pub concurrency: usize,
    /// Whether `partially_applicable` units are dispatched.
    pub policy: PartialPolicy,
    /// Budget after which no further units start.
    pub timeout: Option<Duration>,
    /// External abort signal.
    pub cancel: CancelToken,
}

impl Default for RunOpts {
    fn default() -> Self {
        Self {
            concurrency: 1,
            policy: PartialPolicy::Skip,
            timeout: None,
            cancel: CancelToken::new(),
        }
    }
}

/// Read-only inputs shared by every worker.
#[derive(Debug, Clone, Copy)]
pub struct RunInputs<'a> {
    /// Parsed transcript.
    pub transcript: &'a Transcript,
    /// Validated matrix.
    pub matrix: &'a ApplicabilityMatrix,
    /// Global thresholds.
    pub params: &'a ApplicabilityParams,
    /// Decoder lookup.
    pub registry: &'a DecoderRegistry,
    /// Decoder parameter overrides keyed by `method_id`.
    pub decoder_params: &'a BTreeMap<String, DecoderParams>,
}

/// Callback invoked once per channel as soon as it is fully assembled.
pub type ChannelObserver<'o> = &'o (dyn Fn(&PipelineChannelResult) + Sync);

struct Unit<'a> {
    channel: usize,
    method_id: &'a str,
}

struct ChannelPlan<'a> {
    channel: &'a Channel,
    reports: BTreeMap<String, ApplicabilityReport>,
    units: Vec<usize>,
    pending: AtomicUsize,
    assembled: OnceLock<Result<PipelineChannelResult, SapError>>,
}

fn pool_error(err: impl ToString) -> SapError {
    SapError::Config(ErrorInfo::new("sap_engine.thread_pool", err.to_string()))
}

/// Rejects decoder overrides for methods the matrix never declares.
pub fn check_decoder_overrides(
    matrix: &ApplicabilityMatrix,
    decoder_params: &BTreeMap<String, DecoderParams>,
) -> Result<(), SapError> {
    match decoder_params.keys().find(|method_id| !matrix.contains(method_id)) {
        Some(method_id) => Err(SapError::Consistency(
            ErrorInfo::new(
                "sap_engine.undeclared_method",
                "decoder parameters reference a method the matrix does not declare",
            )
            .with_context("method_id", method_id.clone())
            .with_context("schema_version", matrix.schema_version().to_string()),
        )),
        None => Ok(()),
    }
}

/// Evaluates, dispatches and aggregates a whole transcript.
pub fn run_pipeline(inputs: RunInputs<'_>, opts: &RunOpts) -> Result<PipelineRunResult, SapError> {
    run_pipeline_with_observer(inputs, opts, None)
}

/// [`run_pipeline`] with a callback fired as each channel completes.
///
/// Work is split into independent (channel, method) units on a bounded rayon
/// pool. Every unit owns one write-once slot; the worker that finishes a
/// channel's last unit assembles that channel. Once the token fires or the
/// timeout elapses no further unit starts, and channels are assembled from
/// the slots already written.
pub fn run_pipeline_with_observer(
    inputs: RunInputs<'_>,
    opts: &RunOpts,
    observer: Option<ChannelObserver<'_>>,
) -> Result<PipelineRunResult, SapError> {
    check_decoder_overrides(inputs.matrix, inputs.decoder_params)?;
    inputs.params.validate()?;

    let span = tracing::info_span!(
        "run_pipeline",
        source = %inputs.transcript.source,
        schema_version = %inputs.matrix.schema_version()
    );
    let _guard = span.enter();
    let started = Instant::now();
    let deadline = opts.timeout.map(|timeout| started + timeout);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.concurrency.max(1))
        .build()
        .map_err(pool_error)?;

    let channels: Vec<&Channel> = inputs.transcript.channels.values().collect();
    let evaluated: Vec<BTreeMap<String, ApplicabilityReport>> = pool.install(|| {
        channels
            .par_iter()
            .map(|channel| evaluate_channel(channel, inputs.matrix, inputs.params))
            .collect()
    });

    let mut units: Vec<Unit<'_>> = Vec::new();
    let mut plans: Vec<ChannelPlan<'_>> = Vec::with_capacity(channels.len());
    for (index, (channel, reports)) in channels.iter().copied().zip(evaluated).enumerate() {
        let mut owned = Vec::new();
        for (method_id, report) in &reports {
            if opts.policy.admits(report.status) {
                if let Some(spec) = inputs.matrix.method(method_id) {
                    owned.push(units.len());
                    units.push(Unit {
                        channel: index,
                        method_id: spec.method_id.as_str(),
                    });
                }
            }
        }
        plans.push(ChannelPlan {
            channel,
            pending: AtomicUsize::new(owned.len()),
            units: owned,
            reports,
            assembled: OnceLock::new(),
        });
    }
    tracing::info!(
        channels = plans.len(),
        methods = inputs.matrix.len(),
        units = units.len(),
        "dispatching decoding units"
    );

    let slots: Vec<OnceLock<ExperimentResult>> = units.iter().map(|_| OnceLock::new()).collect();
    let interrupted = AtomicBool::new(false);
    let timed_out = AtomicBool::new(false);
    let orchestrator = Orchestrator::new(inputs.registry, opts.policy);

    let assemble = |plan: &ChannelPlan<'_>| {
        let outcome = aggregate(
            &plan.channel.name,
            plan.reports.values().cloned(),
            plan.units.iter().filter_map(|unit| slots[*unit].get().cloned()),
        );
        if let (Ok(result), Some(observer)) = (&outcome, observer) {
            observer(result);
        }
        let _ = plan.assembled.set(outcome);
    };

    for plan in plans.iter().filter(|plan| plan.units.is_empty()) {
        assemble(plan);
    }

    let dispatched: Result<(), SapError> = pool.install(|| {
        units.par_iter().enumerate().try_for_each(|(index, unit)| -> Result<(), SapError> {
            let plan = &plans[unit.channel];
            // The deadline latches run-locally; the caller's token is only read.
            let expired = timed_out.load(Ordering::SeqCst)
                || deadline.is_some_and(|deadline| Instant::now() >= deadline);
            if expired {
                timed_out.store(true, Ordering::SeqCst);
            }
            if expired || opts.cancel.is_cancelled() {
                if !interrupted.swap(true, Ordering::SeqCst) {
                    tracing::warn!(timed_out = expired, "run interrupted; remaining units dropped");
                }
            } else {
                let _unit = tracing::debug_span!(
                    parent: &span,
                    "unit",
                    channel = %plan.channel.name,
                    method_id = %unit.method_id
                )
                .entered();
                let spec = inputs.matrix.method(unit.method_id).ok_or_else(|| {
                    SapError::Consistency(
                        ErrorInfo::new("sap_engine.undeclared_method", "unit names an undeclared method")
                            .with_context("method_id", unit.method_id.to_string()),
                    )
                })?;
                let report = plan.reports.get(unit.method_id).ok_or_else(|| {
                    SapError::Consistency(
                        ErrorInfo::new("sap_engine.missing_report", "unit has no applicability report")
                            .with_context("channel", plan.channel.name.clone())
                            .with_context("method_id", unit.method_id.to_string()),
                    )
                })?;
                let result = orchestrator.run(
                    plan.channel,
                    spec,
                    report,
                    inputs.decoder_params.get(unit.method_id),
                )?;
                tracing::debug!(status = %result.status, "unit finished");
                let _ = slots[index].set(result);
            }
            if plan.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
                assemble(plan);
            }
            Ok(())
        })
    });
    dispatched?;

    let mut assembler = RunAssembler::new(RunProvenance {
        sat_source: inputs.transcript.source.clone(),
        matrix_schema_version: inputs.matrix.schema_version().to_string(),
        matrix_hash: inputs.matrix.content_hash()?,
        transcript_hash: inputs.transcript.content_hash()?,
        decoders: inputs.registry.list(),
    })
    .with_declared_methods(inputs.matrix.method_ids());
    for plan in &plans {
        if plan.assembled.get().is_none() {
            assemble(plan);
        }
        match plan.assembled.get() {
            Some(Ok(channel)) => assembler.insert_channel(channel.clone())?,
            Some(Err(err)) => return Err(err.clone()),
            None => {}
        }
    }
    if interrupted.load(Ordering::SeqCst) {
        assembler.mark_interrupted();
    }

    let result = assembler.finalize();
    tracing::info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        interrupted = result.interrupted(),
        "pipeline run finished"
    );
    Ok(result)
}
