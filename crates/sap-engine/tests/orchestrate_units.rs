mod common;

use common::{event_channel, CountingDecoder, PanickingDecoder, SilentDecoder};
use sap_core::{InputKind, SapError};
use sap_decode::{DecoderParams, DecoderRegistry};
use sap_engine::{ExperimentStatus, Orchestrator, PartialPolicy};
use sap_matrix::{evaluate, ApplicabilityParams, ApplicabilityStatus, MethodSpec};
use serde_json::Value;

fn registry() -> DecoderRegistry {
    let mut registry = DecoderRegistry::new();
    registry
        .register(Box::new(CountingDecoder {
            method_id: "counting",
            fails_on: Some("A"),
        }))
        .expect("register counting");
    registry
        .register(Box::new(PanickingDecoder))
        .expect("register panicking");
    registry
        .register(Box::new(SilentDecoder))
        .expect("register silent");
    registry
}

#[test]
fn unregistered_method_is_skipped_not_failed() {
    let registry = registry();
    let orchestrator = Orchestrator::new(&registry, PartialPolicy::Skip);
    let channel = event_channel("ch1", 5);
    let spec = MethodSpec::new("M3", vec![InputKind::Events]);
    let report = evaluate(&channel, &spec, &ApplicabilityParams::default());

    let result = orchestrator
        .run(&channel, &spec, &report, None)
        .expect("skipped result");

    assert_eq!(result.status, ExperimentStatus::Skipped);
    assert_eq!(result.diagnostics, vec!["no decoder registered for method `M3`"]);
    assert!(result.decoder_version.is_none());
    assert!(result.hypotheses().is_empty());
}

#[test]
fn overrides_merge_over_decoder_defaults() {
    let registry = registry();
    let orchestrator = Orchestrator::new(&registry, PartialPolicy::Skip);
    let channel = event_channel("B", 4);
    let spec = MethodSpec::new("counting", vec![InputKind::Events]);
    let report = evaluate(&channel, &spec, &ApplicabilityParams::default());
    let mut overrides = DecoderParams::new();
    overrides.insert("scale".into(), Value::from(3));

    let result = orchestrator
        .run(&channel, &spec, &report, Some(&overrides))
        .expect("ok result");

    assert_eq!(result.status, ExperimentStatus::Ok);
    assert_eq!(result.decoder_version.as_deref(), Some("1.0.0"));
    assert_eq!(result.parameters.get("scale"), Some(&Value::from(3)));
    assert_eq!(result.parameters.get("label"), Some(&Value::from("default")));
    assert_eq!(result.hypotheses()[0].representation, "4");
    assert_eq!(result.hypotheses()[0].parameters, result.parameters);
}

#[test]
fn returned_fault_becomes_failed_with_diagnostic() {
    let registry = registry();
    let orchestrator = Orchestrator::new(&registry, PartialPolicy::Skip);
    let channel = event_channel("A", 4);
    let spec = MethodSpec::new("counting", vec![InputKind::Events]);
    let report = evaluate(&channel, &spec, &ApplicabilityParams::default());

    let result = orchestrator
        .run(&channel, &spec, &report, None)
        .expect("failed result");

    assert_eq!(result.status, ExperimentStatus::Failed);
    assert_eq!(result.diagnostics.len(), 1);
    assert!(result.diagnostics[0].contains("malformed shape"));
}

#[test]
fn panic_is_contained_at_the_boundary() {
    let registry = registry();
    let orchestrator = Orchestrator::new(&registry, PartialPolicy::Skip);
    let channel = event_channel("A", 4);
    let spec = MethodSpec::new("panics", vec![InputKind::Events]);
    let report = evaluate(&channel, &spec, &ApplicabilityParams::default());

    let result = orchestrator
        .run(&channel, &spec, &report, None)
        .expect("failed result");

    assert_eq!(result.status, ExperimentStatus::Failed);
    assert_eq!(
        result.diagnostics,
        vec!["decoder panicked: index out of bounds in test decoder"]
    );
}

#[test]
fn empty_hypothesis_list_is_ok() {
    let registry = registry();
    let orchestrator = Orchestrator::new(&registry, PartialPolicy::Skip);
    let channel = event_channel("A", 4);
    let spec = MethodSpec::new("silent", vec![InputKind::Events]);
    let report = evaluate(&channel, &spec, &ApplicabilityParams::default());

    let result = orchestrator
        .run(&channel, &spec, &report, None)
        .expect("ok result");

    assert_eq!(result.status, ExperimentStatus::Ok);
    assert!(result.hypotheses().is_empty());
    assert!(result.diagnostics.is_empty());
}

#[test]
fn partial_units_need_the_invoke_policy() {
    let registry = registry();
    let channel = event_channel("B", 2);
    let spec = MethodSpec::new("counting", vec![InputKind::Events]);
    let report = evaluate(&channel, &spec, &ApplicabilityParams::default());
    assert_eq!(report.status, ApplicabilityStatus::PartiallyApplicable);

    let err = Orchestrator::new(&registry, PartialPolicy::Skip)
        .run(&channel, &spec, &report, None)
        .expect_err("skip policy rejects partial units");
    assert!(matches!(err, SapError::Consistency(_)));

    let result = Orchestrator::new(&registry, PartialPolicy::Invoke)
        .run(&channel, &spec, &report, None)
        .expect("invoke policy runs partial units");
    assert_eq!(result.status, ExperimentStatus::Ok);
    assert_eq!(result.diagnostics, vec!["degraded input `events`: 2 < 3"]);
}

#[test]
fn mismatched_report_is_a_consistency_error() {
    let registry = registry();
    let orchestrator = Orchestrator::new(&registry, PartialPolicy::Skip);
    let channel = event_channel("A", 4);
    let other = event_channel("B", 4);
    let spec = MethodSpec::new("silent", vec![InputKind::Events]);
    let report = evaluate(&other, &spec, &ApplicabilityParams::default());

    let err = orchestrator
        .run(&channel, &spec, &report, None)
        .expect_err("report for B cannot drive A");
    assert_eq!(err.info().code, "sap_engine.report_mismatch");
}
