use sap_core::errors::{ErrorInfo, SapError};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("method_id", "M1")
        .with_context("reason", "example")
}

#[test]
fn config_error_surface() {
    let err = SapError::Config(sample_info("sap_matrix.duplicate_method", "duplicate"));
    assert_eq!(err.info().code, "sap_matrix.duplicate_method");
    assert!(err.info().context.contains_key("method_id"));
    assert_eq!(
        err.to_string(),
        "config error: [sap_matrix.duplicate_method] duplicate (method_id=M1, reason=example)"
    );
    assert_eq!(err.family(), "config");
    assert!(err.is_fatal_at_load());
}

#[test]
fn consistency_error_surface() {
    let err = SapError::Consistency(sample_info("C001", "undeclared method"));
    assert_eq!(err.info().code, "C001");
    assert!(err.info().context.contains_key("reason"));
    assert_eq!(err.family(), "consistency");
    assert!(!err.is_fatal_at_load());
}

#[test]
fn decode_error_display_includes_hint() {
    let err = SapError::Decode(ErrorInfo::new("D001", "ragged matrix").with_hint("pad rows"));
    let rendered = err.to_string();
    assert_eq!(rendered, "decode error: [D001] ragged matrix; hint: pad rows");
}

#[test]
fn errors_roundtrip_through_json() {
    let err = SapError::Transcript(sample_info("T001", "bad channel"));
    let json = serde_json::to_string(&err).expect("serialize");
    assert!(json.contains("\"family\":\"Transcript\""));
    let decoded: SapError = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(decoded, err);
}
