use std::collections::BTreeMap;

use sap_core::{Channel, InputKind, Measure};

use crate::matrix::{ApplicabilityMatrix, MethodSpec};
use crate::params::ApplicabilityParams;
use crate::report::{ApplicabilityReport, ApplicabilityStatus};

/// Reason recorded for every absent input.
pub const MISSING_REASON: &str = "not present in channel";

/// Decides whether `spec` may run on `channel`.
///
/// Pure: identical inputs always produce an identical report.
pub fn evaluate(
    channel: &Channel,
    spec: &MethodSpec,
    params: &ApplicabilityParams,
) -> ApplicabilityReport {
    let resolved = params.with_overrides(&spec.thresholds);
    let mut missing_inputs = BTreeMap::new();
    let mut unstable_inputs = BTreeMap::new();
    let mut diagnostics = Vec::new();

    for &kind in &spec.required_inputs {
        match channel.measure(kind) {
            None => {
                missing_inputs.insert(kind, MISSING_REASON.to_string());
            }
            Some(measure) => {
                if let Some(shortfall) = stability_shortfall(kind, measure, &resolved) {
                    unstable_inputs.insert(kind, shortfall);
                }
            }
        }
    }

    for &kind in &spec.optional_inputs {
        match channel.measure(kind) {
            None => diagnostics.push(format!("optional input `{kind}` {MISSING_REASON}")),
            Some(measure) => {
                if let Some(shortfall) = stability_shortfall(kind, measure, &resolved) {
                    diagnostics.push(format!("optional input `{kind}` unstable: {shortfall}"));
                }
            }
        }
    }

    let status = if !missing_inputs.is_empty() {
        ApplicabilityStatus::NotApplicable
    } else if !unstable_inputs.is_empty() {
        ApplicabilityStatus::PartiallyApplicable
    } else {
        ApplicabilityStatus::Applicable
    };

    ApplicabilityReport {
        channel: channel.name.clone(),
        method_id: spec.method_id.clone(),
        status,
        missing_inputs,
        unstable_inputs,
        diagnostics,
    }
}

/// Evaluates every declared method against one channel.
pub fn evaluate_channel(
    channel: &Channel,
    matrix: &ApplicabilityMatrix,
    params: &ApplicabilityParams,
) -> BTreeMap<String, ApplicabilityReport> {
    matrix
        .methods()
        .map(|spec| (spec.method_id.clone(), evaluate(channel, spec, params)))
        .collect()
}

/// Returns the observed-vs-required description when `measure` falls short.
fn stability_shortfall(
    kind: InputKind,
    measure: Measure,
    thresholds: &ApplicabilityParams,
) -> Option<String> {
    match measure {
        Measure::Count(observed) => {
            let required = thresholds.min_count(kind)?;
            (observed < required).then(|| format!("{observed} < {required}"))
        }
        Measure::Shape(rows, cols) => {
            let [min_rows, min_cols] = thresholds.min_matrix_shape;
            let mut parts = Vec::new();
            if rows < min_rows {
                parts.push(format!("rows {rows} < {min_rows}"));
            }
            if cols < min_cols {
                parts.push(format!("cols {cols} < {min_cols}"));
            }
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Measure::Pairs(pairs) => {
            (thresholds.require_relation_pairs && pairs == 0).then(|| "0 pairs < 1".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_axes_are_checked_independently() {
        let params = ApplicabilityParams::default();
        assert_eq!(
            stability_shortfall(InputKind::Matrix, Measure::Shape(5, 1), &params),
            Some("cols 1 < 2".to_string())
        );
        assert_eq!(
            stability_shortfall(InputKind::Matrix, Measure::Shape(1, 1), &params),
            Some("rows 1 < 2, cols 1 < 2".to_string())
        );
        assert_eq!(
            stability_shortfall(InputKind::Matrix, Measure::Shape(2, 2), &params),
            None
        );
    }

    #[test]
    fn empty_relations_pass_when_pairs_optional() {
        let params = ApplicabilityParams {
            require_relation_pairs: false,
            ..ApplicabilityParams::default()
        };
        assert_eq!(
            stability_shortfall(InputKind::Relations, Measure::Pairs(0), &params),
            None
        );
    }
}
