use std::collections::BTreeSet;

use proptest::prelude::*;
use sap_core::{Channel, Event, InputKind, Matrix, RelationPair};
use sap_matrix::{evaluate, ApplicabilityParams, ApplicabilityStatus, MethodSpec};

fn kind_strategy() -> impl Strategy<Value = InputKind> {
    prop::sample::select(InputKind::ALL.to_vec())
}

fn channel_strategy() -> impl Strategy<Value = Channel> {
    (
        prop::option::of(0usize..8),
        prop::option::of(0usize..8),
        prop::option::of(0usize..12),
        prop::option::of(0usize..16),
        prop::option::of((0usize..4, 0usize..4)),
        prop::option::of(0usize..3),
    )
        .prop_map(|(events, intervals, symbols, vector, matrix, relations)| {
            let mut channel = Channel::new("prop");
            channel.events = events.map(|n| {
                (0..n)
                    .map(|i| Event {
                        onset: i as f64,
                        duration: 0.1,
                        amplitude: None,
                    })
                    .collect()
            });
            channel.intervals = intervals.map(|n| vec![0.2; n]);
            channel.symbols = symbols.map(|n| vec!["a".to_string(); n]);
            channel.vector = vector.map(|n| vec![0.0; n]);
            channel.matrix = matrix.map(|(r, c)| Matrix::new(vec![vec![0.0; c]; r]));
            channel.relations = relations.map(|n| {
                (0..n)
                    .map(|_| RelationPair {
                        peer: "peer".into(),
                        phase_delta: 0.0,
                        lag: None,
                    })
                    .collect()
            });
            channel
        })
}

fn spec_strategy() -> impl Strategy<Value = MethodSpec> {
    prop::collection::btree_set(kind_strategy(), 1..4).prop_map(|kinds| {
        MethodSpec::new("prop_method", kinds.into_iter().collect::<Vec<_>>())
    })
}

proptest! {
    #[test]
    fn absent_required_inputs_are_exactly_the_missing_set(channel in channel_strategy(), spec in spec_strategy()) {
        let report = evaluate(&channel, &spec, &ApplicabilityParams::default());
        let absent: BTreeSet<_> = spec
            .required_inputs
            .iter()
            .copied()
            .filter(|kind| !channel.has(*kind))
            .collect();
        let missing: BTreeSet<_> = report.missing_inputs.keys().copied().collect();
        prop_assert_eq!(&missing, &absent);
        if !absent.is_empty() {
            prop_assert_eq!(report.status, ApplicabilityStatus::NotApplicable);
        }
        for kind in report.unstable_inputs.keys() {
            prop_assert!(!report.missing_inputs.contains_key(kind));
        }
    }

    #[test]
    fn evaluation_is_idempotent(channel in channel_strategy(), spec in spec_strategy()) {
        let params = ApplicabilityParams::default();
        let first = evaluate(&channel, &spec, &params);
        let second = evaluate(&channel, &spec, &params);
        prop_assert_eq!(first, second);
    }
}
