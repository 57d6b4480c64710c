use proptest::prelude::*;
use sap_core::{Channel, Event, InputKind, RelationPair};
use sap_decode::{ChannelView, Decoder, DurationMorseDecoder, PhaseDeltaDecoder};

proptest! {
    #[test]
    fn phase_symbols_stay_inside_alphabet(
        deltas in proptest::collection::vec(-20.0f64..20.0, 1..40),
        levels in 2usize..9,
    ) {
        let mut channel = Channel::new("ch");
        channel.relations = Some(
            deltas
                .iter()
                .map(|delta| RelationPair { peer: "peer".into(), phase_delta: *delta, lag: None })
                .collect(),
        );
        let view = ChannelView::restrict(&channel, &[InputKind::Relations]);
        let mut params = PhaseDeltaDecoder.default_params();
        params.insert("levels".into(), levels.into());

        let hypotheses = PhaseDeltaDecoder.decode(&view, &params).expect("decode succeeds");
        prop_assert_eq!(hypotheses.len(), 1);
        let rendered = &hypotheses[0].representation;
        prop_assert_eq!(rendered.len(), deltas.len());
        for symbol in rendered.chars() {
            let value = symbol.to_digit(10).expect("digit symbol") as usize;
            prop_assert!(value < levels);
        }
        let coherence = hypotheses[0].scores["coherence"];
        prop_assert!((0.0..=1.0 + 1e-9).contains(&coherence));
    }

    #[test]
    fn morse_confidence_is_a_fraction(durations in proptest::collection::vec(0.01f64..1.0, 1..30)) {
        let mut onset = 0.0;
        let events = durations
            .iter()
            .map(|duration| {
                let event = Event { onset, duration: *duration, amplitude: None };
                onset += duration + 0.1;
                event
            })
            .collect();
        let mut channel = Channel::new("ch");
        channel.events = Some(events);
        let view = ChannelView::restrict(&channel, &[InputKind::Events]);

        let hypotheses = DurationMorseDecoder
            .decode(&view, &DurationMorseDecoder.default_params())
            .expect("decode succeeds");
        for hypothesis in &hypotheses {
            let confidence = hypothesis.scores["confidence"];
            prop_assert!((0.0..=1.0).contains(&confidence));
        }
    }
}
