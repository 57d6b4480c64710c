mod common;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use common::{event_channel, events_matrix, CountingDecoder};
use sap_core::Transcript;
use sap_decode::DecoderRegistry;
use sap_engine::{run_pipeline, RunInputs, RunOpts};
use sap_matrix::ApplicabilityParams;
use tracing::span::{Attributes, Id};
use tracing::Subscriber;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;

/// Records the parent span name of every `unit` span.
struct UnitParents(Arc<Mutex<Vec<Option<String>>>>);

impl<S> Layer<S> for UnitParents
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        if attrs.metadata().name() != "unit" {
            return;
        }
        let parent = ctx
            .span(id)
            .and_then(|span| span.parent())
            .map(|parent| parent.name().to_string());
        self.0.lock().expect("parents lock").push(parent);
    }
}

#[test]
fn worker_unit_spans_nest_under_the_run_span() {
    let parents = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(UnitParents(Arc::clone(&parents)));
    // Rayon workers only see the global dispatcher.
    tracing::subscriber::set_global_default(subscriber).expect("install subscriber");

    let transcript = Transcript::from_channels(
        "sat-3",
        (0..6).map(|idx| event_channel(&format!("ch{idx}"), 5)).collect(),
    );
    let matrix = events_matrix(&["X"]);
    let mut registry = DecoderRegistry::new();
    registry
        .register(Box::new(CountingDecoder {
            method_id: "X",
            fails_on: None,
        }))
        .expect("register X");
    let overrides = BTreeMap::new();
    let inputs = RunInputs {
        transcript: &transcript,
        matrix: &matrix,
        params: &ApplicabilityParams::default(),
        registry: &registry,
        decoder_params: &overrides,
    };
    let opts = RunOpts {
        concurrency: 3,
        ..RunOpts::default()
    };

    run_pipeline(inputs, &opts).expect("run completes");

    let parents = parents.lock().expect("parents lock");
    assert_eq!(parents.len(), 6);
    assert!(parents
        .iter()
        .all(|parent| parent.as_deref() == Some("run_pipeline")));
}
