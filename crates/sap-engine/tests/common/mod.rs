#![allow(dead_code)]

use std::thread;
use std::time::Duration;

use sap_core::{Channel, Event, SapError};
use sap_decode::{ChannelView, Decoder, DecoderParams, Hypothesis, HypothesisLevel};
use sap_matrix::{ApplicabilityMatrix, MethodSpec};
use sap_core::InputKind;
use serde_json::Value;

/// Counts events; faults on one named channel.
pub struct CountingDecoder {
    pub method_id: &'static str,
    pub fails_on: Option<&'static str>,
}

impl Decoder for CountingDecoder {
    fn method_id(&self) -> &str {
        self.method_id
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn default_params(&self) -> DecoderParams {
        let mut params = DecoderParams::new();
        params.insert("scale".into(), Value::from(1));
        params.insert("label".into(), Value::from("default"));
        params
    }

    fn decode(
        &self,
        view: &ChannelView<'_>,
        params: &DecoderParams,
    ) -> Result<Vec<Hypothesis>, SapError> {
        if self.fails_on == Some(view.channel) {
            return Err(SapError::decode("test.fault", "malformed shape"));
        }
        let events = view.require_events()?;
        Ok(vec![Hypothesis::new(HypothesisLevel::Symbols, events.len().to_string())
            .with_score("confidence", 1.0)
            .with_parameters(params.clone())])
    }
}

/// Always panics.
pub struct PanickingDecoder;

impl Decoder for PanickingDecoder {
    fn method_id(&self) -> &str {
        "panics"
    }

    fn version(&self) -> &str {
        "0.0.1"
    }

    fn decode(
        &self,
        _view: &ChannelView<'_>,
        _params: &DecoderParams,
    ) -> Result<Vec<Hypothesis>, SapError> {
        panic!("index out of bounds in test decoder")
    }
}

/// Sleeps on one named channel before proposing an empty hypothesis set.
pub struct SlowDecoder {
    pub slow_on: &'static str,
    pub pause: Duration,
}

impl Decoder for SlowDecoder {
    fn method_id(&self) -> &str {
        "slow"
    }

    fn version(&self) -> &str {
        "0.1.0"
    }

    fn decode(
        &self,
        view: &ChannelView<'_>,
        _params: &DecoderParams,
    ) -> Result<Vec<Hypothesis>, SapError> {
        if view.channel == self.slow_on {
            thread::sleep(self.pause);
        }
        Ok(Vec::new())
    }
}

/// Never proposes anything.
pub struct SilentDecoder;

impl Decoder for SilentDecoder {
    fn method_id(&self) -> &str {
        "silent"
    }

    fn version(&self) -> &str {
        "0.3.0"
    }

    fn decode(
        &self,
        _view: &ChannelView<'_>,
        _params: &DecoderParams,
    ) -> Result<Vec<Hypothesis>, SapError> {
        Ok(Vec::new())
    }
}

pub fn events(count: usize) -> Vec<Event> {
    (0..count)
        .map(|idx| Event {
            onset: idx as f64,
            duration: 0.25,
            amplitude: Some(1.0),
        })
        .collect()
}

pub fn event_channel(name: &str, count: usize) -> Channel {
    let mut channel = Channel::new(name);
    channel.events = Some(events(count));
    channel
}

pub fn events_matrix(method_ids: &[&str]) -> ApplicabilityMatrix {
    ApplicabilityMatrix::new(
        "1.0",
        method_ids
            .iter()
            .map(|method_id| MethodSpec::new(*method_id, vec![InputKind::Events]))
            .collect(),
    )
    .expect("valid matrix")
}
