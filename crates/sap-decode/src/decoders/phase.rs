use std::collections::BTreeMap;
use std::f64::consts::TAU;

use sap_core::errors::{ErrorInfo, SapError};
use serde_json::Value;

use crate::decoder::{
    json_f64, param_f64, param_usize, ChannelView, Decoder, DecoderParams, Hypothesis,
    HypothesisLevel,
};

const METHOD_ID: &str = "phase_delta";
const VERSION: &str = "0.1.0";
const DEFAULT_LEVELS: usize = 2;

/// Quantises inter-channel phase deltas into `levels` symbols, one hypothesis per peer.
///
/// Coherence is the mean resultant length of the quantisation residuals.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseDeltaDecoder;

struct PeerSymbols {
    peer: String,
    symbols: Vec<usize>,
    coherence: f64,
}

fn quantise(deltas: &[f64], levels: usize, reference: f64) -> (Vec<usize>, f64) {
    let step = TAU / levels as f64;
    let mut symbols = Vec::with_capacity(deltas.len());
    let (mut cos_sum, mut sin_sum) = (0.0, 0.0);
    for delta in deltas {
        let wrapped = (delta - reference).rem_euclid(TAU);
        let slot = (wrapped / step).round();
        let residual = wrapped - slot * step;
        symbols.push(slot as usize % levels);
        cos_sum += residual.cos();
        sin_sum += residual.sin();
    }
    let coherence = if deltas.is_empty() {
        0.0
    } else {
        cos_sum.hypot(sin_sum) / deltas.len() as f64
    };
    (symbols, coherence)
}

fn render_symbols(symbols: &[usize], levels: usize) -> String {
    if levels <= 10 {
        symbols.iter().map(|symbol| symbol.to_string()).collect()
    } else {
        symbols
            .iter()
            .map(|symbol| symbol.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Decoder for PhaseDeltaDecoder {
    fn method_id(&self) -> &str {
        METHOD_ID
    }

    fn version(&self) -> &str {
        VERSION
    }

    fn default_params(&self) -> DecoderParams {
        let mut params = DecoderParams::new();
        params.insert("levels".into(), Value::from(DEFAULT_LEVELS));
        params.insert("reference".into(), json_f64(0.0));
        params
    }

    fn decode(
        &self,
        view: &ChannelView<'_>,
        params: &DecoderParams,
    ) -> Result<Vec<Hypothesis>, SapError> {
        let relations = view.require_relations()?;
        let levels = param_usize(params, "levels")?.unwrap_or(DEFAULT_LEVELS);
        if levels < 2 {
            return Err(SapError::Decode(
                ErrorInfo::new("sap_decode.invalid_param", "levels must be at least 2")
                    .with_context("levels", levels.to_string()),
            ));
        }
        let reference = param_f64(params, "reference")?.unwrap_or(0.0);
        if relations.iter().any(|pair| !pair.phase_delta.is_finite()) {
            return Err(SapError::Decode(
                ErrorInfo::new(
                    "sap_decode.phase.non_finite",
                    "relation phase deltas must be finite",
                )
                .with_context("channel", view.channel.to_string()),
            ));
        }

        let mut by_peer: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for pair in relations {
            by_peer
                .entry(pair.peer.as_str())
                .or_default()
                .push(pair.phase_delta);
        }

        let mut peers: Vec<PeerSymbols> = by_peer
            .into_iter()
            .map(|(peer, deltas)| {
                let (symbols, coherence) = quantise(&deltas, levels, reference);
                PeerSymbols {
                    peer: peer.to_string(),
                    symbols,
                    coherence,
                }
            })
            .collect();
        peers.sort_by(|a, b| b.coherence.total_cmp(&a.coherence).then(a.peer.cmp(&b.peer)));

        Ok(peers
            .into_iter()
            .map(|peer| {
                let mut parameters = DecoderParams::new();
                parameters.insert("levels".into(), Value::from(levels));
                parameters.insert("reference".into(), json_f64(reference));
                parameters.insert("peer".into(), Value::from(peer.peer.clone()));
                Hypothesis::new(
                    HypothesisLevel::Symbols,
                    render_symbols(&peer.symbols, levels),
                )
                .with_score("coherence", peer.coherence)
                .with_score("pairs", peer.symbols.len() as f64)
                .with_parameters(parameters)
                .with_note(format!("{} pairs against {}", peer.symbols.len(), peer.peer))
            })
            .collect())
    }
}
