use std::collections::BTreeMap;

use sap_core::errors::{ErrorInfo, SapError};

use crate::decoder::{
    json_f64, ChannelView, Decoder, DecoderParams, Hypothesis, HypothesisLevel,
};

const METHOD_ID: &str = "spectral_stability_encoding";
const VERSION: &str = "0.1.0";

/// Reads a two-carrier keyed signal from a frames x bins feature matrix.
///
/// The dominant bin of each frame votes for a carrier; the two most voted bins
/// become `0` (lower) and `1` (higher). Frames dominated by any other bin are
/// emitted as `?`. The optional vector is read as the bin frequency axis.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpectralStabilityDecoder;

fn dominant_bin(frame: &[f64]) -> usize {
    let mut best = 0;
    for (idx, value) in frame.iter().enumerate() {
        if *value > frame[best] {
            best = idx;
        }
    }
    best
}

fn run_lengths(bits: &str) -> Vec<(char, usize)> {
    let mut runs: Vec<(char, usize)> = Vec::new();
    for bit in bits.chars() {
        match runs.last_mut() {
            Some((current, length)) if *current == bit => *length += 1,
            _ => runs.push((bit, 1)),
        }
    }
    runs
}

fn describe_bin(bin: usize, axis: Option<&[f64]>) -> String {
    match axis.and_then(|axis| axis.get(bin)) {
        Some(frequency) => format!("{bin} ({frequency} Hz)"),
        None => bin.to_string(),
    }
}

impl Decoder for SpectralStabilityDecoder {
    fn method_id(&self) -> &str {
        METHOD_ID
    }

    fn version(&self) -> &str {
        VERSION
    }

    fn decode(
        &self,
        view: &ChannelView<'_>,
        _params: &DecoderParams,
    ) -> Result<Vec<Hypothesis>, SapError> {
        let matrix = view.require_matrix()?;
        if !matrix.is_rectangular() {
            return Err(SapError::Decode(
                ErrorInfo::new(
                    "sap_decode.spectral.ragged_matrix",
                    "feature matrix rows differ in length",
                )
                .with_context("channel", view.channel.to_string()),
            ));
        }
        if matrix.rows.iter().flatten().any(|value| !value.is_finite()) {
            return Err(SapError::Decode(
                ErrorInfo::new(
                    "sap_decode.spectral.non_finite",
                    "feature matrix contains non-finite values",
                )
                .with_context("channel", view.channel.to_string()),
            ));
        }
        let (frames, bins) = matrix.shape();
        if frames == 0 || bins == 0 {
            return Ok(Vec::new());
        }

        let dominant: Vec<usize> = matrix.rows.iter().map(|row| dominant_bin(row)).collect();
        let mut votes: BTreeMap<usize, usize> = BTreeMap::new();
        for bin in &dominant {
            *votes.entry(*bin).or_default() += 1;
        }
        let mut ranked: Vec<(usize, usize)> = votes.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let profile = ranked
            .iter()
            .map(|(bin, count)| format!("{bin}:{count}"))
            .collect::<Vec<_>>()
            .join(" ");
        let axis = view.vector;
        let mut parameters = DecoderParams::new();
        parameters.insert("frames".into(), serde_json::Value::from(frames));

        let (bits, stability, note) = match ranked.as_slice() {
            [(only, _)] => {
                parameters.insert("carrier_low".into(), serde_json::Value::from(*only));
                (
                    "0".repeat(frames),
                    1.0,
                    format!(
                        "single carrier bin {}; no modulation detected",
                        describe_bin(*only, axis)
                    ),
                )
            }
            [(first, first_votes), (second, second_votes), ..] => {
                let low = (*first).min(*second);
                let high = (*first).max(*second);
                parameters.insert("carrier_low".into(), serde_json::Value::from(low));
                parameters.insert("carrier_high".into(), serde_json::Value::from(high));
                let bits = dominant
                    .iter()
                    .map(|bin| match *bin {
                        bin if bin == low => '0',
                        bin if bin == high => '1',
                        _ => '?',
                    })
                    .collect::<String>();
                (
                    bits,
                    (first_votes + second_votes) as f64 / frames as f64,
                    format!(
                        "carrier bins {} / {}",
                        describe_bin(low, axis),
                        describe_bin(high, axis)
                    ),
                )
            }
            [] => return Ok(Vec::new()),
        };

        let runs = run_lengths(&bits);
        let mean_dwell = frames as f64 / runs.len() as f64;
        let runs_repr = runs
            .iter()
            .map(|(bit, length)| format!("{bit}x{length}"))
            .collect::<Vec<_>>()
            .join(" ");
        parameters.insert("stability".into(), json_f64(stability));

        Ok(vec![
            Hypothesis::new(HypothesisLevel::Bits, bits)
                .with_score("stability", stability)
                .with_parameters(parameters.clone())
                .with_note(note.clone())
                .with_note(format!("dominant bin votes {profile}")),
            Hypothesis::new(HypothesisLevel::Symbols, runs_repr)
                .with_score("mean_dwell", mean_dwell)
                .with_score("stability", stability)
                .with_parameters(parameters)
                .with_note(note),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dominant_bin_prefers_first_maximum() {
        assert_eq!(dominant_bin(&[0.1, 0.9, 0.9]), 1);
        assert_eq!(dominant_bin(&[0.5]), 0);
    }

    #[test]
    fn run_lengths_collapse_repeats() {
        assert_eq!(run_lengths("0011101"), vec![('0', 2), ('1', 3), ('0', 1), ('1', 1)]);
        assert!(run_lengths("").is_empty());
    }
}
