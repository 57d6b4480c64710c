use sap_core::errors::{ErrorInfo, SapError};
use sap_core::{Event, InputKind};
use serde_json::Value;

use crate::decoder::{
    json_f64, param_f64, ChannelView, Decoder, DecoderParams, Hypothesis, HypothesisLevel,
};

const METHOD_ID: &str = "duration_based_morse_like";
const VERSION: &str = "0.2.0";

const DEFAULT_LETTER_GAP_FACTOR: f64 = 2.0;
const DEFAULT_WORD_GAP_FACTOR: f64 = 5.0;

const MORSE_TABLE: &[(&str, char)] = &[
    (".-", 'A'),
    ("-...", 'B'),
    ("-.-.", 'C'),
    ("-..", 'D'),
    (".", 'E'),
    ("..-.", 'F'),
    ("--.", 'G'),
    ("....", 'H'),
    ("..", 'I'),
    (".---", 'J'),
    ("-.-", 'K'),
    (".-..", 'L'),
    ("--", 'M'),
    ("-.", 'N'),
    ("---", 'O'),
    (".--.", 'P'),
    ("--.-", 'Q'),
    (".-.", 'R'),
    ("...", 'S'),
    ("-", 'T'),
    ("..-", 'U'),
    ("...-", 'V'),
    (".--", 'W'),
    ("-..-", 'X'),
    ("-.--", 'Y'),
    ("--..", 'Z'),
    ("-----", '0'),
    (".----", '1'),
    ("..---", '2'),
    ("...--", '3'),
    ("....-", '4'),
    (".....", '5'),
    ("-....", '6'),
    ("--...", '7'),
    ("---..", '8'),
    ("----.", '9'),
];

fn letter_for(code: &str) -> Option<char> {
    MORSE_TABLE
        .iter()
        .find(|(pattern, _)| *pattern == code)
        .map(|(_, letter)| *letter)
}

fn malformed(code: &str, message: impl Into<String>, channel: &str) -> SapError {
    SapError::Decode(ErrorInfo::new(code, message).with_context("channel", channel.to_string()))
}

/// Splits event durations into dots and dashes and gaps into letter and word breaks.
///
/// Parameters: `dot_max`, `dash_min` (seconds; adaptive midpoint when absent),
/// `letter_gap_factor`, `word_gap_factor` (multiples of the shortest gap).
#[derive(Debug, Clone, Copy, Default)]
pub struct DurationMorseDecoder;

#[derive(Debug, Clone, Copy)]
struct DurationSplit {
    dot_max: f64,
    dash_min: f64,
    note: &'static str,
}

impl DurationSplit {
    fn resolve(events: &[Event], params: &DecoderParams) -> Result<Self, SapError> {
        let dot_max = param_f64(params, "dot_max")?;
        let dash_min = param_f64(params, "dash_min")?;
        let split = match (dot_max, dash_min) {
            (Some(dot_max), Some(dash_min)) => Self {
                dot_max,
                dash_min,
                note: "explicit duration thresholds",
            },
            (Some(value), None) | (None, Some(value)) => Self {
                dot_max: value,
                dash_min: value,
                note: "single duration threshold",
            },
            (None, None) => Self::adaptive(events),
        };
        if split.dot_max <= 0.0 || split.dash_min < split.dot_max {
            return Err(SapError::Decode(
                ErrorInfo::new(
                    "sap_decode.invalid_param",
                    "dot_max must be positive and not exceed dash_min",
                )
                .with_context("dot_max", split.dot_max.to_string())
                .with_context("dash_min", split.dash_min.to_string()),
            ));
        }
        Ok(split)
    }

    fn adaptive(events: &[Event]) -> Self {
        let shortest = events
            .iter()
            .map(|event| event.duration)
            .fold(f64::INFINITY, f64::min);
        let longest = events
            .iter()
            .map(|event| event.duration)
            .fold(0.0, f64::max);
        if longest < shortest * 1.5 {
            return Self {
                dot_max: longest,
                dash_min: longest * 3.0,
                note: "uniform durations; every mark read as a dot",
            };
        }
        let midpoint = (shortest + longest) / 2.0;
        Self {
            dot_max: midpoint,
            dash_min: midpoint,
            note: "adaptive duration midpoint",
        }
    }

    fn classify(&self, duration: f64) -> char {
        if duration <= self.dot_max {
            '.'
        } else if duration >= self.dash_min {
            '-'
        } else {
            '?'
        }
    }
}

fn event_gaps(
    view: &ChannelView<'_>,
    events: &[Event],
) -> Result<(Vec<f64>, &'static str), SapError> {
    let needed = events.len().saturating_sub(1);
    if let Some(intervals) = view.intervals.filter(|intervals| intervals.len() >= needed) {
        let gaps = intervals[..needed].to_vec();
        if gaps.iter().any(|gap| !gap.is_finite() || *gap < 0.0) {
            return Err(malformed(
                "sap_decode.morse.malformed_interval",
                "intervals must be finite and non-negative",
                view.channel,
            ));
        }
        return Ok((gaps, "gaps taken from intervals"));
    }
    let mut gaps = Vec::with_capacity(needed);
    for pair in events.windows(2) {
        if pair[1].onset < pair[0].onset {
            return Err(malformed(
                "sap_decode.morse.unordered_events",
                "events are not ordered by onset",
                view.channel,
            ));
        }
        gaps.push((pair[1].onset - (pair[0].onset + pair[0].duration)).max(0.0));
    }
    Ok((gaps, "gaps derived from event onsets"))
}

impl Decoder for DurationMorseDecoder {
    fn method_id(&self) -> &str {
        METHOD_ID
    }

    fn version(&self) -> &str {
        VERSION
    }

    fn default_params(&self) -> DecoderParams {
        let mut params = DecoderParams::new();
        params.insert(
            "letter_gap_factor".into(),
            json_f64(DEFAULT_LETTER_GAP_FACTOR),
        );
        params.insert("word_gap_factor".into(), json_f64(DEFAULT_WORD_GAP_FACTOR));
        params
    }

    fn decode(
        &self,
        view: &ChannelView<'_>,
        params: &DecoderParams,
    ) -> Result<Vec<Hypothesis>, SapError> {
        let events = view.require_events()?;
        if events.is_empty() {
            return Ok(Vec::new());
        }
        if events
            .iter()
            .any(|event| !event.onset.is_finite() || !event.duration.is_finite() || event.duration <= 0.0)
        {
            return Err(malformed(
                "sap_decode.morse.malformed_event",
                "event onsets must be finite and durations positive",
                view.channel,
            ));
        }

        let split = DurationSplit::resolve(events, params)?;
        let letter_factor =
            param_f64(params, "letter_gap_factor")?.unwrap_or(DEFAULT_LETTER_GAP_FACTOR);
        let word_factor = param_f64(params, "word_gap_factor")?.unwrap_or(DEFAULT_WORD_GAP_FACTOR);
        if letter_factor <= 0.0 || word_factor < letter_factor {
            return Err(SapError::Decode(
                ErrorInfo::new(
                    "sap_decode.invalid_param",
                    "gap factors must be positive with word_gap_factor >= letter_gap_factor",
                )
                .with_context("letter_gap_factor", letter_factor.to_string())
                .with_context("word_gap_factor", word_factor.to_string()),
            ));
        }
        let (gaps, gap_note) = event_gaps(view, events)?;
        let unit = gaps
            .iter()
            .copied()
            .filter(|gap| *gap > 0.0)
            .fold(f64::INFINITY, f64::min);

        let mut words: Vec<Vec<String>> = Vec::new();
        let mut word: Vec<String> = Vec::new();
        let mut letter = String::new();
        for (idx, event) in events.iter().enumerate() {
            letter.push(split.classify(event.duration));
            let Some(gap) = gaps.get(idx).copied() else {
                continue;
            };
            if !unit.is_finite() {
                continue;
            }
            if gap >= unit * word_factor {
                word.push(std::mem::take(&mut letter));
                words.push(std::mem::take(&mut word));
            } else if gap >= unit * letter_factor {
                word.push(std::mem::take(&mut letter));
            }
        }
        word.push(letter);
        words.push(word);

        let marks = events.len();
        let ambiguous = words
            .iter()
            .flatten()
            .map(|letter| letter.chars().filter(|mark| *mark == '?').count())
            .sum::<usize>();
        let confidence = (marks - ambiguous) as f64 / marks as f64;

        let letters = words.iter().map(Vec::len).sum::<usize>();
        let mut decoded = 0usize;
        let text = words
            .iter()
            .map(|word| {
                word.iter()
                    .map(|code| match letter_for(code) {
                        Some(letter) => {
                            decoded += 1;
                            letter
                        }
                        None => '?',
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join(" ");
        let coverage = decoded as f64 / letters as f64;
        let symbols = words
            .iter()
            .map(|word| word.join(" "))
            .collect::<Vec<_>>()
            .join(" / ");

        let mut parameters = DecoderParams::new();
        parameters.insert("dot_max".into(), json_f64(split.dot_max));
        parameters.insert("dash_min".into(), json_f64(split.dash_min));
        parameters.insert("letter_gap_factor".into(), json_f64(letter_factor));
        parameters.insert("word_gap_factor".into(), json_f64(word_factor));
        parameters.insert(
            "unit_gap".into(),
            if unit.is_finite() {
                json_f64(unit)
            } else {
                Value::Null
            },
        );

        let mut notes = vec![split.note.to_string(), gap_note.to_string()];
        if view.is_degraded(InputKind::Events) {
            notes.push("event count below stability threshold".to_string());
        }

        let mut symbol_hypothesis = Hypothesis::new(HypothesisLevel::Symbols, symbols)
            .with_score("confidence", confidence)
            .with_parameters(parameters.clone());
        let mut text_hypothesis = Hypothesis::new(HypothesisLevel::Text, text)
            .with_score("confidence", confidence * coverage)
            .with_score("coverage", coverage)
            .with_parameters(parameters);
        symbol_hypothesis.notes = notes.clone();
        text_hypothesis.notes = notes;

        let mut hypotheses = vec![symbol_hypothesis, text_hypothesis];
        hypotheses.sort_by(|a, b| {
            let a = a.scores.get("confidence").copied().unwrap_or(0.0);
            let b = b.scores.get("confidence").copied().unwrap_or(0.0);
            b.total_cmp(&a)
        });
        Ok(hypotheses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_covers_letters_and_digits() {
        assert_eq!(letter_for("...---..."), None);
        assert_eq!(letter_for("..."), Some('S'));
        assert_eq!(letter_for("-----"), Some('0'));
        assert_eq!(MORSE_TABLE.len(), 36);
    }

    #[test]
    fn classify_marks_ambiguous_band() {
        let split = DurationSplit {
            dot_max: 0.12,
            dash_min: 0.2,
            note: "",
        };
        assert_eq!(split.classify(0.1), '.');
        assert_eq!(split.classify(0.3), '-');
        assert_eq!(split.classify(0.15), '?');
    }
}
