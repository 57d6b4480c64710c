use std::collections::BTreeMap;
use std::fmt::{self, Display};

use sap_core::errors::{ErrorInfo, SapError};
use sap_core::{Channel, Event, InputKind, Matrix, RelationPair};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque decoder parameters keyed by name.
pub type DecoderParams = BTreeMap<String, Value>;

/// Abstraction tier of a decoded hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HypothesisLevel {
    /// Raw binary stream.
    Bits,
    /// Channel symbols (dot/dash, constellation indices).
    Symbols,
    /// Human readable text.
    Text,
}

impl Display for HypothesisLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HypothesisLevel::Bits => "bits",
            HypothesisLevel::Symbols => "symbols",
            HypothesisLevel::Text => "text",
        })
    }
}

/// One candidate decoded result proposed by a decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    /// Abstraction tier.
    pub level: HypothesisLevel,
    /// Decoded content.
    pub representation: String,
    /// Named scores.
    #[serde(default)]
    pub scores: BTreeMap<String, f64>,
    /// Parameter set that produced this hypothesis.
    #[serde(default)]
    pub parameters: DecoderParams,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Vec<String>,
}

impl Hypothesis {
    /// Creates a hypothesis with no scores, parameters or notes.
    pub fn new(level: HypothesisLevel, representation: impl Into<String>) -> Self {
        Self {
            level,
            representation: representation.into(),
            scores: BTreeMap::new(),
            parameters: DecoderParams::new(),
            notes: Vec::new(),
        }
    }

    /// Adds a named score.
    pub fn with_score(mut self, name: impl Into<String>, value: f64) -> Self {
        self.scores.insert(name.into(), value);
        self
    }

    /// Sets the producing parameters.
    pub fn with_parameters(mut self, parameters: DecoderParams) -> Self {
        self.parameters = parameters;
        self
    }

    /// Appends a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// The lexically first score, used as the headline score in reports.
    pub fn primary_score(&self) -> Option<(&str, f64)> {
        self.scores
            .iter()
            .next()
            .map(|(name, value)| (name.as_str(), *value))
    }
}

/// Channel data restricted to the kinds a method declares.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelView<'a> {
    /// Channel name.
    pub channel: &'a str,
    /// Events, when declared and present.
    pub events: Option<&'a [Event]>,
    /// Intervals, when declared and present.
    pub intervals: Option<&'a [f64]>,
    /// Symbols, when declared and present.
    pub symbols: Option<&'a [String]>,
    /// Feature vector, when declared and present.
    pub vector: Option<&'a [f64]>,
    /// Feature matrix, when declared and present.
    pub matrix: Option<&'a Matrix>,
    /// Relations, when declared and present.
    pub relations: Option<&'a [RelationPair]>,
    /// Required kinds passed through below their stability threshold.
    pub degraded: Vec<InputKind>,
}

impl<'a> ChannelView<'a> {
    /// Exposes only `kinds` of `channel`.
    pub fn restrict(channel: &'a Channel, kinds: &[InputKind]) -> Self {
        let allowed = |kind: InputKind| kinds.contains(&kind);
        Self {
            channel: channel.name.as_str(),
            events: channel
                .events
                .as_deref()
                .filter(|_| allowed(InputKind::Events)),
            intervals: channel
                .intervals
                .as_deref()
                .filter(|_| allowed(InputKind::Intervals)),
            symbols: channel
                .symbols
                .as_deref()
                .filter(|_| allowed(InputKind::Symbols)),
            vector: channel
                .vector
                .as_deref()
                .filter(|_| allowed(InputKind::Vector)),
            matrix: channel.matrix.as_ref().filter(|_| allowed(InputKind::Matrix)),
            relations: channel
                .relations
                .as_deref()
                .filter(|_| allowed(InputKind::Relations)),
            degraded: Vec::new(),
        }
    }

    /// Marks kinds as degraded.
    pub fn with_degraded(mut self, degraded: Vec<InputKind>) -> Self {
        self.degraded = degraded;
        self
    }

    /// True when `kind` was passed through below its threshold.
    pub fn is_degraded(&self, kind: InputKind) -> bool {
        self.degraded.contains(&kind)
    }

    /// Events or a decode error naming the missing kind.
    pub fn require_events(&self) -> Result<&'a [Event], SapError> {
        self.events.ok_or_else(|| missing_view_input(self.channel, InputKind::Events))
    }

    /// Matrix or a decode error naming the missing kind.
    pub fn require_matrix(&self) -> Result<&'a Matrix, SapError> {
        self.matrix.ok_or_else(|| missing_view_input(self.channel, InputKind::Matrix))
    }

    /// Relations or a decode error naming the missing kind.
    pub fn require_relations(&self) -> Result<&'a [RelationPair], SapError> {
        self.relations
            .ok_or_else(|| missing_view_input(self.channel, InputKind::Relations))
    }
}

fn missing_view_input(channel: &str, kind: InputKind) -> SapError {
    SapError::Decode(
        ErrorInfo::new(
            "sap_decode.missing_input",
            format!("input `{kind}` not available to decoder"),
        )
        .with_context("channel", channel.to_string()),
    )
}

/// Capability contract shared by every decoding algorithm.
///
/// Implementations are stateless; faults are reported through the returned
/// `Result` and must not escape as panics.
pub trait Decoder: Send + Sync {
    /// Identifier matching a `MethodSpec` in the applicability matrix.
    fn method_id(&self) -> &str;

    /// Implementation version reported in run provenance.
    fn version(&self) -> &str;

    /// Parameters used when the run configuration supplies none.
    fn default_params(&self) -> DecoderParams {
        DecoderParams::new()
    }

    /// Proposes hypotheses for one channel, ordered by the decoder's own ranking.
    fn decode(
        &self,
        view: &ChannelView<'_>,
        params: &DecoderParams,
    ) -> Result<Vec<Hypothesis>, SapError>;
}

/// Reads an optional finite float parameter.
pub fn param_f64(params: &DecoderParams, key: &str) -> Result<Option<f64>, SapError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => match value.as_f64() {
            Some(number) if number.is_finite() => Ok(Some(number)),
            _ => Err(invalid_param(key, value)),
        },
    }
}

/// Reads an optional non-negative integer parameter.
pub fn param_usize(params: &DecoderParams, key: &str) -> Result<Option<usize>, SapError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|number| usize::try_from(number).ok())
            .map(Some)
            .ok_or_else(|| invalid_param(key, value)),
    }
}

fn invalid_param(key: &str, value: &Value) -> SapError {
    SapError::Decode(
        ErrorInfo::new("sap_decode.invalid_param", format!("parameter {key} is invalid"))
            .with_context("parameter", key.to_string())
            .with_context("value", value.to_string()),
    )
}

/// Converts a float into a JSON parameter value; non-finite values become null.
pub fn json_f64(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_hides_undeclared_kinds() {
        let mut channel = Channel::new("ch1");
        channel.vector = Some(vec![1.0, 2.0]);
        channel.intervals = Some(vec![0.5]);
        let view = ChannelView::restrict(&channel, &[InputKind::Vector]);
        assert_eq!(view.vector, Some(&[1.0, 2.0][..]));
        assert!(view.intervals.is_none());
        assert!(view.require_events().is_err());
    }

    #[test]
    fn parameter_accessors_validate_types() {
        let mut params = DecoderParams::new();
        params.insert("dot_max".into(), Value::from(0.12));
        params.insert("levels".into(), Value::from("four"));
        assert_eq!(param_f64(&params, "dot_max").expect("float"), Some(0.12));
        assert_eq!(param_f64(&params, "absent").expect("absent"), None);
        assert!(param_usize(&params, "levels").is_err());
    }
}
