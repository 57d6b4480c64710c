//! Per-channel extracted representations.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Kind of extracted representation a decoding method may consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// Timed events with onsets and durations.
    Events,
    /// Inter-event interval lengths.
    Intervals,
    /// Discrete symbol sequence.
    Symbols,
    /// One-dimensional feature vector.
    Vector,
    /// Two-dimensional feature matrix (frames by bins).
    Matrix,
    /// Pairwise relations to other channels.
    Relations,
}

impl InputKind {
    /// Every kind in canonical order.
    pub const ALL: [InputKind; 6] = [
        InputKind::Events,
        InputKind::Intervals,
        InputKind::Symbols,
        InputKind::Vector,
        InputKind::Matrix,
        InputKind::Relations,
    ];

    /// Wire name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            InputKind::Events => "events",
            InputKind::Intervals => "intervals",
            InputKind::Symbols => "symbols",
            InputKind::Vector => "vector",
            InputKind::Matrix => "matrix",
            InputKind::Relations => "relations",
        }
    }
}

impl Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single timed event extracted from the signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Onset time in seconds.
    pub onset: f64,
    /// Event duration in seconds.
    pub duration: f64,
    /// Optional peak amplitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amplitude: Option<f64>,
}

/// Row-major feature matrix, typically frames by frequency bins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Matrix {
    /// Matrix rows.
    pub rows: Vec<Vec<f64>>,
}

impl Matrix {
    /// Creates a matrix from its rows.
    pub fn new(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }

    /// Returns `(rows, cols)` where `cols` is the shortest row length.
    pub fn shape(&self) -> (usize, usize) {
        let cols = self.rows.iter().map(Vec::len).min().unwrap_or(0);
        (self.rows.len(), cols)
    }

    /// True when every row has the same length.
    pub fn is_rectangular(&self) -> bool {
        match self.rows.first() {
            Some(first) => self.rows.iter().all(|row| row.len() == first.len()),
            None => true,
        }
    }
}

/// One observed relation between this channel and a peer channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationPair {
    /// Name of the related channel.
    pub peer: String,
    /// Phase difference in radians.
    pub phase_delta: f64,
    /// Optional time lag in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lag: Option<f64>,
}

/// Size of a present representation, as compared against stability thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    /// Element count or vector length.
    Count(usize),
    /// Matrix shape as `(rows, cols)`.
    Shape(usize, usize),
    /// Number of related pairs.
    Pairs(usize),
}

/// Named logical stream holding extracted representations.
///
/// `None` means the representation is absent; `Some` with zero elements
/// means it was extracted but came back empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Channel {
    /// Channel name; filled from the transcript key when loading.
    #[serde(default)]
    pub name: String,
    /// Timed events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<Event>>,
    /// Interval lengths in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intervals: Option<Vec<f64>>,
    /// Symbol sequence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbols: Option<Vec<String>>,
    /// Feature vector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f64>>,
    /// Feature matrix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<Matrix>,
    /// Relations to peer channels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relations: Option<Vec<RelationPair>>,
}

impl Channel {
    /// Creates an empty channel with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns true when the representation of `kind` is present.
    pub fn has(&self, kind: InputKind) -> bool {
        self.measure(kind).is_some()
    }

    /// Measures the representation of `kind`, or `None` when absent.
    pub fn measure(&self, kind: InputKind) -> Option<Measure> {
        match kind {
            InputKind::Events => self.events.as_ref().map(|v| Measure::Count(v.len())),
            InputKind::Intervals => self.intervals.as_ref().map(|v| Measure::Count(v.len())),
            InputKind::Symbols => self.symbols.as_ref().map(|v| Measure::Count(v.len())),
            InputKind::Vector => self.vector.as_ref().map(|v| Measure::Count(v.len())),
            InputKind::Matrix => self.matrix.as_ref().map(|m| {
                let (rows, cols) = m.shape();
                Measure::Shape(rows, cols)
            }),
            InputKind::Relations => self.relations.as_ref().map(|v| Measure::Pairs(v.len())),
        }
    }

    /// Kinds present on this channel, in canonical order.
    pub fn present_kinds(&self) -> Vec<InputKind> {
        InputKind::ALL
            .into_iter()
            .filter(|kind| self.has(*kind))
            .collect()
    }

    /// True when no representation is present.
    pub fn is_empty(&self) -> bool {
        self.present_kinds().is_empty()
    }
}
