use sap_core::errors::{ErrorInfo, SapError};
use sap_core::InputKind;
use serde::{Deserialize, Serialize};

/// Global stability thresholds applied when a method declares none of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplicabilityParams {
    /// Minimum number of events.
    #[serde(default = "ApplicabilityParams::default_min_event_count")]
    pub min_event_count: usize,
    /// Minimum number of intervals.
    #[serde(default = "ApplicabilityParams::default_min_interval_count")]
    pub min_interval_count: usize,
    /// Minimum number of symbols.
    #[serde(default = "ApplicabilityParams::default_min_symbol_count")]
    pub min_symbol_count: usize,
    /// Minimum feature vector length.
    #[serde(default = "ApplicabilityParams::default_min_vector_length")]
    pub min_vector_length: usize,
    /// Minimum matrix shape as `[rows, cols]`; both axes are checked independently.
    #[serde(default = "ApplicabilityParams::default_min_matrix_shape")]
    pub min_matrix_shape: [usize; 2],
    /// Whether relations must contain at least one related pair.
    #[serde(default = "ApplicabilityParams::default_require_relation_pairs")]
    pub require_relation_pairs: bool,
}

impl ApplicabilityParams {
    fn default_min_event_count() -> usize {
        3
    }
    fn default_min_interval_count() -> usize {
        3
    }
    fn default_min_symbol_count() -> usize {
        5
    }
    fn default_min_vector_length() -> usize {
        10
    }
    fn default_min_matrix_shape() -> [usize; 2] {
        [2, 2]
    }
    fn default_require_relation_pairs() -> bool {
        true
    }

    /// Rejects zero thresholds.
    pub fn validate(&self) -> Result<(), SapError> {
        let checks = [
            ("min_event_count", self.min_event_count),
            ("min_interval_count", self.min_interval_count),
            ("min_symbol_count", self.min_symbol_count),
            ("min_vector_length", self.min_vector_length),
            ("min_matrix_shape.rows", self.min_matrix_shape[0]),
            ("min_matrix_shape.cols", self.min_matrix_shape[1]),
        ];
        for (name, value) in checks {
            if value == 0 {
                return Err(invalid_threshold(name, value));
            }
        }
        Ok(())
    }

    /// Returns these defaults with every threshold the method declares applied on top.
    pub fn with_overrides(&self, overrides: &ThresholdOverrides) -> ApplicabilityParams {
        ApplicabilityParams {
            min_event_count: overrides.min_event_count.unwrap_or(self.min_event_count),
            min_interval_count: overrides
                .min_interval_count
                .unwrap_or(self.min_interval_count),
            min_symbol_count: overrides.min_symbol_count.unwrap_or(self.min_symbol_count),
            min_vector_length: overrides
                .min_vector_length
                .unwrap_or(self.min_vector_length),
            min_matrix_shape: overrides.min_matrix_shape.unwrap_or(self.min_matrix_shape),
            require_relation_pairs: overrides
                .require_relation_pairs
                .unwrap_or(self.require_relation_pairs),
        }
    }

    /// Minimum count for the count-like kinds; `None` for matrix and relations.
    pub fn min_count(&self, kind: InputKind) -> Option<usize> {
        match kind {
            InputKind::Events => Some(self.min_event_count),
            InputKind::Intervals => Some(self.min_interval_count),
            InputKind::Symbols => Some(self.min_symbol_count),
            InputKind::Vector => Some(self.min_vector_length),
            InputKind::Matrix | InputKind::Relations => None,
        }
    }
}

impl Default for ApplicabilityParams {
    fn default() -> Self {
        Self {
            min_event_count: Self::default_min_event_count(),
            min_interval_count: Self::default_min_interval_count(),
            min_symbol_count: Self::default_min_symbol_count(),
            min_vector_length: Self::default_min_vector_length(),
            min_matrix_shape: Self::default_min_matrix_shape(),
            require_relation_pairs: Self::default_require_relation_pairs(),
        }
    }
}

/// Per-method thresholds overriding [`ApplicabilityParams`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ThresholdOverrides {
    /// Overrides `min_event_count`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_event_count: Option<usize>,
    /// Overrides `min_interval_count`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_interval_count: Option<usize>,
    /// Overrides `min_symbol_count`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_symbol_count: Option<usize>,
    /// Overrides `min_vector_length`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_vector_length: Option<usize>,
    /// Overrides `min_matrix_shape`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_matrix_shape: Option<[usize; 2]>,
    /// Overrides `require_relation_pairs`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_relation_pairs: Option<bool>,
}

impl ThresholdOverrides {
    /// True when the method declares no thresholds of its own.
    pub fn is_empty(&self) -> bool {
        self == &ThresholdOverrides::default()
    }

    /// Rejects zero thresholds.
    pub fn validate(&self) -> Result<(), SapError> {
        let checks = [
            ("min_event_count", self.min_event_count),
            ("min_interval_count", self.min_interval_count),
            ("min_symbol_count", self.min_symbol_count),
            ("min_vector_length", self.min_vector_length),
            ("min_matrix_shape.rows", self.min_matrix_shape.map(|s| s[0])),
            ("min_matrix_shape.cols", self.min_matrix_shape.map(|s| s[1])),
        ];
        for (name, value) in checks {
            if value == Some(0) {
                return Err(invalid_threshold(name, 0));
            }
        }
        Ok(())
    }
}

fn invalid_threshold(name: &str, value: usize) -> SapError {
    SapError::Config(
        ErrorInfo::new(
            "sap_matrix.invalid_threshold",
            format!("threshold {name} must be a positive integer"),
        )
        .with_context("threshold", name.to_string())
        .with_context("value", value.to_string()),
    )
}
