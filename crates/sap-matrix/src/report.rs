use std::collections::BTreeMap;
use std::fmt::{self, Display};

use sap_core::InputKind;
use serde::{Deserialize, Serialize};

/// Applicability verdict for one (channel, method) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicabilityStatus {
    /// Every required input is present and stable.
    Applicable,
    /// Every required input is present but at least one is unstable.
    PartiallyApplicable,
    /// At least one required input is absent.
    NotApplicable,
}

impl ApplicabilityStatus {
    /// Wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicabilityStatus::Applicable => "applicable",
            ApplicabilityStatus::PartiallyApplicable => "partially_applicable",
            ApplicabilityStatus::NotApplicable => "not_applicable",
        }
    }
}

impl Display for ApplicabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating one method against one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicabilityReport {
    /// Channel the report refers to.
    pub channel: String,
    /// Method the report refers to.
    pub method_id: String,
    /// Verdict derived from the missing and unstable sets.
    pub status: ApplicabilityStatus,
    /// Absent required kinds with the reason they count as missing.
    #[serde(default)]
    pub missing_inputs: BTreeMap<InputKind, String>,
    /// Present required kinds that failed stability, as observed-vs-required.
    #[serde(default)]
    pub unstable_inputs: BTreeMap<InputKind, String>,
    /// Findings on optional inputs; informational only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

impl ApplicabilityReport {
    /// True for `applicable`.
    pub fn is_applicable(&self) -> bool {
        self.status == ApplicabilityStatus::Applicable
    }

    /// Required kinds that are present but degraded.
    pub fn degraded_kinds(&self) -> Vec<InputKind> {
        self.unstable_inputs.keys().copied().collect()
    }
}
