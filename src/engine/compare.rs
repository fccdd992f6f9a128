//! Attribute comparison.
//!
//! A pure mapping from a (reference, AI) value pair and an equality policy
//! to a [`VerdictStatus`]. Missing values short-circuit: a missing reference
//! yields `MISSING_REFERENCE` even when the AI value is missing too, so the
//! two missing outcomes never depend on evaluation order.

use serde::{Deserialize, Serialize};

use crate::engine::normalize::NormalizedValue;
use crate::schema::EqualityPolicy;

/// Outcome of one attribute comparison.
///
/// `MISSING_*` is distinct from `KO`: it marks a value that never made it
/// into the payload, not a disagreement, and is reported separately. Missing
/// verdicts are excluded from attribute match-rate denominators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictStatus {
    /// Reference and AI values agree under the attribute's policy.
    Ok,
    /// Both values are present and disagree.
    Ko,
    /// The reference payload carries no value for the attribute.
    MissingReference,
    /// The AI payload carries no value for the attribute.
    MissingAi,
}

impl VerdictStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictStatus::Ok => "OK",
            VerdictStatus::Ko => "KO",
            VerdictStatus::MissingReference => "MISSING_REFERENCE",
            VerdictStatus::MissingAi => "MISSING_AI",
        }
    }

    /// Whether the comparison found agreement.
    pub fn is_match(&self) -> bool {
        matches!(self, VerdictStatus::Ok)
    }
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One attribute of one record, compared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeVerdict {
    /// Attribute key from the schema.
    pub key: String,
    /// Display title: payload title when one side carried it, schema title
    /// otherwise.
    pub title: String,
    /// Normalized reference value, when present.
    pub reference: Option<String>,
    /// Normalized AI value, when present.
    pub ai: Option<String>,
    /// Comparison outcome.
    pub status: VerdictStatus,
}

/// Compare a reference value against an AI value under a policy.
pub fn compare_values(
    policy: EqualityPolicy,
    reference: &NormalizedValue,
    ai: &NormalizedValue,
) -> VerdictStatus {
    match (reference, ai) {
        (NormalizedValue::Missing, _) => VerdictStatus::MissingReference,
        (_, NormalizedValue::Missing) => VerdictStatus::MissingAi,
        (NormalizedValue::Present(r), NormalizedValue::Present(a)) => {
            if values_equal(policy, r, a) {
                VerdictStatus::Ok
            } else {
                VerdictStatus::Ko
            }
        }
    }
}

/// Equality of two present values under a policy.
///
/// Both sides are trimmed first. The numeric policy parses both sides as
/// floats and falls back to the exact rule when either side does not parse.
fn values_equal(policy: EqualityPolicy, reference: &str, ai: &str) -> bool {
    let r = reference.trim();
    let a = ai.trim();
    match policy {
        EqualityPolicy::Exact => r == a,
        EqualityPolicy::CaseInsensitive => r.to_lowercase() == a.to_lowercase(),
        EqualityPolicy::Numeric { tolerance } => match (r.parse::<f64>(), a.parse::<f64>()) {
            (Ok(x), Ok(y)) => (x - y).abs() <= tolerance,
            _ => r == a,
        },
    }
}
