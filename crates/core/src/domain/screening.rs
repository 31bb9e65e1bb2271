use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::donor::DonorId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScreeningResultId(pub String);

impl std::fmt::Display for ScreeningResultId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Accept,
    Reject,
    NeedsReview,
}

impl Verdict {
    pub const WIRE_VALUES: &'static [&'static str] = &["accept", "reject", "needs_review"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Accept => "accept",
            Verdict::Reject => "reject",
            Verdict::NeedsReview => "needs_review",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "accept" => Some(Verdict::Accept),
            "reject" => Some(Verdict::Reject),
            "needs_review" => Some(Verdict::NeedsReview),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const WIRE_VALUES: &'static [&'static str] = &["low", "medium", "high", "critical"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }
}

/// One flagged issue from an evaluation, optionally citing the guideline
/// title it was raised under.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concern {
    pub concern: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guideline_ref: Option<String>,
}

/// A completed evaluation. Results are append-only: re-running a screening
/// inserts a new row and never touches earlier ones, so the history shows
/// how verdicts shifted as guidelines changed. `guidelines_snapshot` is the
/// JSON form of exactly the guidelines the model saw.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScreeningResult {
    pub id: ScreeningResultId,
    pub donor_id: DonorId,
    pub verdict: Verdict,
    pub confidence: f64,
    pub reasoning: String,
    pub concerns: Vec<Concern>,
    pub missing_data: Vec<String>,
    pub guidelines_snapshot: String,
    pub model_version: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::{Severity, Verdict};

    #[test]
    fn verdict_round_trips_wire_values() {
        for raw in Verdict::WIRE_VALUES {
            assert_eq!(Verdict::parse(raw).unwrap().as_str(), *raw);
        }
        assert!(Verdict::parse("maybe").is_none());
    }

    #[test]
    fn severity_orders_low_to_critical() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::High < Severity::Critical);
    }
}
