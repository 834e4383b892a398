use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier assigned to a screening case when it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CaseId(pub String);

/// A single caller-supplied feature value.
///
/// The untagged representation lets callers post plain JSON scalars:
/// numbers, booleans, and strings map onto the three variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl FeatureValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FeatureValue::Flag(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FeatureValue::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Number(value) => write!(f, "{value}"),
            FeatureValue::Flag(value) => write!(f, "{value}"),
            FeatureValue::Text(value) => write!(f, "{value}"),
        }
    }
}

/// Named feature bag describing one subject. Treated as read-only for the
/// whole evaluation.
pub type FeatureMap = BTreeMap<String, FeatureValue>;

/// Ordered severity category derived from a numeric risk score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    VeryLow,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskTier {
    pub const fn label(self) -> &'static str {
        match self {
            RiskTier::VeryLow => "very_low",
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
            RiskTier::Critical => "critical",
        }
    }

    /// Parse a tier name leniently; unknown spellings return `None` so the
    /// caller can pick its own conservative default.
    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "very_low" | "very low" | "minimal" => Some(RiskTier::VeryLow),
            "low" => Some(RiskTier::Low),
            "medium" | "moderate" => Some(RiskTier::Medium),
            "high" => Some(RiskTier::High),
            "critical" | "very_high" | "very high" | "severe" => Some(RiskTier::Critical),
            _ => None,
        }
    }
}

/// Cut points mapping a 0-100 risk score onto tiers. Each field is the
/// inclusive lower bound of its tier; scores below `low` are very low risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            low: 15.0,
            medium: 30.0,
            high: 50.0,
            critical: 80.0,
        }
    }
}

impl TierThresholds {
    pub fn tier_for(&self, score: f64) -> RiskTier {
        if score >= self.critical {
            RiskTier::Critical
        } else if score >= self.high {
            RiskTier::High
        } else if score >= self.medium {
            RiskTier::Medium
        } else if score >= self.low {
            RiskTier::Low
        } else {
            RiskTier::VeryLow
        }
    }

    /// Cut points must strictly ascend and stay inside (0, 100] so every
    /// score maps to exactly one tier.
    pub fn is_monotonic(&self) -> bool {
        0.0 < self.low
            && self.low < self.medium
            && self.medium < self.high
            && self.high < self.critical
            && self.critical <= 100.0
    }
}

/// Final routing decision for a screened subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Decision {
    Approve,
    ConditionalApprove { conditions: Vec<String> },
    ManualReview { reasons: Vec<String> },
    Reject,
}

impl Decision {
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::ConditionalApprove { .. } => "conditional_approve",
            Decision::ManualReview { .. } => "manual_review",
            Decision::Reject => "reject",
        }
    }

    /// Human-readable summary used in alerts and CLI output.
    pub fn summary(&self) -> String {
        match self {
            Decision::Approve => "approved".to_string(),
            Decision::ConditionalApprove { conditions } => {
                if conditions.is_empty() {
                    "conditionally approved".to_string()
                } else {
                    format!("conditionally approved: {}", conditions.join("; "))
                }
            }
            Decision::ManualReview { reasons } => {
                if reasons.is_empty() {
                    "manual review required".to_string()
                } else {
                    format!("manual review required: {}", reasons.join("; "))
                }
            }
            Decision::Reject => "rejected".to_string(),
        }
    }
}

/// Routing suggestion offered by the advisory model; never binding on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionHint {
    Approve,
    ConditionalApprove,
    ManualReview,
    Reject,
}

impl DecisionHint {
    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "approve" | "approved" => Some(DecisionHint::Approve),
            "conditional_approve" | "conditional_approval" => Some(DecisionHint::ConditionalApprove),
            "manual_review" | "review" => Some(DecisionHint::ManualReview),
            "reject" | "rejected" | "decline" => Some(DecisionHint::Reject),
            _ => None,
        }
    }
}

/// How the final verdict was produced. Reviewers treat this as the audit
/// signal separating full evaluations from degraded ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMethod {
    RuleOnly,
    AdvisoryEnhanced,
    ErrorFallback,
}

impl EvaluationMethod {
    pub const fn label(self) -> &'static str {
        match self {
            EvaluationMethod::RuleOnly => "rule_only",
            EvaluationMethod::AdvisoryEnhanced => "advisory_enhanced",
            EvaluationMethod::ErrorFallback => "error_fallback",
        }
    }
}

/// Deterministic output of the rule pass for one feature map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleVerdict {
    pub score: f64,
    pub risk_tier: RiskTier,
    pub indicators: BTreeSet<String>,
    pub risk_factors: Vec<String>,
    pub breakdown: BTreeMap<String, f64>,
}

/// Normalized advisory output. Either every field here materialized from the
/// model response, or the advisory contributed nothing at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryVerdict {
    pub score: f64,
    pub risk_tier: RiskTier,
    pub confidence: f64,
    pub indicators: BTreeSet<String>,
    pub risk_factors: Vec<String>,
    pub rationale: String,
    pub decision_hint: Option<DecisionHint>,
}

/// Combined verdict returned to callers. Built once per evaluation and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub score: f64,
    pub risk_tier: RiskTier,
    pub decision: Decision,
    pub confidence: f64,
    pub indicators: BTreeSet<String>,
    pub risk_factors: Vec<String>,
    pub rationale: String,
    pub method: EvaluationMethod,
}

/// Lifecycle state of a stored screening case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseStatus {
    Cleared,
    ConditionallyCleared,
    PendingReview,
    Declined,
}

impl CaseStatus {
    pub const fn label(self) -> &'static str {
        match self {
            CaseStatus::Cleared => "cleared",
            CaseStatus::ConditionallyCleared => "conditionally_cleared",
            CaseStatus::PendingReview => "pending_review",
            CaseStatus::Declined => "declined",
        }
    }
}

/// Caller-facing screening request: an external reference plus the feature
/// bag extracted upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningSubmission {
    pub subject_reference: String,
    pub features: FeatureMap,
}
