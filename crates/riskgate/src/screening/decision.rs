use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::combine::CombinedAssessment;
use super::domain::{Decision, EvaluationMethod};

/// Decision cut points plus the indicator-to-condition catalog.
///
/// Thresholds apply to the suitability axis, `100 - risk score`, so a
/// higher bar means a safer subject: suitability at or above `approve_at`
/// clears outright, the band down to `conditional_at` clears with
/// conditions, the band down to `review_at` goes to an analyst, and
/// anything below is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionPolicy {
    pub approve_at: f64,
    pub conditional_at: f64,
    pub review_at: f64,
    /// Maps a triggered indicator to the remediation attached to a
    /// conditional approval.
    pub conditions: BTreeMap<String, String>,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            approve_at: 80.0,
            conditional_at: 65.0,
            review_at: 50.0,
            conditions: BTreeMap::new(),
        }
    }
}

impl DecisionPolicy {
    pub fn with_conditions(mut self, catalog: BTreeMap<String, String>) -> Self {
        self.conditions = catalog;
        self
    }

    pub fn is_monotonic(&self) -> bool {
        self.review_at < self.conditional_at && self.conditional_at < self.approve_at
    }

    /// Route an assessment to a decision. Error fallbacks are forced to
    /// manual review no matter what partial score they carry; an unattended
    /// approval must never come out of a failed evaluation.
    pub(crate) fn decide(&self, assessment: &CombinedAssessment) -> Decision {
        if assessment.method == EvaluationMethod::ErrorFallback {
            return Decision::ManualReview {
                reasons: vec![
                    "Automated screening was unavailable; an analyst must review this subject"
                        .to_string(),
                ],
            };
        }

        let suitability = 100.0 - assessment.score;
        if suitability >= self.approve_at {
            Decision::Approve
        } else if suitability >= self.conditional_at {
            Decision::ConditionalApprove {
                conditions: self.conditions_for(&assessment.indicators),
            }
        } else if suitability >= self.review_at {
            Decision::ManualReview {
                reasons: vec![format!(
                    "Risk score {:.1} falls in the analyst review band",
                    assessment.score
                )],
            }
        } else {
            Decision::Reject
        }
    }

    /// Conditions for the triggered indicators, deduplicated while keeping
    /// indicator order stable.
    fn conditions_for(&self, indicators: &BTreeSet<String>) -> Vec<String> {
        let mut conditions: Vec<String> = Vec::new();
        for indicator in indicators {
            if let Some(text) = self.conditions.get(indicator) {
                if !conditions.iter().any(|existing| existing == text) {
                    conditions.push(text.clone());
                }
            }
        }
        conditions
    }
}
