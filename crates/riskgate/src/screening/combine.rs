use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::domain::{AdvisoryVerdict, EvaluationMethod, RiskTier, RuleVerdict, TierThresholds};

/// Indicator inserted when a blended score lands in a high tier without
/// either signal naming a flag. High and critical verdicts always carry at
/// least one indicator.
pub const ELEVATED_RISK: &str = "elevated_risk";

/// Weighting applied when both the advisory and rule signals are available.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombinePolicy {
    pub advisory_weight: f64,
    pub rule_weight: f64,
}

impl Default for CombinePolicy {
    fn default() -> Self {
        Self {
            advisory_weight: 0.6,
            rule_weight: 0.4,
        }
    }
}

impl CombinePolicy {
    pub fn weight_sum(&self) -> f64 {
        self.advisory_weight + self.rule_weight
    }
}

/// Merged assessment handed to decision mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedAssessment {
    pub score: f64,
    pub risk_tier: RiskTier,
    pub confidence: f64,
    pub indicators: BTreeSet<String>,
    pub risk_factors: Vec<String>,
    pub rationale: String,
    pub method: EvaluationMethod,
}

/// Confidence attributed to a rule-only verdict: scales with the score and
/// is capped below full certainty because no second signal confirmed it.
pub(crate) fn rule_confidence(score: f64) -> f64 {
    (score + 10.0).min(95.0)
}

/// One-paragraph account of the rule verdict, used standalone for rule-only
/// evaluations and as the validation clause of combined rationales.
pub(crate) fn rule_summary(rule: &RuleVerdict) -> String {
    let mut summary = format!(
        "Rule screening scored {:.1}/100 ({} risk).",
        rule.score,
        rule.risk_tier.label()
    );
    if rule.risk_factors.is_empty() {
        summary.push_str(" No risk indicators triggered.");
    } else {
        let top: Vec<&str> = rule
            .risk_factors
            .iter()
            .take(3)
            .map(String::as_str)
            .collect();
        summary.push_str(&format!(" Key factors: {}.", top.join("; ")));
    }
    summary
}

/// Merge the two signals. With no advisory verdict the rule verdict passes
/// through untouched apart from the derived confidence; with one, scores
/// blend by weight, the tier is recomputed from the blended score, and the
/// audit fields union with advisory entries first.
pub(crate) fn combine(
    policy: &CombinePolicy,
    tiers: &TierThresholds,
    rule: &RuleVerdict,
    advisory: Option<&AdvisoryVerdict>,
) -> CombinedAssessment {
    match advisory {
        None => CombinedAssessment {
            score: rule.score,
            risk_tier: rule.risk_tier,
            confidence: rule_confidence(rule.score),
            indicators: rule.indicators.clone(),
            risk_factors: rule.risk_factors.clone(),
            rationale: rule_summary(rule),
            method: EvaluationMethod::RuleOnly,
        },
        Some(advisory) => {
            let score = (advisory.score * policy.advisory_weight
                + rule.score * policy.rule_weight)
                .clamp(0.0, 100.0);

            let risk_tier = tiers.tier_for(score);

            let mut indicators = advisory.indicators.clone();
            indicators.extend(rule.indicators.iter().cloned());
            if risk_tier >= RiskTier::High && indicators.is_empty() {
                indicators.insert(ELEVATED_RISK.to_string());
            }

            let mut risk_factors = advisory.risk_factors.clone();
            risk_factors.extend(rule.risk_factors.iter().cloned());

            CombinedAssessment {
                score,
                risk_tier,
                confidence: (advisory.confidence + rule_confidence(rule.score)) / 2.0,
                indicators,
                risk_factors,
                rationale: format!(
                    "{} Rule validation: {}",
                    advisory.rationale,
                    rule_summary(rule)
                ),
                method: EvaluationMethod::AdvisoryEnhanced,
            }
        }
    }
}
