//! Deterministic scoring pass: an ordered rule table evaluated against a
//! read-only feature map.

use std::collections::{BTreeMap, BTreeSet};

use super::domain::{FeatureMap, FeatureValue, RiskTier, RuleVerdict, TierThresholds};

mod model;

pub use model::{Band, Predicate, Rule, RuleTable, Trigger};

/// Indicator emitted when no rules are configured and scoring is impossible.
pub const SCORING_UNAVAILABLE: &str = "scoring_unavailable";

struct RuleHit {
    weight: f64,
    indicator: String,
    factor: String,
}

/// Evaluates the configured rule table. Evaluation is pure: the same
/// feature map always yields the same verdict, and the map is never
/// mutated.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    table: RuleTable,
    tiers: TierThresholds,
}

impl RuleEngine {
    pub fn new(table: RuleTable, tiers: TierThresholds) -> Self {
        Self { table, tiers }
    }

    /// True when the table is empty and every evaluation degrades to the
    /// conservative unscored verdict.
    pub fn is_vacuous(&self) -> bool {
        self.table.is_empty()
    }

    pub fn evaluate(&self, features: &FeatureMap) -> RuleVerdict {
        if self.table.is_empty() {
            return self.unscored_verdict();
        }

        let mut total = 0.0;
        let mut indicators = BTreeSet::new();
        let mut risk_factors = Vec::new();
        let mut breakdown = BTreeMap::new();

        for rule in self.table.rules() {
            match fire(rule, features) {
                Some(hit) => {
                    total += hit.weight;
                    indicators.insert(hit.indicator);
                    risk_factors.push(hit.factor);
                    breakdown.insert(rule.name.clone(), hit.weight);
                }
                None => {
                    breakdown.insert(rule.name.clone(), 0.0);
                }
            }
        }

        let score = total.clamp(0.0, 100.0);
        RuleVerdict {
            score,
            risk_tier: self.tiers.tier_for(score),
            indicators,
            risk_factors,
            breakdown,
        }
    }

    /// With no rules the engine cannot vouch for anything: score floor,
    /// critical tier, and a single indicator naming the condition.
    fn unscored_verdict(&self) -> RuleVerdict {
        let mut indicators = BTreeSet::new();
        indicators.insert(SCORING_UNAVAILABLE.to_string());
        RuleVerdict {
            score: 0.0,
            risk_tier: RiskTier::Critical,
            indicators,
            risk_factors: vec![
                "No screening rules are configured; the subject could not be scored".to_string(),
            ],
            breakdown: BTreeMap::new(),
        }
    }
}

fn fire(rule: &Rule, features: &FeatureMap) -> Option<RuleHit> {
    match &rule.trigger {
        Trigger::Flat {
            predicate,
            weight,
            indicator,
            factor,
        } => {
            if !predicate.matches(features) {
                return None;
            }
            let value = predicate.primary_feature().and_then(|name| features.get(name));
            Some(RuleHit {
                weight: *weight,
                indicator: indicator.clone(),
                factor: render_factor(factor, value),
            })
        }
        Trigger::Banded { feature, bands } => {
            let value = features.get(feature)?;
            let number = value.as_number()?;
            let band = bands.iter().find(|band| band.matches(number))?;
            Some(RuleHit {
                weight: band.weight,
                indicator: band.indicator.clone(),
                factor: render_factor(&band.factor, Some(value)),
            })
        }
    }
}

/// Substitute the triggering feature value into a `{value}` placeholder so
/// risk-factor text carries the concrete evidence.
fn render_factor(template: &str, value: Option<&FeatureValue>) -> String {
    match value {
        Some(value) if template.contains("{value}") => {
            template.replace("{value}", &value.to_string())
        }
        _ => template.to_string(),
    }
}
