use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};

use super::advisory::{
    AdvisoryClient, AdvisoryTransport, PromptBuilder, ResponseParser,
};
use super::combine::{combine, CombinedAssessment, CombinePolicy};
use super::decision::DecisionPolicy;
use super::domain::{
    AdvisoryVerdict, EvaluationMethod, FeatureMap, RiskTier, RuleVerdict, TierThresholds, Verdict,
};
use super::rules::{RuleEngine, RuleTable};

/// Indicator carried by verdicts produced through the error fallback path.
pub const ANALYSIS_ERROR: &str = "analysis_error";

/// Scoring and routing policy for one engine instance. Fixed at
/// construction; evaluations only ever read it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningPolicy {
    pub tiers: TierThresholds,
    pub combine: CombinePolicy,
    pub decisions: DecisionPolicy,
}

impl Default for ScreeningPolicy {
    fn default() -> Self {
        Self {
            tiers: TierThresholds::default(),
            combine: CombinePolicy::default(),
            decisions: DecisionPolicy::default(),
        }
    }
}

impl ScreeningPolicy {
    pub fn validate(&self) -> Result<(), PolicyError> {
        if !self.tiers.is_monotonic() {
            return Err(PolicyError::TierOrdering);
        }
        let sum = self.combine.weight_sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(PolicyError::WeightSum(sum));
        }
        if !self.decisions.is_monotonic() {
            return Err(PolicyError::DecisionOrdering);
        }
        Ok(())
    }
}

/// Rejected policy configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyError {
    #[error("risk tier cut points must strictly ascend within (0, 100]")]
    TierOrdering,
    #[error("combination weights must sum to 1.0, got {0:.3}")]
    WeightSum(f64),
    #[error("decision thresholds must strictly ascend")]
    DecisionOrdering,
}

/// The full screening pipeline: rule pass, best-effort advisory pass,
/// combination, and decision mapping.
///
/// `evaluate` is total. Whatever fails along the way, the caller gets a
/// verdict; degraded paths are visible in the verdict's `method`.
pub struct ScreeningEngine<T: AdvisoryTransport> {
    rules: RuleEngine,
    policy: ScreeningPolicy,
    advisory: AdvisoryClient<T>,
    parser: ResponseParser,
    prompts: Arc<dyn PromptBuilder>,
}

impl<T: AdvisoryTransport> std::fmt::Debug for ScreeningEngine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreeningEngine")
            .field("rules", &self.rules)
            .field("policy", &self.policy)
            .field("parser", &self.parser)
            .finish_non_exhaustive()
    }
}

impl<T: AdvisoryTransport> ScreeningEngine<T> {
    pub fn new(
        table: RuleTable,
        policy: ScreeningPolicy,
        advisory: AdvisoryClient<T>,
        parser: ResponseParser,
        prompts: Arc<dyn PromptBuilder>,
    ) -> Result<Self, PolicyError> {
        policy.validate()?;
        let rules = RuleEngine::new(table, policy.tiers.clone());
        Ok(Self {
            rules,
            policy,
            advisory,
            parser,
            prompts,
        })
    }

    pub fn policy(&self) -> &ScreeningPolicy {
        &self.policy
    }

    /// Evaluate one subject end to end.
    pub fn evaluate(&self, features: &FeatureMap) -> Verdict {
        let rule = self.rules.evaluate(features);
        let advisory = self.consult_advisory(features, &rule);

        let assessment = if self.rules.is_vacuous() && advisory.is_none() {
            error_fallback()
        } else {
            combine(&self.policy.combine, &self.policy.tiers, &rule, advisory.as_ref())
        };

        let decision = self.policy.decisions.decide(&assessment);
        info!(
            score = assessment.score,
            tier = assessment.risk_tier.label(),
            method = assessment.method.label(),
            decision = decision.label(),
            "subject screened"
        );

        Verdict {
            score: assessment.score,
            risk_tier: assessment.risk_tier,
            decision,
            confidence: assessment.confidence,
            indicators: assessment.indicators,
            risk_factors: assessment.risk_factors,
            rationale: assessment.rationale,
            method: assessment.method,
        }
    }

    /// Ask the advisory model for a second opinion. Any failure on this
    /// path, transport, envelope, or parsing, is logged and swallowed.
    fn consult_advisory(
        &self,
        features: &FeatureMap,
        rule: &RuleVerdict,
    ) -> Option<AdvisoryVerdict> {
        let prompt = self.prompts.build(features, rule);
        let raw = match self.advisory.request(&prompt) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "advisory unavailable, continuing rule-only");
                return None;
            }
        };

        match self.parser.parse(&raw) {
            Ok(verdict) => Some(verdict),
            Err(err) => {
                warn!(error = %err, "advisory response unusable, continuing rule-only");
                None
            }
        }
    }
}

/// Both signals failed: neutral midpoint score, zero confidence, forced
/// high tier. Decision mapping turns this into a manual review.
fn error_fallback() -> CombinedAssessment {
    let mut indicators = BTreeSet::new();
    indicators.insert(ANALYSIS_ERROR.to_string());
    CombinedAssessment {
        score: 50.0,
        risk_tier: RiskTier::High,
        confidence: 0.0,
        indicators,
        risk_factors: vec!["Screening could not be completed automatically".to_string()],
        rationale: "Neither the rule pass nor the advisory model produced a usable assessment; \
                    the subject is routed to manual review."
            .to_string(),
        method: EvaluationMethod::ErrorFallback,
    }
}
