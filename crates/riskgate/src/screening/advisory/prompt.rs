use std::fmt::Write;

use super::super::domain::{FeatureMap, RuleVerdict};

/// Renders the advisory prompt for one evaluation. Implementations must be
/// deterministic for a given feature map and rule verdict.
pub trait PromptBuilder: Send + Sync {
    fn build(&self, features: &FeatureMap, rule: &RuleVerdict) -> String;
}

/// Prompt renderer shared by the built-in screening profiles. The rendered
/// text pins the model to a strict JSON-only reply with the field names the
/// response parser requires.
#[derive(Debug, Clone)]
pub struct ScreeningPrompt {
    /// Persona line, e.g. "an expert fraud analyst at a financial institution".
    pub analyst_role: String,
    /// Noun for the thing under review, e.g. "transaction" or "application".
    pub subject_noun: String,
}

impl PromptBuilder for ScreeningPrompt {
    fn build(&self, features: &FeatureMap, rule: &RuleVerdict) -> String {
        let mut prompt = String::new();
        let _ = writeln!(
            prompt,
            "You are {}. Assess the following {} for risk.",
            self.analyst_role, self.subject_noun
        );

        let _ = writeln!(prompt, "\n{} DETAILS:", self.subject_noun.to_ascii_uppercase());
        for (name, value) in features {
            let _ = writeln!(prompt, "- {name}: {value}");
        }

        let _ = writeln!(prompt, "\nRULE-BASED ANALYSIS RESULTS:");
        let _ = writeln!(prompt, "- Risk score: {:.1}/100", rule.score);
        let _ = writeln!(prompt, "- Risk tier: {}", rule.risk_tier.label());
        if !rule.indicators.is_empty() {
            let indicators: Vec<&str> = rule.indicators.iter().map(String::as_str).collect();
            let _ = writeln!(prompt, "- Indicators: {}", indicators.join(", "));
        }
        for factor in &rule.risk_factors {
            let _ = writeln!(prompt, "- Factor: {factor}");
        }

        let _ = writeln!(
            prompt,
            "\nRespond ONLY with a JSON object in exactly this format:"
        );
        let _ = writeln!(prompt, "{{");
        let _ = writeln!(prompt, "  \"score\": <number 0-100>,");
        let _ = writeln!(
            prompt,
            "  \"risk_level\": \"very_low\"|\"low\"|\"medium\"|\"high\"|\"critical\","
        );
        let _ = writeln!(prompt, "  \"confidence\": <number 0-100>,");
        let _ = writeln!(prompt, "  \"indicators\": [<short tags>],");
        let _ = writeln!(prompt, "  \"risk_factors\": [<short sentences>],");
        let _ = writeln!(prompt, "  \"reason\": \"<one-paragraph explanation>\",");
        let _ = writeln!(
            prompt,
            "  \"decision_hint\": \"approve\"|\"conditional_approve\"|\"manual_review\"|\"reject\""
        );
        let _ = writeln!(prompt, "}}");
        let _ = write!(prompt, "Do not include any text outside the JSON object.");
        prompt
    }
}
