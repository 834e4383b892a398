use serde::{Deserialize, Serialize};

use super::super::domain::{FeatureMap, FeatureValue};

/// One screening rule: a trigger over the feature map plus the audit
/// metadata emitted when it fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub trigger: Trigger,
}

/// How a rule fires: a single weighted predicate, or a ladder of mutually
/// exclusive weight bands over one numeric feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Trigger {
    Flat {
        predicate: Predicate,
        weight: f64,
        indicator: String,
        factor: String,
    },
    Banded {
        feature: String,
        bands: Vec<Band>,
    },
}

/// Half-open weight band `[at_least, below)` for a numeric feature. The
/// first matching band in the ladder wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub at_least: f64,
    pub below: Option<f64>,
    pub weight: f64,
    pub indicator: String,
    pub factor: String,
}

impl Band {
    pub(super) fn matches(&self, value: f64) -> bool {
        value >= self.at_least && self.below.map_or(true, |upper| value < upper)
    }
}

/// Predicate over the feature map. A missing or wrong-typed feature is the
/// rule's no-match outcome, never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Numeric feature is at or above the threshold.
    NumberAtLeast { feature: String, threshold: f64 },
    /// Numeric feature lies in the half-open range `[at_least, below)`.
    NumberInRange {
        feature: String,
        at_least: f64,
        below: f64,
    },
    /// Numeric feature divides evenly by `divisor`.
    MultipleOf { feature: String, divisor: f64 },
    /// Text feature equals one of the values, ignoring case and whitespace.
    EqualsAny { feature: String, values: Vec<String> },
    /// Text feature contains one of the needles, ignoring case.
    ContainsAny { feature: String, needles: Vec<String> },
    /// Boolean feature is present and true.
    IsTrue { feature: String },
    /// Feature is absent, or its text equals one of the placeholder values.
    MissingOr { feature: String, values: Vec<String> },
    /// Hour-of-day feature falls inside `[start, end]`, wrapping midnight
    /// when `start > end`.
    HourBetween { feature: String, start: u8, end: u8 },
    AllOf(Vec<Predicate>),
    AnyOf(Vec<Predicate>),
}

impl Predicate {
    pub fn matches(&self, features: &FeatureMap) -> bool {
        match self {
            Predicate::NumberAtLeast { feature, threshold } => {
                number(features, feature).is_some_and(|value| value >= *threshold)
            }
            Predicate::NumberInRange {
                feature,
                at_least,
                below,
            } => number(features, feature)
                .is_some_and(|value| value >= *at_least && value < *below),
            Predicate::MultipleOf { feature, divisor } => {
                if *divisor <= 0.0 {
                    return false;
                }
                number(features, feature).is_some_and(|value| (value % divisor).abs() < 1e-9)
            }
            Predicate::EqualsAny { feature, values } => text(features, feature)
                .is_some_and(|value| {
                    let value = value.trim();
                    values.iter().any(|candidate| value.eq_ignore_ascii_case(candidate))
                }),
            Predicate::ContainsAny { feature, needles } => text(features, feature)
                .is_some_and(|value| {
                    let haystack = value.to_ascii_lowercase();
                    needles
                        .iter()
                        .any(|needle| haystack.contains(&needle.to_ascii_lowercase()))
                }),
            Predicate::IsTrue { feature } => features
                .get(feature)
                .and_then(FeatureValue::as_flag)
                .unwrap_or(false),
            Predicate::MissingOr { feature, values } => match features.get(feature) {
                None => true,
                Some(value) => {
                    let text = value.to_string();
                    let text = text.trim().to_ascii_lowercase();
                    values.iter().any(|candidate| text == candidate.to_ascii_lowercase())
                }
            },
            Predicate::HourBetween {
                feature,
                start,
                end,
            } => number(features, feature).is_some_and(|value| {
                if value < 0.0 || value > 23.0 {
                    return false;
                }
                let hour = value as u8;
                if start <= end {
                    hour >= *start && hour <= *end
                } else {
                    hour >= *start || hour <= *end
                }
            }),
            Predicate::AllOf(children) => children.iter().all(|child| child.matches(features)),
            Predicate::AnyOf(children) => children.iter().any(|child| child.matches(features)),
        }
    }

    /// Feature this predicate primarily inspects, used to render the
    /// triggering value into the rule's risk-factor text.
    pub fn primary_feature(&self) -> Option<&str> {
        match self {
            Predicate::NumberAtLeast { feature, .. }
            | Predicate::NumberInRange { feature, .. }
            | Predicate::MultipleOf { feature, .. }
            | Predicate::EqualsAny { feature, .. }
            | Predicate::ContainsAny { feature, .. }
            | Predicate::IsTrue { feature }
            | Predicate::MissingOr { feature, .. }
            | Predicate::HourBetween { feature, .. } => Some(feature),
            Predicate::AllOf(children) | Predicate::AnyOf(children) => {
                children.iter().find_map(Predicate::primary_feature)
            }
        }
    }
}

fn number(features: &FeatureMap, feature: &str) -> Option<f64> {
    features.get(feature).and_then(FeatureValue::as_number)
}

fn text<'a>(features: &'a FeatureMap, feature: &str) -> Option<&'a str> {
    features.get(feature).and_then(FeatureValue::as_text)
}

/// Immutable, ordered collection of rules fixed at engine construction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}
