//! Built-in screening profiles: a rule table, a condition catalog, and a
//! prompt persona bundled per line of business.

use std::collections::BTreeMap;

use super::advisory::ScreeningPrompt;
use super::rules::{Band, Predicate, Rule, RuleTable, Trigger};

/// Everything a caller needs to assemble an engine for one line of business.
#[derive(Debug, Clone)]
pub struct ScreeningProfile {
    pub rules: RuleTable,
    pub conditions: BTreeMap<String, String>,
    pub prompt: ScreeningPrompt,
}

fn flat(name: &str, predicate: Predicate, weight: f64, indicator: &str, factor: &str) -> Rule {
    Rule {
        name: name.to_string(),
        trigger: Trigger::Flat {
            predicate,
            weight,
            indicator: indicator.to_string(),
            factor: factor.to_string(),
        },
    }
}

fn banded(name: &str, feature: &str, bands: Vec<Band>) -> Rule {
    Rule {
        name: name.to_string(),
        trigger: Trigger::Banded {
            feature: feature.to_string(),
            bands,
        },
    }
}

fn band(at_least: f64, below: Option<f64>, weight: f64, indicator: &str, factor: &str) -> Band {
    Band {
        at_least,
        below,
        weight,
        indicator: indicator.to_string(),
        factor: factor.to_string(),
    }
}

fn equals(feature: &str, values: &[&str]) -> Predicate {
    Predicate::EqualsAny {
        feature: feature.to_string(),
        values: values.iter().map(|value| value.to_string()).collect(),
    }
}

fn contains(feature: &str, needles: &[&str]) -> Predicate {
    Predicate::ContainsAny {
        feature: feature.to_string(),
        needles: needles.iter().map(|needle| needle.to_string()).collect(),
    }
}

fn at_least(feature: &str, threshold: f64) -> Predicate {
    Predicate::NumberAtLeast {
        feature: feature.to_string(),
        threshold,
    }
}

/// Payment-transaction screening. Feature names follow the transaction
/// export schema: `amount`, `location`, `hour`, `is_weekend`,
/// `merchant_category`, `transaction_type`, `suspicious_pattern`, and
/// `customer_risk_profile`.
pub fn transaction_screening() -> ScreeningProfile {
    let rules = RuleTable::new(vec![
        banded(
            "amount_threshold",
            "amount",
            vec![
                band(
                    10_000.0,
                    None,
                    25.0,
                    "very_high_amount",
                    "Very high transaction amount: {value}",
                ),
                band(
                    5_000.0,
                    Some(10_000.0),
                    17.5,
                    "high_amount",
                    "High transaction amount: {value}",
                ),
            ],
        ),
        flat(
            "round_amount",
            Predicate::AllOf(vec![
                at_least("amount", 1_000.0),
                Predicate::MultipleOf {
                    feature: "amount".to_string(),
                    divisor: 1_000.0,
                },
            ]),
            5.0,
            "round_amount",
            "Round-number transaction amount: {value}",
        ),
        flat(
            "structured_amount",
            Predicate::NumberInRange {
                feature: "amount".to_string(),
                at_least: 9_000.0,
                below: 10_000.0,
            },
            15.0,
            "structured_amount",
            "Amount {value} sits just below the reporting threshold",
        ),
        flat(
            "foreign_location",
            contains(
                "location",
                &[
                    "London, UK",
                    "Paris, France",
                    "Tokyo, Japan",
                    "Sydney, Australia",
                ],
            ),
            20.0,
            "foreign_location",
            "Foreign transaction location: {value}",
        ),
        flat(
            "high_risk_location",
            contains("location", &["Unknown Location", "Foreign Location"]),
            16.0,
            "high_risk_location",
            "High-risk transaction location: {value}",
        ),
        flat(
            "unknown_location",
            Predicate::MissingOr {
                feature: "location".to_string(),
                values: vec!["unknown".to_string(), "n/a".to_string(), String::new()],
            },
            10.0,
            "unknown_location",
            "Transaction location is missing or unverified",
        ),
        flat(
            "unusual_hours",
            Predicate::HourBetween {
                feature: "hour".to_string(),
                start: 23,
                end: 6,
            },
            10.0,
            "unusual_hours",
            "Transaction at an unusual hour: {value}:00",
        ),
        flat(
            "weekend_transaction",
            Predicate::IsTrue {
                feature: "is_weekend".to_string(),
            },
            5.0,
            "weekend_transaction",
            "Weekend transaction",
        ),
        flat(
            "wire_transfer_merchant",
            equals("merchant_category", &["wire_transfer"]),
            15.0,
            "wire_transfer",
            "Wire transfer merchant category",
        ),
        flat(
            "high_risk_merchant",
            equals("merchant_category", &["luxury", "electronics"]),
            15.0,
            "high_risk_merchant",
            "High-risk merchant category: {value}",
        ),
        flat(
            "medium_risk_merchant",
            equals("merchant_category", &["online", "atm"]),
            9.0,
            "medium_risk_merchant",
            "Medium-risk merchant category: {value}",
        ),
        flat(
            "transfer_type",
            equals("transaction_type", &["transfer"]),
            15.0,
            "wire_transfer",
            "Wire transfer transaction",
        ),
        flat(
            "large_transfer",
            Predicate::AllOf(vec![
                equals("transaction_type", &["transfer"]),
                at_least("amount", 5_000.0),
            ]),
            10.0,
            "large_wire_transfer",
            "Large wire transfer",
        ),
        flat(
            "large_withdrawal",
            Predicate::AllOf(vec![
                equals("transaction_type", &["withdrawal"]),
                at_least("amount", 1_000.0),
            ]),
            10.0,
            "large_withdrawal",
            "Large cash withdrawal: {value}",
        ),
        flat(
            "suspicious_pattern",
            Predicate::IsTrue {
                feature: "suspicious_pattern".to_string(),
            },
            20.0,
            "suspicious_pattern",
            "Transaction matches a known suspicious pattern",
        ),
        flat(
            "high_risk_customer",
            equals("customer_risk_profile", &["high"]),
            15.0,
            "high_risk_customer",
            "Customer carries a high-risk profile",
        ),
    ]);

    let conditions = catalog(&[
        ("unusual_hours", "Enable enhanced account monitoring for 30 days"),
        ("round_amount", "Request documentation for the source of funds"),
        (
            "structured_amount",
            "File a structuring review with the compliance team",
        ),
        (
            "high_risk_merchant",
            "Confirm the purchase with the account holder before settlement",
        ),
    ]);

    ScreeningProfile {
        rules,
        conditions,
        prompt: ScreeningPrompt {
            analyst_role: "an expert fraud analyst at a major financial institution".to_string(),
            subject_noun: "transaction".to_string(),
        },
    }
}

/// Consumer-credit screening. Feature names follow the application intake
/// schema: `credit_score`, `debt_to_income`, `employment_years`,
/// `employment_status`, `annual_income`, and `loan_to_income`.
pub fn credit_screening() -> ScreeningProfile {
    let rules = RuleTable::new(vec![
        banded(
            "credit_score_band",
            "credit_score",
            vec![
                band(
                    0.0,
                    Some(600.0),
                    28.0,
                    "deep_subprime_credit",
                    "Credit score {value} is deep subprime",
                ),
                band(
                    600.0,
                    Some(650.0),
                    21.0,
                    "subprime_credit",
                    "Credit score {value} is subprime",
                ),
                band(
                    650.0,
                    Some(700.0),
                    14.0,
                    "fair_credit",
                    "Credit score {value} is below the prime tier",
                ),
                band(
                    700.0,
                    Some(750.0),
                    7.0,
                    "near_prime_credit",
                    "Credit score {value} is just below prime",
                ),
            ],
        ),
        banded(
            "debt_to_income_band",
            "debt_to_income",
            vec![
                band(
                    50.0,
                    None,
                    25.0,
                    "excessive_dti",
                    "Debt-to-income ratio {value}% is excessive",
                ),
                band(
                    43.0,
                    Some(50.0),
                    15.0,
                    "very_high_dti",
                    "Debt-to-income ratio {value}% is very high",
                ),
                band(
                    36.0,
                    Some(43.0),
                    10.0,
                    "high_dti",
                    "Debt-to-income ratio {value}% exceeds the lending guideline",
                ),
                band(
                    30.0,
                    Some(36.0),
                    5.0,
                    "elevated_dti",
                    "Debt-to-income ratio {value}% is elevated",
                ),
            ],
        ),
        banded(
            "employment_band",
            "employment_years",
            vec![
                band(
                    0.0,
                    Some(1.0),
                    10.0,
                    "minimal_employment_history",
                    "Employment history under one year",
                ),
                band(
                    1.0,
                    Some(3.0),
                    5.0,
                    "short_employment_history",
                    "Employment history of {value} years is short",
                ),
            ],
        ),
        banded(
            "income_band",
            "annual_income",
            vec![
                band(
                    0.0,
                    Some(30_000.0),
                    12.0,
                    "insufficient_income",
                    "Annual income {value} is below the lending floor",
                ),
                band(
                    30_000.0,
                    Some(50_000.0),
                    6.0,
                    "low_income",
                    "Annual income {value} is low for the requested amount",
                ),
                band(
                    50_000.0,
                    Some(75_000.0),
                    3.0,
                    "below_target_income",
                    "Annual income {value} is below the target band",
                ),
            ],
        ),
        banded(
            "loan_to_income_band",
            "loan_to_income",
            vec![
                band(
                    500.0,
                    None,
                    5.0,
                    "excessive_loan_multiple",
                    "Requested loan is over five times annual income",
                ),
                band(
                    300.0,
                    Some(500.0),
                    4.0,
                    "high_loan_multiple",
                    "Requested loan is a high multiple of income",
                ),
                band(
                    200.0,
                    Some(300.0),
                    2.0,
                    "stretched_loan_amount",
                    "Requested loan stretches the income multiple",
                ),
            ],
        ),
        flat(
            "unstable_employment",
            equals("employment_status", &["unemployed"]),
            10.0,
            "unstable_employment",
            "Applicant is not currently employed",
        ),
    ]);

    let conditions = catalog(&[
        (
            "elevated_dti",
            "Reduce existing debt to improve debt-to-income ratio",
        ),
        (
            "high_dti",
            "Reduce existing debt to improve debt-to-income ratio",
        ),
        (
            "very_high_dti",
            "Reduce existing debt to improve debt-to-income ratio",
        ),
        (
            "minimal_employment_history",
            "Provide additional employment verification",
        ),
        (
            "short_employment_history",
            "Provide additional employment verification",
        ),
        (
            "fair_credit",
            "Consider a co-signer or additional collateral",
        ),
        (
            "near_prime_credit",
            "Consider a co-signer or additional collateral",
        ),
        (
            "subprime_credit",
            "Consider a co-signer or additional collateral",
        ),
    ]);

    ScreeningProfile {
        rules,
        conditions,
        prompt: ScreeningPrompt {
            analyst_role: "a senior credit underwriter at a retail lender".to_string(),
            subject_noun: "loan application".to_string(),
        },
    }
}

fn catalog(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(indicator, condition)| (indicator.to_string(), condition.to_string()))
        .collect()
}
