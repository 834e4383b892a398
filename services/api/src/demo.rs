use crate::infra::{
    advisory_config_from, build_engine, offline_advisory_config, InMemoryCaseRepository,
    InMemoryReviewAlerts, OfflineTransport, ProfileKind, ScriptedTransport,
};
use clap::{ArgGroup, Args};
use riskgate::config::AppConfig;
use riskgate::error::AppError;
use riskgate::screening::{
    AdvisoryClient, AdvisoryConfig, AdvisoryTransport, CaseId, CaseRepository, FeatureMap,
    FeatureValue, HttpTransport, RetryBackoff, RuleEngine, ScreeningEngine, ScreeningService,
    ScreeningSubmission, SubmissionImporter, TierThresholds,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("input").required(true).args(["dataset", "subject"])))]
pub(crate) struct ScreenArgs {
    /// CSV dataset with a subject_reference column plus feature columns
    #[arg(long)]
    pub(crate) dataset: Option<PathBuf>,
    /// Single subject as a JSON document shaped like the HTTP submit payload
    #[arg(long)]
    pub(crate) subject: Option<PathBuf>,
    /// Screening profile to apply
    #[arg(long, value_enum, default_value_t = ProfileKind::Transaction)]
    pub(crate) profile: ProfileKind,
    /// Skip the advisory model and settle every row on its rule verdict
    #[arg(long)]
    pub(crate) offline: bool,
    /// Print the per-rule score breakdown under each subject
    #[arg(long)]
    pub(crate) breakdown: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Screening profile to demonstrate
    #[arg(long, value_enum, default_value_t = ProfileKind::Transaction)]
    pub(crate) profile: ProfileKind,
    /// Print the per-rule score breakdown under each scenario
    #[arg(long)]
    pub(crate) breakdown: bool,
}

pub(crate) fn run_screen(args: ScreenArgs) -> Result<(), AppError> {
    let ScreenArgs {
        dataset,
        subject,
        profile,
        offline,
        breakdown,
    } = args;

    // The clap input group guarantees exactly one source is set.
    let submissions = match (&dataset, &subject) {
        (Some(path), None) => SubmissionImporter::from_path(path)?,
        (None, Some(path)) => vec![SubmissionImporter::subject_from_path(path)?],
        _ => Vec::new(),
    };
    if submissions.is_empty() {
        println!("No subjects to screen");
        return Ok(());
    }

    let bundle = profile.load();
    let breakdown_rules =
        breakdown.then(|| RuleEngine::new(bundle.rules.clone(), TierThresholds::default()));

    println!(
        "Screening {} subject(s) with the {} profile",
        submissions.len(),
        profile.label()
    );

    if offline {
        println!("Advisory model: disabled (rule verdicts only)");
        let engine = build_engine(
            bundle,
            AdvisoryClient::new(offline_advisory_config(), OfflineTransport),
        )?;
        screen_rows(&engine, &submissions, breakdown_rules.as_ref());
    } else {
        let config = AppConfig::load()?;
        let advisory_config = advisory_config_from(&config.advisory);
        println!(
            "Advisory model: {} at {}",
            advisory_config.model, advisory_config.endpoint
        );
        let transport = HttpTransport::new(&advisory_config)?;
        let engine = build_engine(bundle, AdvisoryClient::new(advisory_config, transport))?;
        screen_rows(&engine, &submissions, breakdown_rules.as_ref());
    }

    Ok(())
}

fn screen_rows<T: AdvisoryTransport>(
    engine: &ScreeningEngine<T>,
    submissions: &[ScreeningSubmission],
    breakdown: Option<&RuleEngine>,
) {
    let mut tally: BTreeMap<&'static str, usize> = BTreeMap::new();

    for submission in submissions {
        let verdict = engine.evaluate(&submission.features);
        println!(
            "- {} | score {:.1} | {} | {} | {}",
            submission.subject_reference,
            verdict.score,
            verdict.risk_tier.label(),
            verdict.method.label(),
            verdict.decision.summary()
        );
        if let Some(rules) = breakdown {
            let rule_verdict = rules.evaluate(&submission.features);
            for (rule, points) in &rule_verdict.breakdown {
                if *points > 0.0 {
                    println!("    {rule}: +{points:.1}");
                }
            }
        }
        *tally.entry(verdict.decision.label()).or_insert(0) += 1;
    }

    let summary: Vec<String> = tally
        .iter()
        .map(|(label, count)| format!("{label} {count}"))
        .collect();
    println!("\nDecision tally: {}", summary.join(" | "));
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { profile, breakdown } = args;

    let bundle = profile.load();
    let breakdown_rules =
        breakdown.then(|| RuleEngine::new(bundle.rules.clone(), TierThresholds::default()));

    let transport = ScriptedTransport::default();
    let engine = build_engine(
        bundle,
        AdvisoryClient::new(demo_advisory_config(), transport.clone()),
    )?;
    let repository = Arc::new(InMemoryCaseRepository::default());
    let alerts = Arc::new(InMemoryReviewAlerts::default());
    let service = ScreeningService::new(engine, repository.clone(), alerts.clone());

    println!("Risk screening demo");
    println!("Profile: {}", profile.label());
    println!("Advisory model: scripted responses (no network access)");

    let scenarios = match profile {
        ProfileKind::Transaction => transaction_scenarios(),
        ProfileKind::Credit => credit_scenarios(),
    };

    let mut tally: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut last_case: Option<CaseId> = None;

    for scenario in scenarios {
        stage_advisory(&transport, &scenario.advisory);
        println!("\nScenario: {}", scenario.label);

        let record = match service.screen(ScreeningSubmission {
            subject_reference: scenario.reference.to_string(),
            features: scenario.features.clone(),
        }) {
            Ok(record) => record,
            Err(err) => {
                println!("  Screening failed: {err}");
                continue;
            }
        };

        let verdict = &record.verdict;
        println!(
            "- case {} | score {:.1} | {} | {}",
            record.case_id.0,
            verdict.score,
            verdict.risk_tier.label(),
            verdict.decision.summary()
        );
        println!(
            "  Method {} | confidence {:.1}",
            verdict.method.label(),
            verdict.confidence
        );
        println!("  Rationale: {}", verdict.rationale);
        if !verdict.indicators.is_empty() {
            let names: Vec<&str> = verdict.indicators.iter().map(String::as_str).collect();
            println!("  Indicators: {}", names.join(", "));
        }
        if let Some(rules) = &breakdown_rules {
            let rule_verdict = rules.evaluate(&scenario.features);
            println!("  Rule breakdown (non-zero):");
            for (rule, points) in &rule_verdict.breakdown {
                if *points > 0.0 {
                    println!("    - {rule}: +{points:.1}");
                }
            }
        }

        *tally.entry(verdict.decision.label()).or_insert(0) += 1;
        last_case = Some(record.case_id.clone());
    }

    let events = alerts.events();
    if events.is_empty() {
        println!("\nExternal alerts: none dispatched");
    } else {
        println!("\nExternal alerts:");
        for alert in events {
            println!("  - template={} -> {}", alert.template, alert.case_id.0);
        }
    }

    if let Some(case_id) = last_case {
        if let Ok(Some(record)) = repository.fetch(&case_id) {
            match serde_json::to_string_pretty(&record.status_view()) {
                Ok(payload) => println!("\nPublic status payload for {}:\n{payload}", case_id.0),
                Err(err) => println!("\nPublic status payload unavailable: {err}"),
            }
        }
    }

    let summary: Vec<String> = tally
        .iter()
        .map(|(label, count)| format!("{label} {count}"))
        .collect();
    println!("\nDecision tally: {}", summary.join(" | "));

    Ok(())
}

const DEMO_RETRY_BUDGET: u32 = 3;

fn demo_advisory_config() -> AdvisoryConfig {
    AdvisoryConfig {
        endpoint: "scripted".to_string(),
        model: "scripted-analyst".to_string(),
        timeout: Duration::from_secs(1),
        max_retries: DEMO_RETRY_BUDGET,
        backoff: RetryBackoff::Fixed(Duration::ZERO),
    }
}

struct DemoScenario {
    label: &'static str,
    reference: &'static str,
    features: FeatureMap,
    advisory: ScriptedAdvisory,
}

enum ScriptedAdvisory {
    /// Well-formed advisory assessment.
    Json(serde_json::Value),
    /// The endpoint answers, but not with JSON the parser can use.
    Prose(&'static str),
    /// Every delivery attempt fails.
    Outage,
}

fn stage_advisory(transport: &ScriptedTransport, advisory: &ScriptedAdvisory) {
    match advisory {
        ScriptedAdvisory::Json(value) => transport.push_advisory(&value.to_string()),
        ScriptedAdvisory::Prose(text) => transport.push_advisory(text),
        ScriptedAdvisory::Outage => {
            for _ in 0..DEMO_RETRY_BUDGET {
                transport.push_outage();
            }
        }
    }
}

fn features(entries: &[(&str, FeatureValue)]) -> FeatureMap {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

fn transaction_scenarios() -> Vec<DemoScenario> {
    vec![
        DemoScenario {
            label: "routine grocery purchase",
            reference: "txn-demo-001",
            features: features(&[
                ("amount", FeatureValue::Number(50.0)),
                ("location", FeatureValue::Text("New York, USA".to_string())),
                ("hour", FeatureValue::Number(14.0)),
                ("is_weekend", FeatureValue::Flag(false)),
                ("merchant_category", FeatureValue::Text("grocery".to_string())),
                ("transaction_type", FeatureValue::Text("purchase".to_string())),
                ("customer_risk_profile", FeatureValue::Text("low".to_string())),
            ]),
            advisory: ScriptedAdvisory::Json(json!({
                "score": 5,
                "risk_level": "very_low",
                "confidence": 75,
                "indicators": [],
                "risk_factors": [],
                "reason": "Typical low-value grocery purchase consistent with the customer profile.",
            })),
        },
        DemoScenario {
            label: "structured wire to an unverified location",
            reference: "txn-demo-002",
            features: features(&[
                ("amount", FeatureValue::Number(9_500.0)),
                ("location", FeatureValue::Text("Unknown Location".to_string())),
                ("hour", FeatureValue::Number(14.0)),
                ("is_weekend", FeatureValue::Flag(false)),
                (
                    "merchant_category",
                    FeatureValue::Text("wire_transfer".to_string()),
                ),
                ("transaction_type", FeatureValue::Text("purchase".to_string())),
                ("customer_risk_profile", FeatureValue::Text("low".to_string())),
            ]),
            advisory: ScriptedAdvisory::Json(json!({
                "score": 92,
                "risk_level": "critical",
                "confidence": 88,
                "indicators": ["layering"],
                "risk_factors": ["Amount sits just below the reporting threshold"],
                "reason": "Strong structuring pattern with an unverifiable destination.",
                "decision_hint": "reject",
            })),
        },
        DemoScenario {
            label: "late-night weekend online purchase",
            reference: "txn-demo-003",
            features: features(&[
                ("amount", FeatureValue::Number(150.0)),
                ("location", FeatureValue::Text("New York, USA".to_string())),
                ("hour", FeatureValue::Number(2.0)),
                ("is_weekend", FeatureValue::Flag(true)),
                ("merchant_category", FeatureValue::Text("online".to_string())),
                ("transaction_type", FeatureValue::Text("purchase".to_string())),
                ("customer_risk_profile", FeatureValue::Text("low".to_string())),
            ]),
            advisory: ScriptedAdvisory::Prose(
                "This one looks broadly fine to me, nothing jumps out.",
            ),
        },
        DemoScenario {
            label: "flagged customer draining an account",
            reference: "txn-demo-004",
            features: features(&[
                ("amount", FeatureValue::Number(1_500.0)),
                ("location", FeatureValue::Text("New York, USA".to_string())),
                ("hour", FeatureValue::Number(14.0)),
                ("is_weekend", FeatureValue::Flag(false)),
                ("merchant_category", FeatureValue::Text("branch".to_string())),
                (
                    "transaction_type",
                    FeatureValue::Text("withdrawal".to_string()),
                ),
                ("suspicious_pattern", FeatureValue::Flag(true)),
                ("customer_risk_profile", FeatureValue::Text("high".to_string())),
            ]),
            advisory: ScriptedAdvisory::Outage,
        },
    ]
}

fn credit_scenarios() -> Vec<DemoScenario> {
    vec![
        DemoScenario {
            label: "prime applicant with stable income",
            reference: "app-demo-001",
            features: features(&[
                ("credit_score", FeatureValue::Number(780.0)),
                ("debt_to_income", FeatureValue::Number(20.0)),
                ("employment_years", FeatureValue::Number(8.0)),
                (
                    "employment_status",
                    FeatureValue::Text("employed".to_string()),
                ),
                ("annual_income", FeatureValue::Number(95_000.0)),
                ("loan_to_income", FeatureValue::Number(150.0)),
            ]),
            advisory: ScriptedAdvisory::Json(json!({
                "score": 8,
                "risk_level": "very_low",
                "confidence": 82,
                "indicators": [],
                "risk_factors": [],
                "reason": "Prime credit history and ample verified income.",
            })),
        },
        DemoScenario {
            label: "stretched first-time borrower",
            reference: "app-demo-002",
            features: features(&[
                ("credit_score", FeatureValue::Number(680.0)),
                ("debt_to_income", FeatureValue::Number(33.0)),
                ("employment_years", FeatureValue::Number(2.0)),
                (
                    "employment_status",
                    FeatureValue::Text("employed".to_string()),
                ),
                ("annual_income", FeatureValue::Number(60_000.0)),
                ("loan_to_income", FeatureValue::Number(250.0)),
            ]),
            advisory: ScriptedAdvisory::Prose("Applicant seems okay but the file is thin."),
        },
        DemoScenario {
            label: "unemployed subprime applicant",
            reference: "app-demo-003",
            features: features(&[
                ("credit_score", FeatureValue::Number(580.0)),
                ("debt_to_income", FeatureValue::Number(45.0)),
                ("employment_years", FeatureValue::Number(0.5)),
                (
                    "employment_status",
                    FeatureValue::Text("unemployed".to_string()),
                ),
                ("annual_income", FeatureValue::Number(40_000.0)),
                ("loan_to_income", FeatureValue::Number(350.0)),
            ]),
            advisory: ScriptedAdvisory::Json(json!({
                "score": 85,
                "risk_level": "critical",
                "confidence": 80,
                "indicators": ["repayment_risk"],
                "risk_factors": ["No current employment income"],
                "reason": "Debt load and unemployment make default likely.",
                "decision_hint": "reject",
            })),
        },
    ]
}
