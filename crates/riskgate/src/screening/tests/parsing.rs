use crate::screening::advisory::{ParseError, ResponseParser, ResponseSchema};
use crate::screening::domain::{DecisionHint, RiskTier};

fn parser() -> ResponseParser {
    ResponseParser::default()
}

#[test]
fn parses_a_clean_object() {
    let verdict = parser()
        .parse(r#"{"score": 72, "risk_level": "high", "confidence": 85, "indicators": ["velocity"], "risk_factors": ["Rapid spending"], "reason": "Pattern matches prior fraud."}"#)
        .expect("clean object parses");

    assert_eq!(verdict.score, 72.0);
    assert_eq!(verdict.risk_tier, RiskTier::High);
    assert_eq!(verdict.confidence, 85.0);
    assert!(verdict.indicators.contains("velocity"));
    assert_eq!(verdict.rationale, "Pattern matches prior fraud.");
    assert_eq!(verdict.decision_hint, None);
}

#[test]
fn digs_the_object_out_of_surrounding_garbage() {
    let raw = "garbage{\"score\":150,\"risk_level\":\"banana\",\"is_fraud\":\"yes\",\"reason\":\"x\"}trailing";

    let verdict = parser().parse(raw).expect("embedded object parses");

    assert_eq!(verdict.score, 100.0);
    assert_eq!(verdict.risk_tier, RiskTier::High);
    assert_eq!(verdict.rationale, "x");
}

#[test]
fn braces_inside_string_values_do_not_truncate() {
    let raw = r#"Sure! {"score": 20, "risk_level": "low", "reason": "matched pattern {wire} today", "indicators": "solo"} done"#;

    let verdict = parser().parse(raw).expect("object with brace in string parses");

    assert_eq!(verdict.score, 20.0);
    assert_eq!(verdict.rationale, "matched pattern {wire} today");
    // Bare scalar list fields wrap into single-element lists.
    assert!(verdict.indicators.contains("solo"));
    assert_eq!(verdict.indicators.len(), 1);
}

#[test]
fn escaped_quotes_inside_strings_are_tracked() {
    let raw = r#"{"score": 5, "risk_level": "low", "reason": "said \"fine\" {ok}"}"#;

    let verdict = parser().parse(raw).expect("escaped quotes parse");

    assert_eq!(verdict.rationale, r#"said "fine" {ok}"#);
}

#[test]
fn missing_required_field_is_a_hard_failure() {
    let raw = r#"{"score": 40, "risk_level": "medium"}"#;

    let err = parser().parse(raw).expect_err("missing reason must fail");

    match err {
        ParseError::MissingFields { fields } => assert_eq!(fields, vec!["reason".to_string()]),
        other => panic!("expected MissingFields, got {other:?}"),
    }
}

#[test]
fn no_object_at_all_is_malformed() {
    let err = parser()
        .parse("the model declined to answer")
        .expect_err("prose only must fail");

    assert!(matches!(err, ParseError::MalformedJson { .. }));
}

#[test]
fn bare_array_payload_is_malformed() {
    // A scalar array never opens an object, so extraction finds nothing.
    let err = parser()
        .parse(r#"no object here, just [1, 2, 3]"#)
        .expect_err("array payload must fail");

    assert!(matches!(err, ParseError::MalformedJson { .. }));
}

#[test]
fn hopelessly_truncated_output_is_malformed() {
    let err = parser()
        .parse(r#"{"score": 10, "risk_level": "low", "reason": "cut off"#)
        .expect_err("unclosed object with no closing brace must fail");

    assert!(matches!(err, ParseError::MalformedJson { .. }));
}

#[test]
fn truncated_tail_after_nested_object_is_malformed() {
    // The last closing brace belongs to the nested object, so the fallback
    // candidate is still unbalanced.
    let raw = r#"{"score": 10, "nested": {"a": 1}, "risk_level": "low", "reason": "cut"#;

    let err = parser().parse(raw).expect_err("unbalanced fallback must fail");

    assert!(matches!(err, ParseError::MalformedJson { .. }));
}

#[test]
fn first_balanced_object_wins() {
    let raw = r#"{"score": 10, "risk_level": "low", "reason": "first"} {"score": 90, "risk_level": "critical", "reason": "second"}"#;

    let verdict = parser().parse(raw).expect("first object parses");

    assert_eq!(verdict.score, 10.0);
    assert_eq!(verdict.rationale, "first");
}

#[test]
fn numeric_strings_are_accepted() {
    let verdict = parser()
        .parse(r#"{"score": "85", "risk_level": "high", "confidence": "60", "reason": "stringly typed"}"#)
        .expect("numeric strings parse");

    assert_eq!(verdict.score, 85.0);
    assert_eq!(verdict.confidence, 60.0);
}

#[test]
fn non_numeric_score_is_malformed() {
    let err = parser()
        .parse(r#"{"score": "lots", "risk_level": "high", "reason": "x"}"#)
        .expect_err("unparseable score must fail");

    assert!(matches!(err, ParseError::MalformedJson { .. }));
}

#[test]
fn null_required_field_is_treated_as_missing() {
    // A null score must not slip past validation and coerce to 0 risk.
    let err = parser()
        .parse(r#"{"score": null, "risk_level": "critical", "reason": "model glitched"}"#)
        .expect_err("null score must fail");

    match err {
        ParseError::MissingFields { fields } => assert_eq!(fields, vec!["score".to_string()]),
        other => panic!("expected MissingFields, got {other:?}"),
    }
}

#[test]
fn out_of_range_numbers_clamp() {
    let verdict = parser()
        .parse(r#"{"score": -20, "risk_level": "low", "confidence": 400, "reason": "x"}"#)
        .expect("out-of-range values parse");

    assert_eq!(verdict.score, 0.0);
    assert_eq!(verdict.confidence, 100.0);
}

#[test]
fn unknown_risk_tier_defaults_high() {
    let verdict = parser()
        .parse(r#"{"score": 10, "risk_level": "chartreuse", "reason": "x"}"#)
        .expect("unknown tier parses");

    assert_eq!(verdict.risk_tier, RiskTier::High);
}

#[test]
fn absent_confidence_defaults_to_zero() {
    let verdict = parser()
        .parse(r#"{"score": 10, "risk_level": "low", "reason": "x"}"#)
        .expect("absent confidence parses");

    assert_eq!(verdict.confidence, 0.0);
}

#[test]
fn unknown_decision_hint_coerces_to_manual_review() {
    let verdict = parser()
        .parse(r#"{"score": 10, "risk_level": "low", "reason": "x", "decision_hint": "escalate?!"}"#)
        .expect("unknown hint parses");

    assert_eq!(verdict.decision_hint, Some(DecisionHint::ManualReview));
}

#[test]
fn list_fields_tolerate_scalars_and_absence() {
    let verdict = parser()
        .parse(r#"{"score": 10, "risk_level": "low", "reason": "x", "risk_factors": "just one"}"#)
        .expect("scalar list field parses");

    assert_eq!(verdict.risk_factors, vec!["just one".to_string()]);
    assert!(verdict.indicators.is_empty());
}

#[test]
fn custom_schema_changes_the_required_set() {
    let parser = ResponseParser::new(ResponseSchema {
        required: vec!["verdict".to_string(), "reason".to_string()],
    });

    let err = parser
        .parse(r#"{"score": 10, "risk_level": "low", "reason": "x"}"#)
        .expect_err("missing custom field must fail");

    match err {
        ParseError::MissingFields { fields } => {
            assert_eq!(fields, vec!["verdict".to_string()]);
        }
        other => panic!("expected MissingFields, got {other:?}"),
    }
}

#[test]
fn markdown_fenced_json_parses() {
    let raw = "```json\n{\"score\": 33, \"risk_level\": \"medium\", \"reason\": \"fenced\"}\n```";

    let verdict = parser().parse(raw).expect("fenced object parses");

    assert_eq!(verdict.score, 33.0);
    assert_eq!(verdict.risk_tier, RiskTier::Medium);
}
