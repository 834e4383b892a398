use std::collections::BTreeSet;

use serde_json::{Map, Value};

use super::super::domain::{AdvisoryVerdict, DecisionHint, RiskTier};

/// Field names that must be present in the decoded advisory object before
/// any value is trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSchema {
    pub required: Vec<String>,
}

impl Default for ResponseSchema {
    fn default() -> Self {
        Self {
            required: vec![
                "score".to_string(),
                "risk_level".to_string(),
                "reason".to_string(),
            ],
        }
    }
}

/// Parse failure. Upstream collapses every variant into "the advisory
/// signal is absent"; the variants exist for logs and tests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("advisory text did not contain a decodable JSON object: {detail}")]
    MalformedJson { detail: String },
    #[error("advisory object is missing required fields: {}", fields.join(", "))]
    MissingFields { fields: Vec<String> },
}

/// Tolerant parser for advisory model output.
///
/// Models wrap their JSON in prose, markdown fences, or trailing chatter;
/// the parser digs the first balanced object out of the text, validates the
/// required fields, and only then normalizes values into a verdict.
#[derive(Debug, Clone)]
pub struct ResponseParser {
    schema: ResponseSchema,
}

impl ResponseParser {
    pub fn new(schema: ResponseSchema) -> Self {
        Self { schema }
    }

    pub fn parse(&self, raw: &str) -> Result<AdvisoryVerdict, ParseError> {
        let candidate = extract_object(raw).ok_or_else(|| ParseError::MalformedJson {
            detail: "no JSON object found in advisory text".to_string(),
        })?;

        let object: Map<String, Value> =
            serde_json::from_str(candidate).map_err(|err| ParseError::MalformedJson {
                detail: err.to_string(),
            })?;

        // A required field carrying an explicit null is as unusable as an
        // absent one; accepting it would coerce score to 0, the least-risk
        // value, on the normalization path.
        let missing: Vec<String> = self
            .schema
            .required
            .iter()
            .filter(|field| matches!(object.get(field.as_str()), None | Some(Value::Null)))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ParseError::MissingFields { fields: missing });
        }

        self.normalize(object)
    }

    /// Validation decided the object is usable; from here every odd value is
    /// coerced to a conservative default rather than rejected.
    fn normalize(&self, object: Map<String, Value>) -> Result<AdvisoryVerdict, ParseError> {
        let score = number_field(&object, "score")?.unwrap_or(0.0).clamp(0.0, 100.0);
        let confidence = number_field(&object, "confidence")?
            .unwrap_or(0.0)
            .clamp(0.0, 100.0);

        let risk_tier = object
            .get("risk_level")
            .map(display_text)
            .and_then(|label| RiskTier::from_label(&label))
            .unwrap_or(RiskTier::High);

        let indicators: BTreeSet<String> =
            string_list(object.get("indicators")).into_iter().collect();
        let risk_factors = string_list(object.get("risk_factors"));

        let rationale = object.get("reason").map(display_text).unwrap_or_default();

        let decision_hint = match object.get("decision_hint") {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                DecisionHint::from_label(&display_text(value))
                    .unwrap_or(DecisionHint::ManualReview),
            ),
        };

        Ok(AdvisoryVerdict {
            score,
            risk_tier,
            confidence,
            indicators,
            risk_factors,
            rationale,
            decision_hint,
        })
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new(ResponseSchema::default())
    }
}

/// Extract the first balanced top-level JSON object. The scanner tracks
/// string and escape state so braces inside string values cannot truncate
/// the candidate. When the object never closes (truncated model output) it
/// falls back to everything up to the last closing brace.
fn extract_object(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let start = trimmed.find('{')?;
    let tail = &trimmed[start..];

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in tail.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&tail[..idx + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    let last = tail.rfind('}')?;
    Some(&tail[..=last])
}

/// Numeric field coercion: JSON numbers pass through, numeric strings are
/// parsed, anything else present is a hard parse failure.
fn number_field(object: &Map<String, Value>, field: &str) -> Result<Option<f64>, ParseError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => Ok(number.as_f64()),
        Some(Value::String(text)) => {
            text.trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| ParseError::MalformedJson {
                    detail: format!("field '{field}' is not numeric: '{text}'"),
                })
        }
        Some(other) => Err(ParseError::MalformedJson {
            detail: format!("field '{field}' is {}, not numeric", kind_of(other)),
        }),
    }
}

/// List coercion: arrays keep their element order, a bare scalar becomes a
/// single-element list, and null or absent becomes empty.
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(display_text).collect(),
        Some(scalar) => vec![display_text(scalar)],
    }
}

fn display_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
