use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Untrusted key/value payload for a single scoring call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoringRequest {
    fields: Map<String, Value>,
}

impl ScoringRequest {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Accepts only JSON objects; anything else has no named fields to read.
    pub fn from_value(value: Value) -> Result<Self, FeatureError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(FeatureError::NotAnObject {
                found: json_kind(&other),
            }),
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Reads `field` as a float, substituting `default` when the key is absent.
    pub fn number(&self, field: &'static str, default: f64) -> Result<f64, FeatureError> {
        match self.fields.get(field) {
            None => Ok(default),
            Some(value) => coerce(field, value),
        }
    }

    /// Optional free-text field; numbers and booleans are rendered as text.
    pub fn text(&self, field: &str) -> Option<String> {
        match self.fields.get(field)? {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            _ => None,
        }
    }
}

impl From<Map<String, Value>> for ScoringRequest {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

fn coerce(field: &'static str, value: &Value) -> Result<f64, FeatureError> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };

    match parsed {
        Some(number) if number.is_finite() => Ok(number),
        _ => Err(FeatureError::TypeConversion {
            field,
            found: describe(value),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(raw) => format!("string {raw:?}"),
        other => json_kind(other).to_string(),
    }
}

/// Failure to turn a request payload into numeric features.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeatureError {
    #[error("could not convert field '{field}' to float: got {found}")]
    TypeConversion { field: &'static str, found: String },
    #[error("request body must be a JSON object, got {found}")]
    NotAnObject { found: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: Value) -> ScoringRequest {
        ScoringRequest::from_value(value).expect("object payload")
    }

    #[test]
    fn absent_fields_take_the_default() {
        let payload = request(json!({}));
        assert_eq!(payload.number("days_inactive", 0.0), Ok(0.0));
        assert_eq!(payload.number("daily_sales_avg", 1.0), Ok(1.0));
    }

    #[test]
    fn coerces_numbers_booleans_and_numeric_strings() {
        let payload = request(json!({
            "budget": 12000,
            "urgency": " 8.5 ",
            "monthly_bill": true,
        }));
        assert_eq!(payload.number("budget", 0.0), Ok(12000.0));
        assert_eq!(payload.number("urgency", 0.0), Ok(8.5));
        assert_eq!(payload.number("monthly_bill", 0.0), Ok(1.0));
    }

    #[test]
    fn rejects_values_that_are_not_numeric() {
        let payload = request(json!({
            "days_inactive": "forty",
            "support_tickets": null,
            "monthly_bill": [1, 2],
            "amount": "NaN",
        }));

        for field in ["days_inactive", "support_tickets", "monthly_bill", "amount"] {
            let err = payload.number(field, 0.0).expect_err("coercion fails");
            assert!(err.to_string().contains(field), "{err}");
        }
    }

    #[test]
    fn non_object_payloads_are_rejected() {
        let err = ScoringRequest::from_value(json!([1, 2, 3])).expect_err("array rejected");
        assert_eq!(err, FeatureError::NotAnObject { found: "array" });
    }

    #[test]
    fn text_fields_are_optional() {
        let payload = request(json!({ "category": "Travel", "code": 42, "tags": [] }));
        assert_eq!(payload.text("category").as_deref(), Some("Travel"));
        assert_eq!(payload.text("code").as_deref(), Some("42"));
        assert_eq!(payload.text("tags"), None);
        assert_eq!(payload.text("missing"), None);
    }
}
