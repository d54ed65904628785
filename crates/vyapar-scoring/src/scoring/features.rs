use serde::{Deserialize, Serialize};
use std::fmt;

use super::request::{FeatureError, ScoringRequest};

/// The four independent scoring chains exposed by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringEndpoint {
    Churn,
    Inventory,
    Lead,
    Expense,
}

impl ScoringEndpoint {
    pub const ALL: [ScoringEndpoint; 4] = [
        ScoringEndpoint::Churn,
        ScoringEndpoint::Inventory,
        ScoringEndpoint::Lead,
        ScoringEndpoint::Expense,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Churn => "churn",
            Self::Inventory => "inventory",
            Self::Lead => "lead",
            Self::Expense => "expense",
        }
    }

    /// Accepts the short id or the HTTP route name (`predict-churn`, `score-lead`, ...).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().trim_start_matches('/').to_ascii_lowercase().as_str() {
            "churn" | "predict" | "predict-churn" => Some(Self::Churn),
            "inventory" | "predict-inventory" => Some(Self::Inventory),
            "lead" | "score-lead" => Some(Self::Lead),
            "expense" | "audit-expense" => Some(Self::Expense),
            _ => None,
        }
    }

    /// Positional schema the trained models for this endpoint expect.
    pub fn schema(self) -> &'static [FieldSpec] {
        match self {
            Self::Churn => &CHURN_SCHEMA,
            Self::Inventory => &INVENTORY_SCHEMA,
            Self::Lead => &LEAD_SCHEMA,
            Self::Expense => &EXPENSE_SCHEMA,
        }
    }

    pub fn feature_count(self) -> usize {
        self.schema().len()
    }

    pub fn artifact_file(self) -> &'static str {
        match self {
            Self::Churn => "churn_model.json",
            Self::Inventory => "inventory_model.json",
            Self::Lead => "lead_model.json",
            Self::Expense => "expense_model.json",
        }
    }

    /// Whether a model of `kind` can drive this endpoint's scorer.
    ///
    /// Churn reads a probability, lead a 0/1 class, inventory a quantity and
    /// expense the -1/1 anomaly label.
    pub fn accepts(self, kind: &str) -> bool {
        match self {
            Self::Churn | Self::Lead => {
                matches!(kind, "logistic_regression" | "random_forest")
            }
            Self::Inventory => kind == "linear_regression",
            Self::Expense => kind == "isolation_forest",
        }
    }

    /// Picks an endpoint from the payload's marker keys, in a fixed priority order.
    pub fn infer(request: &ScoringRequest) -> Option<Self> {
        [
            ("days_inactive", Self::Churn),
            ("current_stock", Self::Inventory),
            ("budget", Self::Lead),
            ("amount", Self::Expense),
        ]
        .into_iter()
        .find(|(marker, _)| request.contains(marker))
        .map(|(_, endpoint)| endpoint)
    }
}

impl fmt::Display for ScoringEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A named input field and the value substituted when it is absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub default: f64,
}

const fn field(name: &'static str, default: f64) -> FieldSpec {
    FieldSpec { name, default }
}

static CHURN_SCHEMA: [FieldSpec; 3] = [
    field("days_inactive", 0.0),
    field("support_tickets", 0.0),
    field("monthly_bill", 0.0),
];

// daily_sales_avg defaults to one so an empty payload never divides by zero.
static INVENTORY_SCHEMA: [FieldSpec; 2] = [
    field("current_stock", 0.0),
    field("daily_sales_avg", 1.0),
];

static LEAD_SCHEMA: [FieldSpec; 2] = [field("budget", 0.0), field("urgency", 0.0)];

static EXPENSE_SCHEMA: [FieldSpec; 1] = [field("amount", 0.0)];

/// Fixed-order numeric features for one endpoint.
///
/// Only [`FeatureVector::extract`] builds one, so the length always equals the
/// endpoint's schema length.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    endpoint: ScoringEndpoint,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn extract(
        endpoint: ScoringEndpoint,
        request: &ScoringRequest,
    ) -> Result<Self, FeatureError> {
        let values = endpoint
            .schema()
            .iter()
            .map(|spec| request.number(spec.name, spec.default))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { endpoint, values })
    }

    pub fn endpoint(&self) -> ScoringEndpoint {
        self.endpoint
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn at(&self, index: usize) -> f64 {
        self.values[index]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChurnFeatures {
    pub days_inactive: f64,
    pub support_tickets: f64,
    pub monthly_bill: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InventoryFeatures {
    pub current_stock: f64,
    pub daily_sales_avg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeadFeatures {
    pub budget: f64,
    pub urgency: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpenseFeatures {
    pub amount: f64,
}

impl ChurnFeatures {
    pub fn from_vector(vector: &FeatureVector) -> Self {
        debug_assert_eq!(vector.endpoint(), ScoringEndpoint::Churn);
        Self {
            days_inactive: vector.at(0),
            support_tickets: vector.at(1),
            monthly_bill: vector.at(2),
        }
    }
}

impl InventoryFeatures {
    pub fn from_vector(vector: &FeatureVector) -> Self {
        debug_assert_eq!(vector.endpoint(), ScoringEndpoint::Inventory);
        Self {
            current_stock: vector.at(0),
            daily_sales_avg: vector.at(1),
        }
    }
}

impl LeadFeatures {
    pub fn from_vector(vector: &FeatureVector) -> Self {
        debug_assert_eq!(vector.endpoint(), ScoringEndpoint::Lead);
        Self {
            budget: vector.at(0),
            urgency: vector.at(1),
        }
    }
}

impl ExpenseFeatures {
    pub fn from_vector(vector: &FeatureVector) -> Self {
        debug_assert_eq!(vector.endpoint(), ScoringEndpoint::Expense);
        Self {
            amount: vector.at(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> ScoringRequest {
        ScoringRequest::from_value(value).expect("object payload")
    }

    #[test]
    fn vector_follows_schema_order_regardless_of_payload_order() {
        let payload = request(json!({
            "monthly_bill": 1200,
            "days_inactive": 45,
            "support_tickets": 2,
            "unrelated": "ignored",
        }));

        let vector = FeatureVector::extract(ScoringEndpoint::Churn, &payload).expect("extracts");
        assert_eq!(vector.as_slice(), &[45.0, 2.0, 1200.0]);
    }

    #[test]
    fn vector_length_is_fixed_per_endpoint() {
        let empty = request(json!({}));
        for endpoint in ScoringEndpoint::ALL {
            let vector = FeatureVector::extract(endpoint, &empty).expect("defaults apply");
            assert_eq!(vector.len(), endpoint.feature_count());
        }
    }

    #[test]
    fn inventory_velocity_defaults_to_one() {
        let vector = FeatureVector::extract(ScoringEndpoint::Inventory, &request(json!({})))
            .expect("defaults apply");
        let features = InventoryFeatures::from_vector(&vector);
        assert_eq!(features.current_stock, 0.0);
        assert_eq!(features.daily_sales_avg, 1.0);
    }

    #[test]
    fn extraction_surfaces_the_offending_field() {
        let err = FeatureVector::extract(
            ScoringEndpoint::Lead,
            &request(json!({ "budget": 100, "urgency": "asap" })),
        )
        .expect_err("urgency is not numeric");
        assert!(matches!(
            err,
            FeatureError::TypeConversion {
                field: "urgency",
                ..
            }
        ));
    }

    #[test]
    fn endpoint_names_round_trip_through_parse() {
        for endpoint in ScoringEndpoint::ALL {
            assert_eq!(ScoringEndpoint::parse(endpoint.id()), Some(endpoint));
        }
        assert_eq!(ScoringEndpoint::parse("/predict"), Some(ScoringEndpoint::Churn));
        assert_eq!(
            ScoringEndpoint::parse("audit-expense"),
            Some(ScoringEndpoint::Expense)
        );
        assert_eq!(ScoringEndpoint::parse("forecast"), None);
    }

    #[test]
    fn infer_uses_marker_priority() {
        assert_eq!(
            ScoringEndpoint::infer(&request(json!({ "amount": 10, "budget": 5 }))),
            Some(ScoringEndpoint::Lead)
        );
        assert_eq!(
            ScoringEndpoint::infer(&request(json!({ "current_stock": 3 }))),
            Some(ScoringEndpoint::Inventory)
        );
        assert_eq!(ScoringEndpoint::infer(&request(json!({ "query": "hi" }))), None);
    }

    #[test]
    fn endpoints_accept_only_compatible_model_kinds() {
        assert!(ScoringEndpoint::Churn.accepts("random_forest"));
        assert!(ScoringEndpoint::Lead.accepts("logistic_regression"));
        assert!(ScoringEndpoint::Inventory.accepts("linear_regression"));
        assert!(ScoringEndpoint::Expense.accepts("isolation_forest"));

        assert!(!ScoringEndpoint::Churn.accepts("linear_regression"));
        assert!(!ScoringEndpoint::Inventory.accepts("random_forest"));
        assert!(!ScoringEndpoint::Expense.accepts("logistic_regression"));
    }
}
