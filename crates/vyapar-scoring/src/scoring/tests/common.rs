use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use serde_json::{json, Value};

use crate::scoring::features::{FeatureVector, ScoringEndpoint};
use crate::scoring::models::{ModelArtifact, ModelError, ModelHandle, PredictiveModel};
use crate::scoring::request::ScoringRequest;
use crate::scoring::{scoring_router, ModelSet, ScoringEngine};

pub(super) fn request(value: Value) -> ScoringRequest {
    ScoringRequest::from_value(value).expect("object payload")
}

fn handle(endpoint: ScoringEndpoint, artifact: Value) -> ModelHandle {
    let artifact: ModelArtifact = serde_json::from_value(artifact).expect("artifact parses");
    artifact.into_handle(endpoint).expect("artifact is valid")
}

pub(super) fn churn_classifier() -> ModelHandle {
    handle(
        ScoringEndpoint::Churn,
        json!({
            "kind": "logistic_regression",
            "coefficients": [0.08, 0.6, 0.0005],
            "intercept": -4.5
        }),
    )
}

pub(super) fn restock_regressor() -> ModelHandle {
    handle(
        ScoringEndpoint::Inventory,
        json!({
            "kind": "linear_regression",
            "coefficients": [-1.0, 14.0],
            "intercept": 20.0
        }),
    )
}

pub(super) fn lead_forest() -> ModelHandle {
    handle(
        ScoringEndpoint::Lead,
        json!({
            "kind": "random_forest",
            "n_features": 2,
            "trees": [
                { "nodes": [
                    { "feature": 0, "threshold": 25000.0, "left": 1, "right": 2 },
                    { "value": 0.0 },
                    { "value": 1.0 }
                ]},
                { "nodes": [
                    { "feature": 1, "threshold": 6.5, "left": 1, "right": 2 },
                    { "value": 0.2 },
                    { "value": 0.9 }
                ]}
            ]
        }),
    )
}

pub(super) fn expense_detector() -> ModelHandle {
    let tree = json!({ "nodes": [
        { "feature": 0, "threshold": 5000.0, "left": 1, "right": 2 },
        { "size": 250 },
        { "size": 1 }
    ]});
    handle(
        ScoringEndpoint::Expense,
        json!({
            "kind": "isolation_forest",
            "n_features": 1,
            "sample_size": 256,
            "trees": [tree.clone(), tree]
        }),
    )
}

pub(super) fn model_engine() -> ScoringEngine {
    ScoringEngine::new(
        ModelSet::default()
            .with_model(ScoringEndpoint::Churn, churn_classifier())
            .with_model(ScoringEndpoint::Inventory, restock_regressor())
            .with_model(ScoringEndpoint::Lead, lead_forest())
            .with_model(ScoringEndpoint::Expense, expense_detector()),
    )
}

/// Model that always fails, standing in for a broken inference runtime.
#[derive(Debug)]
pub(super) struct BrokenModel;

impl PredictiveModel for BrokenModel {
    fn predict(&self, _features: &FeatureVector) -> Result<f64, ModelError> {
        Err(ModelError::NonFinite { model: "broken" })
    }

    fn name(&self) -> &'static str {
        "broken"
    }

    fn feature_count(&self) -> usize {
        3
    }
}

/// Classifier with a fixed answer and no probability output.
#[derive(Debug)]
pub(super) struct ConstantClassifier(pub(super) f64);

impl PredictiveModel for ConstantClassifier {
    fn predict(&self, _features: &FeatureVector) -> Result<f64, ModelError> {
        Ok(self.0)
    }

    fn name(&self) -> &'static str {
        "constant"
    }

    fn feature_count(&self) -> usize {
        2
    }
}

pub(super) fn router_with_engine(engine: ScoringEngine) -> axum::Router {
    scoring_router(Arc::new(engine))
}

pub(super) fn post_json(path: &str, body: &Value) -> Request<Body> {
    post_raw(path, serde_json::to_vec(body).expect("serialize body"))
}

pub(super) fn post_raw(path: &str, body: impl Into<Body>) -> Request<Body> {
    Request::post(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
