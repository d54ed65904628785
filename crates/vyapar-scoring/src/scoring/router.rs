use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use super::engine::{ScoreResult, ScoringEngine, ScoringError};
use super::features::ScoringEndpoint;
use super::request::ScoringRequest;

/// Router exposing one POST route per scoring chain plus `/score` auto-routing.
pub fn scoring_router(engine: Arc<ScoringEngine>) -> Router {
    Router::new()
        .route("/predict", post(churn_handler))
        .route("/predict-churn", post(churn_handler))
        .route("/predict-inventory", post(inventory_handler))
        .route("/score-lead", post(lead_handler))
        .route("/audit-expense", post(expense_handler))
        .route("/score", post(inferred_handler))
        .with_state(engine)
}

/// Body of a successful scoring call.
#[derive(Debug, Serialize)]
pub struct ScoringResponse<'a> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<ScoringEndpoint>,
    #[serde(flatten)]
    pub result: &'a ScoreResult,
}

impl<'a> ScoringResponse<'a> {
    pub fn new(result: &'a ScoreResult) -> Self {
        Self {
            success: true,
            endpoint: None,
            result,
        }
    }

    pub fn routed(endpoint: ScoringEndpoint, result: &'a ScoreResult) -> Self {
        Self {
            success: true,
            endpoint: Some(endpoint),
            result,
        }
    }
}

/// Uniform failure body shared by every scoring route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

/// Anything that stops a request before or during scoring.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("invalid JSON payload: {0}")]
    Payload(String),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

impl From<JsonRejection> for DispatchError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Payload(rejection.body_text())
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let body = ErrorResponse::new(self.to_string());
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

fn parse_payload(payload: Result<Json<Value>, JsonRejection>) -> Result<ScoringRequest, DispatchError> {
    let Json(value) = payload?;
    ScoringRequest::from_value(value).map_err(|err| DispatchError::Scoring(err.into()))
}

fn dispatch(
    engine: &ScoringEngine,
    endpoint: ScoringEndpoint,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let outcome = parse_payload(payload)
        .and_then(|request| engine.score(endpoint, &request).map_err(DispatchError::from));

    match outcome {
        Ok(result) => {
            debug!(
                %endpoint,
                status = result.status_label(),
                model_used = result.model_used(),
                "scored request"
            );
            (StatusCode::OK, Json(ScoringResponse::new(&result))).into_response()
        }
        Err(err) => {
            error!(%endpoint, error = %err, "scoring request failed");
            err.into_response()
        }
    }
}

pub(crate) async fn churn_handler(
    State(engine): State<Arc<ScoringEngine>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    dispatch(&engine, ScoringEndpoint::Churn, payload)
}

pub(crate) async fn inventory_handler(
    State(engine): State<Arc<ScoringEngine>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    dispatch(&engine, ScoringEndpoint::Inventory, payload)
}

pub(crate) async fn lead_handler(
    State(engine): State<Arc<ScoringEngine>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    dispatch(&engine, ScoringEndpoint::Lead, payload)
}

pub(crate) async fn expense_handler(
    State(engine): State<Arc<ScoringEngine>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    dispatch(&engine, ScoringEndpoint::Expense, payload)
}

pub(crate) async fn inferred_handler(
    State(engine): State<Arc<ScoringEngine>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let outcome = parse_payload(payload).and_then(|request| {
        engine
            .score_inferred(&request)
            .map_err(DispatchError::from)
    });

    match outcome {
        Ok((endpoint, result)) => {
            debug!(%endpoint, status = result.status_label(), "scored routed request");
            (StatusCode::OK, Json(ScoringResponse::routed(endpoint, &result))).into_response()
        }
        Err(err) => {
            error!(error = %err, "routed scoring request failed");
            err.into_response()
        }
    }
}
