use serde::Serialize;
use tracing::{info, warn};

use super::decision::{round_to, ChurnStatus, ExpenseStatus, InventoryStatus, LeadStatus};
use super::features::{
    ChurnFeatures, ExpenseFeatures, FeatureVector, InventoryFeatures, LeadFeatures,
    ScoringEndpoint,
};
use super::heuristic;
use super::models::{load_artifact, ModelError, ModelHandle, ModelLoadError};
use super::request::{FeatureError, ScoringRequest};
use crate::config::{ScoringConfig, ScoringMode};

/// `model_used` tag reported when the rule-based scorer ran.
pub const HEURISTIC_MODEL: &str = "heuristic";

pub const HOT_LEAD_SCORE: u32 = 90;
pub const COLD_LEAD_SCORE: u32 = 30;
pub const ANOMALY_RISK_SCORE: f64 = 0.95;
pub const NORMAL_RISK_SCORE: f64 = 0.1;

/// Loaded model handles, one optional slot per endpoint.
#[derive(Debug, Clone, Default)]
pub struct ModelSet {
    churn: Option<ModelHandle>,
    inventory: Option<ModelHandle>,
    lead: Option<ModelHandle>,
    expense: Option<ModelHandle>,
}

impl ModelSet {
    /// Reads every artifact that exists in the configured directory.
    ///
    /// Strict mode turns a missing inventory, lead or expense artifact into an error.
    pub fn load(config: &ScoringConfig) -> Result<Self, ModelLoadError> {
        let mut models = Self::default();
        if config.mode == ScoringMode::Heuristic {
            return Ok(models);
        }

        for endpoint in ScoringEndpoint::ALL {
            match load_artifact(&config.model_dir, endpoint)? {
                Some(handle) => *models.slot_mut(endpoint) = Some(handle),
                None if config.mode == ScoringMode::Strict
                    && endpoint != ScoringEndpoint::Churn =>
                {
                    return Err(ModelLoadError::Missing {
                        endpoint,
                        path: config.model_dir.join(endpoint.artifact_file()),
                    });
                }
                None => {}
            }
        }

        Ok(models)
    }

    pub fn with_model(mut self, endpoint: ScoringEndpoint, handle: ModelHandle) -> Self {
        *self.slot_mut(endpoint) = Some(handle);
        self
    }

    pub fn get(&self, endpoint: ScoringEndpoint) -> Option<&ModelHandle> {
        match endpoint {
            ScoringEndpoint::Churn => self.churn.as_ref(),
            ScoringEndpoint::Inventory => self.inventory.as_ref(),
            ScoringEndpoint::Lead => self.lead.as_ref(),
            ScoringEndpoint::Expense => self.expense.as_ref(),
        }
    }

    /// Resolves the scorer an endpoint runs with on this call.
    pub fn scorer(&self, endpoint: ScoringEndpoint) -> Scorer<'_> {
        self.get(endpoint).map_or(Scorer::Heuristic, Scorer::Model)
    }

    fn slot_mut(&mut self, endpoint: ScoringEndpoint) -> &mut Option<ModelHandle> {
        match endpoint {
            ScoringEndpoint::Churn => &mut self.churn,
            ScoringEndpoint::Inventory => &mut self.inventory,
            ScoringEndpoint::Lead => &mut self.lead,
            ScoringEndpoint::Expense => &mut self.expense,
        }
    }
}

/// Either the rule-based heuristic or a loaded model for one endpoint.
#[derive(Debug, Clone, Copy)]
pub enum Scorer<'a> {
    Heuristic,
    Model(&'a ModelHandle),
}

impl Scorer<'_> {
    pub fn label(&self) -> &'static str {
        match self {
            Scorer::Heuristic => HEURISTIC_MODEL,
            Scorer::Model(model) => model.name(),
        }
    }
}

/// Stateless scorer shared read-only by every request.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    models: ModelSet,
}

impl ScoringEngine {
    pub fn new(models: ModelSet) -> Self {
        Self { models }
    }

    /// Engine that never consults a model.
    pub fn heuristic() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ScoringConfig) -> Result<Self, ModelLoadError> {
        let engine = Self::new(ModelSet::load(config)?);

        for endpoint in ScoringEndpoint::ALL {
            let scorer = engine.scorer_label(endpoint);
            if scorer == HEURISTIC_MODEL && config.mode != ScoringMode::Heuristic {
                warn!(
                    %endpoint,
                    artifact = %config.model_dir.join(endpoint.artifact_file()).display(),
                    "model artifact not found, using heuristic scorer"
                );
            } else {
                info!(%endpoint, scorer, mode = config.mode.label(), "scorer selected");
            }
        }

        Ok(engine)
    }

    pub fn models(&self) -> &ModelSet {
        &self.models
    }

    /// Name of the scorer an endpoint will use: a model family or `heuristic`.
    pub fn scorer_label(&self, endpoint: ScoringEndpoint) -> &'static str {
        self.models.scorer(endpoint).label()
    }

    pub fn score(
        &self,
        endpoint: ScoringEndpoint,
        request: &ScoringRequest,
    ) -> Result<ScoreResult, ScoringError> {
        let vector = FeatureVector::extract(endpoint, request)?;

        let result = match endpoint {
            ScoringEndpoint::Churn => ScoreResult::Churn(self.churn(&vector)?),
            ScoringEndpoint::Inventory => ScoreResult::Inventory(self.inventory(&vector)?),
            ScoringEndpoint::Lead => ScoreResult::Lead(self.lead(&vector)?),
            ScoringEndpoint::Expense => {
                ScoreResult::Expense(self.expense(&vector, request.text("category"))?)
            }
        };

        Ok(result)
    }

    /// Scores against whichever endpoint the payload's keys point to.
    pub fn score_inferred(
        &self,
        request: &ScoringRequest,
    ) -> Result<(ScoringEndpoint, ScoreResult), ScoringError> {
        let endpoint = ScoringEndpoint::infer(request).ok_or(ScoringError::Unroutable)?;
        let result = self.score(endpoint, request)?;
        Ok((endpoint, result))
    }

    fn churn(&self, vector: &FeatureVector) -> Result<ChurnAssessment, ScoringError> {
        // Churn is probed per call and never fails for lack of a model.
        let Scorer::Model(model) = self.models.scorer(ScoringEndpoint::Churn) else {
            let raw = heuristic::churn_risk(&ChurnFeatures::from_vector(vector));
            let risk_score = round_to(raw, 2);
            return Ok(ChurnAssessment {
                risk_score,
                status: ChurnStatus::from_risk(risk_score),
                model_used: HEURISTIC_MODEL,
            });
        };

        let churn_class = model
            .predict(vector)
            .map_err(model_failure(ScoringEndpoint::Churn))?;
        let probability = model
            .predict_probability(vector)
            .map_err(model_failure(ScoringEndpoint::Churn))?;
        let risk_score = round_to(probability.clamp(0.0, 1.0), 2);

        Ok(ChurnAssessment {
            risk_score,
            status: ChurnStatus::from_prediction(churn_class, risk_score),
            model_used: model.name(),
        })
    }

    fn inventory(&self, vector: &FeatureVector) -> Result<InventoryAssessment, ScoringError> {
        let Scorer::Model(model) = self.models.scorer(ScoringEndpoint::Inventory) else {
            let forecast = heuristic::stockout_forecast(&InventoryFeatures::from_vector(vector));
            return Ok(InventoryAssessment {
                days_until_stockout: Some(round_to(forecast.days_until_stockout, 2)),
                recommended_restock_qty: None,
                restock_urgent: forecast.restock_urgent,
                status: InventoryStatus::from_urgency(forecast.restock_urgent),
                model_used: HEURISTIC_MODEL,
            });
        };

        let quantity = model
            .predict(vector)
            .map_err(model_failure(ScoringEndpoint::Inventory))?;
        let quantity = quantity.max(0.0);
        let restock_urgent = quantity > 0.0;
        let quantity = round_to(quantity, 2);

        Ok(InventoryAssessment {
            days_until_stockout: None,
            recommended_restock_qty: Some(quantity),
            restock_urgent,
            status: InventoryStatus::from_urgency(restock_urgent),
            model_used: model.name(),
        })
    }

    fn lead(&self, vector: &FeatureVector) -> Result<LeadAssessment, ScoringError> {
        let (lead_score, model_used) = match self.models.scorer(ScoringEndpoint::Lead) {
            Scorer::Heuristic => (
                heuristic::lead_score(&LeadFeatures::from_vector(vector)),
                HEURISTIC_MODEL,
            ),
            Scorer::Model(model) => {
                let label = model
                    .predict(vector)
                    .map_err(model_failure(ScoringEndpoint::Lead))?;
                // The classifier is not calibrated, so each label maps to a fixed score.
                let score = if label >= 0.5 {
                    HOT_LEAD_SCORE
                } else {
                    COLD_LEAD_SCORE
                };
                (score, model.name())
            }
        };

        Ok(LeadAssessment {
            lead_score,
            status: LeadStatus::from_score(lead_score),
            model_used,
        })
    }

    fn expense(
        &self,
        vector: &FeatureVector,
        category: Option<String>,
    ) -> Result<ExpenseAssessment, ScoringError> {
        let scorer = self.models.scorer(ScoringEndpoint::Expense);
        let (is_anomaly, risk_score, model_used) = match scorer {
            Scorer::Heuristic => {
                let audit = heuristic::expense_audit(&ExpenseFeatures::from_vector(vector));
                (audit.is_anomaly, audit.risk_score, HEURISTIC_MODEL)
            }
            Scorer::Model(model) => {
                let label = model
                    .predict(vector)
                    .map_err(model_failure(ScoringEndpoint::Expense))?;
                let is_anomaly = label < 0.0;
                let risk_score = if is_anomaly {
                    ANOMALY_RISK_SCORE
                } else {
                    NORMAL_RISK_SCORE
                };
                (is_anomaly, risk_score, model.name())
            }
        };

        Ok(ExpenseAssessment {
            risk_score,
            is_fraud_risk: is_anomaly,
            status: ExpenseStatus::from_anomaly(is_anomaly),
            model_used,
            category,
        })
    }
}

fn model_failure(endpoint: ScoringEndpoint) -> impl Fn(ModelError) -> ScoringError {
    move |source| ScoringError::Model { endpoint, source }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChurnAssessment {
    pub risk_score: f64,
    pub status: ChurnStatus,
    pub model_used: &'static str,
}

/// Heuristic runs report days of cover; model runs report a restock quantity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryAssessment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_until_stockout: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_restock_qty: Option<f64>,
    pub restock_urgent: bool,
    pub status: InventoryStatus,
    pub model_used: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadAssessment {
    pub lead_score: u32,
    pub status: LeadStatus,
    pub model_used: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseAssessment {
    pub risk_score: f64,
    pub is_fraud_risk: bool,
    pub status: ExpenseStatus,
    pub model_used: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Outcome of one scoring chain, serialized flat into the response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScoreResult {
    Churn(ChurnAssessment),
    Inventory(InventoryAssessment),
    Lead(LeadAssessment),
    Expense(ExpenseAssessment),
}

impl ScoreResult {
    pub fn endpoint(&self) -> ScoringEndpoint {
        match self {
            ScoreResult::Churn(_) => ScoringEndpoint::Churn,
            ScoreResult::Inventory(_) => ScoringEndpoint::Inventory,
            ScoreResult::Lead(_) => ScoringEndpoint::Lead,
            ScoreResult::Expense(_) => ScoringEndpoint::Expense,
        }
    }

    pub fn status_label(&self) -> &'static str {
        match self {
            ScoreResult::Churn(assessment) => assessment.status.label(),
            ScoreResult::Inventory(assessment) => assessment.status.label(),
            ScoreResult::Lead(assessment) => assessment.status.label(),
            ScoreResult::Expense(assessment) => assessment.status.label(),
        }
    }

    pub fn model_used(&self) -> &'static str {
        match self {
            ScoreResult::Churn(assessment) => assessment.model_used,
            ScoreResult::Inventory(assessment) => assessment.model_used,
            ScoreResult::Lead(assessment) => assessment.model_used,
            ScoreResult::Expense(assessment) => assessment.model_used,
        }
    }
}

/// Failure of a single scoring chain; always terminal for that request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error(transparent)]
    Feature(#[from] FeatureError),
    #[error("{endpoint} model failed: {source}")]
    Model {
        endpoint: ScoringEndpoint,
        #[source]
        source: ModelError,
    },
    #[error("payload does not identify an endpoint; expected one of days_inactive, current_stock, budget, amount")]
    Unroutable,
}
