//! Request dispatch and scoring contract for the churn, inventory, lead and expense
//! endpoints.
//!
//! Each request runs one linear chain: feature extraction, a heuristic or
//! model-backed scorer, then the decision mapper that attaches a status label.

pub mod decision;
pub mod engine;
pub mod features;
pub mod heuristic;
pub mod models;
pub mod request;
pub mod router;

#[cfg(test)]
mod tests;

pub use decision::{ChurnStatus, ExpenseStatus, InventoryStatus, LeadStatus};
pub use engine::{
    ChurnAssessment, ExpenseAssessment, InventoryAssessment, LeadAssessment, ModelSet,
    ScoreResult, Scorer, ScoringEngine, ScoringError, HEURISTIC_MODEL,
};
pub use features::{FeatureVector, ScoringEndpoint};
pub use models::{ModelArtifact, ModelError, ModelHandle, ModelLoadError, PredictiveModel};
pub use request::{FeatureError, ScoringRequest};
pub use router::{scoring_router, DispatchError, ErrorResponse, ScoringResponse};
