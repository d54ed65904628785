//! Trained-model capability and the JSON artifacts that provide it.
//!
//! An artifact is a single JSON document tagged by `kind`. Loading validates the
//! document against the endpoint's feature schema, so a handle that made it into the
//! engine can only fail at inference time on malformed numeric output.

mod forest;
mod isolation;
mod linear;

pub use forest::{ClassLeaf, DecisionTree, RandomForest, TreeNode};
pub use isolation::{IsolationForest, IsolationLeaf};
pub use linear::{LinearRegression, LogisticRegression};

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::features::{FeatureVector, ScoringEndpoint};

/// Shared read-only handle to a loaded model.
pub type ModelHandle = Arc<dyn PredictiveModel>;

/// Inference over an endpoint's feature vector.
pub trait PredictiveModel: Send + Sync + fmt::Debug {
    /// Class label, regression value, or anomaly label depending on the model family.
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError>;

    /// Probability of the positive class.
    fn predict_probability(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let _ = features;
        Err(ModelError::Unsupported {
            model: self.name(),
            capability: "predict_probability",
        })
    }

    /// Identifier reported as `model_used` in responses.
    fn name(&self) -> &'static str;

    fn feature_count(&self) -> usize;
}

/// Runtime inference failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("{model} expects {expected} features, received {found}")]
    FeatureCount {
        model: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("{model} does not support {capability}")]
    Unsupported {
        model: &'static str,
        capability: &'static str,
    },
    #[error("{model} produced a non-finite output")]
    NonFinite { model: &'static str },
}

pub(crate) fn check_width(
    model: &'static str,
    expected: usize,
    features: &FeatureVector,
) -> Result<(), ModelError> {
    if features.len() == expected {
        Ok(())
    } else {
        Err(ModelError::FeatureCount {
            model,
            expected,
            found: features.len(),
        })
    }
}

pub(crate) fn finite(model: &'static str, value: f64) -> Result<f64, ModelError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ModelError::NonFinite { model })
    }
}

/// Serialized model description.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    LogisticRegression(LogisticRegression),
    LinearRegression(LinearRegression),
    RandomForest(RandomForest),
    IsolationForest(IsolationForest),
}

impl ModelArtifact {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ModelArtifact::LogisticRegression(_) => "logistic_regression",
            ModelArtifact::LinearRegression(_) => "linear_regression",
            ModelArtifact::RandomForest(_) => "random_forest",
            ModelArtifact::IsolationForest(_) => "isolation_forest",
        }
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            ModelArtifact::LogisticRegression(model) => model.validate(),
            ModelArtifact::LinearRegression(model) => model.validate(),
            ModelArtifact::RandomForest(model) => model.validate(),
            ModelArtifact::IsolationForest(model) => model.validate(),
        }
    }

    /// Validates the artifact and checks its kind and width suit the endpoint.
    pub fn into_handle(self, endpoint: ScoringEndpoint) -> Result<ModelHandle, String> {
        if !endpoint.accepts(self.kind()) {
            return Err(format!(
                "{} model cannot score the {} endpoint",
                self.kind(),
                endpoint
            ));
        }
        self.validate()?;

        let handle: ModelHandle = match self {
            ModelArtifact::LogisticRegression(model) => Arc::new(model),
            ModelArtifact::LinearRegression(model) => Arc::new(model),
            ModelArtifact::RandomForest(model) => Arc::new(model),
            ModelArtifact::IsolationForest(model) => Arc::new(model),
        };

        if handle.feature_count() != endpoint.feature_count() {
            return Err(format!(
                "{} model takes {} features but the {} schema has {}",
                handle.name(),
                handle.feature_count(),
                endpoint,
                endpoint.feature_count()
            ));
        }

        Ok(handle)
    }
}

/// Loads the endpoint's artifact from `dir`; `Ok(None)` when the file does not exist.
pub fn load_artifact(
    dir: &Path,
    endpoint: ScoringEndpoint,
) -> Result<Option<ModelHandle>, ModelLoadError> {
    let path = dir.join(endpoint.artifact_file());

    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(ModelLoadError::Io { path, source }),
    };

    let artifact =
        ModelArtifact::from_json(&raw).map_err(|source| ModelLoadError::Parse {
            path: path.clone(),
            source,
        })?;

    artifact
        .into_handle(endpoint)
        .map(Some)
        .map_err(|reason| ModelLoadError::Invalid { path, reason })
}

/// Startup failure while reading model artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("failed to read model artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("model artifact {} is not valid JSON: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("model artifact {} is invalid: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
    #[error("{endpoint} model artifact {} is required in strict mode", path.display())]
    Missing {
        endpoint: ScoringEndpoint,
        path: PathBuf,
    },
}
