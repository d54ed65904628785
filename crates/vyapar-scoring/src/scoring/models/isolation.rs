use serde::Deserialize;

use super::forest::DecisionTree;
use super::{check_width, finite, ModelError, PredictiveModel};
use crate::scoring::features::FeatureVector;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Leaf of an isolation tree; `size` is the training sample count that reached it.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct IsolationLeaf {
    pub size: usize,
}

/// Isolation forest anomaly detector.
///
/// `predict` yields `-1.0` for anomalies and `1.0` for normal points. A point is an
/// anomaly when its decision function `-score - offset` is negative, where `score`
/// is `2^(-E[h(x)] / c(sample_size))`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IsolationForest {
    pub n_features: usize,
    pub sample_size: usize,
    #[serde(default = "default_offset")]
    pub offset: f64,
    pub trees: Vec<DecisionTree<IsolationLeaf>>,
}

fn default_offset() -> f64 {
    -0.5
}

/// Average path length of an unsuccessful BST search over `n` points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

impl IsolationForest {
    const NAME: &'static str = "isolation_forest";

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.n_features == 0 {
            return Err("n_features must be positive".to_string());
        }
        if self.sample_size < 2 {
            return Err("sample_size must be at least 2".to_string());
        }
        if !self.offset.is_finite() {
            return Err("offset must be finite".to_string());
        }
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (position, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .map_err(|reason| format!("tree {position}: {reason}"))?;
        }
        Ok(())
    }

    /// Anomaly score in (0, 1]; values near 1 isolate quickly.
    pub fn anomaly_score(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        check_width(Self::NAME, self.n_features, features)?;
        let values = features.as_slice();

        let total_path: f64 = self
            .trees
            .iter()
            .map(|tree| {
                let (leaf, depth) = tree.descend(values);
                depth as f64 + average_path_length(leaf.size)
            })
            .sum();
        let mean_path = total_path / self.trees.len() as f64;

        finite(
            Self::NAME,
            2f64.powf(-mean_path / average_path_length(self.sample_size)),
        )
    }
}

impl PredictiveModel for IsolationForest {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let score = self.anomaly_score(features)?;
        let decision = -score - self.offset;
        Ok(if decision < 0.0 { -1.0 } else { 1.0 })
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn feature_count(&self) -> usize {
        self.n_features
    }
}
