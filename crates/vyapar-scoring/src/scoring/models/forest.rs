use serde::Deserialize;

use super::{check_width, finite, ModelError, PredictiveModel};
use crate::scoring::features::FeatureVector;

/// Flattened tree node. Children are indices into the owning tree's node list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TreeNode<L> {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf(L),
}

/// Binary decision tree stored in pre-order; the root is node 0.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(bound(deserialize = "L: Deserialize<'de>"))]
pub struct DecisionTree<L> {
    pub nodes: Vec<TreeNode<L>>,
}

impl<L> DecisionTree<L> {
    /// Children must point strictly forward, which also rules out cycles.
    pub(crate) fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        for (index, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } = node
            {
                if *feature >= n_features {
                    return Err(format!(
                        "node {index} splits on feature {feature} of {n_features}"
                    ));
                }
                if !threshold.is_finite() {
                    return Err(format!("node {index} has a non-finite threshold"));
                }
                for child in [*left, *right] {
                    if child <= index || child >= self.nodes.len() {
                        return Err(format!("node {index} has out-of-order child {child}"));
                    }
                }
            }
        }

        Ok(())
    }

    /// Walks to a leaf, returning it with its depth. Values equal to a threshold go left.
    pub(crate) fn descend(&self, values: &[f64]) -> (&L, usize) {
        let mut index = 0;
        let mut depth = 0;

        loop {
            match &self.nodes[index] {
                TreeNode::Leaf(leaf) => return (leaf, depth),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if values[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                    depth += 1;
                }
            }
        }
    }
}

/// Leaf of a classification tree holding the positive-class fraction.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ClassLeaf {
    pub value: f64,
}

/// Bagged ensemble of classification trees.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    pub trees: Vec<DecisionTree<ClassLeaf>>,
}

impl RandomForest {
    const NAME: &'static str = "random_forest";

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.n_features == 0 {
            return Err("n_features must be positive".to_string());
        }
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (position, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .map_err(|reason| format!("tree {position}: {reason}"))?;
            let leaf_out_of_range = tree.nodes.iter().any(|node| {
                matches!(node, TreeNode::Leaf(ClassLeaf { value }) if !(0.0..=1.0).contains(value))
            });
            if leaf_out_of_range {
                return Err(format!("tree {position}: leaf values must lie within [0, 1]"));
            }
        }
        Ok(())
    }
}

impl PredictiveModel for RandomForest {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let probability = self.predict_probability(features)?;
        Ok(if probability >= 0.5 { 1.0 } else { 0.0 })
    }

    fn predict_probability(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        check_width(Self::NAME, self.n_features, features)?;
        let values = features.as_slice();
        let total: f64 = self
            .trees
            .iter()
            .map(|tree| tree.descend(values).0.value)
            .sum();
        finite(Self::NAME, total / self.trees.len() as f64)
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn feature_count(&self) -> usize {
        self.n_features
    }
}
