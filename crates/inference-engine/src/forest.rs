//! Native Decision-Forest Ensemble
//!
//! Evaluates a soft-voting ensemble of tree estimators exported to JSON by
//! the offline training job. Each estimator averages its trees' leaf class
//! distributions; the ensemble takes the weighted mean across estimators.

use feature_engine::{FeatureVector, FEATURE_DIMENSION};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::model::RiskModel;
use crate::InferenceError;

/// A single tree node. Splits send `x[feature] <= threshold` left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Class counts or probabilities; normalised on evaluation
        value: Vec<f64>,
    },
}

/// Decision tree stored as a flat node array, root at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Walk the tree and return the normalised leaf distribution
    fn leaf_distribution(&self, values: &[f64]) -> Result<Vec<f64>, InferenceError> {
        let mut index = 0;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes
        for _ in 0..self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    index = if values[*feature] <= *threshold { *left } else { *right };
                }
                Some(TreeNode::Leaf { value }) => return Ok(normalise(value)),
                None => {
                    return Err(InferenceError::InferenceFailed(format!(
                        "node index {} out of bounds",
                        index
                    )))
                }
            }
        }
        Err(InferenceError::InferenceFailed(
            "tree walk did not reach a leaf".to_string(),
        ))
    }

    fn validate(&self, n_classes: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if !threshold.is_finite() {
                        return Err(format!("node {} has a non-finite threshold", i));
                    }
                    if *feature >= FEATURE_DIMENSION {
                        return Err(format!("node {} splits on unknown feature {}", i, feature));
                    }
                    if *left >= self.nodes.len() || *right >= self.nodes.len() {
                        return Err(format!("node {} has a child out of bounds", i));
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.len() != n_classes {
                        return Err(format!(
                            "leaf {} has {} classes, expected {}",
                            i,
                            value.len(),
                            n_classes
                        ));
                    }
                    if value.iter().any(|v| !v.is_finite() || *v < 0.0) {
                        return Err(format!("leaf {} has a negative or non-finite value", i));
                    }
                }
            }
        }
        Ok(())
    }
}

fn one() -> f64 {
    1.0
}

/// One voting member of the ensemble (e.g. a random forest)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimator {
    pub name: String,
    #[serde(default = "one")]
    pub weight: f64,
    pub trees: Vec<DecisionTree>,
}

impl Estimator {
    fn predict_probability(&self, values: &[f64], n_classes: usize) -> Result<Vec<f64>, InferenceError> {
        let mut probabilities = vec![0.0; n_classes];
        for tree in &self.trees {
            let leaf = tree.leaf_distribution(values)?;
            for (p, v) in probabilities.iter_mut().zip(leaf.iter()) {
                *p += v;
            }
        }
        let n = self.trees.len() as f64;
        probabilities.iter_mut().for_each(|p| *p /= n);
        Ok(probabilities)
    }
}

/// Soft-voting tree ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub n_classes: usize,
    pub estimators: Vec<Estimator>,
}

impl TreeEnsemble {
    /// Load and validate an ensemble from a JSON file
    pub fn from_path(path: &Path) -> Result<Self, InferenceError> {
        let raw = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                InferenceError::ModelUnavailable(format!("{} not found", path.display()))
            }
            _ => InferenceError::ModelLoadError(format!("{}: {}", path.display(), e)),
        })?;
        let ensemble: TreeEnsemble = serde_json::from_str(&raw)
            .map_err(|e| InferenceError::ModelLoadError(format!("{}: {}", path.display(), e)))?;
        ensemble.validate()?;

        info!(
            "Loaded tree ensemble from {}: {} estimators, {} classes",
            path.display(),
            ensemble.estimators.len(),
            ensemble.n_classes
        );
        Ok(ensemble)
    }

    /// Structural checks so evaluation can index without panicking
    pub fn validate(&self) -> Result<(), InferenceError> {
        let fail = |msg: String| Err(InferenceError::ModelLoadError(msg));

        if self.n_classes == 0 {
            return fail("ensemble declares zero classes".to_string());
        }
        if self.estimators.is_empty() {
            return fail("ensemble has no estimators".to_string());
        }
        for estimator in &self.estimators {
            if estimator.trees.is_empty() {
                return fail(format!("estimator '{}' has no trees", estimator.name));
            }
            if !(estimator.weight > 0.0 && estimator.weight.is_finite()) {
                return fail(format!(
                    "estimator '{}' has a non-positive or non-finite weight",
                    estimator.name
                ));
            }
            for tree in &estimator.trees {
                if let Err(msg) = tree.validate(self.n_classes) {
                    return fail(format!("estimator '{}': {}", estimator.name, msg));
                }
            }
        }
        Ok(())
    }
}

impl RiskModel for TreeEnsemble {
    fn predict(&self, features: &FeatureVector) -> Result<usize, InferenceError> {
        let probabilities = self.predict_probability(features)?;
        Ok(argmax(&probabilities))
    }

    fn predict_probability(&self, features: &FeatureVector) -> Result<Vec<f64>, InferenceError> {
        let values = features.as_slice();
        let mut votes = vec![0.0; self.n_classes];
        let mut total_weight = 0.0;

        for estimator in &self.estimators {
            let probabilities = estimator.predict_probability(values, self.n_classes)?;
            for (vote, p) in votes.iter_mut().zip(probabilities.iter()) {
                *vote += estimator.weight * p;
            }
            total_weight += estimator.weight;
        }

        votes.iter_mut().for_each(|v| *v /= total_weight);
        debug!("Ensemble vote: {:?}", votes);
        Ok(votes)
    }

    fn name(&self) -> &str {
        "tree_ensemble"
    }
}

fn normalise(value: &[f64]) -> Vec<f64> {
    let total: f64 = value.iter().sum();
    if total > 0.0 {
        value.iter().map(|v| v / total).collect()
    } else {
        vec![1.0 / value.len() as f64; value.len()]
    }
}

/// Index of the largest value; ties go to the lowest index
pub(crate) fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best, max), (i, &v)| {
            if v > max {
                (i, v)
            } else {
                (best, max)
            }
        })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;
    use feature_engine::engineer;

    /// Stump on contamination: <= 0.3 is class 1 (low), else class 0 (high)
    fn stump(low_counts: Vec<f64>, high_counts: Vec<f64>) -> DecisionTree {
        DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: 2,
                    threshold: 0.3,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { value: low_counts },
                TreeNode::Leaf { value: high_counts },
            ],
        }
    }

    fn ensemble() -> TreeEnsemble {
        TreeEnsemble {
            n_classes: 3,
            estimators: vec![
                Estimator {
                    name: "random_forest".to_string(),
                    weight: 1.0,
                    trees: vec![
                        stump(vec![0.0, 9.0, 1.0], vec![8.0, 0.0, 2.0]),
                        stump(vec![0.0, 10.0, 0.0], vec![6.0, 0.0, 4.0]),
                    ],
                },
                Estimator {
                    name: "gradient_boosting".to_string(),
                    weight: 1.0,
                    trees: vec![stump(vec![0.1, 0.8, 0.1], vec![0.7, 0.1, 0.2])],
                },
            ],
        }
    }

    #[test]
    fn test_soft_vote_probabilities() {
        let model = ensemble();
        let probabilities = model
            .predict_probability(&engineer(50.0, 7.0, 0.05, 0))
            .unwrap();

        // RF: (0.9 + 1.0) / 2 = 0.95 low; GB: 0.8 low; mean 0.875
        assert!((probabilities[1] - 0.875).abs() < 1e-12);
        assert!((probabilities.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert_eq!(model.predict(&engineer(50.0, 7.0, 0.05, 0)).unwrap(), 1);
    }

    #[test]
    fn test_right_branch() {
        let model = ensemble();
        assert_eq!(model.predict(&engineer(50.0, 7.0, 0.6, 0)).unwrap(), 0);
    }

    #[test]
    fn test_validate_rejects_bad_structure() {
        let mut model = ensemble();
        model.estimators[0].trees[0].nodes[0] = TreeNode::Split {
            feature: 12,
            threshold: 0.0,
            left: 1,
            right: 2,
        };
        assert!(matches!(model.validate(), Err(InferenceError::ModelLoadError(_))));

        let mut model = ensemble();
        model.estimators[1].trees[0].nodes[1] = TreeNode::Leaf { value: vec![1.0] };
        assert!(model.validate().is_err());

        let mut model = ensemble();
        model.estimators.clear();
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut model = ensemble();
        model.estimators[0].trees[0].nodes[1] = TreeNode::Leaf {
            value: vec![-1.0, 2.0, 0.0],
        };
        assert!(matches!(model.validate(), Err(InferenceError::ModelLoadError(_))));

        let mut model = ensemble();
        model.estimators[1].trees[0].nodes[2] = TreeNode::Leaf {
            value: vec![f64::NAN, 1.0, 0.0],
        };
        assert!(model.validate().is_err());

        let mut model = ensemble();
        model.estimators[0].trees[1].nodes[0] = TreeNode::Split {
            feature: 2,
            threshold: f64::NAN,
            left: 1,
            right: 2,
        };
        assert!(model.validate().is_err());

        let mut model = ensemble();
        model.estimators[1].weight = f64::INFINITY;
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_negative_leaf_json_rejected() {
        let json = r#"{
            "n_classes": 3,
            "estimators": [{
                "name": "rf",
                "trees": [{"nodes": [{"type": "leaf", "value": [-1.0, 2.0, 0.0]}]}]
            }]
        }"#;
        let model: TreeEnsemble = serde_json::from_str(json).unwrap();
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_cycle_is_an_error_not_a_hang() {
        let tree = DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: 0,
                    threshold: 1e9,
                    left: 1,
                    right: 1,
                },
                TreeNode::Split {
                    feature: 0,
                    threshold: 1e9,
                    left: 0,
                    right: 0,
                },
            ],
        };
        assert!(tree.leaf_distribution(&[0.0; FEATURE_DIMENSION]).is_err());
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{
            "n_classes": 3,
            "estimators": [{
                "name": "rf",
                "trees": [{"nodes": [{"type": "leaf", "value": [1, 3, 0]}]}]
            }]
        }"#;
        let model: TreeEnsemble = serde_json::from_str(json).unwrap();
        model.validate().unwrap();
        assert_eq!(model.estimators[0].weight, 1.0);
        let probabilities = model.predict_probability(&FeatureVector::default()).unwrap();
        assert_eq!(probabilities, vec![0.25, 0.75, 0.0]);
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let err = TreeEnsemble::from_path(Path::new("/nonexistent/forest.json")).unwrap_err();
        assert!(matches!(err, InferenceError::ModelUnavailable(_)));
    }

    #[test]
    fn test_argmax_ties_pick_first() {
        assert_eq!(argmax(&[0.4, 0.4, 0.2]), 0);
        assert_eq!(argmax(&[0.1, 0.2, 0.7]), 2);
    }
}
