use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::features::FeatureTensor;

use super::{CryLabel, ModelFamily, Predictor, RawOutput, flat_input};

/// One node of a binary decision tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// Go `left` when `features[feature] <= threshold`, otherwise `right`.
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
    },
    /// Terminal vote for a label table index.
    Leaf { class: usize },
}

/// Decision tree stored as a node arena rooted at index 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Walk from the root to a leaf. Children always sit after their parent,
    /// which `ForestModel::validate` enforces.
    pub fn predict(&self, features: &[f32]) -> usize {
        let mut index = 0usize;
        loop {
            match &self.nodes[index] {
                TreeNode::Leaf { class } => return *class,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features.get(*feature).copied().unwrap_or(0.0);
                    index = if value <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

/// Random forest classifier voting over the label table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestModel {
    /// Model format version.
    pub model_version: i64,
    /// Number of `f32` values per input vector.
    pub feature_len_f32: usize,
    /// Class order; must equal the label table.
    pub classes: Vec<CryLabel>,
    pub trees: Vec<DecisionTree>,
}

impl ForestModel {
    /// Validate structural invariants of the model.
    pub fn validate(&self) -> Result<(), String> {
        if self.classes.as_slice() != CryLabel::ALL.as_slice() {
            return Err("classes must match the label table order".to_string());
        }
        if self.feature_len_f32 == 0 {
            return Err("feature_len_f32 must be positive".to_string());
        }
        if self.trees.is_empty() {
            return Err("Forest must contain at least one tree".to_string());
        }
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(format!("Tree {tree_idx} has no nodes"));
            }
            for (node_idx, node) in tree.nodes.iter().enumerate() {
                match *node {
                    TreeNode::Leaf { class } if class >= self.classes.len() => {
                        return Err(format!(
                            "Tree {tree_idx} node {node_idx} votes for class {class} out of range"
                        ));
                    }
                    TreeNode::Split {
                        feature,
                        left,
                        right,
                        ..
                    } => {
                        if feature >= self.feature_len_f32 {
                            return Err(format!(
                                "Tree {tree_idx} node {node_idx} splits on feature {feature} out of range"
                            ));
                        }
                        for child in [left, right] {
                            if child <= node_idx || child >= tree.nodes.len() {
                                return Err(format!(
                                    "Tree {tree_idx} node {node_idx} has invalid child {child}"
                                ));
                            }
                        }
                    }
                    TreeNode::Leaf { .. } => {}
                }
            }
        }
        Ok(())
    }

    /// Load a model from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self, PipelineError> {
        let bytes = std::fs::read(path).map_err(|err| PipelineError::model_load(path, err))?;
        let model: Self =
            serde_json::from_slice(&bytes).map_err(|err| PipelineError::model_load(path, err))?;
        model
            .validate()
            .map_err(|err| PipelineError::model_load(path, err))?;
        Ok(model)
    }

    /// Vote counts per class.
    pub fn votes(&self, features: &[f32]) -> Vec<usize> {
        let mut votes = vec![0usize; self.classes.len()];
        for tree in &self.trees {
            votes[tree.predict(features)] += 1;
        }
        votes
    }

    /// Majority vote; ties go to the lowest class index.
    pub fn predict_class_index(&self, features: &[f32]) -> usize {
        let votes = self.votes(features);
        let mut best = 0usize;
        for (idx, &count) in votes.iter().enumerate() {
            if count > votes[best] {
                best = idx;
            }
        }
        best
    }
}

impl Predictor for ForestModel {
    fn family(&self) -> ModelFamily {
        ModelFamily::Forest
    }

    fn expected_shape(&self) -> Vec<usize> {
        vec![1, self.feature_len_f32]
    }

    fn score(&self, input: &FeatureTensor) -> Result<RawOutput, PipelineError> {
        let features = flat_input(input, self.feature_len_f32)?;
        Ok(RawOutput::ClassIndex(self.predict_class_index(features)))
    }
}
