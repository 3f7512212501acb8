//! Classifier families, output normalization and the model registry.
//!
//! Every family implements [`Predictor`]; [`dispatch::predict`] turns raw
//! scores into a ranked [`PredictionResult`] over the fixed label table.

mod cnn;
pub mod dispatch;
mod family;
mod forest;
mod labels;
mod mlp;
mod predictor;
mod registry;

pub use cnn::{CnnConfig, CnnModel, CryCnn};
pub use dispatch::{LabelScore, PredictionMode, PredictionResult, predict, predict_with_registry};
pub use family::{InputKind, ModelFamily, ModelPaths};
pub use forest::{DecisionTree, ForestModel, TreeNode};
pub use labels::CryLabel;
pub use mlp::MlpModel;
pub use predictor::{Predictor, RawOutput};
pub use registry::{ModelHandle, ModelRegistry};

use crate::error::PipelineError;
use crate::features::FeatureTensor;

/// Borrow a flat input of exactly `len` values.
pub(crate) fn flat_input(input: &FeatureTensor, len: usize) -> Result<&[f32], PipelineError> {
    match input {
        FeatureTensor::Flat(vector) if vector.len() == len => Ok(vector.data()),
        other => Err(PipelineError::ShapeMismatch {
            expected: vec![1, len],
            actual: other.shape(),
        }),
    }
}

/// Index of the largest value; ties go to the lowest index.
pub(crate) fn argmax(values: &[f32]) -> usize {
    let mut best_idx = 0usize;
    let mut best_val = f32::NEG_INFINITY;
    for (idx, &v) in values.iter().enumerate() {
        if v > best_val {
            best_val = v;
            best_idx = idx;
        }
    }
    best_idx
}
