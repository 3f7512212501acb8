use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::features::FeatureTensor;
use crate::ml::{CryLabel, ModelFamily, Predictor, RawOutput, argmax, flat_input};

/// Standardize, ReLU hidden layer, softmax output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpModel {
    pub model_version: i64,
    pub feature_len_f32: usize,
    /// Class order; must equal the label table.
    pub classes: Vec<CryLabel>,
    pub hidden_size: usize,
    /// Shape: `[hidden][input]`.
    pub weights1: Vec<f32>,
    pub bias1: Vec<f32>,
    /// Shape: `[classes][hidden]`.
    pub weights2: Vec<f32>,
    pub bias2: Vec<f32>,
    pub feature_mean: Vec<f32>,
    pub feature_std: Vec<f32>,
}

impl MlpModel {
    pub fn validate(&self) -> Result<(), String> {
        if self.classes.as_slice() != CryLabel::ALL.as_slice() {
            return Err("classes must match the label table order".to_string());
        }
        let input = self.feature_len_f32;
        let hidden = self.hidden_size;
        let classes = self.classes.len();
        if input == 0 || hidden == 0 {
            return Err("feature_len_f32 and hidden_size must be positive".to_string());
        }
        if self.weights1.len() != input * hidden {
            return Err("weights1 length mismatch".to_string());
        }
        if self.bias1.len() != hidden {
            return Err("bias1 length mismatch".to_string());
        }
        if self.weights2.len() != classes * hidden {
            return Err("weights2 length mismatch".to_string());
        }
        if self.bias2.len() != classes {
            return Err("bias2 length mismatch".to_string());
        }
        if self.feature_mean.len() != input {
            return Err("feature_mean length mismatch".to_string());
        }
        if self.feature_std.len() != input {
            return Err("feature_std length mismatch".to_string());
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

    /// Class probabilities; callers must pass exactly `feature_len_f32` values.
    pub fn predict_proba(&self, features: &[f32]) -> Vec<f32> {
        let input = self.feature_len_f32;
        let hidden = self.hidden_size;

        let normalized: Vec<f32> = features
            .iter()
            .zip(self.feature_mean.iter().zip(&self.feature_std))
            .map(|(&x, (&mean, &std))| (x - mean) / std.max(1e-6))
            .collect();

        let hidden_act: Vec<f32> = (0..hidden)
            .map(|h| {
                let row = &self.weights1[h * input..(h + 1) * input];
                let sum: f32 = row.iter().zip(&normalized).map(|(w, x)| w * x).sum();
                (sum + self.bias1[h]).max(0.0)
            })
            .collect();

        let logits: Vec<f32> = self
            .bias2
            .iter()
            .enumerate()
            .map(|(c, &bias)| {
                let row = &self.weights2[c * hidden..(c + 1) * hidden];
                bias + row.iter().zip(&hidden_act).map(|(w, h)| w * h).sum::<f32>()
            })
            .collect();

        softmax(&logits)
    }

    pub fn predict_class_index(&self, features: &[f32]) -> usize {
        argmax(&self.predict_proba(features))
    }
}

impl Predictor for MlpModel {
    fn family(&self) -> ModelFamily {
        ModelFamily::Dense
    }

    fn expected_shape(&self) -> Vec<usize> {
        vec![1, self.feature_len_f32]
    }

    fn score(&self, input: &FeatureTensor) -> Result<RawOutput, PipelineError> {
        let features = flat_input(input, self.feature_len_f32)?;
        Ok(RawOutput::ClassIndex(self.predict_class_index(features)))
    }
}

/// Numerically stable softmax.
fn softmax(raw: &[f32]) -> Vec<f32> {
    if raw.is_empty() {
        return Vec::new();
    }
    let max = raw.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = raw.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return vec![1.0 / raw.len() as f32; raw.len()];
    }
    exps.into_iter().map(|e| e / sum).collect()
}
