use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::features::FeatureTensor;

use super::{CryLabel, ModelFamily, ModelRegistry, Predictor, RawOutput};

/// How the model's output was normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMode {
    SingleLabel,
    Distribution,
}

/// One label with its confidence in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: CryLabel,
    pub percent: f32,
}

/// Normalized classifier output, highest confidence first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub mode: PredictionMode,
    pub scores: Vec<LabelScore>,
}

impl PredictionResult {
    pub fn top(&self) -> Option<CryLabel> {
        self.scores.first().map(|score| score.label)
    }

    pub fn percent_for(&self, label: CryLabel) -> Option<f32> {
        self.scores
            .iter()
            .find(|score| score.label == label)
            .map(|score| score.percent)
    }
}

/// Score `input` with `model` and normalize the output.
pub fn predict(model: &dyn Predictor, input: &FeatureTensor) -> Result<PredictionResult, PipelineError> {
    let expected = model.expected_shape();
    let actual = input.shape();
    if expected != actual {
        return Err(PipelineError::ShapeMismatch { expected, actual });
    }
    normalize(model.score(input)?)
}

/// Look up the family's model and predict; an empty slot is `ModelNotLoaded`.
pub fn predict_with_registry(
    registry: &ModelRegistry,
    family: ModelFamily,
    input: &FeatureTensor,
) -> Result<PredictionResult, PipelineError> {
    let model = registry.get(family)?;
    predict(model.as_ref(), input)
}

pub(crate) fn normalize(raw: RawOutput) -> Result<PredictionResult, PipelineError> {
    match raw {
        RawOutput::ClassIndex(index) => single_label(index),
        RawOutput::Probabilities(probabilities) => distribution(&probabilities),
    }
}

fn single_label(index: usize) -> Result<PredictionResult, PipelineError> {
    let label = CryLabel::from_index(index).ok_or_else(|| {
        PipelineError::invalid_output(format!(
            "class index {index} outside label table of {}",
            CryLabel::ALL.len()
        ))
    })?;
    Ok(PredictionResult {
        mode: PredictionMode::SingleLabel,
        scores: vec![LabelScore {
            label,
            percent: 100.0,
        }],
    })
}

fn distribution(probabilities: &[f32]) -> Result<PredictionResult, PipelineError> {
    if probabilities.len() != CryLabel::ALL.len() {
        return Err(PipelineError::invalid_output(format!(
            "expected {} probabilities, got {}",
            CryLabel::ALL.len(),
            probabilities.len()
        )));
    }
    if probabilities.iter().any(|p| !p.is_finite() || *p < 0.0) {
        return Err(PipelineError::invalid_output(
            "probabilities must be finite and non-negative",
        ));
    }
    let mut scores: Vec<LabelScore> = CryLabel::ALL
        .iter()
        .zip(probabilities)
        .map(|(&label, &p)| LabelScore {
            label,
            percent: round_percent(p),
        })
        .collect();
    // Stable: equal confidences keep label table order.
    scores.sort_by(|a, b| b.percent.total_cmp(&a.percent));
    Ok(PredictionResult {
        mode: PredictionMode::Distribution,
        scores,
    })
}

/// Probability to percent, rounded to two decimals.
fn round_percent(probability: f32) -> f32 {
    (probability * 10_000.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FlatVector;

    struct Fixed {
        output: RawOutput,
    }

    impl Predictor for Fixed {
        fn family(&self) -> ModelFamily {
            ModelFamily::Forest
        }

        fn expected_shape(&self) -> Vec<usize> {
            vec![1, 4]
        }

        fn score(&self, _input: &FeatureTensor) -> Result<RawOutput, PipelineError> {
            Ok(self.output.clone())
        }
    }

    fn flat(len: usize) -> FeatureTensor {
        FeatureTensor::Flat(FlatVector::new(vec![0.0; len]))
    }

    #[test]
    fn class_index_maps_to_single_label_at_full_confidence() {
        let model = Fixed {
            output: RawOutput::ClassIndex(2),
        };
        let result = predict(&model, &flat(4)).unwrap();
        assert_eq!(result.mode, PredictionMode::SingleLabel);
        assert_eq!(
            result.scores,
            vec![LabelScore {
                label: CryLabel::Discomfort,
                percent: 100.0
            }]
        );
    }

    #[test]
    fn distribution_is_ranked_with_stable_ties() {
        let result =
            normalize(RawOutput::Probabilities(vec![0.1, 0.05, 0.6, 0.2, 0.05])).unwrap();
        let ranked: Vec<(CryLabel, f32)> = result
            .scores
            .iter()
            .map(|score| (score.label, score.percent))
            .collect();
        assert_eq!(
            ranked,
            vec![
                (CryLabel::Discomfort, 60.0),
                (CryLabel::Hungry, 20.0),
                (CryLabel::BellyPain, 10.0),
                (CryLabel::Burping, 5.0),
                (CryLabel::Tired, 5.0),
            ]
        );
        assert_eq!(result.top(), Some(CryLabel::Discomfort));
    }

    #[test]
    fn all_equal_probabilities_keep_table_order() {
        let result = normalize(RawOutput::Probabilities(vec![0.2; 5])).unwrap();
        let labels: Vec<CryLabel> = result.scores.iter().map(|s| s.label).collect();
        assert_eq!(labels, CryLabel::ALL.to_vec());
    }

    #[test]
    fn percentages_sum_to_one_hundred() {
        for probs in [
            vec![0.123_4, 0.234_5, 0.345_6, 0.100_0, 0.196_5],
            vec![1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0, 0.0, 0.0],
            vec![0.999, 0.000_25, 0.000_25, 0.000_25, 0.000_25],
        ] {
            let result = normalize(RawOutput::Probabilities(probs)).unwrap();
            let sum: f32 = result.scores.iter().map(|s| s.percent).sum();
            assert!((sum - 100.0).abs() <= 0.1, "sum {sum}");
        }
    }

    #[test]
    fn malformed_outputs_are_rejected() {
        assert!(matches!(
            normalize(RawOutput::ClassIndex(5)),
            Err(PipelineError::InvalidModelOutput { .. })
        ));
        assert!(matches!(
            normalize(RawOutput::Probabilities(vec![0.5, 0.5])),
            Err(PipelineError::InvalidModelOutput { .. })
        ));
        assert!(matches!(
            normalize(RawOutput::Probabilities(vec![f32::NAN, 0.0, 0.0, 0.0, 1.0])),
            Err(PipelineError::InvalidModelOutput { .. })
        ));
    }

    #[test]
    fn shape_is_checked_before_scoring() {
        let model = Fixed {
            output: RawOutput::ClassIndex(0),
        };
        match predict(&model, &flat(3)) {
            Err(PipelineError::ShapeMismatch { expected, actual }) => {
                assert_eq!(expected, vec![1, 4]);
                assert_eq!(actual, vec![1, 3]);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn empty_registry_slot_is_model_not_loaded() {
        let registry = ModelRegistry::new();
        assert!(matches!(
            predict_with_registry(&registry, ModelFamily::Cnn, &flat(4)),
            Err(PipelineError::ModelNotLoaded(ModelFamily::Cnn))
        ));
    }
}
