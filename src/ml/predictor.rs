use crate::error::PipelineError;
use crate::features::FeatureTensor;

use super::ModelFamily;

/// Unnormalized model output.
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutput {
    /// A single predicted index into the label table.
    ClassIndex(usize),
    /// One probability per label, in label table order.
    Probabilities(Vec<f32>),
}

/// Common scoring interface of every model family.
///
/// Implementations are immutable after loading and shared across worker
/// threads.
pub trait Predictor: Send + Sync {
    fn family(&self) -> ModelFamily;

    /// Input shape `score` accepts, including the batch axis.
    fn expected_shape(&self) -> Vec<usize>;

    fn score(&self, input: &FeatureTensor) -> Result<RawOutput, PipelineError>;
}
