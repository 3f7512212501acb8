use std::path::PathBuf;

use thiserror::Error;

use crate::ml::ModelFamily;

/// Reasons an upload was rejected before any pipeline stage ran.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Upload rejected: {}", .reasons.join("; "))]
pub struct ValidationError {
    /// Every violated check, in the order the checks ran.
    pub reasons: Vec<String>,
}

/// Failures raised by the feature extraction and inference pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The upload bytes are empty or not a supported audio container.
    #[error("Audio decode failed: {message}")]
    Decode { message: String },
    /// A zero-length signal reached a feature stage.
    #[error("Signal is empty after silence trimming")]
    EmptySignal,
    /// An adapted tensor does not match the model's expected input.
    #[error("Tensor shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    /// The registry slot for a model family was read before startup published it.
    #[error("The {0} model is not loaded; start the service with a configured model path")]
    ModelNotLoaded(ModelFamily),
    /// A second publish was attempted for an already loaded family.
    #[error("The {0} model is already loaded")]
    AlreadyLoaded(ModelFamily),
    /// Boundary validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A model artifact could not be read or parsed.
    #[error("Failed to load model from {path}: {message}")]
    ModelLoad { path: PathBuf, message: String },
    /// The model produced output that cannot be mapped onto the label table.
    #[error("Model output is invalid: {message}")]
    InvalidModelOutput { message: String },
    /// Extraction parameters are outside their supported range.
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },
    /// The spectrogram image could not be encoded.
    #[error("Spectrogram encoding failed: {message}")]
    Render { message: String },
    /// The worker pool has shut down or dropped the job.
    #[error("Pipeline worker unavailable")]
    WorkerUnavailable,
}

impl PipelineError {
    pub(crate) fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidModelOutput {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    pub(crate) fn model_load(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::ModelLoad {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Whether the error was caused by the uploaded content rather than the service.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Decode { .. } | Self::EmptySignal
        )
    }
}
