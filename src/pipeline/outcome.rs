use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ml::{ModelFamily, PredictionResult};

/// Structured result of one classified upload. Carries no markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub request_id: Uuid,
    pub filename: String,
    /// Original upload bytes, standard base64.
    pub audio_base64: String,
    /// Rendered spectrogram PNG, standard base64.
    pub spectrogram_base64: String,
    pub family: ModelFamily,
    pub prediction: PredictionResult,
}
