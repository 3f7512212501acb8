//! End-to-end request execution: validate, decode, render, extract, adapt,
//! predict.

mod outcome;
mod upload;
mod workers;

use std::sync::Arc;
use std::time::Instant;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use tracing::{debug, info, info_span};
use uuid::Uuid;

use crate::analysis::audio::{self, AudioOptions};
use crate::analysis::mfcc::{self, MfccParams};
use crate::analysis::spectrogram;
use crate::config::{AppConfig, FeatureSettings};
use crate::error::PipelineError;
use crate::features::{self, FeatureTensor};
use crate::ml::{self, InputKind, ModelFamily, ModelRegistry};

pub use outcome::PipelineOutcome;
pub use upload::{
    FILE_REQUIRED, UNSUPPORTED_FORMAT, UploadForm, content_type_for_path, validate_upload,
};
pub use workers::{PendingClassification, PipelineWorkers};

/// Stateless request executor over a shared model registry.
#[derive(Clone)]
pub struct Pipeline {
    registry: Arc<ModelRegistry>,
    audio: AudioOptions,
    mfcc: MfccParams,
    features: FeatureSettings,
}

impl Pipeline {
    pub fn new(registry: Arc<ModelRegistry>, config: &AppConfig) -> Self {
        Self {
            registry,
            audio: config.audio.clone(),
            mfcc: config.mfcc.clone(),
            features: config.features.clone(),
        }
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// Classify one upload with the given family.
    ///
    /// Validation failures return before any stage runs; any later failure
    /// aborts the request without a partial outcome.
    pub fn classify(
        &self,
        form: &UploadForm,
        family: ModelFamily,
    ) -> Result<PipelineOutcome, PipelineError> {
        validate_upload(form)?;
        let request_id = Uuid::new_v4();
        let span = info_span!("classify", %request_id, %family);
        let _guard = span.enter();
        let started = Instant::now();

        let model = self.registry.get(family)?;
        let waveform = audio::load_with_options(&form.bytes, &self.audio)?;
        debug!(
            samples = waveform.len(),
            sample_rate = waveform.sample_rate(),
            "Decoded upload"
        );
        let rendered = spectrogram::render(&waveform)?;

        let tensor: FeatureTensor = match family.input_kind() {
            InputKind::Image => {
                features::to_image_tensor(&rendered, self.features.image_size)?.into()
            }
            InputKind::Flat => {
                let mfcc = mfcc::extract(&waveform, &self.mfcc)?;
                features::to_flat_vector(&mfcc, self.features.flat_length)?.into()
            }
        };
        let prediction = ml::predict(model.as_ref(), &tensor)?;

        info!(
            top = ?prediction.top(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Classified upload"
        );
        Ok(PipelineOutcome {
            request_id,
            filename: form.display_name().to_string(),
            audio_base64: STANDARD.encode(&form.bytes),
            spectrogram_base64: rendered.to_base64()?,
            family,
            prediction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_pipeline() -> Pipeline {
        Pipeline::new(Arc::new(ModelRegistry::new()), &AppConfig::default())
    }

    #[test]
    fn validation_runs_before_registry_lookup() {
        let form = UploadForm::new("notes.txt", "text/plain", b"not audio".to_vec());
        match empty_pipeline().classify(&form, ModelFamily::Forest) {
            Err(PipelineError::Validation(err)) => {
                assert_eq!(err.reasons, vec![UNSUPPORTED_FORMAT.to_string()]);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn unloaded_family_is_reported_before_decoding() {
        let form = UploadForm::new("cry.wav", "audio/wav", b"garbage".to_vec());
        assert!(matches!(
            empty_pipeline().classify(&form, ModelFamily::Dense),
            Err(PipelineError::ModelNotLoaded(ModelFamily::Dense))
        ));
    }
}
