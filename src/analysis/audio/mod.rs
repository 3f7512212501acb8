//! Upload decoding and cleanup: in-memory decode, mono downmix, optional
//! resample and denoise, then edge silence trimming.

mod decode;
mod denoise;
mod resample;
mod silence;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PipelineError;


/// Default trim threshold in dB below the loudest frame.
pub const DEFAULT_TOP_DB: f32 = 20.0;

/// Mono floating-point audio at a known sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Waveform {
    /// Wrap mono samples; a zero sample rate is raised to 1 Hz.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate: sample_rate.max(1),
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_seconds(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Options applied while turning upload bytes into a [`Waveform`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioOptions {
    /// Frames quieter than this many dB below the loudest frame are trimmed from the edges.
    #[serde(default = "default_top_db")]
    pub top_db: f32,
    /// Resample to this rate; `None` keeps the file's native rate.
    #[serde(default)]
    pub target_sample_rate: Option<u32>,
    /// Apply stationary spectral gating before trimming.
    #[serde(default)]
    pub denoise: bool,
}

fn default_top_db() -> f32 {
    DEFAULT_TOP_DB
}

impl Default for AudioOptions {
    fn default() -> Self {
        Self {
            top_db: DEFAULT_TOP_DB,
            target_sample_rate: None,
            denoise: false,
        }
    }
}

/// Decode upload bytes with default options.
pub fn load(bytes: &[u8]) -> Result<Waveform, PipelineError> {
    load_with_options(bytes, &AudioOptions::default())
}

/// Decode upload bytes into a trimmed mono waveform.
pub fn load_with_options(bytes: &[u8], options: &AudioOptions) -> Result<Waveform, PipelineError> {
    let decoded = decode::decode_bytes(bytes)?;
    let mut sample_rate = decoded.sample_rate;
    let mut mono = decode::downmix_to_mono(&decoded.samples, decoded.channels);

    if let Some(target) = options.target_sample_rate.filter(|rate| *rate > 0) {
        if target != sample_rate {
            mono = resample::resample_linear(&mono, sample_rate, target);
            sample_rate = target;
        }
    }
    if options.denoise {
        mono = denoise::spectral_gate(&mono);
    }

    let decoded_len = mono.len();
    let trimmed = silence::trim_silence(&mono, options.top_db);
    debug!(
        sample_rate,
        decoded_len,
        trimmed_len = trimmed.len(),
        "Decoded upload audio"
    );
    Ok(Waveform::new(trimmed, sample_rate))
}
