//! Classic MFCC extraction: pre-emphasis, framing, Hamming window, power
//! spectrum, Mel filterbank, log, orthonormal DCT-II, fixed frame count.

mod dct;
mod filterbank;
mod framing;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::audio::Waveform;
use crate::analysis::fft::FftPlan;
use crate::error::PipelineError;

use filterbank::MelFilterbank;

/// Extraction parameters. Defaults match the models' training setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MfccParams {
    #[serde(default = "default_pre_emphasis")]
    pub pre_emphasis: f32,
    #[serde(default = "default_frame_size")]
    pub frame_size_seconds: f32,
    #[serde(default = "default_frame_stride")]
    pub frame_stride_seconds: f32,
    /// Power-of-two FFT size; frames are truncated or zero padded to it.
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    #[serde(default = "default_mel_filter_count")]
    pub mel_filter_count: usize,
    /// Coefficients kept after dropping the zeroth.
    #[serde(default = "default_cepstral_coeff_count")]
    pub cepstral_coeff_count: usize,
    /// Rows in the output; shorter clips are zero padded, longer ones truncated.
    #[serde(default = "default_fixed_frame_count")]
    pub fixed_frame_count: usize,
}

/// Upper bound for frame size and stride.
const MAX_FRAME_SECONDS: f32 = 1.0;

fn default_pre_emphasis() -> f32 {
    0.97
}

fn default_frame_size() -> f32 {
    0.025
}

fn default_frame_stride() -> f32 {
    0.01
}

fn default_fft_size() -> usize {
    512
}

fn default_mel_filter_count() -> usize {
    40
}

fn default_cepstral_coeff_count() -> usize {
    12
}

fn default_fixed_frame_count() -> usize {
    100
}

impl Default for MfccParams {
    fn default() -> Self {
        Self {
            pre_emphasis: default_pre_emphasis(),
            frame_size_seconds: default_frame_size(),
            frame_stride_seconds: default_frame_stride(),
            fft_size: default_fft_size(),
            mel_filter_count: default_mel_filter_count(),
            cepstral_coeff_count: default_cepstral_coeff_count(),
            fixed_frame_count: default_fixed_frame_count(),
        }
    }
}

impl MfccParams {
    fn validate(&self) -> Result<(), PipelineError> {
        if self.fft_size == 0 || !self.fft_size.is_power_of_two() {
            return Err(PipelineError::invalid_parameter(format!(
                "fft_size must be a non-zero power of two, got {}",
                self.fft_size
            )));
        }
        if self.mel_filter_count == 0 || self.cepstral_coeff_count == 0 {
            return Err(PipelineError::invalid_parameter(
                "mel_filter_count and cepstral_coeff_count must be positive",
            ));
        }
        if self.cepstral_coeff_count >= self.mel_filter_count {
            return Err(PipelineError::invalid_parameter(format!(
                "cepstral_coeff_count {} must be below mel_filter_count {}",
                self.cepstral_coeff_count, self.mel_filter_count
            )));
        }
        if self.fixed_frame_count == 0 {
            return Err(PipelineError::invalid_parameter(
                "fixed_frame_count must be positive",
            ));
        }
        for (name, value) in [
            ("frame_size_seconds", self.frame_size_seconds),
            ("frame_stride_seconds", self.frame_stride_seconds),
        ] {
            if !(value > 0.0 && value <= MAX_FRAME_SECONDS) {
                return Err(PipelineError::invalid_parameter(format!(
                    "{name} must be in (0, {MAX_FRAME_SECONDS}] seconds, got {value}"
                )));
            }
        }
        if !self.pre_emphasis.is_finite() {
            return Err(PipelineError::invalid_parameter(
                "pre_emphasis must be finite",
            ));
        }
        Ok(())
    }
}

/// Row-major `frames x coeffs` matrix of cepstral coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct MfccMatrix {
    frames: usize,
    coeffs: usize,
    data: Vec<f32>,
}

impl MfccMatrix {
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn coeffs(&self) -> usize {
        self.coeffs
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn row(&self, frame: usize) -> &[f32] {
        &self.data[frame * self.coeffs..(frame + 1) * self.coeffs]
    }

    #[cfg(test)]
    pub(crate) fn from_rows(frames: usize, coeffs: usize, data: Vec<f32>) -> Self {
        assert_eq!(frames * coeffs, data.len());
        Self {
            frames,
            coeffs,
            data,
        }
    }
}

/// Compute the fixed-size MFCC matrix of a waveform.
pub fn extract(waveform: &Waveform, params: &MfccParams) -> Result<MfccMatrix, PipelineError> {
    params.validate()?;
    if waveform.is_empty() {
        return Err(PipelineError::EmptySignal);
    }
    let sr = waveform.sample_rate() as f32;
    let frame_len = ((params.frame_size_seconds * sr).round() as usize).max(1);
    let step = ((params.frame_stride_seconds * sr).round() as usize).max(1);

    let emphasized = framing::pre_emphasis(waveform.samples(), params.pre_emphasis);
    let frames = framing::windowed_frames(&emphasized, frame_len, step);

    let plan = FftPlan::new(params.fft_size)?;
    let bank = MelFilterbank::new(waveform.sample_rate(), plan.len(), params.mel_filter_count);
    let coeffs = params.cepstral_coeff_count;
    let rows = params.fixed_frame_count;

    let mut data = vec![0.0_f32; rows * coeffs];
    let mut scratch = Vec::with_capacity(plan.len());
    let mut power = vec![0.0_f32; plan.bins()];
    for (row, frame) in frames.iter().take(rows).enumerate() {
        plan.power_spectrum_into(frame, &mut scratch, &mut power)?;
        let log_energies = bank.log_energies(&power);
        let cepstrum = dct::dct_ii_ortho(&log_energies, 1, coeffs);
        data[row * coeffs..(row + 1) * coeffs].copy_from_slice(&cepstrum);
    }
    debug!(
        frame_len,
        step,
        computed_frames = frames.len(),
        filters = bank.len(),
        "Extracted MFCC"
    );
    Ok(MfccMatrix {
        frames: rows,
        coeffs,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noise(len: usize) -> Vec<f32> {
        let mut state = 0x1234_5678_u32;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state as f32 / u32::MAX as f32) - 0.5
            })
            .collect()
    }

    #[test]
    fn one_second_clip_is_padded_to_fixed_rows() {
        let waveform = Waveform::new(noise(16_000), 16_000);
        let mfcc = extract(&waveform, &MfccParams::default()).unwrap();
        assert_eq!(mfcc.frames(), 100);
        assert_eq!(mfcc.coeffs(), 12);
        // 99 computed frames, the 100th row is padding.
        assert!(mfcc.row(98).iter().any(|&c| c != 0.0));
        assert!(mfcc.row(99).iter().all(|&c| c == 0.0));
    }

    #[test]
    fn long_clip_is_truncated() {
        let waveform = Waveform::new(noise(16_000 * 3), 16_000);
        let mfcc = extract(&waveform, &MfccParams::default()).unwrap();
        assert_eq!(mfcc.data().len(), 1_200);
        assert!(mfcc.row(99).iter().any(|&c| c != 0.0));
    }

    #[test]
    fn single_frame_clip_fills_first_row_only() {
        let waveform = Waveform::new(noise(100), 16_000);
        let mfcc = extract(&waveform, &MfccParams::default()).unwrap();
        assert!(mfcc.row(0).iter().all(|c| c.is_finite()));
        assert!(mfcc.row(1).iter().all(|&c| c == 0.0));
    }

    #[test]
    fn empty_waveform_is_rejected() {
        let waveform = Waveform::new(Vec::new(), 16_000);
        assert!(matches!(
            extract(&waveform, &MfccParams::default()),
            Err(PipelineError::EmptySignal)
        ));
    }

    #[test]
    fn invalid_params_are_rejected() {
        let waveform = Waveform::new(noise(1_000), 16_000);
        for params in [
            MfccParams {
                fft_size: 0,
                ..MfccParams::default()
            },
            MfccParams {
                fft_size: 500,
                ..MfccParams::default()
            },
            MfccParams {
                cepstral_coeff_count: 40,
                ..MfccParams::default()
            },
            MfccParams {
                frame_size_seconds: f32::INFINITY,
                ..MfccParams::default()
            },
            MfccParams {
                frame_size_seconds: f32::NAN,
                ..MfccParams::default()
            },
            MfccParams {
                frame_stride_seconds: 1.0e9,
                ..MfccParams::default()
            },
            MfccParams {
                pre_emphasis: f32::NAN,
                ..MfccParams::default()
            },
        ] {
            assert!(matches!(
                extract(&waveform, &params),
                Err(PipelineError::InvalidParameter { .. })
            ));
        }
    }
}
