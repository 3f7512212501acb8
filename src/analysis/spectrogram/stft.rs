use std::f32::consts::PI;

use rustfft::{FftPlanner, num_complex::Complex};

/// FFT size of the display STFT.
pub(crate) const DISPLAY_N_FFT: usize = 2048;
/// Hop between display STFT frames.
pub(crate) const DISPLAY_HOP: usize = 512;
/// Dynamic range kept below the loudest cell.
pub(crate) const DISPLAY_TOP_DB: f32 = 80.0;
const AMPLITUDE_FLOOR: f32 = 1e-10;

/// Decibel magnitudes relative to the loudest cell, frame-major.
pub(crate) struct DbSpectrogram {
    /// `db[frame * bins + bin]`, each value in `[-DISPLAY_TOP_DB, 0]`.
    pub(crate) db: Vec<f32>,
    pub(crate) frames: usize,
    pub(crate) bins: usize,
}

impl DbSpectrogram {
    pub(crate) fn at(&self, frame: usize, bin: usize) -> f32 {
        self.db[frame * self.bins + bin]
    }
}

/// Centered, zero-padded Hann STFT converted to `20·log10(|X| / max|X|)`.
pub(crate) fn db_spectrogram(samples: &[f32]) -> DbSpectrogram {
    let bins = DISPLAY_N_FFT / 2 + 1;
    let frames = 1 + samples.len() / DISPLAY_HOP;
    let window: Vec<f32> = (0..DISPLAY_N_FFT)
        .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f32 / DISPLAY_N_FFT as f32).cos())
        .collect();
    let fft = FftPlanner::<f32>::new().plan_fft_forward(DISPLAY_N_FFT);
    let pad = DISPLAY_N_FFT / 2;

    let mut magnitudes = Vec::with_capacity(frames * bins);
    let mut buffer = vec![Complex::new(0.0_f32, 0.0); DISPLAY_N_FFT];
    for frame in 0..frames {
        let origin = frame * DISPLAY_HOP;
        for (i, cell) in buffer.iter_mut().enumerate() {
            let sample = (origin + i)
                .checked_sub(pad)
                .and_then(|idx| samples.get(idx))
                .copied()
                .unwrap_or(0.0);
            *cell = Complex::new(sample * window[i], 0.0);
        }
        fft.process(&mut buffer);
        magnitudes.extend(buffer[..bins].iter().map(|c| c.norm()));
    }

    let reference = magnitudes
        .iter()
        .copied()
        .fold(0.0_f32, f32::max)
        .max(AMPLITUDE_FLOOR);
    let ref_db = 20.0 * reference.log10();
    let db = magnitudes
        .into_iter()
        .map(|mag| (20.0 * mag.max(AMPLITUDE_FLOOR).log10() - ref_db).max(-DISPLAY_TOP_DB))
        .collect();
    DbSpectrogram { db, frames, bins }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_count_follows_centered_layout() {
        let spec = db_spectrogram(&vec![0.1; 4_096]);
        assert_eq!(spec.frames, 1 + 4_096 / DISPLAY_HOP);
        assert_eq!(spec.bins, DISPLAY_N_FFT / 2 + 1);
        assert_eq!(spec.db.len(), spec.frames * spec.bins);
    }

    #[test]
    fn values_are_relative_to_peak_and_floored() {
        let samples: Vec<f32> = (0..8_000)
            .map(|i| (2.0 * PI * 1_000.0 * i as f32 / 16_000.0).sin())
            .collect();
        let spec = db_spectrogram(&samples);
        let max = spec.db.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let min = spec.db.iter().copied().fold(f32::INFINITY, f32::min);
        assert!(max.abs() < 1e-4);
        assert!(min >= -DISPLAY_TOP_DB);
        // 1 kHz at 16 kHz sample rate sits in bin 128.
        let mid = spec.frames / 2;
        assert!(spec.at(mid, 128) > -1.0);
    }
}
