use std::ops::Range;

/// RMS frame length used to measure loudness while trimming.
const TRIM_FRAME_LENGTH: usize = 2048;
/// Hop between RMS frames; trim boundaries land on multiples of this.
const TRIM_HOP_LENGTH: usize = 512;

/// Remove leading and trailing sections quieter than `top_db` below the loudest frame.
///
/// Quiet sections between loud ones are kept. Digital silence trims to empty.
pub(super) fn trim_silence(samples: &[f32], top_db: f32) -> Vec<f32> {
    non_silent_range(samples, top_db, TRIM_FRAME_LENGTH, TRIM_HOP_LENGTH)
        .map(|range| samples[range].to_vec())
        .unwrap_or_default()
}

/// Sample range spanning the first through last frame within `top_db` of the peak frame.
pub(super) fn non_silent_range(
    samples: &[f32],
    top_db: f32,
    frame_length: usize,
    hop_length: usize,
) -> Option<Range<usize>> {
    if samples.is_empty() {
        return None;
    }
    let hop_length = hop_length.max(1);
    let rms = frame_rms(samples, frame_length.max(1), hop_length);
    let peak = rms.iter().copied().fold(0.0_f64, f64::max);
    if peak <= 0.0 {
        return None;
    }
    // 20·log10(rms / peak) > -top_db  <=>  rms > peak · 10^(-top_db / 20)
    let threshold = peak * 10.0_f64.powf(-(top_db.max(0.0) as f64) / 20.0);
    let first = rms.iter().position(|&value| value > threshold)?;
    let last = rms.iter().rposition(|&value| value > threshold)?;
    let start = (first * hop_length).min(samples.len());
    let end = ((last + 1) * hop_length).min(samples.len());
    (end > start).then_some(start..end)
}

/// RMS of centered, zero-padded frames at every hop position.
fn frame_rms(samples: &[f32], frame_length: usize, hop_length: usize) -> Vec<f64> {
    let mut prefix = Vec::with_capacity(samples.len() + 1);
    prefix.push(0.0_f64);
    let mut acc = 0.0_f64;
    for &sample in samples {
        acc += sample as f64 * sample as f64;
        prefix.push(acc);
    }
    let half = frame_length / 2;
    let frames = 1 + samples.len() / hop_length;
    (0..frames)
        .map(|frame| {
            let center = frame * hop_length;
            let start = center.saturating_sub(half).min(samples.len());
            let end = (center + frame_length - half).min(samples.len());
            let energy = (prefix[end] - prefix[start]).max(0.0);
            (energy / frame_length as f64).sqrt()
        })
        .collect()
}
