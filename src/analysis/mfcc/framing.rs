use crate::analysis::fft::hamming_window;

/// First-order pre-emphasis, `y[t] = x[t] - alpha * x[t - 1]` with `y[0] = x[0]`.
pub(super) fn pre_emphasis(samples: &[f32], alpha: f32) -> Vec<f32> {
    let mut out = Vec::with_capacity(samples.len());
    let mut previous = None;
    for &sample in samples {
        out.push(match previous {
            Some(prev) => sample - alpha * prev,
            None => sample,
        });
        previous = Some(sample);
    }
    out
}

/// Number of frames covering `signal_len` samples; the last frame may be padded.
pub(super) fn frame_count(signal_len: usize, frame_len: usize, step: usize) -> usize {
    let step = step.max(1);
    if signal_len <= frame_len {
        1
    } else {
        1 + (signal_len - frame_len).div_ceil(step)
    }
}

/// Split the signal into zero-padded, Hamming-windowed frames of `frame_len`.
pub(super) fn windowed_frames(signal: &[f32], frame_len: usize, step: usize) -> Vec<Vec<f32>> {
    let count = frame_count(signal.len(), frame_len, step);
    let window = hamming_window(frame_len);
    (0..count)
        .map(|index| {
            let start = index * step;
            (0..frame_len)
                .map(|offset| {
                    let sample = signal.get(start + offset).copied().unwrap_or(0.0);
                    sample * window[offset]
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pre_emphasis_keeps_first_sample() {
        let out = pre_emphasis(&[1.0, 1.0, 2.0], 0.97);
        assert_eq!(out[0], 1.0);
        assert!((out[1] - 0.03).abs() < 1e-6);
        assert!((out[2] - 1.03).abs() < 1e-6);
    }

    #[test]
    fn frame_count_rounds_partial_tail_up() {
        assert_eq!(frame_count(100, 400, 160), 1);
        assert_eq!(frame_count(400, 400, 160), 1);
        assert_eq!(frame_count(401, 400, 160), 2);
        // 1 s at 16 kHz: 1 + ceil(15600 / 160).
        assert_eq!(frame_count(16_000, 400, 160), 99);
    }

    #[test]
    fn tail_frame_is_zero_padded() {
        let frames = windowed_frames(&[1.0; 5], 4, 2);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].len(), 4);
        assert_eq!(frames[1][3], 0.0);
        assert!(frames[1][0] > 0.0);
    }
}
