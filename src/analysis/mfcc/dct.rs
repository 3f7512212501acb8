/// Orthonormal DCT-II, keeping coefficients `first..first + count`.
pub(super) fn dct_ii_ortho(values: &[f32], first: usize, count: usize) -> Vec<f32> {
    let n = values.len();
    if n == 0 {
        return vec![0.0; count];
    }
    let n_f = n as f64;
    (first..first + count)
        .map(|k| {
            let mut sum = 0.0_f64;
            for (m, &v) in values.iter().enumerate() {
                let angle = std::f64::consts::PI * k as f64 * (2.0 * m as f64 + 1.0) / (2.0 * n_f);
                sum += v as f64 * angle.cos();
            }
            let scale = if k == 0 {
                (1.0 / n_f).sqrt()
            } else {
                (2.0 / n_f).sqrt()
            };
            (sum * scale) as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_input_has_only_dc_energy() {
        let out = dct_ii_ortho(&[2.0; 8], 0, 4);
        assert!((out[0] - 2.0 * 8.0_f32.sqrt()).abs() < 1e-5);
        assert!(out[1..].iter().all(|c| c.abs() < 1e-5));
    }

    #[test]
    fn transform_preserves_energy() {
        let values = [0.3_f32, -1.2, 0.8, 2.5, -0.4];
        let out = dct_ii_ortho(&values, 0, values.len());
        let input: f32 = values.iter().map(|v| v * v).sum();
        let output: f32 = out.iter().map(|v| v * v).sum();
        assert!((input - output).abs() < 1e-4);
    }

    #[test]
    fn skipping_dc_returns_requested_slice() {
        let values = [0.3_f32, -1.2, 0.8, 2.5];
        let full = dct_ii_ortho(&values, 0, 4);
        let tail = dct_ii_ortho(&values, 1, 3);
        assert_eq!(tail.len(), 3);
        for (a, b) in full[1..].iter().zip(tail.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}
