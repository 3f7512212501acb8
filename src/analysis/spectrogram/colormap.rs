/// Magma control points sampled at eighths of the unit interval.
const MAGMA: [[u8; 3]; 9] = [
    [0, 0, 4],
    [28, 16, 68],
    [79, 18, 123],
    [129, 37, 129],
    [181, 54, 122],
    [229, 80, 100],
    [251, 135, 97],
    [254, 194, 135],
    [252, 253, 191],
];

/// Map a normalized value in `[0, 1]` onto the magma ramp.
pub(crate) fn magma(value: f32) -> [u8; 3] {
    let value = if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let scaled = value * (MAGMA.len() - 1) as f32;
    let lower = (scaled.floor() as usize).min(MAGMA.len() - 2);
    let frac = scaled - lower as f32;
    let a = MAGMA[lower];
    let b = MAGMA[lower + 1];
    let mut out = [0u8; 3];
    for channel in 0..3 {
        let mixed = a[channel] as f32 + (b[channel] as f32 - a[channel] as f32) * frac;
        out[channel] = mixed.round().clamp(0.0, 255.0) as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_match_control_points() {
        assert_eq!(magma(0.0), MAGMA[0]);
        assert_eq!(magma(1.0), MAGMA[8]);
        assert_eq!(magma(0.5), MAGMA[4]);
    }

    #[test]
    fn out_of_range_values_clamp() {
        assert_eq!(magma(-3.0), MAGMA[0]);
        assert_eq!(magma(7.0), MAGMA[8]);
        assert_eq!(magma(f32::NAN), MAGMA[0]);
    }

    #[test]
    fn ramp_brightens_monotonically() {
        let luma = |c: [u8; 3]| c.iter().map(|&v| v as u32).sum::<u32>();
        let mut last = 0;
        for step in 0..=32 {
            let value = luma(magma(step as f32 / 32.0));
            assert!(value >= last);
            last = value;
        }
    }
}
