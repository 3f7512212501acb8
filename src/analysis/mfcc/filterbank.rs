/// Triangular Mel filterbank over the one-sided bins of an FFT.
pub(super) struct MelFilterbank {
    filters: Vec<Vec<(usize, f32)>>,
}

impl MelFilterbank {
    /// `filter_count` triangles evenly spaced in Mel from 0 Hz to Nyquist.
    pub(super) fn new(sample_rate: u32, fft_size: usize, filter_count: usize) -> Self {
        let bins = mel_points(sample_rate, fft_size, filter_count);
        let filters = (0..filter_count)
            .map(|m| build_triangle(bins[m], bins[m + 1], bins[m + 2]))
            .collect();
        Self { filters }
    }

    pub(super) fn len(&self) -> usize {
        self.filters.len()
    }

    /// Log filter energies in dB.
    ///
    /// Sums run in f64 and empty filters read `f64::EPSILON` (about -313 dB)
    /// before the log, the float64 floor the trained models saw.
    pub(super) fn log_energies(&self, power: &[f32]) -> Vec<f32> {
        self.filters
            .iter()
            .map(|filter| {
                let energy: f64 = filter
                    .iter()
                    .map(|&(bin, weight)| {
                        f64::from(power.get(bin).copied().unwrap_or(0.0)) * f64::from(weight)
                    })
                    .sum();
                let energy = if energy == 0.0 { f64::EPSILON } else { energy };
                (20.0 * energy.log10()) as f32
            })
            .collect()
    }

    #[cfg(test)]
    fn weights(&self, filter: usize) -> &[(usize, f32)] {
        &self.filters[filter]
    }
}

fn mel_points(sample_rate: u32, fft_size: usize, filter_count: usize) -> Vec<usize> {
    let sr = sample_rate.max(1) as f32;
    let mel_max = hz_to_mel(sr / 2.0);
    (0..filter_count + 2)
        .map(|i| {
            let mel = mel_max * i as f32 / (filter_count + 1) as f32;
            (((fft_size + 1) as f32 * mel_to_hz(mel)) / sr).floor() as usize
        })
        .collect()
}

/// Rising on `[left, center)`, falling on `[center, right)`.
fn build_triangle(left: usize, center: usize, right: usize) -> Vec<(usize, f32)> {
    let mut weights = Vec::new();
    for bin in left..center {
        weights.push((bin, (bin - left) as f32 / (center - left) as f32));
    }
    for bin in center..right {
        weights.push((bin, (right - bin) as f32 / (right - center) as f32));
    }
    weights.retain(|&(_, weight)| weight > 0.0);
    weights
}

fn hz_to_mel(hz: f32) -> f32 {
    2595.0_f32 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f32) -> f32 {
    700.0_f32 * (10.0_f32.powf(mel / 2595.0) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mel_scale_round_trips() {
        for hz in [0.0_f32, 440.0, 4_000.0, 8_000.0] {
            assert!((mel_to_hz(hz_to_mel(hz)) - hz).abs() < 0.5);
        }
    }

    #[test]
    fn points_span_dc_to_nyquist_bin() {
        let points = mel_points(16_000, 512, 40);
        assert_eq!(points.len(), 42);
        assert_eq!(points[0], 0);
        assert_eq!(*points.last().unwrap(), 256);
        assert!(points.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn triangles_peak_at_one_on_their_center() {
        let bank = MelFilterbank::new(16_000, 512, 40);
        assert_eq!(bank.len(), 40);
        let last = bank.weights(39);
        let peak = last.iter().map(|&(_, w)| w).fold(0.0_f32, f32::max);
        assert!((peak - 1.0).abs() < 1e-6);
        assert!(last.iter().all(|&(bin, _)| bin <= 256));
    }

    #[test]
    fn silent_power_floors_at_double_epsilon() {
        let bank = MelFilterbank::new(16_000, 512, 40);
        let energies = bank.log_energies(&vec![0.0; 257]);
        let floor = (20.0 * f64::EPSILON.log10()) as f32;
        assert!((floor + 313.07).abs() < 0.01);
        assert!(energies.iter().all(|&e| (e - floor).abs() < 1e-3));
    }

    #[test]
    fn tiny_energies_are_not_raised_to_the_floor() {
        let bank = MelFilterbank::new(16_000, 512, 40);
        let energies = bank.log_energies(&vec![1.0e-12; 257]);
        assert!(energies.iter().all(|&e| e > -260.0 && e < -200.0));
    }
}
