use std::f32::consts::PI;

use rustfft::{FftPlanner, num_complex::Complex};

const GATE_N_FFT: usize = 1024;
const GATE_HOP: usize = 256;
/// Bins quieter than `mean + N_STD · std` (in dB, per bin) are treated as noise.
const GATE_N_STD: f32 = 1.5;

/// Stationary spectral gate: estimates a per-bin noise floor over the whole
/// clip and zeroes STFT cells below it, then resynthesizes by overlap-add.
pub(super) fn spectral_gate(samples: &[f32]) -> Vec<f32> {
    if samples.len() < GATE_N_FFT {
        return samples.to_vec();
    }
    let window = periodic_hann(GATE_N_FFT);
    let mut planner = FftPlanner::<f32>::new();
    let forward = planner.plan_fft_forward(GATE_N_FFT);
    let inverse = planner.plan_fft_inverse(GATE_N_FFT);

    let frames = 1 + (samples.len() - GATE_N_FFT).div_ceil(GATE_HOP);
    let mut spectra: Vec<Vec<Complex<f32>>> = Vec::with_capacity(frames);
    for frame in 0..frames {
        let start = frame * GATE_HOP;
        let mut buffer: Vec<Complex<f32>> = (0..GATE_N_FFT)
            .map(|i| {
                let sample = samples.get(start + i).copied().unwrap_or(0.0);
                Complex::new(sample * window[i], 0.0)
            })
            .collect();
        forward.process(&mut buffer);
        spectra.push(buffer);
    }

    let thresholds = noise_thresholds(&spectra);
    for spectrum in &mut spectra {
        for (bin, cell) in spectrum.iter_mut().enumerate() {
            let folded = if bin > GATE_N_FFT / 2 {
                GATE_N_FFT - bin
            } else {
                bin
            };
            if magnitude_db(*cell) < thresholds[folded] {
                *cell = Complex::new(0.0, 0.0);
            }
        }
    }

    let total = (frames - 1) * GATE_HOP + GATE_N_FFT;
    let mut output = vec![0.0_f32; total];
    let mut weight = vec![0.0_f32; total];
    let scale = 1.0 / GATE_N_FFT as f32;
    for (frame, spectrum) in spectra.iter_mut().enumerate() {
        inverse.process(spectrum);
        let start = frame * GATE_HOP;
        for i in 0..GATE_N_FFT {
            output[start + i] += spectrum[i].re * scale * window[i];
            weight[start + i] += window[i] * window[i];
        }
    }
    for (sample, w) in output.iter_mut().zip(weight.iter()) {
        if *w > 1e-6 {
            *sample /= *w;
        }
    }
    output.truncate(samples.len());
    output
}

fn noise_thresholds(spectra: &[Vec<Complex<f32>>]) -> Vec<f32> {
    let bins = GATE_N_FFT / 2 + 1;
    let count = spectra.len().max(1) as f32;
    (0..bins)
        .map(|bin| {
            let values: Vec<f32> = spectra.iter().map(|s| magnitude_db(s[bin])).collect();
            let mean = values.iter().sum::<f32>() / count;
            let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / count;
            mean + GATE_N_STD * var.sqrt()
        })
        .collect()
}

fn magnitude_db(cell: Complex<f32>) -> f32 {
    20.0 * cell.norm().max(1e-10).log10()
}

fn periodic_hann(length: usize) -> Vec<f32> {
    (0..length)
        .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f32 / length as f32).cos())
        .collect()
}
