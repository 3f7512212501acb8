use std::f32::consts::PI;

use crate::error::PipelineError;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Complex32 {
    pub(crate) re: f32,
    pub(crate) im: f32,
}

impl Complex32 {
    pub(crate) fn new(re: f32, im: f32) -> Self {
        Self { re, im }
    }

    fn mul(self, other: Self) -> Self {
        Self {
            re: self.re * other.re - self.im * other.im,
            im: self.re * other.im + self.im * other.re,
        }
    }

    fn add(self, other: Self) -> Self {
        Self {
            re: self.re + other.re,
            im: self.im + other.im,
        }
    }

    fn sub(self, other: Self) -> Self {
        Self {
            re: self.re - other.re,
            im: self.im - other.im,
        }
    }

    pub(crate) fn norm_sqr(self) -> f32 {
        self.re * self.re + self.im * self.im
    }
}

/// Symmetric Hamming window, `0.54 - 0.46 cos(2πn / (N - 1))`.
pub(crate) fn hamming_window(length: usize) -> Vec<f32> {
    if length <= 1 {
        return vec![1.0_f32; length];
    }
    let denom = (length - 1) as f32;
    (0..length)
        .map(|n| 0.54_f32 - 0.46 * (2.0 * PI * n as f32 / denom).cos())
        .collect()
}

/// Precomputed radix-2 FFT of a fixed power-of-two length.
pub(crate) struct FftPlan {
    len: usize,
    bit_swaps: Vec<(usize, usize)>,
    twiddles: Vec<Vec<Complex32>>,
}

impl FftPlan {
    pub(crate) fn new(len: usize) -> Result<Self, PipelineError> {
        if len == 0 || !len.is_power_of_two() {
            return Err(PipelineError::invalid_parameter(format!(
                "FFT length must be power-of-two, got {len}"
            )));
        }
        Ok(Self {
            len,
            bit_swaps: build_bit_swaps(len),
            twiddles: build_twiddle_tables(len),
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Number of one-sided bins, `N / 2 + 1`.
    pub(crate) fn bins(&self) -> usize {
        self.len / 2 + 1
    }

    pub(crate) fn process(&self, buffer: &mut [Complex32]) -> Result<(), PipelineError> {
        if buffer.len() != self.len {
            return Err(PipelineError::invalid_parameter(format!(
                "FFT length mismatch: buffer {} plan {}",
                buffer.len(),
                self.len
            )));
        }
        for &(i, j) in &self.bit_swaps {
            buffer.swap(i, j);
        }
        for stage in &self.twiddles {
            apply_stage(buffer, stage);
        }
        Ok(())
    }

    /// One-sided power spectrum `(1/N)·|X|²` of a real frame.
    ///
    /// Frames longer than the plan are truncated and shorter ones zero padded.
    pub(crate) fn power_spectrum_into(
        &self,
        frame: &[f32],
        scratch: &mut Vec<Complex32>,
        out: &mut [f32],
    ) -> Result<(), PipelineError> {
        scratch.clear();
        scratch.resize(self.len, Complex32::default());
        for (cell, &sample) in scratch.iter_mut().zip(frame.iter()) {
            cell.re = sample;
        }
        self.process(scratch)?;
        let scale = 1.0 / self.len as f32;
        for (slot, value) in out.iter_mut().zip(scratch.iter().take(self.bins())) {
            *slot = value.norm_sqr() * scale;
        }
        Ok(())
    }
}

fn build_bit_swaps(len: usize) -> Vec<(usize, usize)> {
    let mut swaps = Vec::new();
    let mut j = 0usize;
    for i in 1..len {
        let mut bit = len >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            swaps.push((i, j));
        }
    }
    swaps
}

fn build_twiddle_tables(len: usize) -> Vec<Vec<Complex32>> {
    let mut tables = Vec::new();
    let mut step = 2usize;
    while step <= len {
        let half = step / 2;
        let angle = -2.0_f64 * std::f64::consts::PI / step as f64;
        let stage = (0..half)
            .map(|i| {
                let (sin, cos) = (angle * i as f64).sin_cos();
                Complex32::new(cos as f32, sin as f32)
            })
            .collect();
        tables.push(stage);
        step *= 2;
    }
    tables
}

fn apply_stage(buffer: &mut [Complex32], twiddles: &[Complex32]) {
    let half = twiddles.len();
    let step = half * 2;
    for start in (0..buffer.len()).step_by(step) {
        for i in 0..half {
            let u = buffer[start + i];
            let v = buffer[start + i + half].mul(twiddles[i]);
            buffer[start + i] = u.add(v);
            buffer[start + i + half] = u.sub(v);
        }
    }
}
