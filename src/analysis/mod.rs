//! Signal processing stages: decoding, spectrogram rendering, MFCC extraction.

pub mod audio;
pub(crate) mod fft;
pub mod mfcc;
pub mod spectrogram;
