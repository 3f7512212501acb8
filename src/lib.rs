//! Infant cry classification: decode an uploaded recording, render its
//! spectrogram, extract MFCCs and score them with one of three model families.

/// Decoding, spectrogram rendering and MFCC extraction.
pub mod analysis;
/// Application directory resolution.
pub mod app_dirs;
/// TOML service configuration.
pub mod config;
/// Pipeline error types.
pub mod error;
/// Model input tensors.
pub mod features;
/// Tracing setup.
pub mod logging;
/// Model families, dispatch and registry.
pub mod ml;
/// Request execution and worker pool.
pub mod pipeline;

pub use error::{PipelineError, ValidationError};
