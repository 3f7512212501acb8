//! TOML configuration for the classification service.
//!
//! Config keys: `models`, `audio`, `mfcc`, `features`, `workers`, `logging`. Every
//! section is optional; missing keys fall back to the defaults the models were
//! trained against.

mod defaults;
mod errors;
mod io;

use serde::{Deserialize, Serialize};

use crate::analysis::audio::AudioOptions;
use crate::analysis::mfcc::MfccParams;
use crate::logging::LoggingSettings;
use crate::ml::ModelPaths;

pub use errors::ConfigError;
pub use io::{CONFIG_FILE_NAME, config_path, load_from_path, load_or_default, save_to_path};

use defaults::{
    clamp_image_size, clamp_worker_count, default_flat_length, default_image_size,
    default_worker_count,
};

/// Aggregate service configuration loaded from disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Serialized model artifacts loaded at startup.
    #[serde(default)]
    pub models: ModelPaths,
    /// Decoding and silence trimming options.
    #[serde(default)]
    pub audio: AudioOptions,
    /// MFCC extraction parameters.
    #[serde(default)]
    pub mfcc: MfccParams,
    /// Tensor shapes handed to the models.
    #[serde(default)]
    pub features: FeatureSettings,
    /// Worker pool sizing.
    #[serde(default)]
    pub workers: WorkerSettings,
    /// Log filter and log file retention.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl AppConfig {
    pub(crate) fn normalized(mut self) -> Self {
        self.features.image_size = clamp_image_size(self.features.image_size);
        self.features.flat_length = self.features.flat_length.max(1);
        self.workers.count = clamp_worker_count(self.workers.count);
        self.logging = self.logging.normalized();
        if !self.audio.top_db.is_finite() || self.audio.top_db <= 0.0 {
            self.audio.top_db = AudioOptions::default().top_db;
        }
        self
    }
}

/// Input shapes for the image and flat-vector model families.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSettings {
    /// Square edge of the resized spectrogram tensor.
    #[serde(default = "default_image_size")]
    pub image_size: u32,
    /// Length of the tiled MFCC vector.
    #[serde(default = "default_flat_length")]
    pub flat_length: usize,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            image_size: default_image_size(),
            flat_length: default_flat_length(),
        }
    }
}

/// Worker pool configuration; `count = 0` sizes the pool from available parallelism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerSettings {
    #[serde(default = "default_worker_count")]
    pub count: u32,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            count: default_worker_count(),
        }
    }
}

impl WorkerSettings {
    /// Resolve the effective thread count.
    pub fn effective_count(&self) -> usize {
        if self.count > 0 {
            return self.count as usize;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(2)
            .clamp(1, defaults::MAX_WORKER_COUNT as usize)
    }
}
