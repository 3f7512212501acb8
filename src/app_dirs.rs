//! Application directory helpers anchored to a single `.cryscope` folder.
//!
//! Config and log files live under the OS config directory by default. Set
//! `CRYSCOPE_CONFIG_HOME` to relocate them for tests or container deployments.

use std::path::PathBuf;

use directories::BaseDirs;
use thiserror::Error;

/// Name of the application directory that lives under the OS config root.
pub const APP_DIR_NAME: &str = ".cryscope";
/// Environment variable overriding the base config directory.
pub const CONFIG_HOME_ENV: &str = "CRYSCOPE_CONFIG_HOME";

/// Errors that can occur while resolving or preparing application directories.
#[derive(Debug, Error)]
pub enum AppDirError {
    /// No suitable base config directory could be resolved.
    #[error("No suitable base config directory available for application files")]
    NoBaseDir,
    /// Failed to create the application directory.
    #[error("Failed to create application directory at {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Return the root `.cryscope` directory, creating it if needed.
pub fn app_root_dir() -> Result<PathBuf, AppDirError> {
    let base = config_base_dir().ok_or(AppDirError::NoBaseDir)?;
    ensure_dir(base.join(APP_DIR_NAME))
}

/// Return the logs directory inside the `.cryscope` root, creating it if needed.
pub fn logs_dir() -> Result<PathBuf, AppDirError> {
    ensure_dir(app_root_dir()?.join("logs"))
}

/// Return the default models directory inside the `.cryscope` root.
pub fn models_dir() -> Result<PathBuf, AppDirError> {
    ensure_dir(app_root_dir()?.join("models"))
}

fn ensure_dir(path: PathBuf) -> Result<PathBuf, AppDirError> {
    std::fs::create_dir_all(&path).map_err(|source| AppDirError::CreateDir {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

fn config_base_dir() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_HOME_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf())
}
