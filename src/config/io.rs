use std::path::{Path, PathBuf};

use crate::app_dirs;

use super::{AppConfig, ConfigError};

/// Default filename used to store the service configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Resolve the configuration file path inside the app directory.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(app_dirs::app_root_dir()?.join(CONFIG_FILE_NAME))
}

/// Load configuration from the app directory, returning defaults if missing.
pub fn load_or_default() -> Result<AppConfig, ConfigError> {
    load_from_path(&config_path()?)
}

/// Load configuration from an explicit path, returning defaults if the file is absent.
pub fn load_from_path(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        tracing::info!("No config at {}; using defaults", path.display());
        return Ok(AppConfig::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&text, path)
}

/// Save configuration to a specific path, creating parent directories as needed.
pub fn save_to_path(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let text = toml::to_string_pretty(config).map_err(|source| ConfigError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, text).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_config(text: &str, path: &Path) -> Result<AppConfig, ConfigError> {
    toml::from_str::<AppConfig>(text)
        .map(AppConfig::normalized)
        .map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::ModelFamily;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = load_from_path(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.features.flat_length, 1200);
        assert_eq!(config.features.image_size, 224);
        assert_eq!(config.mfcc.fixed_frame_count, 100);
        assert_eq!(config.audio.top_db, 20.0);
        assert!(!config.audio.denoise);
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let text = r#"
[models]
forest = "/srv/models/forest.json"

[mfcc]
cepstral_coeff_count = 13

[workers]
count = 500

[logging]
level = "cryscope=debug"
retained_files = 0
"#;
        let config = parse_config(text, Path::new("inline.toml")).unwrap();
        assert_eq!(
            config.models.path_for(ModelFamily::Forest),
            Some(Path::new("/srv/models/forest.json"))
        );
        assert!(config.models.path_for(ModelFamily::Cnn).is_none());
        assert_eq!(config.mfcc.cepstral_coeff_count, 13);
        assert_eq!(config.mfcc.mel_filter_count, 40);
        assert_eq!(config.workers.count, 32);
        assert_eq!(config.logging.level, "cryscope=debug");
        assert!(config.logging.file);
        assert_eq!(config.logging.retained_files, 1);
    }

    #[test]
    fn invalid_toml_reports_path() {
        let err = parse_config("models = 3", Path::new("broken.toml")).unwrap_err();
        match err {
            ConfigError::ParseToml { path, .. } => assert_eq!(path, Path::new("broken.toml")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let mut config = AppConfig::default();
        config.audio.denoise = true;
        config.features.flat_length = 600;
        save_to_path(&config, &path).unwrap();
        let loaded = load_from_path(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
