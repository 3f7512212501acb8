//! Command-line entry point: classify one recording and print the outcome as JSON.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use cryscope::config::{self, AppConfig};
use cryscope::ml::{ModelFamily, ModelRegistry};
use cryscope::pipeline::{Pipeline, PipelineWorkers, UploadForm, content_type_for_path};
use cryscope::{app_dirs, logging};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[derive(Debug, Clone)]
struct CliOptions {
    family: ModelFamily,
    audio_path: PathBuf,
    config_path: Option<PathBuf>,
    model_path: Option<PathBuf>,
    content_type: Option<String>,
    spectrogram_out: Option<PathBuf>,
}

fn run() -> Result<(), String> {
    let Some(options) = parse_args(std::env::args().skip(1).collect())? else {
        println!("{}", help_text());
        return Ok(());
    };
    let (config, model_base) = load_config(options.config_path.as_deref())?;
    if let Err(err) = logging::init(&config.logging) {
        eprintln!("Logging disabled: {err}");
    }

    let mut paths = config.models.resolved_against(&model_base);
    if let Some(model_path) = &options.model_path {
        match options.family {
            ModelFamily::Forest => paths.forest = Some(model_path.clone()),
            ModelFamily::Dense => paths.dense = Some(model_path.clone()),
            ModelFamily::Cnn => paths.cnn = Some(model_path.clone()),
        }
    }
    let registry = ModelRegistry::load_from_config(&paths).map_err(|err| err.to_string())?;
    let pipeline = Pipeline::new(Arc::new(registry), &config);
    let workers = PipelineWorkers::new(pipeline, config.workers.effective_count())
        .map_err(|err| err.to_string())?;

    let bytes = std::fs::read(&options.audio_path)
        .map_err(|err| format!("Failed to read {}: {err}", options.audio_path.display()))?;
    let content_type = options
        .content_type
        .clone()
        .or_else(|| content_type_for_path(&options.audio_path).map(str::to_string));
    let form = UploadForm {
        filename: options
            .audio_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned()),
        content_type,
        bytes,
    };

    let outcome = workers
        .submit(form, options.family)
        .wait()
        .map_err(|err| err.to_string())?;

    if let Some(out) = &options.spectrogram_out {
        let png = STANDARD
            .decode(&outcome.spectrogram_base64)
            .map_err(|err| format!("Failed to decode spectrogram: {err}"))?;
        std::fs::write(out, png)
            .map_err(|err| format!("Failed to write {}: {err}", out.display()))?;
    }
    let json = serde_json::to_string_pretty(&outcome).map_err(|err| err.to_string())?;
    println!("{json}");
    Ok(())
}

/// Explicit config paths anchor relative model paths at their own directory;
/// the default config anchors them at the app `models` directory.
fn load_config(explicit: Option<&Path>) -> Result<(AppConfig, PathBuf), String> {
    match explicit {
        Some(path) => {
            let config = config::load_from_path(path).map_err(|err| err.to_string())?;
            let base = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            Ok((config, base))
        }
        None => {
            let config = config::load_or_default().map_err(|err| err.to_string())?;
            let base = app_dirs::models_dir().map_err(|err| err.to_string())?;
            Ok((config, base))
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<Option<CliOptions>, String> {
    let mut family: Option<ModelFamily> = None;
    let mut audio_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut model_path: Option<PathBuf> = None;
    let mut content_type: Option<String> = None;
    let mut spectrogram_out: Option<PathBuf> = None;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Ok(None),
            "--family" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--family requires a value".to_string())?;
                family = Some(value.parse::<ModelFamily>()?);
            }
            "--config" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--config requires a value".to_string())?;
                config_path = Some(PathBuf::from(value));
            }
            "--model" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--model requires a value".to_string())?;
                model_path = Some(PathBuf::from(value));
            }
            "--content-type" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--content-type requires a value".to_string())?;
                content_type = Some(value.to_string());
            }
            "--spectrogram-out" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--spectrogram-out requires a value".to_string())?;
                spectrogram_out = Some(PathBuf::from(value));
            }
            flag if flag.starts_with("--") => {
                return Err(format!("Unknown argument: {flag}\n\n{}", help_text()));
            }
            positional => {
                if audio_path.is_some() {
                    return Err(format!("Unexpected extra argument: {positional}"));
                }
                audio_path = Some(PathBuf::from(positional));
            }
        }
        idx += 1;
    }

    let family = family.ok_or_else(|| format!("--family is required\n\n{}", help_text()))?;
    let audio_path =
        audio_path.ok_or_else(|| format!("An audio file is required\n\n{}", help_text()))?;
    Ok(Some(CliOptions {
        family,
        audio_path,
        config_path,
        model_path,
        content_type,
        spectrogram_out,
    }))
}

fn help_text() -> String {
    [
        "cryscope",
        "",
        "Usage:",
        "  cryscope --family <forest|dense|cnn> [options] <AUDIO>",
        "",
        "Options:",
        "  --config <path>           Config TOML (default: app directory config.toml).",
        "  --model <path>            Model artifact for the chosen family, overriding config.",
        "  --content-type <mime>     Declared MIME type (default: guessed from extension).",
        "  --spectrogram-out <path>  Also write the rendered spectrogram PNG.",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parses_family_and_positional_audio() {
        let options = parse_args(args(&["--family", "cnn", "cry.wav"]))
            .unwrap()
            .unwrap();
        assert_eq!(options.family, ModelFamily::Cnn);
        assert_eq!(options.audio_path, PathBuf::from("cry.wav"));
        assert!(options.content_type.is_none());
    }

    #[test]
    fn help_short_circuits() {
        assert!(parse_args(args(&["--help"])).unwrap().is_none());
    }

    #[test]
    fn missing_family_and_unknown_flags_are_errors() {
        assert!(parse_args(args(&["cry.wav"])).is_err());
        assert!(parse_args(args(&["--family", "forest", "--bogus", "cry.wav"])).is_err());
        assert!(parse_args(args(&["--family", "svm", "cry.wav"])).is_err());
    }
}
