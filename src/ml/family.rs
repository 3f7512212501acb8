use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Classifier families, one upload entry point each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    /// Random forest over the tiled MFCC vector.
    Forest,
    /// Dense network over the tiled MFCC vector.
    Dense,
    /// Convolutional network over the resized spectrogram image.
    Cnn,
}

/// Input layout a family consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Flat,
    Image,
}

impl ModelFamily {
    pub const ALL: [ModelFamily; 3] = [ModelFamily::Forest, ModelFamily::Dense, ModelFamily::Cnn];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelFamily::Forest => "forest",
            ModelFamily::Dense => "dense",
            ModelFamily::Cnn => "cnn",
        }
    }

    pub fn input_kind(self) -> InputKind {
        match self {
            ModelFamily::Forest | ModelFamily::Dense => InputKind::Flat,
            ModelFamily::Cnn => InputKind::Image,
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelFamily {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "forest" => Ok(ModelFamily::Forest),
            "dense" | "mlp" => Ok(ModelFamily::Dense),
            "cnn" => Ok(ModelFamily::Cnn),
            other => Err(format!(
                "Unknown model family '{other}' (expected forest, dense or cnn)"
            )),
        }
    }
}

/// Serialized model artifacts, one optional path per family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelPaths {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forest: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dense: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cnn: Option<PathBuf>,
}

impl ModelPaths {
    pub fn path_for(&self, family: ModelFamily) -> Option<&Path> {
        match family {
            ModelFamily::Forest => self.forest.as_deref(),
            ModelFamily::Dense => self.dense.as_deref(),
            ModelFamily::Cnn => self.cnn.as_deref(),
        }
    }

    /// Anchor relative paths at `base`; absolute paths are kept.
    pub fn resolved_against(&self, base: &Path) -> Self {
        let resolve = |path: &Option<PathBuf>| {
            path.as_ref().map(|path| {
                if path.is_absolute() {
                    path.clone()
                } else {
                    base.join(path)
                }
            })
        };
        Self {
            forest: resolve(&self.forest),
            dense: resolve(&self.dense),
            cnn: resolve(&self.cnn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_parses_case_insensitively() {
        assert_eq!("Forest".parse::<ModelFamily>(), Ok(ModelFamily::Forest));
        assert_eq!(" CNN ".parse::<ModelFamily>(), Ok(ModelFamily::Cnn));
        assert_eq!("mlp".parse::<ModelFamily>(), Ok(ModelFamily::Dense));
        assert!("svm".parse::<ModelFamily>().is_err());
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let paths = ModelPaths {
            forest: Some(PathBuf::from("forest.json")),
            dense: Some(PathBuf::from("/abs/dense.json")),
            cnn: None,
        };
        let resolved = paths.resolved_against(Path::new("/srv/models"));
        assert_eq!(
            resolved.path_for(ModelFamily::Forest),
            Some(Path::new("/srv/models/forest.json"))
        );
        assert_eq!(
            resolved.path_for(ModelFamily::Dense),
            Some(Path::new("/abs/dense.json"))
        );
        assert!(resolved.cnn.is_none());
    }

    #[test]
    fn image_input_only_for_cnn() {
        assert_eq!(ModelFamily::Cnn.input_kind(), InputKind::Image);
        assert_eq!(ModelFamily::Forest.input_kind(), InputKind::Flat);
        assert_eq!(ModelFamily::Dense.input_kind(), InputKind::Flat);
    }
}
