use std::sync::{Arc, OnceLock};

use tracing::{info, warn};

use crate::error::PipelineError;

use super::{CnnModel, ForestModel, MlpModel, ModelFamily, ModelPaths, Predictor};

/// Shared, immutable handle to a loaded model.
pub type ModelHandle = Arc<dyn Predictor>;

/// Publish-once model slots, one per family.
///
/// Slots are written during startup and read lock-free afterwards. Share the
/// registry with `Arc` rather than a global.
#[derive(Default)]
pub struct ModelRegistry {
    forest: OnceLock<ModelHandle>,
    dense: OnceLock<ModelHandle>,
    cnn: OnceLock<ModelHandle>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every configured artifact. Families without a path stay unloaded.
    pub fn load_from_config(paths: &ModelPaths) -> Result<Self, PipelineError> {
        let registry = Self::new();
        for family in ModelFamily::ALL {
            let Some(path) = paths.path_for(family) else {
                warn!(%family, "No model path configured; family stays unloaded");
                continue;
            };
            let handle: ModelHandle = match family {
                ModelFamily::Forest => Arc::new(ForestModel::load_json(path)?),
                ModelFamily::Dense => Arc::new(MlpModel::load_json(path)?),
                ModelFamily::Cnn => Arc::new(CnnModel::load(path)?),
            };
            registry.publish(handle)?;
            info!(%family, path = %path.display(), "Model loaded");
        }
        Ok(registry)
    }

    /// Store a model in its family's slot; the first publish wins.
    pub fn publish(&self, handle: ModelHandle) -> Result<(), PipelineError> {
        let family = handle.family();
        self.slot(family)
            .set(handle)
            .map_err(|_| PipelineError::AlreadyLoaded(family))
    }

    pub fn get(&self, family: ModelFamily) -> Result<ModelHandle, PipelineError> {
        self.slot(family)
            .get()
            .cloned()
            .ok_or(PipelineError::ModelNotLoaded(family))
    }

    pub fn is_loaded(&self, family: ModelFamily) -> bool {
        self.slot(family).get().is_some()
    }

    fn slot(&self, family: ModelFamily) -> &OnceLock<ModelHandle> {
        match family {
            ModelFamily::Forest => &self.forest,
            ModelFamily::Dense => &self.dense,
            ModelFamily::Cnn => &self.cnn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureTensor;
    use crate::ml::RawOutput;
    use std::path::PathBuf;
    use std::thread;

    struct Stub(ModelFamily, usize);

    impl Predictor for Stub {
        fn family(&self) -> ModelFamily {
            self.0
        }

        fn expected_shape(&self) -> Vec<usize> {
            vec![1, 1]
        }

        fn score(&self, _input: &FeatureTensor) -> Result<RawOutput, PipelineError> {
            Ok(RawOutput::ClassIndex(self.1))
        }
    }

    #[test]
    fn empty_slot_is_model_not_loaded() {
        let registry = ModelRegistry::new();
        assert!(!registry.is_loaded(ModelFamily::Dense));
        assert!(matches!(
            registry.get(ModelFamily::Dense),
            Err(PipelineError::ModelNotLoaded(ModelFamily::Dense))
        ));
    }

    #[test]
    fn second_publish_is_rejected_and_first_is_kept() {
        let registry = ModelRegistry::new();
        registry.publish(Arc::new(Stub(ModelFamily::Forest, 1))).unwrap();
        let err = registry
            .publish(Arc::new(Stub(ModelFamily::Forest, 3)))
            .unwrap_err();
        assert!(matches!(err, PipelineError::AlreadyLoaded(ModelFamily::Forest)));
        let model = registry.get(ModelFamily::Forest).unwrap();
        let input = FeatureTensor::Flat(crate::features::FlatVector::new(vec![0.0]));
        assert_eq!(model.score(&input).unwrap(), RawOutput::ClassIndex(1));
        assert!(!registry.is_loaded(ModelFamily::Cnn));
    }

    #[test]
    fn published_model_is_visible_to_other_threads() {
        let registry = Arc::new(ModelRegistry::new());
        registry.publish(Arc::new(Stub(ModelFamily::Cnn, 0))).unwrap();
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.is_loaded(ModelFamily::Cnn))
            })
            .collect();
        for reader in readers {
            assert!(reader.join().unwrap());
        }
    }

    #[test]
    fn unconfigured_families_stay_unloaded() {
        let registry = ModelRegistry::load_from_config(&ModelPaths::default()).unwrap();
        for family in ModelFamily::ALL {
            assert!(!registry.is_loaded(family));
        }
    }

    #[test]
    fn unreadable_artifact_is_a_load_error() {
        let paths = ModelPaths {
            dense: Some(PathBuf::from("/nonexistent/dense.json")),
            ..ModelPaths::default()
        };
        assert!(matches!(
            ModelRegistry::load_from_config(&paths),
            Err(PipelineError::ModelLoad { .. })
        ));
    }
}
