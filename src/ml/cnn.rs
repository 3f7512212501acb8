//! Convolutional spectrogram classifier on the burn NdArray backend.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use burn::backend::ndarray::{NdArray, NdArrayDevice};
use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig};
use burn::nn::{Linear, LinearConfig, PaddingConfig2d};
use burn::tensor::activation::{relu, softmax};
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use burn_store::{BurnpackStore, ModuleSnapshot};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::PipelineError;
use crate::features::{DEFAULT_IMAGE_SIZE, FeatureTensor};

use super::{CryLabel, ModelFamily, Predictor, RawOutput};

type CnnBackend = NdArray;

/// JSON sidecar describing the network layout and its weights file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CnnConfig {
    pub model_version: i64,
    /// Square input edge in pixels.
    #[serde(default = "default_input_size")]
    pub input_size: usize,
    /// Output channels of each conv block.
    pub channels: Vec<usize>,
    /// Class order; must equal the label table.
    pub classes: Vec<CryLabel>,
    /// Burnpack weights, relative to the config file.
    pub weights: PathBuf,
}

fn default_input_size() -> usize {
    DEFAULT_IMAGE_SIZE as usize
}

impl CnnConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.classes.as_slice() != CryLabel::ALL.as_slice() {
            return Err("classes must match the label table order".to_string());
        }
        if self.channels.is_empty() || self.channels.contains(&0) {
            return Err("channels must be a non-empty list of positive widths".to_string());
        }
        let min_size = 1usize << self.channels.len();
        if self.input_size < min_size {
            return Err(format!(
                "input_size {} too small for {} pooling blocks",
                self.input_size,
                self.channels.len()
            ));
        }
        Ok(())
    }
}

/// Conv 3x3 (same padding), ReLU, 2x2 max pool.
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    pool: MaxPool2d,
}

impl<B: Backend> ConvBlock<B> {
    fn new(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        Self {
            conv: Conv2dConfig::new([in_channels, out_channels], [3, 3])
                .with_padding(PaddingConfig2d::Same)
                .init(device),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
        }
    }

    fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        self.pool.forward(relu(self.conv.forward(input)))
    }
}

/// Conv blocks, global average pool, linear head with softmax.
#[derive(Module, Debug)]
pub struct CryCnn<B: Backend> {
    blocks: Vec<ConvBlock<B>>,
    pool: AdaptiveAvgPool2d,
    head: Linear<B>,
}

impl<B: Backend> CryCnn<B> {
    pub fn new(channels: &[usize], classes: usize, device: &B::Device) -> Self {
        let mut blocks = Vec::with_capacity(channels.len());
        let mut in_channels = 3;
        for &out_channels in channels {
            blocks.push(ConvBlock::new(in_channels, out_channels, device));
            in_channels = out_channels;
        }
        Self {
            blocks,
            pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            head: LinearConfig::new(in_channels, classes).init(device),
        }
    }

    /// `[batch, 3, height, width]` in `0..=1` to `[batch, classes]` probabilities.
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = images;
        for block in &self.blocks {
            x = block.forward(x);
        }
        let pooled: Tensor<B, 2> = self.pool.forward(x).flatten(1, 3);
        softmax(self.head.forward(pooled), 1)
    }
}

/// Loaded CNN plus its layout.
pub struct CnnModel {
    config: CnnConfig,
    network: Mutex<CryCnn<CnnBackend>>,
    device: NdArrayDevice,
}

impl CnnModel {
    /// Load the JSON config at `path` and the burnpack it names.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let bytes = std::fs::read(path).map_err(|err| PipelineError::model_load(path, err))?;
        let config: CnnConfig =
            serde_json::from_slice(&bytes).map_err(|err| PipelineError::model_load(path, err))?;
        config
            .validate()
            .map_err(|err| PipelineError::model_load(path, err))?;

        let weights_path = path
            .parent()
            .map(|dir| dir.join(&config.weights))
            .unwrap_or_else(|| config.weights.clone());
        if !weights_path.exists() {
            return Err(PipelineError::model_load(
                &weights_path,
                "CNN burnpack weights not found",
            ));
        }
        let weights_str = weights_path.to_str().ok_or_else(|| {
            PipelineError::model_load(&weights_path, "burnpack path contains invalid UTF-8")
        })?;

        let device = NdArrayDevice::default();
        let mut network =
            CryCnn::<CnnBackend>::new(&config.channels, config.classes.len(), &device);
        let mut store = BurnpackStore::from_file(weights_str);
        network
            .load_from(&mut store)
            .map_err(|err| PipelineError::model_load(&weights_path, format!("{err:?}")))?;
        info!(
            path = %weights_path.display(),
            blocks = config.channels.len(),
            "Loaded CNN weights"
        );
        Ok(Self::from_parts(config, network, device))
    }

    /// Wrap an in-memory network, e.g. one freshly initialized for evaluation.
    pub fn from_network(config: CnnConfig, network: CryCnn<NdArray>) -> Self {
        Self::from_parts(config, network, NdArrayDevice::default())
    }

    fn from_parts(config: CnnConfig, network: CryCnn<CnnBackend>, device: NdArrayDevice) -> Self {
        Self {
            config,
            network: Mutex::new(network),
            device,
        }
    }

    fn input_shape(&self) -> [usize; 4] {
        let size = self.config.input_size;
        [1, size, size, 3]
    }
}

impl Predictor for CnnModel {
    fn family(&self) -> ModelFamily {
        ModelFamily::Cnn
    }

    fn expected_shape(&self) -> Vec<usize> {
        self.input_shape().to_vec()
    }

    fn score(&self, input: &FeatureTensor) -> Result<RawOutput, PipelineError> {
        let image = match input {
            FeatureTensor::Image(image) if image.shape() == self.input_shape() => image,
            other => {
                return Err(PipelineError::ShapeMismatch {
                    expected: self.expected_shape(),
                    actual: other.shape(),
                });
            }
        };
        let scaled: Vec<f32> = image.data().iter().map(|&v| v / 255.0).collect();
        let data = TensorData::new(scaled, self.input_shape());
        let nchw = Tensor::<CnnBackend, 4>::from_data(data, &self.device).permute([0, 3, 1, 2]);

        let output = {
            let network = self
                .network
                .lock()
                .map_err(|_| PipelineError::invalid_output("CNN model lock poisoned"))?;
            network.forward(nchw)
        };
        let probabilities = output
            .into_data()
            .to_vec::<f32>()
            .map_err(|err| PipelineError::invalid_output(format!("{err:?}")))?;
        Ok(RawOutput::Probabilities(probabilities))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ImageTensor;

    fn config(input_size: usize) -> CnnConfig {
        CnnConfig {
            model_version: 1,
            input_size,
            channels: vec![2, 4],
            classes: CryLabel::ALL.to_vec(),
            weights: PathBuf::from("cnn.bpk"),
        }
    }

    fn small_model() -> CnnModel {
        let device = NdArrayDevice::default();
        let network = CryCnn::<CnnBackend>::new(&[2, 4], 5, &device);
        CnnModel::from_parts(config(16), network, device)
    }

    #[test]
    fn scores_a_probability_per_label() {
        let model = small_model();
        let pixels: Vec<f32> = (0..16 * 16 * 3).map(|i| (i % 256) as f32).collect();
        let input = FeatureTensor::Image(ImageTensor::new(16, pixels).unwrap());
        match model.score(&input).unwrap() {
            RawOutput::Probabilities(probs) => {
                assert_eq!(probs.len(), 5);
                let sum: f32 = probs.iter().sum();
                assert!((sum - 1.0).abs() < 1e-4);
            }
            other => panic!("unexpected output {other:?}"),
        }
    }

    #[test]
    fn rejects_wrong_image_size() {
        let model = small_model();
        let input = FeatureTensor::Image(ImageTensor::new(8, vec![0.0; 8 * 8 * 3]).unwrap());
        assert!(matches!(
            model.score(&input),
            Err(PipelineError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn config_validation() {
        assert!(config(224).validate().is_ok());
        assert!(config(2).validate().is_err());
        let mut bad = config(224);
        bad.classes.swap(0, 1);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn load_reports_missing_weights() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cnn.json");
        std::fs::write(&path, serde_json::to_vec(&config(224)).unwrap()).unwrap();
        let err = CnnModel::load(&path).err().unwrap();
        match err {
            PipelineError::ModelLoad { path, .. } => assert!(path.ends_with("cnn.bpk")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
