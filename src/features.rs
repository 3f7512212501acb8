//! Shape adaptation from rendered/extracted features to model input tensors.

use image::imageops::{self, FilterType};

use crate::analysis::mfcc::MfccMatrix;
use crate::analysis::spectrogram::Spectrogram;
use crate::error::PipelineError;

/// Default square edge of image tensors.
pub const DEFAULT_IMAGE_SIZE: u32 = 224;
/// Default length of flat MFCC vectors.
pub const DEFAULT_FLAT_LENGTH: usize = 1200;

/// Resized spectrogram as `[1, size, size, 3]` channel-last `f32` in `0..=255`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    size: usize,
    data: Vec<f32>,
}

impl ImageTensor {
    /// Wrap channel-last pixel data of a `size x size` RGB image.
    pub fn new(size: usize, data: Vec<f32>) -> Result<Self, PipelineError> {
        let expected = size * size * 3;
        if size == 0 || data.len() != expected {
            return Err(PipelineError::ShapeMismatch {
                expected: vec![1, size, size, 3],
                actual: vec![data.len()],
            });
        }
        Ok(Self { size, data })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn shape(&self) -> [usize; 4] {
        [1, self.size, self.size, 3]
    }
}

/// Tiled MFCC vector with shape `[1, len]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatVector {
    data: Vec<f32>,
}

impl FlatVector {
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn shape(&self) -> [usize; 2] {
        [1, self.data.len()]
    }
}

/// Model input, tagged by layout.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureTensor {
    Image(ImageTensor),
    Flat(FlatVector),
}

impl FeatureTensor {
    pub fn shape(&self) -> Vec<usize> {
        match self {
            Self::Image(tensor) => tensor.shape().to_vec(),
            Self::Flat(vector) => vector.shape().to_vec(),
        }
    }
}

impl From<ImageTensor> for FeatureTensor {
    fn from(tensor: ImageTensor) -> Self {
        Self::Image(tensor)
    }
}

impl From<FlatVector> for FeatureTensor {
    fn from(vector: FlatVector) -> Self {
        Self::Flat(vector)
    }
}

/// Bicubic resize of the rendered spectrogram to a `size x size` tensor.
pub fn to_image_tensor(spectrogram: &Spectrogram, size: u32) -> Result<ImageTensor, PipelineError> {
    if size == 0 {
        return Err(PipelineError::invalid_parameter("image size must be positive"));
    }
    let resized = imageops::resize(spectrogram.image(), size, size, FilterType::CatmullRom);
    let data = resized.into_raw().into_iter().map(f32::from).collect();
    ImageTensor::new(size as usize, data)
}

/// Row-major flatten, then cyclic tile to exactly `length` values.
pub fn to_flat_vector(mfcc: &MfccMatrix, length: usize) -> Result<FlatVector, PipelineError> {
    Ok(FlatVector::new(tile_to_length(mfcc.data(), length)?))
}

/// Repeat `values` end to end and cut at `length`.
///
/// Short clips keep their energy profile instead of being diluted with
/// zeros; very short inputs become periodic.
pub fn tile_to_length(values: &[f32], length: usize) -> Result<Vec<f32>, PipelineError> {
    if values.is_empty() || length == 0 {
        return Err(PipelineError::ShapeMismatch {
            expected: vec![1, length],
            actual: vec![1, values.len()],
        });
    }
    Ok(values.iter().copied().cycle().take(length).collect())
}
