//! Log-frequency dB spectrogram rendered onto a fixed 1000x600 canvas.

mod canvas;
mod colormap;
mod stft;

use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{ImageFormat, RgbImage};
use tracing::debug;

use crate::analysis::audio::Waveform;
use crate::error::PipelineError;

pub use canvas::{CANVAS_HEIGHT, CANVAS_WIDTH};

/// Rendered spectrogram raster with its axes, title and colour bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    image: RgbImage,
}

impl Spectrogram {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// PNG-encoded bytes of the raster.
    pub fn to_png(&self) -> Result<Vec<u8>, PipelineError> {
        let mut cursor = Cursor::new(Vec::new());
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| PipelineError::Render {
                message: err.to_string(),
            })?;
        Ok(cursor.into_inner())
    }

    /// Standard-alphabet base64 of the PNG bytes.
    pub fn to_base64(&self) -> Result<String, PipelineError> {
        Ok(STANDARD.encode(self.to_png()?))
    }
}

/// Render a waveform to a spectrogram image.
///
/// Identical waveforms always produce byte-identical rasters.
pub fn render(waveform: &Waveform) -> Result<Spectrogram, PipelineError> {
    if waveform.is_empty() {
        return Err(PipelineError::EmptySignal);
    }
    let spec = stft::db_spectrogram(waveform.samples());
    debug!(
        frames = spec.frames,
        bins = spec.bins,
        "Rendering spectrogram"
    );
    let image = canvas::draw(&spec, waveform.sample_rate(), waveform.duration_seconds());
    Ok(Spectrogram { image })
}
