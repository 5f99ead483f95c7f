//! Image decoding and model input preparation.

use std::path::Path;

use image::DynamicImage;

use crate::error::PipelineError;

/// The model takes square RGB inputs of this side length.
pub const INPUT_SIZE: u32 = 224;
pub const CHANNELS: usize = 3;

/// Length of the flattened NHWC input buffer.
pub const INPUT_LEN: usize = (INPUT_SIZE as usize) * (INPUT_SIZE as usize) * CHANNELS;

pub fn load_image(path: &Path) -> Result<DynamicImage, PipelineError> {
    image::open(path).map_err(|source| PipelineError::ImageDecode {
        path: path.display().to_string(),
        source,
    })
}

/// Resizes to the fixed model resolution and scales pixels to [0, 1].
/// Layout is NHWC, matching the exported network.
pub fn to_input_buffer(image: &DynamicImage) -> Vec<f32> {
    let resized = image
        .resize_exact(INPUT_SIZE, INPUT_SIZE, image::imageops::FilterType::Triangle)
        .to_rgb8();
    resized
        .as_raw()
        .iter()
        .map(|&v| f32::from(v) / 255.0)
        .collect()
}
