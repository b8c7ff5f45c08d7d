//! Image → tensor pipeline for the severity model.
//!
//! decode → nearest-neighbour resize to 224×224 → cast to f32 → divide by
//! 255 → leading batch dimension. The resize and the normalisation must
//! match what the model was trained with: a different resampling filter
//! shifts predictions, and unnormalised inputs collapse them.

use image::RgbImage;

use crate::acquisition::ImageSource;
use crate::error::PreprocessError;
use crate::preprocess::tensor::PreparedTensor;

/// Spatial size the model consumes.
pub const INPUT_SIZE: u32 = 224;

/// Decodes PNG/JPEG/BMP/GIF bytes into RGB, discarding any alpha channel.
pub fn decode(bytes: &[u8]) -> Result<RgbImage, PreprocessError> {
    let img = image::load_from_memory(bytes)?;
    if img.width() == 0 || img.height() == 0 {
        return Err(PreprocessError::EmptyImage);
    }
    Ok(img.to_rgb8())
}

/// Nearest-neighbour resize without corner alignment or half-pixel
/// centres: output pixel `d` samples source `min(in - 1, floor(d * in / out))`.
pub fn resize_nearest(src: &RgbImage, width: u32, height: u32) -> RgbImage {
    let xs = source_indices(src.width(), width);
    let ys = source_indices(src.height(), height);
    RgbImage::from_fn(width, height, |x, y| *src.get_pixel(xs[x as usize], ys[y as usize]))
}

fn source_indices(input: u32, output: u32) -> Vec<u32> {
    let scale = input as f64 / output as f64;
    (0..output)
        .map(|d| ((d as f64 * scale).floor() as u32).min(input.saturating_sub(1)))
        .collect()
}

/// Casts every channel to f32, divides by 255 and adds the batch axis.
pub fn to_normalized_tensor(img: &RgbImage) -> PreparedTensor {
    let data = img.as_raw().iter().map(|&v| v as f32 / 255.0).collect();
    PreparedTensor::batched(img.height() as usize, img.width() as usize, 3, data)
}

/// Runs the full pipeline on an acquired image.
pub fn prepare(source: &ImageSource) -> Result<PreparedTensor, PreprocessError> {
    prepare_bytes(source.bytes())
}

pub fn prepare_bytes(bytes: &[u8]) -> Result<PreparedTensor, PreprocessError> {
    let decoded = decode(bytes)?;
    let resized = resize_nearest(&decoded, INPUT_SIZE, INPUT_SIZE);
    Ok(to_normalized_tensor(&resized))
}
