use crate::image_classifier::models::model_config::Normalization;
use image::{imageops, RgbImage};
use tract_onnx::prelude::*;

/// Scales `image` to fit `width`x`height`, keeping its aspect ratio and
/// centering it on a black canvas.
pub fn letterbox(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    if image.width() == image.height() && width == height {
        return imageops::resize(image, width, height, imageops::FilterType::Triangle);
    }

    let (w, h) = (image.width() as f32, image.height() as f32);
    let scale = (width as f32 / w).min(height as f32 / h);
    let new_w = ((w * scale) as u32).clamp(1, width);
    let new_h = ((h * scale) as u32).clamp(1, height);

    let scaled = imageops::resize(image, new_w, new_h, imageops::FilterType::Triangle);

    let mut padded = RgbImage::new(width, height);
    let x_offset = (width - new_w) / 2;
    let y_offset = (height - new_h) / 2;
    imageops::overlay(&mut padded, &scaled, x_offset as i64, y_offset as i64);

    padded
}

/// Lays `image` out as a `[1, 3, H, W]` f32 tensor.
pub fn image_to_tensor(image: &RgbImage, normalization: &Normalization) -> Tensor {
    let (width, height) = (image.width() as usize, image.height() as usize);

    tract_ndarray::Array4::from_shape_fn((1, 3, height, width), |(_, c, y, x)| {
        let pixel = image.get_pixel(x as u32, y as u32);
        (pixel[c] as f32 / 255.0 - normalization.mean[c]) / normalization.std[c]
    })
    .into_tensor()
}

pub fn resize_image_to_tensor(
    image: &RgbImage,
    width: u32,
    height: u32,
    normalization: &Normalization,
) -> Tensor {
    let resized = letterbox(image, width, height);
    image_to_tensor(&resized, normalization)
}
