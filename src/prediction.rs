use crate::error::PredictError;
use crate::image_classifier::interface::{Classification, ImageClassifier};
use image::{DynamicImage, ImageReader, RgbImage};
use std::io::Cursor;

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub probability: f32,
    pub class_name: String,
}

/// Decodes uploaded bytes, guessing the format from the content, and
/// converts whatever color mode they use to RGB.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, PredictError> {
    let image = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?
        .decode()?;

    Ok(into_rgb(image))
}

fn into_rgb(image: DynamicImage) -> RgbImage {
    match image {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => other.to_rgb8(),
    }
}

/// Highest-probability classes first, at most `k` of them.
///
/// Equal probabilities are ordered by class name, then class index.
pub fn top_k(mut classifications: Vec<Classification>, k: usize) -> Vec<Prediction> {
    classifications.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.label.cmp(&b.label))
            .then_with(|| a.class_index.cmp(&b.class_index))
    });

    classifications
        .into_iter()
        .take(k)
        .map(|c| Prediction {
            probability: c.confidence,
            class_name: c.label,
        })
        .collect()
}

pub fn predict(
    classifier: &dyn ImageClassifier,
    image_bytes: &[u8],
    k: usize,
) -> Result<Vec<Prediction>, PredictError> {
    let image = decode_image(image_bytes)?;
    let classifications = classifier.classify(&image)?;
    Ok(top_k(classifications, k))
}
