use crate::error::InferenceError;
use image::RgbImage;

/// Score for one class of the model's label set.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub class_index: usize,
    pub label: String,
    pub confidence: f32,
}

pub trait ImageClassifier: Send + Sync {
    /// Scores `image` against every class the model knows.
    ///
    /// Returns one entry per class in class-index order; confidences form a
    /// probability distribution (each in [0, 1], summing to ~1).
    fn classify(&self, image: &RgbImage) -> Result<Vec<Classification>, InferenceError>;
}
