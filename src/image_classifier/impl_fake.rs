use crate::error::InferenceError;
use crate::image_classifier::interface::{Classification, ImageClassifier};
use crate::image_classifier::scores::softmax;
use crate::library::logger::interface::Logger;
use image::RgbImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

/// Classifier that needs no model file. Scores are drawn from an RNG seeded
/// with the image's pixels, so the same image always gets the same answer.
pub struct ImageClassifierFake {
    labels: Vec<String>,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl ImageClassifierFake {
    pub fn new(logger: Arc<dyn Logger + Send + Sync>) -> Self {
        let labels = [
            "dog", "cat", "person", "car", "chair", "table", "bird", "tree", "bicycle", "book",
            "laptop", "phone", "cup", "bottle", "keyboard", "mouse", "plant", "clock",
        ]
        .iter()
        .map(|label| label.to_string())
        .collect();

        Self::with_labels(labels, logger)
    }

    pub fn with_labels(labels: Vec<String>, logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            labels,
            logger: logger.with_namespace("fake"),
        }
    }

    fn seed(image: &RgbImage) -> u64 {
        let mut hasher = DefaultHasher::new();
        image.dimensions().hash(&mut hasher);
        image.as_raw().hash(&mut hasher);
        hasher.finish()
    }
}

impl ImageClassifier for ImageClassifierFake {
    fn classify(&self, image: &RgbImage) -> Result<Vec<Classification>, InferenceError> {
        let _ = self.logger.info("Classifying image with fake classifier...");

        let mut rng = StdRng::seed_from_u64(Self::seed(image));
        let logits: Vec<f32> = self
            .labels
            .iter()
            .map(|_| rng.random_range(-4.0..4.0))
            .collect();

        Ok(softmax(&logits)
            .into_iter()
            .zip(&self.labels)
            .enumerate()
            .map(|(class_index, (confidence, label))| Classification {
                class_index,
                label: label.clone(),
                confidence,
            })
            .collect())
    }
}
