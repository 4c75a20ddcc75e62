use crate::error::{ModelLoadError, PredictError, UploadError};
use crate::library::logger::interface::Logger;
use crate::model_holder::ModelHandle;
use crate::prediction::{predict, Prediction};

pub const TITLE: &str = "Image Classification App";
pub const IMAGE_CAPTION: &str = "Uploaded Image";
pub const IMAGE_WIDTH: u32 = 300;

/// One rendered result: a text line and the fill of its bar.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultLine {
    pub text: String,
    pub fraction: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Results(Vec<ResultLine>),
    /// The upload could not be read or decoded; nothing to preview.
    ImageError(String),
    /// The image is fine but the model could not score it.
    PredictionError(String),
}

pub fn subtitle(top_k: usize) -> String {
    format!("Upload an image to get the top {} predictions", top_k)
}

pub fn results_heading(top_k: usize) -> String {
    format!("Top {} Predictions:", top_k)
}

pub fn format_line(prediction: &Prediction) -> String {
    format!(
        "{}: {:.2}%",
        prediction.class_name,
        prediction.probability * 100.0
    )
}

pub fn result_lines(predictions: &[Prediction]) -> Vec<ResultLine> {
    predictions
        .iter()
        .map(|prediction| ResultLine {
            text: format_line(prediction),
            fraction: prediction.probability.clamp(0.0, 1.0),
        })
        .collect()
}

pub fn image_error_message(error: &dyn std::fmt::Display) -> String {
    format!("Error opening image: {}", error)
}

pub fn error_outcome(error: &PredictError) -> Outcome {
    match error {
        PredictError::Decode(e) => Outcome::ImageError(image_error_message(e)),
        PredictError::Inference(e) => {
            Outcome::PredictionError(format!("Error during prediction: {}", e))
        }
        PredictError::ModelLoad(e) => {
            Outcome::PredictionError(format!("Error loading model: {}", e))
        }
    }
}

pub fn upload_error_outcome(error: &UploadError, logger: &dyn Logger) -> Outcome {
    let _ = logger.error(&format!("Rejected upload: {}", error));
    Outcome::ImageError(image_error_message(error))
}

/// Runs one prediction request end to end and turns the result into
/// something a front end can draw.
pub fn prediction_outcome(
    model: Result<ModelHandle, ModelLoadError>,
    image_bytes: &[u8],
    top_k: usize,
    logger: &dyn Logger,
) -> Outcome {
    let result = model
        .map_err(PredictError::from)
        .and_then(|model| predict(model.as_ref(), image_bytes, top_k));

    match result {
        Ok(predictions) => {
            if let Some(best) = predictions.first() {
                let _ = logger.info(&format!("Prediction: {}", format_line(best)));
            }
            Outcome::Results(result_lines(&predictions))
        }
        Err(e) => {
            let _ = logger.error(&format!("Prediction failed: {}", e));
            error_outcome(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InferenceError;
    use crate::image_classifier::test::fixture::{solid_png, Fixture};
    use std::path::PathBuf;

    #[test]
    fn test_format_line_uses_two_decimal_percent() {
        let prediction = Prediction {
            probability: 0.875,
            class_name: "tabby".to_string(),
        };

        assert_eq!(format_line(&prediction), "tabby: 87.50%");
    }

    #[test]
    fn test_result_lines_keep_order_and_fraction() {
        let predictions = vec![
            Prediction {
                probability: 0.6,
                class_name: "dog".to_string(),
            },
            Prediction {
                probability: 0.004,
                class_name: "cat".to_string(),
            },
        ];

        let lines = result_lines(&predictions);

        assert_eq!(lines[0].text, "dog: 60.00%");
        assert_eq!(lines[0].fraction, 0.6);
        assert_eq!(lines[1].text, "cat: 0.40%");
    }

    #[test]
    fn test_headings() {
        assert_eq!(subtitle(5), "Upload an image to get the top 5 predictions");
        assert_eq!(results_heading(5), "Top 5 Predictions:");
    }

    #[test]
    fn test_prediction_outcome_success() {
        let f = Fixture::new();
        let bytes = solid_png(100, 100, [255, 0, 0]);

        let outcome = prediction_outcome(
            Ok(f.image_classifier.clone()),
            &bytes,
            5,
            f.logger.as_ref(),
        );

        match outcome {
            Outcome::Results(lines) => {
                assert_eq!(lines.len(), 5);
                assert!(lines.iter().all(|line| line.text.ends_with('%')));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_prediction_outcome_decode_failure() {
        let f = Fixture::new();

        let outcome = prediction_outcome(
            Ok(f.image_classifier.clone()),
            b"not an image",
            5,
            f.logger.as_ref(),
        );

        assert!(matches!(outcome, Outcome::ImageError(message) if message.starts_with("Error opening image: ")));
    }

    #[test]
    fn test_prediction_outcome_model_load_failure() {
        let f = Fixture::new();
        let bytes = solid_png(4, 4, [0, 0, 0]);

        let outcome = prediction_outcome(
            Err(ModelLoadError::EmptyLabels(PathBuf::from("labels.txt"))),
            &bytes,
            5,
            f.logger.as_ref(),
        );

        assert!(matches!(outcome, Outcome::PredictionError(message) if message.starts_with("Error loading model: ")));
    }

    #[test]
    fn test_inference_error_message() {
        let outcome = error_outcome(&PredictError::Inference(InferenceError::NoOutput));

        assert_eq!(
            outcome,
            Outcome::PredictionError("Error during prediction: model produced no output".to_string())
        );
    }

    #[test]
    fn test_upload_error_outcome() {
        let f = Fixture::new();

        let outcome = upload_error_outcome(
            &UploadError::UnsupportedExtension("gif".to_string()),
            f.logger.as_ref(),
        );

        assert!(matches!(outcome, Outcome::ImageError(_)));
    }
}
