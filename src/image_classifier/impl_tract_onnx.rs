use crate::error::{InferenceError, ModelLoadError};
use crate::image_classifier::interface::{Classification, ImageClassifier};
use crate::image_classifier::labels::{fallback_label, load_labels};
use crate::image_classifier::scores::to_probabilities;
use crate::image_classifier::tract::image::resize_image_to_tensor;
use crate::library::logger::interface::Logger;
use image::RgbImage;
use std::sync::Arc;
use std::time::Instant;
use tract_onnx::prelude::*;

use super::models::model_config::ModelConfig;

pub struct ImageClassifierTractOnnx {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>,
    labels: Option<Vec<String>>,
    config: ModelConfig,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl ImageClassifierTractOnnx {
    pub fn new(
        config: ModelConfig,
        logger: Arc<dyn Logger + Send + Sync>,
    ) -> Result<Self, ModelLoadError> {
        let logger = logger.with_namespace("tract_onnx");
        let started = Instant::now();
        let _ = logger.info(&format!(
            "Loading model from {}",
            config.onnx_model_path.display()
        ));

        let labels = match &config.labels_path {
            Some(path) => Some(load_labels(path)?),
            None => None,
        };

        let (height, width) = config.input_shape;
        let model = tract_onnx::onnx()
            .model_for_path(&config.onnx_model_path)
            .and_then(|model| {
                model.with_input_fact(
                    0,
                    f32::fact([1, 3, height as usize, width as usize]).into(),
                )
            })
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|error| ModelLoadError::Runtime {
                path: config.onnx_model_path.clone(),
                error,
            })?;

        let _ = logger.info(&format!(
            "Model loaded in {:?} ({} labels)",
            started.elapsed(),
            labels.as_ref().map_or(0, Vec::len)
        ));

        Ok(Self {
            model,
            labels,
            config,
            logger,
        })
    }

    fn label_for(&self, class_index: usize) -> String {
        match &self.labels {
            Some(labels) => labels[class_index].clone(),
            None => fallback_label(class_index),
        }
    }
}

impl ImageClassifier for ImageClassifierTractOnnx {
    fn classify(&self, image: &RgbImage) -> Result<Vec<Classification>, InferenceError> {
        let started = Instant::now();
        let input = resize_image_to_tensor(
            image,
            self.config.input_shape.1, // width
            self.config.input_shape.0, // height
            &self.config.normalization,
        );

        let outputs = self
            .model
            .run(tvec!(input.into_tvalue()))
            .map_err(InferenceError::Runtime)?;

        let output = outputs.first().ok_or(InferenceError::NoOutput)?;
        let scores: Vec<f32> = output
            .to_array_view::<f32>()
            .map_err(InferenceError::Runtime)?
            .iter()
            .copied()
            .collect();

        if scores.is_empty() {
            return Err(InferenceError::NoOutput);
        }

        if let Some(labels) = &self.labels {
            if labels.len() != scores.len() {
                return Err(InferenceError::LabelMismatch {
                    classes: scores.len(),
                    labels: labels.len(),
                });
            }
        }

        let probabilities = to_probabilities(&scores)?;

        let _ = self.logger.info(&format!(
            "Scored {} classes in {:?}",
            probabilities.len(),
            started.elapsed()
        ));

        Ok(probabilities
            .into_iter()
            .enumerate()
            .map(|(class_index, confidence)| Classification {
                class_index,
                label: self.label_for(class_index),
                confidence,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_classifier::models::model_config::Normalization;
    use crate::image_classifier::test::fixture::{solid_png, Fixture};
    use crate::prediction::predict;
    use image::Rgb;
    use prost::Message;
    use std::path::{Path, PathBuf};
    use tract_onnx::pb;

    fn node(op_type: &str, input: &str, output: &str) -> pb::NodeProto {
        pb::NodeProto {
            input: vec![input.to_string()],
            output: vec![output.to_string()],
            name: output.to_string(),
            op_type: op_type.to_string(),
            ..Default::default()
        }
    }

    /// Three classes, one per colour channel: the softmax of the mean of
    /// each channel.
    fn write_channel_mean_model(dir: &Path) -> PathBuf {
        let float = pb::tensor_proto::DataType::Float as i32;
        let graph = pb::GraphProto {
            name: "channel_mean".to_string(),
            node: vec![
                node("GlobalAveragePool", "input", "pooled"),
                node("Flatten", "pooled", "flat"),
                node("Softmax", "flat", "output"),
            ],
            input: vec![pb::ValueInfoProto {
                name: "input".to_string(),
                r#type: Some(pb::TypeProto {
                    value: Some(pb::type_proto::Value::TensorType(pb::type_proto::Tensor {
                        elem_type: float,
                        shape: None,
                    })),
                    ..Default::default()
                }),
                ..Default::default()
            }],
            output: vec![pb::ValueInfoProto {
                name: "output".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let model = pb::ModelProto {
            ir_version: 7,
            opset_import: vec![pb::OperatorSetIdProto {
                domain: String::new(),
                version: 13,
            }],
            producer_name: "image-classifier-tests".to_string(),
            graph: Some(graph),
            ..Default::default()
        };

        let path = dir.join("channel_mean.onnx");
        std::fs::write(&path, model.encode_to_vec()).unwrap();
        path
    }

    fn channel_mean_config(dir: &Path, labels_path: Option<PathBuf>) -> ModelConfig {
        ModelConfig {
            onnx_model_path: write_channel_mean_model(dir),
            labels_path,
            input_shape: (8, 8),
            normalization: Normalization::unit(),
        }
    }

    #[test]
    fn test_classify_runs_model_with_fallback_names() {
        let f = Fixture::new();
        let dir = tempfile::tempdir().unwrap();
        let classifier =
            ImageClassifierTractOnnx::new(channel_mean_config(dir.path(), None), f.logger.clone())
                .unwrap();
        let red = RgbImage::from_pixel(8, 8, Rgb([255, 0, 0]));

        let classifications = classifier.classify(&red).unwrap();

        let labels: Vec<&str> = classifications.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["class_0", "class_1", "class_2"]);
        let total: f32 = classifications.iter().map(|c| c.confidence).sum();
        assert!((total - 1.0).abs() < 1e-4);
        assert!(classifications[0].confidence > classifications[1].confidence);
        assert!((classifications[1].confidence - classifications[2].confidence).abs() < 1e-6);
    }

    #[test]
    fn test_classify_rejects_label_count_mismatch() {
        let f = Fixture::new();
        let dir = tempfile::tempdir().unwrap();
        let labels_path = dir.path().join("labels.txt");
        std::fs::write(&labels_path, "red\ngreen\n").unwrap();
        let classifier = ImageClassifierTractOnnx::new(
            channel_mean_config(dir.path(), Some(labels_path)),
            f.logger.clone(),
        )
        .unwrap();
        let red = RgbImage::from_pixel(8, 8, Rgb([255, 0, 0]));

        let result = classifier.classify(&red);

        assert!(matches!(
            result,
            Err(InferenceError::LabelMismatch {
                classes: 3,
                labels: 2
            })
        ));
    }

    #[test]
    fn test_predict_names_top_class_from_labels() {
        let f = Fixture::new();
        let dir = tempfile::tempdir().unwrap();
        let labels_path = dir.path().join("labels.txt");
        std::fs::write(&labels_path, "red\ngreen\nblue\n").unwrap();
        let classifier = ImageClassifierTractOnnx::new(
            channel_mean_config(dir.path(), Some(labels_path)),
            f.logger.clone(),
        )
        .unwrap();

        let predictions = predict(&classifier, &solid_png(100, 100, [0, 0, 255]), 5).unwrap();

        assert_eq!(predictions.len(), 3);
        assert_eq!(predictions[0].class_name, "blue");
        assert!(predictions[0].probability > predictions[1].probability);
    }

    #[test]
    fn test_new_reports_missing_model() {
        let f = Fixture::new();
        let dir = tempfile::tempdir().unwrap();
        let config = ModelConfig {
            onnx_model_path: dir.path().join("missing.onnx"),
            labels_path: None,
            ..ModelConfig::default()
        };

        let result = ImageClassifierTractOnnx::new(config, f.logger.clone());

        assert!(matches!(result, Err(ModelLoadError::Runtime { .. })));
    }

    #[test]
    fn test_new_reports_corrupt_model() {
        let f = Fixture::new();
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("corrupt.onnx");
        std::fs::write(&model_path, b"definitely not protobuf").unwrap();
        let config = ModelConfig {
            onnx_model_path: model_path,
            labels_path: None,
            ..ModelConfig::default()
        };

        let result = ImageClassifierTractOnnx::new(config, f.logger.clone());

        assert!(result.is_err());
    }

    #[test]
    fn test_new_reads_labels_before_model() {
        let f = Fixture::new();
        let dir = tempfile::tempdir().unwrap();
        let config = ModelConfig {
            onnx_model_path: dir.path().join("missing.onnx"),
            labels_path: Some(dir.path().join("missing.txt")),
            ..ModelConfig::default()
        };

        let result = ImageClassifierTractOnnx::new(config, f.logger.clone());

        assert!(matches!(result, Err(ModelLoadError::Labels { .. })));
    }
}
