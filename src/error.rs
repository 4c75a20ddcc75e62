use std::path::PathBuf;
use thiserror::Error;
use tract_onnx::prelude::TractError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("model file not found: {0}")]
    ModelNotFound(PathBuf),
    #[error("labels file not found: {0}")]
    LabelsNotFound(PathBuf),
}

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("failed to read labels from {path}: {source}")]
    Labels {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("labels file {0} contains no labels")]
    EmptyLabels(PathBuf),
    #[error("failed to load model {path}: {error:#}")]
    Runtime { path: PathBuf, error: TractError },
}

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("model run failed: {0:#}")]
    Runtime(TractError),
    #[error("model produced no output")]
    NoOutput,
    #[error("model produced a non-finite score for class {0}")]
    NonFinite(usize),
    #[error("model has {classes} classes but {labels} labels were loaded")]
    LabelMismatch { classes: usize, labels: usize },
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("unsupported file type {0:?}, expected one of jpg, jpeg, png")]
    UnsupportedExtension(String),
    #[error("uploaded file is empty")]
    Empty,
}

/// Failure of a single prediction request.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    Decode(#[from] image::ImageError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error(transparent)]
    ModelLoad(#[from] ModelLoadError),
}
