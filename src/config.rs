use crate::error::ConfigError;
use crate::image_classifier::models::model_config::{ModelConfig, Normalization};
use chrono::Offset;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrontendKind {
    Web,
    Gui,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClassifierBackend {
    TractOnnx,
    Fake,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: ClassifierBackend,
    pub model: ModelConfig,
    pub top_k: usize,
    pub frontend: FrontendKind,
    pub web_addr: SocketAddr,
    pub logger_timezone: chrono::FixedOffset,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: ClassifierBackend::TractOnnx,
            model: ModelConfig::default(),
            top_k: 5,
            frontend: FrontendKind::Web,
            web_addr: SocketAddr::from(([127, 0, 0, 1], 8501)),
            logger_timezone: utc(),
        }
    }
}

const BACKEND: &str = "IMAGE_CLASSIFIER_BACKEND";
const MODEL: &str = "IMAGE_CLASSIFIER_MODEL";
const LABELS: &str = "IMAGE_CLASSIFIER_LABELS";
const INPUT_SIZE: &str = "IMAGE_CLASSIFIER_INPUT_SIZE";
const NORMALIZATION: &str = "IMAGE_CLASSIFIER_NORMALIZATION";
const TOP_K: &str = "IMAGE_CLASSIFIER_TOP_K";
const FRONTEND: &str = "IMAGE_CLASSIFIER_FRONTEND";
const ADDR: &str = "IMAGE_CLASSIFIER_ADDR";
const TZ_OFFSET_HOURS: &str = "IMAGE_CLASSIFIER_TZ_OFFSET_HOURS";

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from `lookup`, falling back to defaults for unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(BACKEND) {
            config.backend = match value.trim().to_lowercase().as_str() {
                "tract" => ClassifierBackend::TractOnnx,
                "fake" => ClassifierBackend::Fake,
                _ => return Err(invalid(BACKEND, &value, "expected tract or fake")),
            };
        }

        if let Some(path) = lookup(MODEL) {
            config.model.onnx_model_path = PathBuf::from(path);
        }

        if let Some(path) = lookup(LABELS) {
            config.model.labels_path = match path.trim() {
                "" | "none" => None,
                path => Some(PathBuf::from(path)),
            };
        }

        if let Some(value) = lookup(INPUT_SIZE) {
            let size = parse_positive(INPUT_SIZE, &value)?;
            let size = u32::try_from(size).map_err(|_| invalid(INPUT_SIZE, &value, "too large"))?;
            config.model.input_shape = (size, size);
        }

        if let Some(value) = lookup(NORMALIZATION) {
            config.model.normalization = match value.trim().to_lowercase().as_str() {
                "unit" => Normalization::unit(),
                "imagenet" => Normalization::imagenet(),
                _ => return Err(invalid(NORMALIZATION, &value, "expected unit or imagenet")),
            };
        }

        if let Some(value) = lookup(TOP_K) {
            config.top_k = parse_positive(TOP_K, &value)?;
        }

        if let Some(value) = lookup(FRONTEND) {
            config.frontend = match value.trim().to_lowercase().as_str() {
                "web" => FrontendKind::Web,
                "gui" => FrontendKind::Gui,
                _ => return Err(invalid(FRONTEND, &value, "expected web or gui")),
            };
        }

        if let Some(value) = lookup(ADDR) {
            config.web_addr = value
                .trim()
                .parse()
                .map_err(|e: std::net::AddrParseError| invalid(ADDR, &value, &e.to_string()))?;
        }

        if let Some(value) = lookup(TZ_OFFSET_HOURS) {
            let hours: i32 = value
                .trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| invalid(TZ_OFFSET_HOURS, &value, &e.to_string()))?;
            config.logger_timezone = hours
                .checked_mul(3600)
                .and_then(chrono::FixedOffset::east_opt)
                .ok_or_else(|| invalid(TZ_OFFSET_HOURS, &value, "offset out of range"))?;
        }

        Ok(config)
    }

    /// Checks that referenced files exist before anything tries to load them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == ClassifierBackend::TractOnnx {
            if !self.model.onnx_model_path.is_file() {
                return Err(ConfigError::ModelNotFound(
                    self.model.onnx_model_path.clone(),
                ));
            }

            if let Some(labels_path) = &self.model.labels_path {
                if !labels_path.is_file() {
                    return Err(ConfigError::LabelsNotFound(labels_path.clone()));
                }
            }
        }

        if self.top_k == 0 {
            return Err(invalid(TOP_K, "0", "must be greater than zero"));
        }

        let (height, width) = self.model.input_shape;
        if height == 0 || width == 0 {
            return Err(invalid(
                INPUT_SIZE,
                &format!("{}x{}", height, width),
                "must be greater than zero",
            ));
        }

        Ok(())
    }
}

fn parse_positive(key: &'static str, value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(0) => Err(invalid(key, value, "must be greater than zero")),
        Ok(parsed) => Ok(parsed),
        Err(e) => Err(invalid(key, value, &e.to_string())),
    }
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn utc() -> chrono::FixedOffset {
    chrono::Utc.fix()
}
