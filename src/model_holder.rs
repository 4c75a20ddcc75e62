use crate::error::ModelLoadError;
use crate::image_classifier::interface::ImageClassifier;
use crate::library::logger::interface::Logger;
use std::sync::Arc;

pub type ModelHandle = Arc<dyn ImageClassifier + Send + Sync>;

pub type ModelLoader = Box<dyn Fn() -> Result<ModelHandle, ModelLoadError> + Send + Sync>;

/// Loads the classifier on first use and hands out the same instance after.
pub struct ModelHolder {
    loader: ModelLoader,
    model: Option<ModelHandle>,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl ModelHolder {
    pub fn new(loader: ModelLoader, logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            loader,
            model: None,
            logger: logger.with_namespace("model_holder"),
        }
    }

    /// Failed loads are not remembered; the next call tries again.
    pub fn get_model(&mut self) -> Result<ModelHandle, ModelLoadError> {
        if let Some(model) = &self.model {
            return Ok(model.clone());
        }

        let _ = self.logger.info("Loading model...");

        match (self.loader)() {
            Ok(model) => {
                let _ = self.logger.info("Model ready");
                self.model = Some(model.clone());
                Ok(model)
            }
            Err(e) => {
                let _ = self.logger.error(&format!("Model load failed: {}", e));
                Err(e)
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }
}
