use config::{ClassifierBackend, Config, FrontendKind};
use error::ModelLoadError;
use frontend::impl_gui::FrontendGui;
use frontend::impl_web::FrontendWeb;
use frontend::interface::Frontend;
use image_classifier::impl_fake::ImageClassifierFake;
use image_classifier::impl_tract_onnx::ImageClassifierTractOnnx;
use library::logger::impl_console::LoggerConsole;
use library::logger::interface::Logger;
use model_holder::{ModelHandle, ModelHolder, ModelLoader};
use std::sync::Arc;

mod config;
mod error;
mod frontend;
mod image_classifier;
mod library;
mod model_holder;
mod prediction;
mod upload;

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::from_env()?;

    let logger: Arc<dyn Logger + Send + Sync> = Arc::new(LoggerConsole::new(config.logger_timezone));

    if let Err(e) = config.validate() {
        let _ = logger.error(&format!("Invalid configuration: {}", e));
        return Err(e.into());
    }

    let holder = ModelHolder::new(model_loader(&config, logger.clone()), logger.clone());

    let frontend: Box<dyn Frontend> = match config.frontend {
        FrontendKind::Web => Box::new(FrontendWeb::new(
            config.web_addr,
            config.top_k,
            holder,
            logger.clone(),
        )),
        FrontendKind::Gui => Box::new(FrontendGui::new(config.top_k, holder, logger.clone())),
    };

    frontend.run()?;

    Ok(())
}

fn model_loader(config: &Config, logger: Arc<dyn Logger + Send + Sync>) -> ModelLoader {
    match config.backend {
        ClassifierBackend::TractOnnx => {
            let model_config = config.model.clone();
            Box::new(move || -> Result<ModelHandle, ModelLoadError> {
                let model = ImageClassifierTractOnnx::new(model_config.clone(), logger.clone())?;
                Ok(Arc::new(model) as ModelHandle)
            })
        }
        ClassifierBackend::Fake => Box::new(move || {
            Ok(Arc::new(ImageClassifierFake::new(logger.clone())) as ModelHandle)
        }),
    }
}
