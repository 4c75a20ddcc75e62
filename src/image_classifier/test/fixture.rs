use crate::image_classifier::{impl_fake::ImageClassifierFake, interface::ImageClassifier};
use crate::library::logger::{impl_console::LoggerConsole, interface::Logger};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::Arc;

pub struct Fixture {
    pub logger: Arc<dyn Logger + Send + Sync>,
    pub image_classifier: Arc<dyn ImageClassifier + Send + Sync>,
}

impl Fixture {
    pub fn new() -> Self {
        let logger: Arc<dyn Logger + Send + Sync> =
            Arc::new(LoggerConsole::new(chrono::FixedOffset::east_opt(0).unwrap()));
        let image_classifier = Arc::new(ImageClassifierFake::new(logger.clone()));

        Self {
            logger,
            image_classifier,
        }
    }

    pub fn with_labels(labels: &[&str]) -> Self {
        let f = Self::new();
        let labels = labels.iter().map(|label| label.to_string()).collect();
        let image_classifier = Arc::new(ImageClassifierFake::with_labels(labels, f.logger.clone()));

        Self {
            image_classifier,
            ..f
        }
    }
}

pub fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

pub fn solid_png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    encode(
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color))),
        ImageFormat::Png,
    )
}
