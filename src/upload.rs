use crate::error::UploadError;
use std::path::Path;

pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// A file handed to us by the user, not yet decoded.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub extension: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: &str, bytes: Vec<u8>) -> Result<Self, UploadError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(UploadError::UnsupportedExtension(extension));
        }

        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }

        Ok(Self {
            file_name: file_name.to_string(),
            extension,
            bytes,
        })
    }

    /// MIME type sniffed from the bytes; the extension is only a fallback
    /// for content `image` does not recognise.
    pub fn mime_type(&self) -> &'static str {
        if let Ok(format) = image::guess_format(&self.bytes) {
            return format.to_mime_type();
        }

        match self.extension.as_str() {
            "png" => "image/png",
            _ => "image/jpeg",
        }
    }
}
