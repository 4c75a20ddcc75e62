use std::error::Error;

/// A user-facing surface that drives upload, preview and prediction.
pub trait Frontend {
    /// Blocks until the front end shuts down.
    fn run(self: Box<Self>) -> Result<(), Box<dyn Error + Send + Sync>>;
}
