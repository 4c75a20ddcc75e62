pub mod impl_fake;
pub mod impl_tract_onnx;
pub mod interface;
pub mod labels;
pub mod models;
pub mod scores;
pub mod tract;

#[cfg(test)]
pub mod test;
