#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),
    #[error("No file uploaded")]
    NoFile,
    #[error("Model load error: {0}")]
    ModelLoad(String),
    #[error("Inference error: {0}")]
    Inference(#[from] tch::TchError),
}
