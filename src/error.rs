use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlbummuxError {
    #[error("Missing required tools: {}", .0.join(", "))]
    ToolingMissing(Vec<String>),

    #[error("Segment encode failed: {0}")]
    EncodeFailed(String),

    #[error("Final combine failed: {0}")]
    CombineFailed(String),

    #[error("Invalid job: {0}")]
    InvalidJob(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, AlbummuxError>;
