use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Size mismatch: expected {0}, got {1}")]
    SizeMismatch(usize, usize),

    #[error("Unsupported buffer layout: expected a single plane, got {0}")]
    InvalidLayout(usize),

    #[error("Invalid Bayer mosaic: {0}")]
    InvalidMosaic(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Capture source error: {0}")]
    SourceError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CaptureError>;
