use lumigrade_core::AppError;

/// Failure of any stage of the grading pipeline
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Failed to read upload: {0}")]
    Io(#[from] std::io::Error),

    #[error("JPEG encoding failed: {0}")]
    Encode(String),

    #[error("Image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error(
        "Composite layer size {expected_width}x{expected_height} does not match image {actual_width}x{actual_height}"
    )]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },
}

pub type Result<T> = std::result::Result<T, ProcessingError>;

impl From<ProcessingError> for AppError {
    fn from(err: ProcessingError) -> Self {
        AppError::ImageProcessing(err.to_string())
    }
}
