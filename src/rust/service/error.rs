use thiserror::Error;

use crate::classifier::ClassifierError;

/// Failures surfaced by the HTTP-facing services.
///
/// Decode, inference and internal failures all reach the caller as the same
/// generic error response; only upload problems are client errors.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Could not decode image: {0}")]
    Decode(String),
    #[error("Inference failed: {0}")]
    Inference(#[source] ClassifierError),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Missing upload: {0}")]
    MissingUpload(String),
    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),
}

impl From<ClassifierError> for ServiceError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::DecodeError(msg) => ServiceError::Decode(msg),
            other => ServiceError::Inference(other),
        }
    }
}

impl From<image::ImageError> for ServiceError {
    fn from(err: image::ImageError) -> Self {
        ServiceError::Decode(err.to_string())
    }
}

impl ServiceError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingUpload(_) => 422,
            Self::PayloadTooLarge(_) => 413,
            Self::Decode(_) | Self::Inference(_) | Self::Internal(_) => 500,
        }
    }
}
