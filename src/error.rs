use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Inference failed: {0}")]
    InferenceError(String),

    #[error("Enhancement failed: {0}")]
    EnhancementError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Machine-readable error report emitted by the CLI
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl PipelineError {
    /// Stable error code for callers that report failures outside Rust
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::DecodeError(_) => "DECODE_ERROR",
            PipelineError::InvalidDimensions { .. } => "INVALID_DIMENSIONS",
            PipelineError::ModelUnavailable(_) => "MODEL_UNAVAILABLE",
            PipelineError::InferenceError(_) => "INFERENCE_ERROR",
            PipelineError::EnhancementError(_) => "ENHANCEMENT_ERROR",
            PipelineError::Io(_) => "IO_ERROR",
            PipelineError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the page can still be processed with a stage fallback
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PipelineError::ModelUnavailable(_) | PipelineError::InferenceError(_)
        )
    }
}

impl From<&PipelineError> for ErrorResponse {
    fn from(err: &PipelineError) -> Self {
        Self {
            error: err.to_string(),
            code: err.code().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_errors_are_recoverable() {
        assert!(PipelineError::ModelUnavailable("layout.rten".to_string()).is_recoverable());
        assert!(PipelineError::InferenceError("bad shape".to_string()).is_recoverable());
    }

    #[test]
    fn test_page_and_runtime_errors_are_not_recoverable() {
        assert!(!PipelineError::DecodeError("truncated".to_string()).is_recoverable());
        assert!(!PipelineError::InvalidDimensions { width: 0, height: 10 }.is_recoverable());
        assert!(!PipelineError::Internal("task panicked".to_string()).is_recoverable());
    }

    #[test]
    fn test_error_response_carries_code() {
        let response = ErrorResponse::from(&PipelineError::InferenceError("nan".to_string()));
        assert_eq!(response.code, "INFERENCE_ERROR");
        assert_eq!(response.error, "Inference failed: nan");
    }
}
