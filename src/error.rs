//! Error types for the underwater_color library

use thiserror::Error;

/// Result type alias for underwater_color operations
pub type Result<T> = std::result::Result<T, CorrectionError>;

/// Error types for analysis, tuning and correction
#[derive(Error, Debug)]
pub enum CorrectionError {
    /// Input buffer is empty or not 3-channel 8-bit
    #[error("Invalid image: {reason}")]
    InvalidImage { reason: String },

    /// Image file could not be loaded, decoded or written
    #[error("Failed to load image: {message}")]
    ImageLoadError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// OpenCV operation failed
    #[error("OpenCV error: {operation}")]
    OpenCvError {
        operation: String,
        #[source]
        source: Option<opencv::Error>,
    },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },

    /// Generic processing error
    #[error("Processing error: {0}")]
    ProcessingError(String),
}

impl CorrectionError {
    /// Create an invalid image error
    pub fn invalid_image(reason: impl Into<String>) -> Self {
        Self::InvalidImage {
            reason: reason.into(),
        }
    }

    /// Create an image load error with context
    pub fn image_load<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ImageLoadError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error with context
    pub fn config<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ConfigError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an OpenCV error with context
    pub fn opencv(operation: impl Into<String>, source: opencv::Error) -> Self {
        Self::OpenCvError {
            operation: operation.into(),
            source: Some(source),
        }
    }

    /// Check if this error indicates a recoverable condition
    ///
    /// Bad input data can be fixed by the caller and retried; OpenCV and
    /// internal failures cannot.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CorrectionError::InvalidImage { .. }
                | CorrectionError::InvalidParameter { .. }
                | CorrectionError::ConfigError { .. }
        )
    }

    /// Get user-friendly error description for application display
    pub fn user_message(&self) -> String {
        match self {
            CorrectionError::InvalidImage { .. } => {
                "The image is empty or not a 3-channel 8-bit color image.".to_string()
            }
            CorrectionError::ImageLoadError { .. } => {
                "Could not load the image. Please check the file format and try again.".to_string()
            }
            CorrectionError::ConfigError { .. } => {
                "Could not read the configuration file. Please check that it is valid JSON.".to_string()
            }
            CorrectionError::InvalidParameter { parameter, .. } => {
                format!("The value for '{}' is not usable.", parameter)
            }
            _ => "Color correction failed. Please try with a different image.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_image_is_recoverable() {
        let err = CorrectionError::invalid_image("zero-size buffer");
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "Invalid image: zero-size buffer");
    }

    #[test]
    fn test_processing_error_not_recoverable() {
        let err = CorrectionError::ProcessingError("boom".into());
        assert!(!err.is_recoverable());
        assert!(err.user_message().contains("Color correction failed"));
    }

    #[test]
    fn test_config_error_keeps_source() {
        use std::error::Error;

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = CorrectionError::config("reading config.json", io);
        assert!(err.source().is_some());
    }
}
