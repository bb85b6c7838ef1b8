//! Error types for the fossil_capture library

use thiserror::Error;

/// Result type alias for fossil_capture operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Error types for capture-quality analysis
///
/// Only input problems are errors. A dark frame, a cluttered background or a
/// missing scale reference are findings reported through the feedback list.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Input bytes could not be interpreted as an image
    #[error("Failed to decode image: {message}")]
    DecodeError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Image decoded but its shape makes analysis meaningless
    #[error("Invalid image: {reason}")]
    InvalidImageError { reason: String },

    /// Invalid configuration parameter
    #[error("Invalid parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl AnalysisError {
    /// Create a decode error with context
    pub fn decode<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::DecodeError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a decode error without an underlying cause
    pub fn decode_msg(message: impl Into<String>) -> Self {
        Self::DecodeError {
            message: message.into(),
            source: None,
        }
    }

    /// Create an invalid image error
    pub fn invalid_image(reason: impl Into<String>) -> Self {
        Self::InvalidImageError {
            reason: reason.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.to_string(),
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

    /// Check whether the caller can recover by asking for a new capture
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AnalysisError::DecodeError { .. } | AnalysisError::InvalidImageError { .. }
        )
    }

    /// Get user-friendly error description for application display
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::DecodeError { .. } => {
                "Could not read the photo. Please take the picture again.".to_string()
            }
            AnalysisError::InvalidImageError { .. } => {
                "The photo appears to be empty. Please take the picture again.".to_string()
            }
            AnalysisError::InvalidParameter { .. } | AnalysisError::ConfigError { .. } => {
                "The quality checker is misconfigured. Please contact support.".to_string()
            }
        }
    }
}
