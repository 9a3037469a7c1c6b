//! # Analysis Error Types Module
//!
//! This module defines the error types surfaced by the label analysis system.
//!
//! Extraction over recognized text never fails: a token that cannot be parsed
//! or a pattern that does not match simply leaves the field absent. Errors only
//! come from constructing the analyzer, decoding images and talking to the
//! recognition engine.

use thiserror::Error;

/// Custom error types for label analysis
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Bytes could not be decoded as an image
    #[error("Could not read image: {0}")]
    ImageDecode(String),

    /// Image decoded but its format is not accepted by the recognizer
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// The recognition engine failed for one attempt
    #[error("Recognition error: {0}")]
    Recognition(String),

    /// A text pattern failed to compile
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading candidate text or word lists failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for AnalysisError {
    fn from(err: image::ImageError) -> Self {
        AnalysisError::ImageDecode(err.to_string())
    }
}
