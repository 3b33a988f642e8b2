//! Error types for the autolabel pipeline.
//!
//! Errors are grouped by the stage that raises them so that messages carry
//! the context a user needs: the offending caption offset, the raw detector
//! string, or the image path.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for autolabel operations.
#[derive(Error, Debug)]
pub enum AutolabelError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Caption construction or tokenization errors
    #[error("Caption error: {0}")]
    Caption(#[from] CaptionError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// A caption that cannot be mapped to token spans.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptionError {
    #[error("caption is empty")]
    Empty,

    /// The last phrase is not closed by a `.`
    #[error("caption must end with '.': {caption:?}")]
    MissingTerminator { caption: String },

    /// Two delimiters with nothing between them, or a leading `.`
    #[error("empty phrase at offset {offset}")]
    EmptyPhrase { offset: usize },

    /// Two consecutive spaces, or a space next to a `.`
    #[error("empty word at offset {offset}")]
    EmptyWord { offset: usize },

    #[error("class list is empty")]
    NoClasses,

    /// Class names are joined with `.`, so they may not contain one
    #[error("class name {class:?} contains the phrase delimiter '.'")]
    DelimiterInClass { class: String },
}

/// Failure to decode one `"phrase(confidence)"` string from the detector.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Missing `(` or `)`, or `)` before `(`
    #[error("format error: {raw:?}")]
    Format { raw: String },

    /// The text between the parentheses is not a finite float in [0, 1]
    #[error("invalid confidence {value:?} in {raw:?}")]
    Parse { raw: String, value: String },
}

/// Failure to assemble detections for one image.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssembleError {
    /// Detector returned a different number of boxes and phrases
    #[error("detector returned {boxes} boxes but {phrases} phrases")]
    LengthMismatch { boxes: usize, phrases: usize },

    /// A phrase-logit string could not be decoded
    #[error("record {index}: {source}")]
    Decode {
        index: usize,
        #[source]
        source: DecodeError,
    },
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The detector collaborator failed
    #[error("Detector error for {path}: {message}")]
    Detector {
        path: PathBuf,
        message: String,
        /// HTTP status code when the detector is a remote server
        status_code: Option<u16>,
    },

    /// Detector output could not be turned into detections
    #[error("Malformed detector output for {path}: {source}")]
    Assemble {
        path: PathBuf,
        #[source]
        source: AssembleError,
    },

    /// Image could not be read or measured
    #[error("Image error for {path}: {message}")]
    Image { path: PathBuf, message: String },

    /// Operation timed out
    #[error("Timeout in {stage} stage for {path} after {timeout_ms}ms")]
    Timeout {
        path: PathBuf,
        stage: String,
        timeout_ms: u64,
    },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
}

/// Convenience type alias for autolabel results.
pub type Result<T> = std::result::Result<T, AutolabelError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
