//! Error types for speech synthesis
//!
//! Audio integrity problems (NaN, Inf, clipping) are deliberately absent:
//! they are repaired by the reassembler rather than surfaced.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for synthesis
#[derive(Error, Debug)]
pub enum Error {
    // Caller errors, never retried
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    // Missing or corrupt vocabulary, audio or catalog
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    // Any failing model stage aborts the whole call
    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid requests
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("Text is empty or contains nothing speakable")]
    EmptyText,

    #[error("Invalid {field}: {value}. Must be one of {allowed:?}")]
    InvalidFilter {
        field: &'static str,
        value: String,
        allowed: &'static [&'static str],
    },

    #[error("No reference sample matches the criteria: {0}")]
    NoMatchingVoice(String),

    #[error("Reference audio and reference text must be provided together")]
    IncompleteReference,

    #[error("Unusable reference voice: {0}")]
    InvalidReference(String),

    #[error("Cannot write an empty waveform")]
    EmptyAudio,
}

/// Missing or unreadable resources
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Vocabulary error: {0}")]
    Vocabulary(String),

    #[error("Audio error in {}: {message}", path.display())]
    Audio { path: PathBuf, message: String },

    #[error("Reference catalog error: {0}")]
    Catalog(String),

    #[error("Model load error: {0}")]
    Model(String),
}

/// The three opaque stages of the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceStage {
    Preprocess,
    Refine,
    Decode,
}

impl fmt::Display for InferenceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InferenceStage::Preprocess => "preprocess",
            InferenceStage::Refine => "refine",
            InferenceStage::Decode => "decode",
        };
        f.write_str(name)
    }
}

/// Model execution errors
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("{stage} stage failed on chunk {chunk}: {message}")]
    Stage {
        stage: InferenceStage,
        chunk: usize,
        message: String,
    },

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("Worker failed: {0}")]
    Worker(String),
}

impl InferenceError {
    pub fn stage(stage: InferenceStage, chunk: usize, message: impl Into<String>) -> Self {
        InferenceError::Stage {
            stage,
            chunk,
            message: message.into(),
        }
    }

    /// Stage that failed, if the error is stage-specific
    pub fn failed_stage(&self) -> Option<InferenceStage> {
        match self {
            InferenceError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl Error {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Whether the caller, not the environment, is at fault
    pub fn is_input(&self) -> bool {
        matches!(self, Error::Input(_))
    }
}
