//! Error types for the translation pipeline.
//!
//! Conversion and per-chunk failures are recovered inside the pipeline and
//! turned into data on the chunk or the result. Only `MergeValidationError`
//! and total failure ever surface as a failed `PipelineResult`.

use thiserror::Error;

/// Failure to project a content tree into linear text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinearizationError {
    /// The root of the tree is not a document node
    #[error("expected a document root, found '{found}'")]
    NotADocument { found: String },

    /// Heading level outside 1..=6
    #[error("heading at {path} has unsupported level {level}")]
    InvalidHeadingLevel { path: String, level: u8 },

    /// A node shape the linear form cannot express
    #[error("unsupported node shape at {path}: {reason}")]
    UnsupportedShape { path: String, reason: String },
}

/// Failure to re-parse linear text into a content tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DelinearizationError {
    /// A fenced code block was opened but never closed
    #[error("unterminated code fence starting at line {line}")]
    UnterminatedFence { line: usize },

    /// The text could not be parsed into blocks
    #[error("malformed linear text at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

/// Failure of a single external translate call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkTranslationError {
    /// The translation service answered with an error status
    #[error("translation service returned {status}: {body}")]
    Service { status: u16, body: String },

    /// The request never completed
    #[error("transport error: {0}")]
    Transport(String),

    /// The translated text could not be parsed back into a tree
    #[error("translated text could not be re-parsed: {0}")]
    Delinearization(#[from] DelinearizationError),

    /// The source chunk could not be linearized for the request
    #[error("source chunk could not be linearized: {0}")]
    Linearization(#[from] LinearizationError),

    /// Any other translator-reported failure
    #[error("{0}")]
    Other(String),
}

/// Raised when a caller inspects a run that stopped on cancellation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("translation cancelled after {completed} of {total} chunks")]
pub struct PipelineCancelledError {
    pub completed: usize,
    pub total: usize,
}

/// The reassembled document failed structural validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("merged document is invalid at {path}: {reason}")]
pub struct MergeValidationError {
    pub path: String,
    pub reason: String,
}

/// Invalid chunk configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("min_chunk_tokens must be greater than zero")]
    ZeroMinimum,

    #[error("chunk bounds out of order: min {min}, target {target}, max {max}")]
    BoundsOutOfOrder { min: usize, target: usize, max: usize },

    #[error("expansion_factor must be at least 1.0, got {0}")]
    ExpansionFactor(f64),
}

/// Umbrella error for callers that drive the pipeline through the service layer.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Linearization(#[from] LinearizationError),

    #[error(transparent)]
    Delinearization(#[from] DelinearizationError),

    #[error(transparent)]
    ChunkTranslation(#[from] ChunkTranslationError),

    #[error(transparent)]
    Cancelled(#[from] PipelineCancelledError),

    #[error(transparent)]
    MergeValidation(#[from] MergeValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A chunk was asked to make a transition its state machine forbids
    #[error("chunk {index} cannot move from {from} to {to}")]
    InvalidTransition {
        index: usize,
        from: String,
        to: String,
    },
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
