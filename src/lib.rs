//! Document Translator Library
//!
//! Splits large structured documents into token-bounded chunks, translates
//! them one by one through an external service and merges the results back
//! into a single valid document, tolerating partial failure.

pub mod api;
pub mod chunking;
pub mod error;
pub mod jobs;
pub mod output;
pub mod pipeline;
pub mod types;

pub use chunking::{ChunkPlan, ChunkPlanner, DocumentLinearizer, HeuristicTokenCounter, TokenCounter};
pub use error::{PipelineError, Result};
pub use output::HttpTranslator;
pub use pipeline::{
    CancellationToken, ChunkMerger, ChunkTranslator, PipelineRun, ProgressEvent, ProgressObserver,
    TranslationOrchestrator,
};
pub use types::{Chunk, ChunkConfig, ChunkStatus, ContentNode, NodeKind, PipelineResult};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::chunking::*;
    pub use crate::error::PipelineError;
    pub use crate::pipeline::*;
    pub use crate::types::*;
}

/// Token count below which a document is never split, before the
/// complexity penalty is applied
pub const BASE_CHUNK_THRESHOLD: usize = 3000;

/// Default minimum chunk size in tokens
pub const DEFAULT_MIN_CHUNK_TOKENS: usize = 1000;

/// Default maximum chunk size in tokens
pub const DEFAULT_MAX_CHUNK_TOKENS: usize = 16384;

/// Default target chunk size in tokens
pub const DEFAULT_TARGET_CHUNK_TOKENS: usize = 8192;

/// Default fixed prompt overhead per chunk in tokens
pub const DEFAULT_OVERHEAD_PER_CHUNK: usize = 500;

/// Default ratio of translated to source length
pub const DEFAULT_EXPANSION_FACTOR: f64 = 1.3;
