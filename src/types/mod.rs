//! Core types for the translation pipeline.

mod chunk;
mod config;
mod document;
mod job;
mod result;

pub use chunk::{Chunk, ChunkStatus};
pub use config::{ChunkConfig, ServiceConfig};
pub use document::{ContentNode, NodeAttrs, NodeKind};
pub use job::{
    PlanRequest, PlanResponse, PlannedChunk, StartTranslationJobRequest,
    StartTranslationJobResponse, TranslationJobStatus, TranslationJobStatusResponse,
};
pub use result::PipelineResult;
