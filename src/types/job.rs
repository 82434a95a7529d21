//! Translation job request and response definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ChunkConfig, ContentNode, PipelineResult};

/// Request to start a translation job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartTranslationJobRequest {
    /// The document to translate
    pub document: ContentNode,

    /// Chunk budgets for this job (service defaults when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ChunkConfig>,

    /// Free-form translation instructions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_rules: Option<String>,

    /// Background about the project the document belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_context: Option<String>,

    /// Terminology to apply consistently
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glossary: Option<String>,
}

/// Response when starting a translation job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartTranslationJobResponse {
    /// ID of the created job
    pub job_id: Uuid,

    /// Whether the job was accepted
    pub accepted: bool,

    /// Number of chunks the document was planned into
    pub total_chunks: usize,

    /// Optional message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Request to preview how a document would be chunked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    pub document: ContentNode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ChunkConfig>,
}

/// Summary of one planned chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedChunk {
    pub index: usize,
    pub node_start: usize,
    pub node_end: usize,
    pub estimated_tokens: usize,
}

/// Response describing a chunk plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResponse {
    pub was_chunked: bool,
    pub total_tokens: usize,
    pub complexity_penalty: usize,
    pub adjusted_threshold: usize,
    pub chunks: Vec<PlannedChunk>,
}

/// Status of a translation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationJobStatus {
    /// Job is queued but not started
    Pending,
    /// Job is currently running
    Running,
    /// Every chunk translated
    Completed,
    /// Some chunks translated, others can be retried
    PartiallyCompleted,
    /// No chunk translated or the merged document was invalid
    Failed,
    /// Job stopped on request
    Cancelled,
}

impl TranslationJobStatus {
    /// Check if the job is no longer running.
    pub fn is_finished(&self) -> bool {
        !matches!(self, TranslationJobStatus::Pending | TranslationJobStatus::Running)
    }

    /// Status for a finished pipeline result.
    pub fn from_result(result: &PipelineResult) -> Self {
        if result.cancelled {
            TranslationJobStatus::Cancelled
        } else if !result.success {
            TranslationJobStatus::Failed
        } else if result.failed_chunk_indices.is_empty() {
            TranslationJobStatus::Completed
        } else {
            TranslationJobStatus::PartiallyCompleted
        }
    }
}

/// Response with job status information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationJobStatusResponse {
    /// ID of the job
    pub job_id: Uuid,

    /// Current status
    pub status: TranslationJobStatus,

    /// Total chunks in the job
    pub total_chunks: usize,

    /// Chunks that finished (successfully or not)
    pub completed_chunks: usize,

    /// Chunk being translated right now
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_chunk_index: Option<usize>,

    /// Outcome of the latest run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<PipelineResult>,

    /// Error message if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// When the job started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// When the job completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}
