//! Pipeline outcome types.

use serde::{Deserialize, Serialize};

use super::ContentNode;

/// Outcome of one pipeline run or retry run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// True when at least one chunk translated and the document validated
    pub success: bool,

    /// The reassembled document; absent on total failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_document: Option<ContentNode>,

    /// Whether the document was split into more than one chunk
    pub was_chunked: bool,

    /// Number of chunks in the run
    pub total_chunks: usize,

    /// Number of chunks that translated successfully
    pub successful_chunks: usize,

    /// Indices of chunks that did not translate, ascending
    pub failed_chunk_indices: Vec<usize>,

    /// First recorded error, or the validation failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Whether the run stopped early because it was cancelled
    #[serde(default)]
    pub cancelled: bool,
}

impl PipelineResult {
    /// Result for a document with no content.
    pub fn empty() -> Self {
        Self {
            success: true,
            merged_document: Some(ContentNode::doc(Vec::new())),
            was_chunked: false,
            total_chunks: 0,
            successful_chunks: 0,
            failed_chunk_indices: Vec::new(),
            error: None,
            cancelled: false,
        }
    }

    /// Check if some, but not all, chunks failed.
    pub fn is_partial(&self) -> bool {
        self.success && !self.failed_chunk_indices.is_empty()
    }
}
