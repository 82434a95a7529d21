//! Chunk type definitions.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::ContentNode;
use crate::error::PipelineError;

/// Translation status of a chunk.
///
/// `Pending -> Translating -> {Success, Error}`. `Error` goes back to
/// `Pending` only through an explicit retry; `Success` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStatus {
    Pending,
    Translating,
    Success,
    Error,
}

impl ChunkStatus {
    /// Check if the chunk has finished its attempt in the current run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChunkStatus::Success | ChunkStatus::Error)
    }
}

impl std::fmt::Display for ChunkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkStatus::Pending => write!(f, "pending"),
            ChunkStatus::Translating => write!(f, "translating"),
            ChunkStatus::Success => write!(f, "success"),
            ChunkStatus::Error => write!(f, "error"),
        }
    }
}

/// A contiguous run of top-level document nodes translated as one unit.
///
/// Chunks are values: every state transition consumes the chunk and returns
/// the next one, so a list of chunks can be swapped element by element
/// without anyone observing a half-updated chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of this chunk in the run (0-indexed)
    pub index: usize,

    /// Original top-level nodes covered by this chunk
    pub nodes: Vec<ContentNode>,

    /// Range of top-level node indices in the source document
    pub node_range: Range<usize>,

    /// Token budget including per-chunk overhead and expansion
    pub estimated_tokens: usize,

    /// Current status
    pub status: ChunkStatus,

    /// Translated document for this chunk, set on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ContentNode>,

    /// Error message of the last failed attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Chunk {
    /// Create a pending chunk.
    pub fn new(
        index: usize,
        nodes: Vec<ContentNode>,
        node_range: Range<usize>,
        estimated_tokens: usize,
    ) -> Self {
        Self {
            index,
            nodes,
            node_range,
            estimated_tokens,
            status: ChunkStatus::Pending,
            result: None,
            error: None,
        }
    }

    /// The chunk's original content wrapped in a document root.
    pub fn source_document(&self) -> ContentNode {
        ContentNode::doc(self.nodes.clone())
    }

    /// `Pending -> Translating`.
    pub fn start_translating(self) -> Result<Self, PipelineError> {
        self.transition(ChunkStatus::Pending, ChunkStatus::Translating)
    }

    /// `Translating -> Success`, storing the translated tree.
    pub fn succeed(self, translated: ContentNode) -> Result<Self, PipelineError> {
        let mut next = self.transition(ChunkStatus::Translating, ChunkStatus::Success)?;
        next.result = Some(translated);
        next.error = None;
        Ok(next)
    }

    /// `Translating -> Error`, recording the message.
    pub fn fail(self, message: impl Into<String>) -> Result<Self, PipelineError> {
        let mut next = self.transition(ChunkStatus::Translating, ChunkStatus::Error)?;
        next.error = Some(message.into());
        Ok(next)
    }

    /// `Translating -> Pending`, used when a finished call is discarded
    /// because the run was cancelled while it was in flight.
    pub fn abandon(self) -> Result<Self, PipelineError> {
        self.transition(ChunkStatus::Translating, ChunkStatus::Pending)
    }

    /// `Error -> Pending` for an explicit retry. Chunks that never got to run
    /// (still pending after a cancelled run) pass through unchanged.
    pub fn reset_for_retry(self) -> Result<Self, PipelineError> {
        match self.status {
            ChunkStatus::Pending => Ok(self),
            _ => self.transition(ChunkStatus::Error, ChunkStatus::Pending),
        }
    }

    fn transition(mut self, from: ChunkStatus, to: ChunkStatus) -> Result<Self, PipelineError> {
        if self.status != from {
            return Err(PipelineError::InvalidTransition {
                index: self.index,
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        Ok(self)
    }
}
