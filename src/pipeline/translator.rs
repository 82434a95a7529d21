//! Contract of the external translate call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ChunkTranslationError;
use crate::types::ContentNode;

/// Caller-supplied context sent with every chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_rules: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_context: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glossary: Option<String>,
}

/// Input of one translate call.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslateChunkParams {
    /// The chunk's original nodes wrapped in a document root
    pub source_content: ContentNode,

    pub translation_rules: Option<String>,

    pub project_context: Option<String>,

    pub glossary: Option<String>,

    /// Position of the chunk; absent when the document was not split
    pub chunk_index: Option<usize>,

    /// Number of chunks in the run; absent when the document was not split
    pub total_chunks: Option<usize>,
}

impl TranslateChunkParams {
    /// Build params for one chunk of a run.
    pub fn new(
        source_content: ContentNode,
        context: &TranslationContext,
        position: Option<(usize, usize)>,
    ) -> Self {
        Self {
            source_content,
            translation_rules: context.translation_rules.clone(),
            project_context: context.project_context.clone(),
            glossary: context.glossary.clone(),
            chunk_index: position.map(|(index, _)| index),
            total_chunks: position.map(|(_, total)| total),
        }
    }
}

/// Output of one successful translate call.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedChunk {
    /// Translated document for the chunk
    pub translated_content: ContentNode,

    /// Text the translator produced before parsing, kept for diagnostics
    pub raw_response_text: String,
}

/// The external translation capability.
///
/// Implementations must be safe to call again with the same chunk (retries
/// do exactly that) and must return an error rather than a partial tree.
#[async_trait]
pub trait ChunkTranslator: Send + Sync {
    /// Translate one chunk.
    async fn translate_chunk(
        &self,
        params: TranslateChunkParams,
    ) -> Result<TranslatedChunk, ChunkTranslationError>;
}
