//! Reassembly of chunk results into one document.

use tracing::{info, warn};

use crate::types::{Chunk, ChunkStatus, ContentNode, NodeKind, PipelineResult};

/// Message used when every chunk failed without recording an error.
const ALL_CHUNKS_FAILED: &str = "all chunks failed to translate";

/// Merges chunks back into a document and classifies the outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkMerger;

impl ChunkMerger {
    pub fn new() -> Self {
        Self
    }

    /// Merge chunks in index order. Successful chunks contribute their
    /// translation, every other chunk its original nodes, so no content is
    /// ever dropped.
    pub fn merge(&self, mut chunks: Vec<Chunk>) -> PipelineResult {
        if chunks.is_empty() {
            return PipelineResult::empty();
        }
        chunks.sort_by_key(|c| c.index);

        let total_chunks = chunks.len();
        let failed_chunk_indices: Vec<usize> = chunks
            .iter()
            .filter(|c| c.status != ChunkStatus::Success)
            .map(|c| c.index)
            .collect();
        let successful_chunks = total_chunks - failed_chunk_indices.len();

        if successful_chunks == 0 {
            let error = chunks
                .iter()
                .find_map(|c| c.error.clone())
                .unwrap_or_else(|| ALL_CHUNKS_FAILED.to_string());
            warn!(total_chunks, error = %error, "No chunk translated");
            return PipelineResult {
                success: false,
                merged_document: None,
                was_chunked: total_chunks > 1,
                total_chunks,
                successful_chunks,
                failed_chunk_indices,
                error: Some(error),
                cancelled: false,
            };
        }

        let mut content = Vec::new();
        for chunk in &chunks {
            match (&chunk.status, &chunk.result) {
                (ChunkStatus::Success, Some(result)) if result.kind == NodeKind::Doc => {
                    content.extend(result.children.iter().cloned());
                }
                (ChunkStatus::Success, Some(result)) => content.push(result.clone()),
                _ => content.extend(chunk.nodes.iter().cloned()),
            }
        }
        let merged = ContentNode::doc(content);

        if let Err(e) = merged.validate() {
            warn!(error = %e, "Merged document failed validation");
            return PipelineResult {
                success: false,
                merged_document: None,
                was_chunked: total_chunks > 1,
                total_chunks,
                successful_chunks,
                failed_chunk_indices,
                error: Some(e.to_string()),
                cancelled: false,
            };
        }

        info!(
            total_chunks,
            successful_chunks,
            failed = failed_chunk_indices.len(),
            "Merged chunk results"
        );

        PipelineResult {
            success: true,
            merged_document: Some(merged),
            was_chunked: total_chunks > 1,
            total_chunks,
            successful_chunks,
            failed_chunk_indices,
            error: None,
            cancelled: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chunk(index: usize, text: &str) -> Chunk {
        Chunk::new(index, vec![ContentNode::paragraph(text)], index..index + 1, 10)
    }

    fn succeeded(index: usize, original: &str, translated: &str) -> Chunk {
        chunk(index, original)
            .start_translating()
            .unwrap()
            .succeed(ContentNode::doc(vec![ContentNode::paragraph(translated)]))
            .unwrap()
    }

    fn failed(index: usize, original: &str, error: &str) -> Chunk {
        chunk(index, original)
            .start_translating()
            .unwrap()
            .fail(error)
            .unwrap()
    }

    #[test]
    fn test_empty() {
        let result = ChunkMerger::new().merge(vec![]);
        assert!(result.success);
        assert_eq!(result.total_chunks, 0);
        assert!(result.merged_document.unwrap().is_empty());
    }

    #[test]
    fn test_all_success_in_index_order() {
        let chunks = vec![succeeded(1, "b", "B"), succeeded(0, "a", "A")];
        let result = ChunkMerger::new().merge(chunks);

        assert!(result.success);
        assert!(result.was_chunked);
        assert_eq!(result.successful_chunks, 2);
        assert!(result.failed_chunk_indices.is_empty());
        assert_eq!(
            result.merged_document.unwrap(),
            ContentNode::doc(vec![ContentNode::paragraph("A"), ContentNode::paragraph("B")])
        );
    }

    #[test]
    fn test_partial_success_keeps_original() {
        let chunks = vec![
            succeeded(0, "a", "A"),
            failed(1, "original b", "timeout"),
            chunk(2, "never ran"),
        ];
        let result = ChunkMerger::new().merge(chunks);

        assert!(result.success);
        assert!(result.is_partial());
        assert_eq!(result.failed_chunk_indices, vec![1, 2]);
        assert_eq!(
            result.merged_document.unwrap().children,
            vec![
                ContentNode::paragraph("A"),
                ContentNode::paragraph("original b"),
                ContentNode::paragraph("never ran"),
            ]
        );
    }

    #[test]
    fn test_failed_chunk_keeps_editor_json() {
        let original = serde_json::json!([
            {"type": "paragraph", "content": [
                {"type": "text", "text": "see docs",
                 "marks": [{"type": "link", "attrs": {"href": "https://x.io"}}]}
            ]},
            {"type": "image", "attrs": {"src": "a.png", "alt": "diagram"}}
        ]);
        let nodes: Vec<ContentNode> = serde_json::from_value(original.clone()).unwrap();
        let failed = Chunk::new(1, nodes, 1..3, 10)
            .start_translating()
            .unwrap()
            .fail("timeout")
            .unwrap();

        let result = ChunkMerger::new().merge(vec![succeeded(0, "a", "A"), failed]);

        assert!(result.success);
        let merged = result.merged_document.unwrap();
        assert_eq!(serde_json::to_value(&merged.children[1..]).unwrap(), original);
    }

    #[test]
    fn test_total_failure_returns_no_document() {
        let chunks = vec![failed(0, "a", "first error"), failed(1, "b", "second error")];
        let result = ChunkMerger::new().merge(chunks);

        assert!(!result.success);
        assert!(result.merged_document.is_none());
        assert_eq!(result.error.as_deref(), Some("first error"));
        assert_eq!(result.failed_chunk_indices, vec![0, 1]);
    }

    #[test]
    fn test_total_failure_without_message() {
        let result = ChunkMerger::new().merge(vec![chunk(0, "a")]);
        assert!(!result.success);
        assert!(!result.was_chunked);
        assert_eq!(result.error.as_deref(), Some(ALL_CHUNKS_FAILED));
    }

    #[test]
    fn test_invalid_translation_fails_validation() {
        let bad = chunk(0, "a")
            .start_translating()
            .unwrap()
            .succeed(ContentNode::doc(vec![ContentNode::list_item(vec![])]))
            .unwrap();
        let result = ChunkMerger::new().merge(vec![bad, succeeded(1, "b", "B")]);

        assert!(!result.success);
        assert!(result.merged_document.is_none());
        assert!(result.error.unwrap().contains("merged document is invalid"));
    }
}
