//! Token-budgeted chunk planning.
//!
//! The planner first decides whether a document needs splitting at all,
//! using a threshold lowered for list-heavy and deeply nested documents.
//! When it does, it walks the linear projection and picks split points
//! between top-level nodes, ranked by boundary priority:
//!
//! - inside the window `target <= budget <= max` the lowest priority wins,
//!   and among equal priorities the earliest point (closest to target);
//! - if the next segment would push past `max`, the best in-window point is
//!   taken, otherwise the best point under target (lowest priority, later
//!   point on ties);
//! - with no legal point at all the chunk runs on to the next top-level
//!   node boundary, so a single oversized node may exceed `max`.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::linearizer::{DocumentLinearizer, Segment};
use super::tokens::{HeuristicTokenCounter, TokenCounter};
use crate::types::{Chunk, ChunkConfig, ContentNode, NodeKind, PlanResponse, PlannedChunk};
use crate::BASE_CHUNK_THRESHOLD;

/// Penalty per list item anywhere in the document.
const LIST_ITEM_PENALTY: usize = 80;

/// Penalty per level of list/blockquote nesting.
const NESTING_PENALTY: usize = 150;

/// Upper bound on the complexity penalty.
const MAX_COMPLEXITY_PENALTY: usize = 2500;

/// Output of planning: the chunks plus the numbers behind the decision.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkPlan {
    pub chunks: Vec<Chunk>,
    pub was_chunked: bool,
    pub total_tokens: usize,
    pub complexity_penalty: usize,
    pub adjusted_threshold: usize,
}

impl ChunkPlan {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Summary without node content, for API responses.
    pub fn summary(&self) -> PlanResponse {
        PlanResponse {
            was_chunked: self.was_chunked,
            total_tokens: self.total_tokens,
            complexity_penalty: self.complexity_penalty,
            adjusted_threshold: self.adjusted_threshold,
            chunks: self
                .chunks
                .iter()
                .map(|c| PlannedChunk {
                    index: c.index,
                    node_start: c.node_range.start,
                    node_end: c.node_range.end,
                    estimated_tokens: c.estimated_tokens,
                })
                .collect(),
        }
    }
}

/// A legal split point seen during the walk.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    segment: usize,
    priority: u8,
}

/// Splits documents into token-bounded chunks.
pub struct ChunkPlanner {
    counter: Arc<dyn TokenCounter>,
    linearizer: Arc<DocumentLinearizer>,
}

impl ChunkPlanner {
    /// Create a planner from a token counter and a shared linearizer.
    pub fn new(counter: Arc<dyn TokenCounter>, linearizer: Arc<DocumentLinearizer>) -> Self {
        Self {
            counter,
            linearizer,
        }
    }

    /// The linearizer this planner projects documents with.
    pub fn linearizer(&self) -> &Arc<DocumentLinearizer> {
        &self.linearizer
    }

    /// Plan the chunks for a document. Never fails: any conversion problem
    /// degrades to a single whole-document chunk.
    pub fn plan(&self, doc: &ContentNode, config: &ChunkConfig) -> ChunkPlan {
        let complexity_penalty = complexity_penalty(doc);
        let adjusted_threshold = BASE_CHUNK_THRESHOLD
            .saturating_sub(complexity_penalty)
            .max(config.min_chunk_tokens);

        if doc.is_empty() {
            return ChunkPlan {
                chunks: Vec::new(),
                was_chunked: false,
                total_tokens: 0,
                complexity_penalty,
                adjusted_threshold,
            };
        }

        let projection = match self.linearizer.linearize(doc) {
            Ok(projection) => projection,
            Err(e) => {
                warn!(error = %e, "Document cannot be linearized, translating as a single chunk");
                let total_tokens = self.counter.count_tokens(&doc.plain_text());
                return self.single_chunk(doc, config, total_tokens, complexity_penalty, adjusted_threshold);
            }
        };

        let total_tokens = self.counter.count_tokens(&projection.text());
        if total_tokens < adjusted_threshold {
            debug!(
                total_tokens,
                adjusted_threshold, "Document below chunking threshold"
            );
            return self.single_chunk(doc, config, total_tokens, complexity_penalty, adjusted_threshold);
        }

        let segments = &projection.segments;
        let tokens: Vec<usize> = segments
            .iter()
            .map(|s| self.counter.count_tokens(&s.text))
            .collect();
        let starts = split_points(segments, &tokens, config);

        let mut chunks = Vec::with_capacity(starts.len());
        for (index, &start) in starts.iter().enumerate() {
            let end = starts.get(index + 1).copied().unwrap_or(segments.len());
            let first_node = segments[start].top_level_index();
            let last_node = segments[end - 1].top_level_index();
            let raw_tokens: usize = tokens[start..end].iter().sum();

            chunks.push(Chunk::new(
                index,
                doc.children[first_node..=last_node].to_vec(),
                first_node..last_node + 1,
                config.budget(raw_tokens),
            ));
        }

        if let Some(bad) = chunks.iter().find(|c| !self.converts_cleanly(c)) {
            warn!(
                chunk_index = bad.index,
                "Chunk failed conversion check, translating as a single chunk"
            );
            return self.single_chunk(doc, config, total_tokens, complexity_penalty, adjusted_threshold);
        }

        info!(
            total_tokens,
            adjusted_threshold,
            chunks = chunks.len(),
            "Planned document chunks"
        );

        ChunkPlan {
            was_chunked: chunks.len() > 1,
            chunks,
            total_tokens,
            complexity_penalty,
            adjusted_threshold,
        }
    }

    fn single_chunk(
        &self,
        doc: &ContentNode,
        config: &ChunkConfig,
        total_tokens: usize,
        complexity_penalty: usize,
        adjusted_threshold: usize,
    ) -> ChunkPlan {
        ChunkPlan {
            chunks: vec![Chunk::new(
                0,
                doc.children.clone(),
                0..doc.children.len(),
                config.budget(total_tokens),
            )],
            was_chunked: false,
            total_tokens,
            complexity_penalty,
            adjusted_threshold,
        }
    }

    /// A chunk must linearize and parse back on its own.
    fn converts_cleanly(&self, chunk: &Chunk) -> bool {
        self.linearizer
            .linearize_nodes(&chunk.nodes)
            .map_err(|e| e.to_string())
            .and_then(|text| self.linearizer.delinearize(&text).map_err(|e| e.to_string()))
            .is_ok()
    }
}

impl Default for ChunkPlanner {
    fn default() -> Self {
        Self::new(
            Arc::new(HeuristicTokenCounter::new()),
            Arc::new(DocumentLinearizer::new()),
        )
    }
}

/// `list_items * 80 + max_nesting_depth * 150`, capped at 2500.
pub fn complexity_penalty(doc: &ContentNode) -> usize {
    let penalty =
        count_list_items(doc) * LIST_ITEM_PENALTY + max_nesting_depth(doc, 0) * NESTING_PENALTY;
    penalty.min(MAX_COMPLEXITY_PENALTY)
}

fn count_list_items(node: &ContentNode) -> usize {
    let own = usize::from(node.kind == NodeKind::ListItem);
    own + node.children.iter().map(count_list_items).sum::<usize>()
}

/// Longest chain of list, list item and blockquote ancestors.
fn max_nesting_depth(node: &ContentNode, depth: usize) -> usize {
    let nests = node.kind.is_list()
        || matches!(node.kind, NodeKind::ListItem | NodeKind::Blockquote);
    let depth = if nests { depth + 1 } else { depth };
    node.children
        .iter()
        .map(|child| max_nesting_depth(child, depth))
        .max()
        .unwrap_or(depth)
        .max(depth)
}

/// A boundary is legal when it separates two different top-level nodes,
/// i.e. it is never inside a list, blockquote or code block.
fn is_legal_split(segments: &[Segment], at: usize) -> bool {
    at > 0 && segments[at - 1].top_level_index() != segments[at].top_level_index()
}

/// Segment indices at which chunks start. Always begins with 0.
fn split_points(segments: &[Segment], tokens: &[usize], config: &ChunkConfig) -> Vec<usize> {
    let mut starts = vec![0];
    let mut start = 0;
    while let Some(cut) = next_cut(segments, tokens, start, config) {
        starts.push(cut);
        start = cut;
    }
    starts
}

fn next_cut(
    segments: &[Segment],
    tokens: &[usize],
    start: usize,
    config: &ChunkConfig,
) -> Option<usize> {
    let mut raw = 0;
    let mut in_window: Option<Candidate> = None;
    let mut below_target: Option<Candidate> = None;
    let mut overflow = false;

    for k in start..segments.len() {
        if k > start && is_legal_split(segments, k) {
            if overflow {
                return Some(k);
            }
            let priority = segments[k].boundary.priority();
            let candidate = Candidate {
                segment: k,
                priority,
            };
            if config.budget(raw) >= config.target_chunk_tokens {
                if in_window.map_or(true, |c| priority < c.priority) {
                    in_window = Some(candidate);
                }
            } else if below_target.map_or(true, |c| priority <= c.priority) {
                below_target = Some(candidate);
            }
        }

        if config.budget(raw + tokens[k]) > config.max_chunk_tokens {
            if let Some(c) = in_window.or(below_target) {
                return Some(c.segment);
            }
            overflow = true;
        }
        raw += tokens[k];
    }

    in_window.map(|c| c.segment)
}
