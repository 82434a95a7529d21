//! Sequential, cancellable translation of a chunk plan.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::merger::ChunkMerger;
use super::progress::{CancellationToken, ProgressEvent, ProgressObserver, ProgressStatus};
use super::translator::{ChunkTranslator, TranslateChunkParams, TranslationContext};
use crate::chunking::{ChunkPlan, ChunkPlanner};
use crate::error::{PipelineCancelledError, PipelineError};
use crate::types::{Chunk, ChunkConfig, ContentNode, PipelineResult};

/// Outcome of a run: the merged result plus the final chunk list, which a
/// later retry run starts from.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub result: PipelineResult,
    pub chunks: Vec<Chunk>,
}

impl PipelineRun {
    /// Fails when the run stopped on cancellation before every chunk finished.
    pub fn ensure_completed(&self) -> Result<(), PipelineCancelledError> {
        if self.result.cancelled {
            return Err(PipelineCancelledError {
                completed: terminal_count(&self.chunks),
                total: self.chunks.len(),
            });
        }
        Ok(())
    }
}

/// Drives plan, translate and merge for one document.
pub struct TranslationOrchestrator {
    config: ChunkConfig,
    planner: Arc<ChunkPlanner>,
    merger: ChunkMerger,
}

impl TranslationOrchestrator {
    pub fn new(config: ChunkConfig, planner: Arc<ChunkPlanner>) -> Self {
        Self {
            config,
            planner,
            merger: ChunkMerger::new(),
        }
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Plan a document with this orchestrator's configuration.
    pub fn plan(&self, doc: &ContentNode) -> ChunkPlan {
        self.planner.plan(doc, &self.config)
    }

    /// Plan and translate a document.
    pub async fn run(
        &self,
        doc: &ContentNode,
        translator: &dyn ChunkTranslator,
        context: &TranslationContext,
        observer: &dyn ProgressObserver,
        cancel: &CancellationToken,
    ) -> PipelineRun {
        let plan = self.plan(doc);
        self.run_plan(plan, translator, context, observer, cancel)
            .await
    }

    /// Translate an already computed plan.
    pub async fn run_plan(
        &self,
        plan: ChunkPlan,
        translator: &dyn ChunkTranslator,
        context: &TranslationContext,
        observer: &dyn ProgressObserver,
        cancel: &CancellationToken,
    ) -> PipelineRun {
        if plan.is_empty() {
            debug!("Empty document, nothing to translate");
            return PipelineRun {
                result: PipelineResult::empty(),
                chunks: Vec::new(),
            };
        }

        info!(
            chunks = plan.len(),
            was_chunked = plan.was_chunked,
            total_tokens = plan.total_tokens,
            "Starting translation run"
        );

        let positions: Vec<usize> = (0..plan.len()).collect();
        let (chunks, cancelled) = self
            .translate_positions(plan.chunks, &positions, translator, context, observer, cancel)
            .await;
        self.finish(chunks, cancelled)
    }

    /// Re-run only the chunks a previous run reported as failed, then merge
    /// the full list again. Successful chunks are never re-translated.
    pub async fn retry_failed_chunks(
        &self,
        previous: &PipelineResult,
        mut chunks: Vec<Chunk>,
        translator: &dyn ChunkTranslator,
        context: &TranslationContext,
        observer: &dyn ProgressObserver,
        cancel: &CancellationToken,
    ) -> PipelineRun {
        chunks.sort_by_key(|c| c.index);

        let mut positions = Vec::new();
        for &index in &previous.failed_chunk_indices {
            let Some(pos) = chunks.iter().position(|c| c.index == index) else {
                warn!(chunk_index = index, "Failed chunk not present in chunk list");
                continue;
            };
            if replace(&mut chunks, pos, |c| c.reset_for_retry()) {
                positions.push(pos);
            }
        }

        info!(
            retrying = positions.len(),
            total = chunks.len(),
            "Retrying failed chunks"
        );

        let (chunks, cancelled) = self
            .translate_positions(chunks, &positions, translator, context, observer, cancel)
            .await;
        self.finish(chunks, cancelled)
    }

    /// The per-chunk state machine, applied to `positions` in order.
    /// Returns the final chunk list and whether cancellation stopped it.
    async fn translate_positions(
        &self,
        mut chunks: Vec<Chunk>,
        positions: &[usize],
        translator: &dyn ChunkTranslator,
        context: &TranslationContext,
        observer: &dyn ProgressObserver,
        cancel: &CancellationToken,
    ) -> (Vec<Chunk>, bool) {
        let total = chunks.len();
        let split = total > 1;
        let mut completed = terminal_count(&chunks);

        for &pos in positions {
            if cancel.is_cancelled() {
                warn!(completed, total, "Translation cancelled");
                return (chunks, true);
            }

            let index = chunks[pos].index;
            if !replace(&mut chunks, pos, |c| c.start_translating()) {
                continue;
            }
            observer.on_progress(ProgressEvent {
                completed,
                total,
                current_chunk_index: index,
                status: ProgressStatus::Translating,
            });

            debug!(chunk_index = index, tokens = chunks[pos].estimated_tokens, "Translating chunk");
            let params = TranslateChunkParams::new(
                chunks[pos].source_document(),
                context,
                split.then_some((index, total)),
            );
            let outcome = translator.translate_chunk(params).await;

            if cancel.is_cancelled() {
                warn!(chunk_index = index, "Translation cancelled mid-chunk, discarding result");
                // The outcome is dropped, so the chunk goes back to Pending
                // rather than Error and stays eligible for a retry run.
                replace(&mut chunks, pos, |c| c.abandon());
                return (chunks, true);
            }

            let status = match outcome {
                Ok(translated) => {
                    replace(&mut chunks, pos, |c| c.succeed(translated.translated_content));
                    ProgressStatus::Success
                }
                Err(e) => {
                    warn!(chunk_index = index, error = %e, "Chunk translation failed");
                    replace(&mut chunks, pos, |c| c.fail(e.to_string()));
                    ProgressStatus::Error
                }
            };
            completed += 1;
            observer.on_progress(ProgressEvent {
                completed,
                total,
                current_chunk_index: index,
                status,
            });
        }

        (chunks, false)
    }

    fn finish(&self, chunks: Vec<Chunk>, cancelled: bool) -> PipelineRun {
        let mut result = self.merger.merge(chunks.clone());
        result.cancelled = cancelled;
        if cancelled && result.successful_chunks == 0 {
            let err = PipelineCancelledError {
                completed: terminal_count(&chunks),
                total: chunks.len(),
            };
            result.error = Some(err.to_string());
        }

        info!(
            success = result.success,
            successful = result.successful_chunks,
            failed = result.failed_chunk_indices.len(),
            cancelled,
            "Translation run finished"
        );

        PipelineRun { result, chunks }
    }
}

/// Swap the chunk at `pos` for its next state. Returns false and leaves the
/// chunk untouched when the transition is not allowed.
fn replace<F>(chunks: &mut [Chunk], pos: usize, next: F) -> bool
where
    F: FnOnce(Chunk) -> Result<Chunk, PipelineError>,
{
    match next(chunks[pos].clone()) {
        Ok(chunk) => {
            chunks[pos] = chunk;
            true
        }
        Err(e) => {
            warn!(error = %e, "Skipping chunk");
            false
        }
    }
}

fn terminal_count(chunks: &[Chunk]) -> usize {
    chunks.iter().filter(|c| c.status.is_terminal()).count()
}
