//! Job processor for background translation runs.

use std::sync::Arc;

use tokio::sync::{mpsc, RwLock, Semaphore};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::store::{JobStore, RetryWork};
use crate::chunking::{ChunkPlan, ChunkPlanner};
use crate::pipeline::{ChunkTranslator, PipelineRun, ProgressEvent, TranslationOrchestrator};

/// Work handed to the processor for one job.
#[derive(Debug, Clone)]
pub enum JobWork {
    /// First run over a freshly planned document
    Translate(ChunkPlan),
    /// Re-run of the chunks a previous run failed
    Retry(RetryWork),
}

/// Processor that runs translation jobs asynchronously.
pub struct JobProcessor {
    planner: Arc<ChunkPlanner>,
    translator: Arc<dyn ChunkTranslator>,
    permits: Arc<Semaphore>,
}

impl JobProcessor {
    /// Create a new job processor running at most `max_concurrent_jobs`
    /// jobs at once.
    pub fn new(
        planner: Arc<ChunkPlanner>,
        translator: Arc<dyn ChunkTranslator>,
        max_concurrent_jobs: usize,
    ) -> Self {
        Self {
            planner,
            translator,
            permits: Arc::new(Semaphore::new(max_concurrent_jobs.max(1))),
        }
    }

    pub fn planner(&self) -> &Arc<ChunkPlanner> {
        &self.planner
    }

    /// Process a translation job. Progress and the final outcome are
    /// written to the job store.
    pub async fn process_job(&self, job_id: Uuid, work: JobWork, job_store: Arc<RwLock<JobStore>>) {
        let _permit = match self.permits.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                error!(job_id = %job_id, error = %e, "Job queue closed");
                job_store.write().await.fail_job(job_id, e.to_string());
                return;
            }
        };

        let job = {
            let store = job_store.read().await;
            store
                .get_job(job_id)
                .map(|j| (j.config.clone(), j.context.clone(), j.cancel.clone()))
        };
        let Some((config, context, cancel)) = job else {
            warn!(job_id = %job_id, "Job vanished before processing");
            return;
        };

        job_store.write().await.start_job(job_id);
        info!(job_id = %job_id, "Starting job processing");

        // Observers are synchronous; events are forwarded to the store from
        // a separate task.
        let (tx, mut rx) = mpsc::unbounded_channel::<ProgressEvent>();
        let progress_store = job_store.clone();
        let progress = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                progress_store
                    .write()
                    .await
                    .update_job_progress(job_id, event);
            }
        });
        let observer = move |event: ProgressEvent| {
            let _ = tx.send(event);
        };

        let orchestrator = TranslationOrchestrator::new(config, self.planner.clone());
        let translator = self.translator.as_ref();
        let run: PipelineRun = match work {
            JobWork::Translate(plan) => {
                orchestrator
                    .run_plan(plan, translator, &context, &observer, &cancel)
                    .await
            }
            JobWork::Retry(retry) => {
                orchestrator
                    .retry_failed_chunks(
                        &retry.previous,
                        retry.chunks,
                        translator,
                        &context,
                        &observer,
                        &cancel,
                    )
                    .await
            }
        };

        drop(observer);
        if let Err(e) = progress.await {
            warn!(job_id = %job_id, error = %e, "Progress forwarding task failed");
        }

        info!(
            job_id = %job_id,
            success = run.result.success,
            successful_chunks = run.result.successful_chunks,
            failed_chunks = run.result.failed_chunk_indices.len(),
            cancelled = run.result.cancelled,
            "Job processing complete"
        );

        job_store.write().await.finish_job(job_id, run);
    }
}
