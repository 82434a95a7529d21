//! Job store for tracking translation job status.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::pipeline::{CancellationToken, PipelineRun, ProgressEvent, TranslationContext};
use crate::types::{
    Chunk, ChunkConfig, PipelineResult, TranslationJobStatus, TranslationJobStatusResponse,
};

/// In-memory job store for tracking translation jobs.
pub struct JobStore {
    jobs: HashMap<Uuid, JobRecord>,
}

/// Internal record for tracking a job.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub job_id: Uuid,
    pub status: TranslationJobStatus,
    pub config: ChunkConfig,
    pub context: TranslationContext,
    pub total_chunks: usize,
    pub completed_chunks: usize,
    pub current_chunk_index: Option<usize>,
    /// Chunk list of the latest finished run, the starting point for retries
    pub chunks: Vec<Chunk>,
    pub result: Option<PipelineResult>,
    pub error: Option<String>,
    pub cancel: CancellationToken,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Everything a retry run needs, taken from a finished job.
#[derive(Debug, Clone)]
pub struct RetryWork {
    pub previous: PipelineResult,
    pub chunks: Vec<Chunk>,
}

impl JobRecord {
    /// Create a new job record.
    pub fn new(
        job_id: Uuid,
        total_chunks: usize,
        config: ChunkConfig,
        context: TranslationContext,
    ) -> Self {
        Self {
            job_id,
            status: TranslationJobStatus::Pending,
            config,
            context,
            total_chunks,
            completed_chunks: 0,
            current_chunk_index: None,
            chunks: Vec::new(),
            result: None,
            error: None,
            cancel: CancellationToken::new(),
            started_at: None,
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    /// Mark the job as started.
    pub fn start(&mut self) {
        self.status = TranslationJobStatus::Running;
        self.started_at = Some(Utc::now());
        self.completed_at = None;
    }

    /// Update progress.
    pub fn update_progress(&mut self, event: ProgressEvent) {
        self.total_chunks = event.total;
        self.completed_chunks = event.completed;
        self.current_chunk_index = Some(event.current_chunk_index);
    }

    /// Record the outcome of a run.
    pub fn finish(&mut self, run: PipelineRun) {
        self.status = TranslationJobStatus::from_result(&run.result);
        self.completed_chunks = run
            .chunks
            .iter()
            .filter(|c| c.status.is_terminal())
            .count();
        self.current_chunk_index = None;
        self.error = run.result.error.clone();
        self.result = Some(run.result);
        self.chunks = run.chunks;
        self.completed_at = Some(Utc::now());
    }

    /// Mark the job as failed.
    pub fn fail(&mut self, error: String) {
        self.status = TranslationJobStatus::Failed;
        self.error = Some(error);
        self.completed_at = Some(Utc::now());
    }

    /// Check if a retry run would have anything to do.
    pub fn is_retryable(&self) -> bool {
        self.status.is_finished()
            && self
                .result
                .as_ref()
                .map_or(false, |r| !r.failed_chunk_indices.is_empty())
    }

    /// Convert to response type.
    pub fn to_response(&self) -> TranslationJobStatusResponse {
        TranslationJobStatusResponse {
            job_id: self.job_id,
            status: self.status,
            total_chunks: self.total_chunks,
            completed_chunks: self.completed_chunks,
            current_chunk_index: self.current_chunk_index,
            result: self.result.clone(),
            error: self.error.clone(),
            started_at: self.started_at,
            completed_at: self.completed_at,
        }
    }
}

impl JobStore {
    /// Create a new job store.
    pub fn new() -> Self {
        Self {
            jobs: HashMap::new(),
        }
    }

    /// Create a new job and return its ID.
    pub fn create_job(
        &mut self,
        total_chunks: usize,
        config: ChunkConfig,
        context: TranslationContext,
    ) -> Uuid {
        let job_id = Uuid::new_v4();
        let record = JobRecord::new(job_id, total_chunks, config, context);
        self.jobs.insert(job_id, record);
        job_id
    }

    /// Get a job by ID.
    pub fn get_job(&self, job_id: Uuid) -> Option<&JobRecord> {
        self.jobs.get(&job_id)
    }

    /// Get a mutable reference to a job.
    pub fn get_job_mut(&mut self, job_id: Uuid) -> Option<&mut JobRecord> {
        self.jobs.get_mut(&job_id)
    }

    /// Start a job.
    pub fn start_job(&mut self, job_id: Uuid) -> bool {
        if let Some(job) = self.jobs.get_mut(&job_id) {
            job.start();
            true
        } else {
            false
        }
    }

    /// Update job progress.
    pub fn update_job_progress(&mut self, job_id: Uuid, event: ProgressEvent) -> bool {
        if let Some(job) = self.jobs.get_mut(&job_id) {
            job.update_progress(event);
            true
        } else {
            false
        }
    }

    /// Record the outcome of a job run.
    pub fn finish_job(&mut self, job_id: Uuid, run: PipelineRun) -> bool {
        if let Some(job) = self.jobs.get_mut(&job_id) {
            job.finish(run);
            true
        } else {
            false
        }
    }

    /// Fail a job.
    pub fn fail_job(&mut self, job_id: Uuid, error: String) -> bool {
        if let Some(job) = self.jobs.get_mut(&job_id) {
            job.fail(error);
            true
        } else {
            false
        }
    }

    /// Request cancellation of a job. Returns `None` for unknown jobs and
    /// `Some(false)` when the job already finished.
    pub fn cancel_job(&mut self, job_id: Uuid) -> Option<bool> {
        let job = self.jobs.get(&job_id)?;
        if job.status.is_finished() {
            return Some(false);
        }
        job.cancel.cancel();
        Some(true)
    }

    /// Prepare a finished job for a retry run: hands out the previous result
    /// and chunk list, arms a fresh cancellation token and puts the job back
    /// to pending. Returns `None` when the job is unknown or not retryable.
    pub fn begin_retry(&mut self, job_id: Uuid) -> Option<RetryWork> {
        let job = self.jobs.get_mut(&job_id)?;
        if !job.is_retryable() {
            return None;
        }
        let previous = job.result.clone()?;
        job.status = TranslationJobStatus::Pending;
        job.cancel = CancellationToken::new();
        job.error = None;
        Some(RetryWork {
            previous,
            chunks: job.chunks.clone(),
        })
    }

    /// Get job status as response.
    pub fn get_job_status(&self, job_id: Uuid) -> Option<TranslationJobStatusResponse> {
        self.jobs.get(&job_id).map(|j| j.to_response())
    }

    /// Clean up old finished jobs (older than 1 hour).
    pub fn cleanup_old_jobs(&mut self) {
        let cutoff = Utc::now() - chrono::Duration::hours(1);
        self.jobs.retain(|_, job| {
            if job.status.is_finished() {
                job.completed_at.map_or(true, |t| t > cutoff)
            } else {
                true
            }
        });
    }

    /// Get count of jobs by status.
    pub fn get_job_counts(&self) -> HashMap<TranslationJobStatus, usize> {
        let mut counts = HashMap::new();
        for job in self.jobs.values() {
            *counts.entry(job.status).or_insert(0) += 1;
        }
        counts
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}
