//! HTTP request handlers for the translation service.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::jobs::{JobProcessor, JobStore, JobWork};
use crate::pipeline::TranslationContext;
use crate::types::{
    ChunkConfig, PlanRequest, PlanResponse, ServiceConfig, StartTranslationJobRequest,
    StartTranslationJobResponse, TranslationJobStatusResponse,
};

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServiceConfig,
    pub job_store: Arc<RwLock<JobStore>>,
    pub processor: Arc<JobProcessor>,
}

/// Error body returned by failing handlers.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Per-request chunk config, falling back to the service defaults.
fn resolve_config(state: &AppState, requested: Option<ChunkConfig>) -> Result<ChunkConfig, ApiError> {
    let config = requested.unwrap_or_else(|| state.config.chunk.clone());
    config
        .validate()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
    Ok(config)
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

/// Health check endpoint.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Preview how a document would be chunked.
pub async fn plan_document(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PlanRequest>,
) -> Result<Json<PlanResponse>, ApiError> {
    let config = resolve_config(&state, request.config)?;
    let plan = state.processor.planner().plan(&request.document, &config);
    Ok(Json(plan.summary()))
}

/// Start a translation job.
pub async fn start_translation_job(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartTranslationJobRequest>,
) -> Result<Json<StartTranslationJobResponse>, ApiError> {
    let config = resolve_config(&state, request.config)?;
    let plan = state.processor.planner().plan(&request.document, &config);
    let total_chunks = plan.len();

    info!(
        nodes = request.document.children.len(),
        chunks = total_chunks,
        total_tokens = plan.total_tokens,
        "Received translation job request"
    );

    let context = TranslationContext {
        translation_rules: request.translation_rules,
        project_context: request.project_context,
        glossary: request.glossary,
    };

    let job_id = {
        let mut store = state.job_store.write().await;
        store.create_job(total_chunks, config, context)
    };

    let processor = state.processor.clone();
    let job_store = state.job_store.clone();
    tokio::spawn(async move {
        processor
            .process_job(job_id, JobWork::Translate(plan), job_store)
            .await;
    });

    Ok(Json(StartTranslationJobResponse {
        job_id,
        accepted: true,
        total_chunks,
        message: None,
    }))
}

/// Get job status.
pub async fn get_job_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, StatusCode> {
    let store = state.job_store.read().await;

    match store.get_job_status(job_id) {
        Some(status) => Ok(Json(status)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// Request cancellation of a running job.
pub async fn cancel_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<TranslationJobStatusResponse>, ApiError> {
    let mut store = state.job_store.write().await;

    match store.cancel_job(job_id) {
        None => Err(api_error(StatusCode::NOT_FOUND, "job not found")),
        Some(false) => Err(api_error(StatusCode::CONFLICT, "job already finished")),
        Some(true) => {
            info!(job_id = %job_id, "Cancellation requested");
            store
                .get_job_status(job_id)
                .map(Json)
                .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "job not found"))
        }
    }
}

/// Retry the failed chunks of a finished job.
pub async fn retry_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<StartTranslationJobResponse>, ApiError> {
    let (work, total_chunks) = {
        let mut store = state.job_store.write().await;
        if store.get_job(job_id).is_none() {
            return Err(api_error(StatusCode::NOT_FOUND, "job not found"));
        }
        match store.begin_retry(job_id) {
            Some(work) => {
                let total = work.chunks.len();
                (work, total)
            }
            None => {
                warn!(job_id = %job_id, "Retry requested for a job with nothing to retry");
                return Err(api_error(
                    StatusCode::CONFLICT,
                    "job is still running or has no failed chunks",
                ));
            }
        }
    };

    let retrying = work.previous.failed_chunk_indices.len();
    info!(job_id = %job_id, retrying, "Retrying failed chunks");

    let processor = state.processor.clone();
    let job_store = state.job_store.clone();
    tokio::spawn(async move {
        processor
            .process_job(job_id, JobWork::Retry(work), job_store)
            .await;
    });

    Ok(Json(StartTranslationJobResponse {
        job_id,
        accepted: true,
        total_chunks,
        message: Some(format!("retrying {} chunks", retrying)),
    }))
}
