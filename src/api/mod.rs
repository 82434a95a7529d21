//! HTTP API.

pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use handlers::AppState;

/// Build the service routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Planning preview
        .route("/translate/plan", post(handlers::plan_document))
        // Translation jobs
        .route("/translate/jobs", post(handlers::start_translation_job))
        .route("/translate/jobs/:job_id", get(handlers::get_job_status))
        .route("/translate/jobs/:job_id/cancel", post(handlers::cancel_job))
        .route("/translate/jobs/:job_id/retry", post(handlers::retry_job))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::ChunkPlanner;
    use crate::error::ChunkTranslationError;
    use crate::jobs::{JobProcessor, JobStore};
    use crate::pipeline::{ChunkTranslator, TranslateChunkParams, TranslatedChunk};
    use crate::types::{ServiceConfig, TranslationJobStatus, TranslationJobStatusResponse};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tokio::sync::RwLock;
    use tower::ServiceExt;

    struct EchoTranslator;

    #[async_trait]
    impl ChunkTranslator for EchoTranslator {
        async fn translate_chunk(
            &self,
            params: TranslateChunkParams,
        ) -> Result<TranslatedChunk, ChunkTranslationError> {
            Ok(TranslatedChunk {
                raw_response_text: String::new(),
                translated_content: params.source_content,
            })
        }
    }

    fn app() -> (Router, Arc<AppState>) {
        let config = ServiceConfig::default();
        let processor = JobProcessor::new(
            Arc::new(ChunkPlanner::default()),
            Arc::new(EchoTranslator),
            config.max_concurrent_jobs,
        );
        let state = Arc::new(AppState {
            config,
            job_store: Arc::new(RwLock::new(JobStore::new())),
            processor: Arc::new(processor),
        });
        (router(state.clone()), state)
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn document() -> serde_json::Value {
        serde_json::json!({
            "type": "doc",
            "content": [
                { "type": "heading", "attrs": { "level": 1 }, "content": [{ "type": "text", "text": "Title" }] },
                { "type": "paragraph", "content": [{ "type": "text", "text": "Body" }] }
            ]
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_plan_endpoint() {
        let (app, _) = app();
        let response = app
            .oneshot(json_request(
                "POST",
                "/translate/plan",
                serde_json::json!({ "document": document() }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["was_chunked"], false);
        assert_eq!(body["chunks"].as_array().unwrap().len(), 1);
        assert_eq!(body["chunks"][0]["node_end"], 2);
    }

    #[tokio::test]
    async fn test_plan_rejects_invalid_config() {
        let (app, _) = app();
        let response = app
            .oneshot(json_request(
                "POST",
                "/translate/plan",
                serde_json::json!({
                    "document": document(),
                    "config": { "target_chunk_tokens": 20000, "max_chunk_tokens": 10000 }
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_job_runs_to_completion() {
        let (app, state) = app();
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/translate/jobs",
                serde_json::json!({ "document": document(), "glossary": "Title = Titel" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["accepted"], true);
        assert_eq!(body["total_chunks"], 1);
        let job_id: uuid::Uuid = serde_json::from_value(body["job_id"].clone()).unwrap();

        let mut finished = false;
        for _ in 0..100 {
            let done = state
                .job_store
                .read()
                .await
                .get_job(job_id)
                .map_or(false, |j| j.status.is_finished());
            if done {
                finished = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(finished);

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/translate/jobs/{}", job_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let status: TranslationJobStatusResponse =
            serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(status.status, TranslationJobStatus::Completed);
        assert!(status.result.unwrap().success);
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let (app, _) = app();
        let uri = format!("/translate/jobs/{}", uuid::Uuid::new_v4());
        let response = app
            .clone()
            .oneshot(Request::builder().uri(&uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(json_request("POST", &format!("{}/cancel", uri), serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_retry_pending_job_conflicts() {
        let (app, state) = app();
        let job_id = state.job_store.write().await.create_job(
            1,
            state.config.chunk.clone(),
            Default::default(),
        );

        let response = app
            .oneshot(json_request(
                "POST",
                &format!("/translate/jobs/{}/retry", job_id),
                serde_json::json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
