//! HTTP client for the external translation service.
//!
//! Chunks travel as linear text. A chunk the linear form cannot express
//! (images, fenced code containing a fence line...) is sent as its document
//! tree instead, and the service answers with a translated tree.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::chunking::DocumentLinearizer;
use crate::error::ChunkTranslationError;
use crate::pipeline::{ChunkTranslator, TranslateChunkParams, TranslatedChunk};
use crate::types::{ContentNode, NodeKind};

/// Request timeout for a single chunk.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Sends chunks to a translation service and turns the answer back into a
/// tree.
pub struct HttpTranslator {
    client: Client,
    base_url: String,
    linearizer: Arc<DocumentLinearizer>,
}

/// Request payload for one chunk.
#[derive(Debug, Serialize)]
struct TranslateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    source_text: Option<String>,
    /// Sent instead of `source_text` when the chunk has no linear form
    #[serde(skip_serializing_if = "Option::is_none")]
    source_document: Option<ContentNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    translation_rules: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    glossary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chunk_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_chunks: Option<usize>,
}

/// Response from the translation service.
#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    translated_text: Option<String>,
    #[serde(default)]
    translated_document: Option<ContentNode>,
}

impl HttpTranslator {
    /// Create a new translator client.
    pub fn new(base_url: &str, linearizer: Arc<DocumentLinearizer>) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            linearizer,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request(&self, params: TranslateChunkParams) -> TranslateRequest {
        let (source_text, source_document) =
            match self.linearizer.linearize_nodes(&params.source_content.children) {
                Ok(text) => (Some(text), None),
                Err(e) => {
                    warn!(
                        chunk_index = ?params.chunk_index,
                        error = %e,
                        "Chunk has no linear form, sending the document tree"
                    );
                    (None, Some(params.source_content))
                }
            };
        TranslateRequest {
            source_text,
            source_document,
            translation_rules: params.translation_rules,
            project_context: params.project_context,
            glossary: params.glossary,
            chunk_index: params.chunk_index,
            total_chunks: params.total_chunks,
        }
    }

    fn parse_response(
        &self,
        response: TranslateResponse,
    ) -> Result<TranslatedChunk, ChunkTranslationError> {
        match response {
            TranslateResponse {
                translated_document: Some(doc),
                ..
            } => {
                let translated_content = if doc.kind == NodeKind::Doc {
                    doc
                } else {
                    ContentNode::doc(vec![doc])
                };
                let raw_response_text =
                    serde_json::to_string(&translated_content).unwrap_or_default();
                Ok(TranslatedChunk {
                    translated_content,
                    raw_response_text,
                })
            }
            TranslateResponse {
                translated_text: Some(text),
                ..
            } => {
                let translated_content = self.linearizer.delinearize(&text)?;
                Ok(TranslatedChunk {
                    translated_content,
                    raw_response_text: text,
                })
            }
            _ => Err(ChunkTranslationError::Other(
                "response carried neither translated_text nor translated_document".to_string(),
            )),
        }
    }

    /// Check if the translation service is healthy.
    pub async fn health_check(&self) -> anyhow::Result<bool> {
        let url = format!("{}/health", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}

#[async_trait]
impl ChunkTranslator for HttpTranslator {
    async fn translate_chunk(
        &self,
        params: TranslateChunkParams,
    ) -> Result<TranslatedChunk, ChunkTranslationError> {
        let request = self.build_request(params);
        let url = format!("{}/translate", self.base_url);

        debug!(
            chunk_index = ?request.chunk_index,
            as_tree = request.source_document.is_some(),
            "Sending chunk to translation service"
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChunkTranslationError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            error!(status, "Translation service returned an error");
            return Err(ChunkTranslationError::Service { status, body });
        }

        let result: TranslateResponse = response
            .json()
            .await
            .map_err(|e| ChunkTranslationError::Transport(e.to_string()))?;
        self.parse_response(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::TranslationContext;
    use crate::types::ContentNode;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use pretty_assertions::assert_eq;

    fn translator(base_url: &str) -> HttpTranslator {
        HttpTranslator::new(base_url, Arc::new(DocumentLinearizer::new())).unwrap()
    }

    fn params(nodes: Vec<ContentNode>, position: Option<(usize, usize)>) -> TranslateChunkParams {
        let context = TranslationContext {
            glossary: Some("hello = hallo".to_string()),
            ..Default::default()
        };
        TranslateChunkParams::new(ContentNode::doc(nodes), &context, position)
    }

    /// Serve `app` on an ephemeral port and return its base URL.
    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        assert_eq!(translator("http://localhost:3021/").base_url(), "http://localhost:3021");
    }

    #[test]
    fn test_request_body() {
        let client = translator("http://localhost:3021");
        let request = client
            .build_request(params(
                vec![ContentNode::heading(1, "Title"), ContentNode::paragraph("Body")],
                Some((1, 3)),
            ));

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "source_text": "# Title\n\nBody",
                "glossary": "hello = hallo",
                "chunk_index": 1,
                "total_chunks": 3,
            })
        );
    }

    #[test]
    fn test_unparseable_response() {
        let client = translator("http://localhost:3021");
        let err = client
            .parse_response(TranslateResponse {
                translated_text: Some("```\nnever closed".to_string()),
                translated_document: None,
            })
            .unwrap_err();
        assert!(matches!(err, ChunkTranslationError::Delinearization(_)));

        let err = client
            .parse_response(TranslateResponse {
                translated_text: None,
                translated_document: None,
            })
            .unwrap_err();
        assert!(matches!(err, ChunkTranslationError::Other(_)));
    }

    fn image(src: &str) -> ContentNode {
        serde_json::from_value(serde_json::json!({
            "type": "image",
            "attrs": { "src": src, "alt": "diagram" }
        }))
        .unwrap()
    }

    #[test]
    fn test_request_sends_tree_without_linear_form() {
        let client = translator("http://localhost:3021");
        let nodes = vec![ContentNode::paragraph("Hello"), image("a.png")];
        let request = client.build_request(params(nodes.clone(), None));

        assert!(request.source_text.is_none());
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json["source_document"],
            serde_json::to_value(ContentNode::doc(nodes)).unwrap()
        );
    }

    #[tokio::test]
    async fn test_document_with_image_translates() {
        use crate::chunking::ChunkPlanner;
        use crate::pipeline::{CancellationToken, NoopProgress, TranslationOrchestrator};
        use crate::types::ChunkConfig;

        // Translates text leaves in a returned tree, or the linear text.
        fn translate_value(value: &mut serde_json::Value) {
            if let Some(text) = value.get_mut("text") {
                if let Some(s) = text.as_str() {
                    *text = serde_json::Value::String(s.replace("Hello", "Hallo"));
                }
            }
            if let Some(children) = value.get_mut("content").and_then(|c| c.as_array_mut()) {
                children.iter_mut().for_each(translate_value);
            }
        }
        let app = Router::new().route(
            "/translate",
            post(|Json(body): Json<serde_json::Value>| async move {
                match body.get("source_document") {
                    Some(doc) => {
                        let mut doc = doc.clone();
                        translate_value(&mut doc);
                        Json(serde_json::json!({ "translated_document": doc }))
                    }
                    None => {
                        let source = body["source_text"].as_str().unwrap_or_default();
                        Json(serde_json::json!({
                            "translated_text": source.replace("Hello", "Hallo")
                        }))
                    }
                }
            }),
        );
        let client = translator(&serve(app).await);

        let doc = ContentNode::doc(vec![
            ContentNode::paragraph("Hello before"),
            image("a.png"),
            ContentNode::paragraph("Hello after"),
        ]);
        let config = ChunkConfig::default();
        let orchestrator = TranslationOrchestrator::new(config, Arc::new(ChunkPlanner::default()));
        let run = orchestrator
            .run(
                &doc,
                &client,
                &TranslationContext::default(),
                &NoopProgress,
                &CancellationToken::new(),
            )
            .await;

        assert!(run.result.success);
        assert!(run.result.failed_chunk_indices.is_empty());
        let merged = run.result.merged_document.unwrap();
        assert_eq!(merged.children.len(), 3);
        assert_eq!(merged.children[0], ContentNode::paragraph("Hallo before"));
        assert_eq!(merged.children[1], image("a.png"));
        assert_eq!(merged.children[2], ContentNode::paragraph("Hallo after"));
    }

    #[tokio::test]
    async fn test_translate_round_trip() {
        let app = Router::new().route(
            "/translate",
            post(|Json(body): Json<serde_json::Value>| async move {
                let source = body["source_text"].as_str().unwrap_or_default();
                Json(serde_json::json!({ "translated_text": source.replace("Hello", "Hallo") }))
            }),
        );
        let client = translator(&serve(app).await);

        let translated = client
            .translate_chunk(params(vec![ContentNode::paragraph("Hello world")], None))
            .await
            .unwrap();

        assert_eq!(translated.raw_response_text, "Hallo world");
        assert_eq!(
            translated.translated_content,
            ContentNode::doc(vec![ContentNode::paragraph("Hallo world")])
        );
    }

    #[tokio::test]
    async fn test_service_error_status() {
        let app = Router::new().route(
            "/translate",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "overloaded") }),
        );
        let client = translator(&serve(app).await);

        let err = client
            .translate_chunk(params(vec![ContentNode::paragraph("Hello")], Some((0, 2))))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ChunkTranslationError::Service {
                status: 503,
                body: "overloaded".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let client = translator("http://127.0.0.1:9");
        let err = client
            .translate_chunk(params(vec![ContentNode::paragraph("Hello")], None))
            .await
            .unwrap_err();
        assert!(matches!(err, ChunkTranslationError::Transport(_)));
        assert!(!client.health_check().await.unwrap());
    }
}
