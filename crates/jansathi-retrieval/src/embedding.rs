//! Embedding service trait and implementations.
//!
//! - `HostedEmbeddingClient` calls the hosted generative-language API to
//!   embed a query. This is the production backend.
//! - `MockEmbedding` provides deterministic hash-based vectors for testing.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RetrievalError;

/// Service for generating query embeddings.
///
/// `Ok(None)` is the degraded "unavailable" signal: the credential needed
/// to call the backend is missing, so retrieval should be skipped without
/// treating it as a failure. Transport and endpoint problems are real
/// errors and surface as `Err`.
pub trait EmbeddingService: Send + Sync {
    /// Generate an embedding vector for the given text.
    fn embed(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<Option<Vec<f32>>, RetrievalError>> + Send;

    /// Return the dimensionality of vectors produced by this service.
    fn dimensions(&self) -> usize;
}

// ---------------------------------------------------------------------------
// HostedEmbeddingClient - hosted embedding endpoint over HTTP
// ---------------------------------------------------------------------------

/// Client for the hosted embedding endpoint.
///
/// Sends `{content: {parts: [{text}]}}` to
/// `{endpoint}/models/{model}:embedContent` and reads back
/// `{embedding: {values: [...]}}`.
pub struct HostedEmbeddingClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    dimensions: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    content: ContentParts<'a>,
}

#[derive(Serialize)]
struct ContentParts<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Option<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    #[serde(default)]
    values: Vec<f32>,
}

impl HostedEmbeddingClient {
    /// Create a new client.
    ///
    /// `api_key` may be `None`; the client then reports itself unavailable
    /// on every call instead of failing, which disables retrieval without
    /// blocking the conversation.
    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: Option<String>,
        dimensions: usize,
    ) -> Result<Self, RetrievalError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RetrievalError::Http(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            dimensions,
        })
    }
}

impl EmbeddingService for HostedEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Option<Vec<f32>>, RetrievalError> {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("Embedding credential missing; reporting unavailable");
            return Ok(None);
        };

        let url = format!("{}/models/{}:embedContent", self.endpoint, self.model);
        let body = EmbedRequest {
            content: ContentParts {
                parts: vec![TextPart { text }],
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Endpoint {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::ResponseParsing(e.to_string()))?;

        let values = parsed
            .embedding
            .map(|e| e.values)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                RetrievalError::ResponseParsing("embedding response had no values".to_string())
            })?;

        Ok(Some(values))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ---------------------------------------------------------------------------
// MockEmbedding - deterministic vectors for tests
// ---------------------------------------------------------------------------

/// Deterministic hash-based embedding for tests.
///
/// The same text always produces the same vector. `unavailable()` builds a
/// mock that reports the credentials-missing signal instead, for
/// exercising the degraded path.
pub struct MockEmbedding {
    dimensions: usize,
    available: bool,
}

impl MockEmbedding {
    pub fn new() -> Self {
        Self {
            dimensions: 8,
            available: true,
        }
    }

    /// A mock whose `embed` always returns `Ok(None)`.
    pub fn unavailable() -> Self {
        Self {
            dimensions: 8,
            available: false,
        }
    }
}

impl Default for MockEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingService for MockEmbedding {
    async fn embed(&self, text: &str) -> Result<Option<Vec<f32>>, RetrievalError> {
        if !self.available {
            return Ok(None);
        }

        let mut vector = Vec::with_capacity(self.dimensions);
        for i in 0..self.dimensions {
            let mut hasher = DefaultHasher::new();
            text.hash(&mut hasher);
            i.hash(&mut hasher);
            let h = hasher.finish();
            vector.push((h % 1000) as f32 / 1000.0);
        }
        Ok(Some(vector))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
