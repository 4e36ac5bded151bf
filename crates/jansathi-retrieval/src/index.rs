//! Vector-index query client.
//!
//! Speaks the hosted index's HTTP query protocol: POST `{host}/query` with
//! an `Api-Key` header and `{vector, topK, includeMetadata}` body, reading
//! back `{matches: [{id, score, metadata: {text}}]}`. Matches arrive in
//! the index's native descending-score order and are passed through
//! untouched, with no client-side re-ranking.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;

/// A single nearest-neighbor match from the index.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalMatch {
    pub id: String,
    pub score: f32,
    /// Stored passage text, when the index was asked for metadata.
    pub metadata_text: Option<String>,
}

/// Service answering nearest-neighbor queries over the knowledge base.
pub trait VectorIndexService: Send + Sync {
    /// Query the index for the `top_k` nearest neighbors of `vector`.
    ///
    /// Failures propagate; the caller decides whether they are fatal
    /// (for retrieval they never are).
    fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> impl std::future::Future<Output = Result<Vec<RetrievalMatch>, RetrievalError>> + Send;
}

// ---------------------------------------------------------------------------
// HostedIndexClient
// ---------------------------------------------------------------------------

/// HTTP client for the hosted vector index.
pub struct HostedIndexClient {
    client: reqwest::Client,
    host: String,
    api_key: String,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    vector: &'a [f32],
    #[serde(rename = "topK")]
    top_k: usize,
    #[serde(rename = "includeMetadata")]
    include_metadata: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    #[serde(default)]
    id: String,
    #[serde(default)]
    score: f32,
    metadata: Option<MatchMetadata>,
}

#[derive(Deserialize)]
struct MatchMetadata {
    text: Option<String>,
}

impl HostedIndexClient {
    /// Create a client for the given index host.
    pub fn new(host: &str, api_key: String) -> Result<Self, RetrievalError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RetrievalError::Http(e.to_string()))?;

        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Build a client only when both host and credential are present.
    ///
    /// Either being absent disables retrieval silently.
    pub fn from_credentials(
        host: Option<String>,
        api_key: Option<String>,
    ) -> Result<Option<Self>, RetrievalError> {
        match (host, api_key) {
            (Some(host), Some(key)) => Ok(Some(Self::new(&host, key)?)),
            _ => Ok(None),
        }
    }
}

impl VectorIndexService for HostedIndexClient {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<RetrievalMatch>, RetrievalError> {
        let url = format!("{}/query", self.host);
        let body = QueryRequest {
            vector,
            top_k,
            include_metadata,
        };

        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
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

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::ResponseParsing(e.to_string()))?;

        Ok(parsed
            .matches
            .into_iter()
            .map(|m| RetrievalMatch {
                id: m.id,
                score: m.score,
                metadata_text: m.metadata.and_then(|md| md.text),
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// MockIndex - canned matches for tests
// ---------------------------------------------------------------------------

/// Test index returning a fixed match list, or a fixed error.
pub struct MockIndex {
    matches: Vec<RetrievalMatch>,
    fail: bool,
}

impl MockIndex {
    pub fn with_matches(matches: Vec<RetrievalMatch>) -> Self {
        Self {
            matches,
            fail: false,
        }
    }

    pub fn empty() -> Self {
        Self::with_matches(Vec::new())
    }

    /// An index whose every query fails with a transport error.
    pub fn failing() -> Self {
        Self {
            matches: Vec::new(),
            fail: true,
        }
    }

    /// Convenience: matches carrying only passage texts, scored in
    /// descending rank order.
    pub fn with_texts(texts: &[&str]) -> Self {
        let matches = texts
            .iter()
            .enumerate()
            .map(|(i, t)| RetrievalMatch {
                id: format!("chunk-{}", i),
                score: 1.0 - i as f32 * 0.1,
                metadata_text: Some(t.to_string()),
            })
            .collect();
        Self::with_matches(matches)
    }
}

impl VectorIndexService for MockIndex {
    async fn query(
        &self,
        _vector: &[f32],
        top_k: usize,
        _include_metadata: bool,
    ) -> Result<Vec<RetrievalMatch>, RetrievalError> {
        if self.fail {
            return Err(RetrievalError::Http("mock index offline".to_string()));
        }
        Ok(self.matches.iter().take(top_k).cloned().collect())
    }
}
