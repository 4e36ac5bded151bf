//! Context assembly: query text in, optional context block out.
//!
//! Ties the embedding service and index client together. Retrieval is
//! strictly best-effort: missing credentials, transport failures, and
//! empty result sets all collapse to `None`, and the caller sends the
//! query unaugmented.

use tracing::{debug, warn};

use crate::embedding::EmbeddingService;
use crate::index::VectorIndexService;

/// Separator between retrieved passages, in rank order.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Assembles retrieved knowledge-base context for a query.
pub struct ContextAssembler<E, I> {
    embedder: E,
    /// `None` when index credentials were absent at startup.
    index: Option<I>,
    top_k: usize,
    include_metadata: bool,
}

impl<E: EmbeddingService, I: VectorIndexService> ContextAssembler<E, I> {
    pub fn new(embedder: E, index: Option<I>, top_k: usize, include_metadata: bool) -> Self {
        Self {
            embedder,
            index,
            top_k,
            include_metadata,
        }
    }

    /// Retrieve context for a query, or `None` when unavailable or empty.
    ///
    /// Never returns an error: retrieval problems are logged and the
    /// conversation proceeds without context.
    pub async fn retrieve(&self, query: &str) -> Option<String> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        let Some(index) = self.index.as_ref() else {
            debug!("Vector index not configured; skipping retrieval");
            return None;
        };

        let vector = match self.embedder.embed(query).await {
            Ok(Some(v)) => v,
            Ok(None) => {
                debug!("Embedding unavailable; skipping retrieval");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Embedding failed; skipping retrieval");
                return None;
            }
        };

        let matches = match index.query(&vector, self.top_k, self.include_metadata).await {
            Ok(m) => m,
            Err(e) => {
                warn!(error = %e, "Index query failed; skipping retrieval");
                return None;
            }
        };

        if matches.is_empty() {
            debug!("Index returned no matches");
            return None;
        }

        // Keep the index's ranking; drop matches without usable text.
        let texts: Vec<&str> = matches
            .iter()
            .filter_map(|m| m.metadata_text.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();

        if texts.is_empty() {
            return None;
        }

        debug!(passages = texts.len(), "Assembled retrieved context");
        Some(texts.join(CONTEXT_SEPARATOR))
    }
}

// =============================================================================
// Tests
// =============================================================================
