//! Stream consumption: one turn's chunk sequence in, display updates out.
//!
//! Chunks are processed strictly in arrival order. Per chunk: citations
//! are validated, filtered, and deduplicated; text is appended to the
//! turn's accumulation (which never shrinks); the whole accumulation is
//! re-scanned for the actions tag (it may span chunks and only become
//! parseable late); and a fresh [`DisplayMessage`] snapshot is emitted
//! whenever text, sources, or actions changed.
//!
//! An unclosed in-progress tag stays visible in the streamed text; once
//! the tag closes and parses it is stripped and never shown again.

use futures::StreamExt;
use jansathi_core::{DisplayMessage, Source};
use tracing::debug;
use uuid::Uuid;

use crate::error::ChatError;
use crate::parser::{ActionTagParser, TagScan};
use crate::sources::{SourceCollector, SourceFilter};
use crate::types::ChunkStream;

/// Drives a single turn's chunk stream.
pub struct StreamConsumer {
    filter: SourceFilter,
}

impl StreamConsumer {
    pub fn new(filter: SourceFilter) -> Self {
        Self { filter }
    }

    /// Consume the stream to completion, emitting incremental snapshots.
    ///
    /// Returns the final message on normal completion. A mid-turn stream
    /// failure is returned as an error after all prior emissions; no
    /// further chunks are processed and the sink is not called again.
    pub async fn consume<F>(
        &self,
        message_id: Uuid,
        mut stream: ChunkStream,
        mut emit: F,
    ) -> Result<DisplayMessage, ChatError>
    where
        F: FnMut(&DisplayMessage),
    {
        let mut accumulated = String::new();
        let mut collector = SourceCollector::new();
        let mut actions: Option<Vec<String>> = None;
        let mut display = DisplayMessage::model_with_id(message_id, String::new());

        while let Some(item) = stream.next().await {
            let chunk = item?;

            for citation in chunk.citations {
                // Grounding entries need both fields to be renderable.
                if citation.uri.is_empty() || citation.title.is_empty() {
                    continue;
                }
                if !self.filter.accepts(&citation.uri) {
                    debug!(uri = %citation.uri, "Citation outside allowed domains; dropped");
                    continue;
                }
                collector.insert(Source {
                    title: citation.title,
                    uri: citation.uri,
                });
            }

            if let Some(text) = chunk.text {
                if !text.is_empty() {
                    accumulated.push_str(&text);
                }
            }

            // The tag may have closed anywhere in the accumulation, so
            // always re-scan the whole of it.
            let display_text = match ActionTagParser::scan(&accumulated) {
                TagScan::Ready {
                    stripped_text,
                    actions: parsed,
                } => {
                    if actions.is_none() {
                        actions = Some(parsed);
                    }
                    stripped_text
                }
                TagScan::Absent | TagScan::Pending => accumulated.clone(),
            };

            let changed = display_text != display.text
                || collector.sources() != display.sources.as_slice()
                || actions != display.actions;
            if changed {
                display.text = display_text;
                display.sources = collector.sources().to_vec();
                display.actions = actions.clone();
                emit(&display);
            }
        }

        Ok(display)
    }
}

// =============================================================================
// Tests
// =============================================================================
