//! Turn-level types shared across the chat pipeline.

use std::pin::Pin;

use futures::Stream;

use crate::error::ChatError;

/// One unit of a turn's streamed response.
///
/// Either field may be absent: some chunks carry only text, some only
/// grounding citations, some both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamChunk {
    /// Partial reply text to append to the turn's accumulation.
    pub text: Option<String>,
    /// Grounding citations attached to this chunk. Not yet validated;
    /// the stream consumer rejects entries missing a uri or title.
    pub citations: Vec<Citation>,
}

impl StreamChunk {
    /// A text-only chunk.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            citations: Vec::new(),
        }
    }

    /// Attach a citation.
    pub fn with_citation(mut self, uri: impl Into<String>, title: impl Into<String>) -> Self {
        self.citations.push(Citation {
            uri: uri.into(),
            title: title.into(),
        });
        self
    }
}

/// Grounding citation as carried on the wire. Fields may be empty when
/// the backend omitted them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Citation {
    pub uri: String,
    pub title: String,
}

/// The ordered chunk sequence of one turn.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, ChatError>> + Send>>;

/// Fixed generation parameters bound to a conversation session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionParams {
    pub system_instruction: String,
    pub model: String,
    pub temperature: f32,
    pub search_tool_enabled: bool,
}
