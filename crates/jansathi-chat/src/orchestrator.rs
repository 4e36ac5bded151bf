//! Chat orchestrator: central coordinator wiring retrieval, augmentation,
//! session, and stream consumption into complete turns.
//!
//! Retrieval failures never abort a turn. Session and stream failures
//! abort only the current turn, surfacing as a single error-flagged
//! message appended after any partial content already emitted; the
//! session stays usable for the next turn.

use jansathi_core::DisplayMessage;
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

use jansathi_retrieval::{ContextAssembler, EmbeddingService, VectorIndexService};

use crate::augment::augment_prompt;
use crate::error::ChatError;
use crate::model::ModelClient;
use crate::persona::SchemeVariant;
use crate::session::SessionManager;
use crate::stream::StreamConsumer;

/// Shown when the session cannot be created (typically a missing API key).
const SESSION_ERROR_TEXT: &str =
    "I could not start the assistant session.\n\nPlease ensure your API key is configured correctly.";

/// Shown when a reply stream fails mid-turn.
const STREAM_ERROR_TEXT: &str =
    "Something went wrong while generating the reply. Please try again.";

/// Central coordinator for conversation turns.
///
/// One turn is outstanding per session at a time: the session manager is
/// held behind an async mutex for the full duration of each turn, so
/// concurrent callers queue rather than interleave history mutations.
pub struct ChatOrchestrator<M, E, I> {
    sessions: Mutex<SessionManager<M>>,
    assembler: ContextAssembler<E, I>,
    consumer: StreamConsumer,
    max_message_length: usize,
}

impl<M, E, I> ChatOrchestrator<M, E, I>
where
    M: ModelClient,
    E: EmbeddingService,
    I: VectorIndexService,
{
    pub fn new(
        sessions: SessionManager<M>,
        assembler: ContextAssembler<E, I>,
        consumer: StreamConsumer,
        max_message_length: usize,
    ) -> Self {
        Self {
            sessions: Mutex::new(sessions),
            assembler,
            consumer,
            max_message_length,
        }
    }

    /// The fixed greeting shown before any turn, with its default
    /// quick-reply language choices.
    pub fn welcome_message() -> DisplayMessage {
        let mut message = DisplayMessage::model(
            "Namaste! I am **Asha**, your digital community guide.\n\n\
             I am here to help you understand government schemes like **Mission Shakti**, \
             **Mission Vatsalya**, and **Poshan 2.0**.\n\n\
             I can speak multiple languages. Which language would you prefer?",
        );
        message.actions = Some(vec![
            "English".to_string(),
            "\u{939}\u{93f}\u{902}\u{926}\u{940} (Hindi)".to_string(),
            "\u{92e}\u{930}\u{93e}\u{920}\u{940} (Marathi)".to_string(),
            "\u{ba4}\u{bae}\u{bbf}\u{bb4}\u{bcd} (Tamil)".to_string(),
        ]);
        message
    }

    /// Replace the active session with one bound to the given scheme.
    pub async fn switch_scheme(&self, variant: SchemeVariant) -> Result<(), ChatError> {
        self.sessions.lock().await.initialize(variant)
    }

    /// Run one complete turn.
    ///
    /// Emits incremental [`DisplayMessage`] snapshots through `sink` as
    /// the reply streams, and returns the final message, which is
    /// error-flagged (and was also emitted) when the session could not
    /// be created or the stream failed mid-turn. Only invalid input
    /// (empty / oversized message) returns `Err`.
    pub async fn send_message<F>(
        &self,
        text: &str,
        mut sink: F,
    ) -> Result<DisplayMessage, ChatError>
    where
        F: FnMut(&DisplayMessage),
    {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if text.chars().count() > self.max_message_length {
            return Err(ChatError::MessageTooLong(self.max_message_length));
        }

        // Retrieval is advisory; None simply means an unaugmented prompt.
        let context = self.assembler.retrieve(text).await;
        let outgoing = augment_prompt(text, context.as_deref());

        // Held for the whole turn: one outstanding turn per session.
        let mut sessions = self.sessions.lock().await;

        let stream = match sessions.stream_turn(&outgoing).await {
            Ok(stream) => stream,
            Err(ChatError::SessionUnavailable(reason)) => {
                warn!(%reason, "Session unavailable");
                let message = DisplayMessage::error(SESSION_ERROR_TEXT);
                sink(&message);
                return Ok(message);
            }
            Err(e) => {
                warn!(error = %e, "Turn failed to start");
                let message = DisplayMessage::error(STREAM_ERROR_TEXT);
                sink(&message);
                return Ok(message);
            }
        };

        match self.consumer.consume(Uuid::new_v4(), stream, &mut sink).await {
            Ok(final_message) => {
                sessions.commit_turn(text, &final_message.text);
                Ok(final_message)
            }
            Err(e) => {
                warn!(error = %e, "Stream failed mid-turn");
                // Appended as a separate message; prior partial updates
                // remain valid and the session is untouched.
                let message = DisplayMessage::error(STREAM_ERROR_TEXT);
                sink(&message);
                Ok(message)
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
