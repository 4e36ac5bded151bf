//! Shared domain types.
//!
//! These types cross crate boundaries: the chat pipeline produces
//! [`DisplayMessage`] snapshots and the presentation layer renders them.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Author of a message in the conversation transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Model,
}

/// A citation backing part of a generated reply.
///
/// Unique by `uri` within a turn; collected only from allow-listed
/// official domains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub uri: String,
}

/// A renderable message snapshot.
///
/// During a streamed turn the pipeline emits a sequence of snapshots with
/// the same `id`; `text` grows (minus any stripped action-tag region) and
/// `sources`/`actions` fill in as chunks arrive. Error replies carry
/// `is_error = true` and a fresh `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayMessage {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<String>>,
    /// Creation time as epoch milliseconds.
    pub timestamp: i64,
    #[serde(default)]
    pub is_error: bool,
}

impl DisplayMessage {
    /// A user-authored message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text.into(), false)
    }

    /// A model-authored message (normal reply).
    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, text.into(), false)
    }

    /// A model-authored message with a caller-chosen id.
    ///
    /// Streamed turns reuse one id across all snapshots so the renderer
    /// can update in place.
    pub fn model_with_id(id: Uuid, text: impl Into<String>) -> Self {
        Self {
            id,
            ..Self::new(Role::Model, text.into(), false)
        }
    }

    /// An error-flagged model message.
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Role::Model, text.into(), true)
    }

    fn new(role: Role, text: String, is_error: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text,
            sources: Vec::new(),
            actions: None,
            timestamp: Utc::now().timestamp_millis(),
            is_error,
        }
    }
}
