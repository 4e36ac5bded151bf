//! Conversation session lifecycle.
//!
//! A session binds the persona instruction and generation parameters to an
//! append-only turn history. `SessionManager` is an explicit two-state
//! machine: UNINITIALIZED until the first `initialize` (or the first turn,
//! which initializes lazily with the last-known scheme variant), ACTIVE
//! afterwards. Re-initializing (e.g. on a scheme switch) discards the
//! in-memory history and starts fresh; it never fails into a half-open
//! state.

use tracing::info;

use crate::error::ChatError;
use crate::model::ModelClient;
use crate::persona::{self, SchemeVariant};
use crate::types::{ChunkStream, SessionParams};

/// One committed user/model exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTurn {
    pub user: String,
    pub model: String,
}

/// A persona-bound conversation session.
///
/// Generation parameters are fixed at creation; only the history mutates,
/// and only by appending.
#[derive(Debug, Clone)]
pub struct ModelSession {
    params: SessionParams,
    history: Vec<HistoryTurn>,
}

impl ModelSession {
    pub fn new(params: SessionParams) -> Self {
        Self {
            params,
            history: Vec::new(),
        }
    }

    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    pub fn history(&self) -> &[HistoryTurn] {
        &self.history
    }

    /// Append a completed exchange.
    pub fn record_turn(&mut self, user: impl Into<String>, model: impl Into<String>) {
        self.history.push(HistoryTurn {
            user: user.into(),
            model: model.into(),
        });
    }
}

enum SessionState {
    Uninitialized,
    Active(ModelSession),
}

/// Generation settings the manager needs to build session parameters.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub model: String,
    pub temperature: f32,
    pub search_tool_enabled: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            model: "gemini-3-pro-preview".to_string(),
            temperature: 0.3,
            search_tool_enabled: true,
        }
    }
}

/// Owns the lifecycle of the active conversation session.
///
/// Exactly one session is active per manager; callers must serialize
/// turns (the orchestrator holds the manager behind an async mutex for
/// the duration of each turn).
pub struct SessionManager<M> {
    client: M,
    settings: SessionSettings,
    state: SessionState,
    /// Last-known scheme variant, used by lazy initialization.
    variant: SchemeVariant,
}

impl<M: ModelClient> SessionManager<M> {
    pub fn new(client: M, settings: SessionSettings, variant: SchemeVariant) -> Self {
        Self {
            client,
            settings,
            state: SessionState::Uninitialized,
            variant,
        }
    }

    /// Create (or replace) the active session for a scheme variant.
    ///
    /// Idempotent; any prior in-memory history is discarded. Fails with
    /// [`ChatError::SessionUnavailable`] when the model credential is
    /// missing, leaving the manager UNINITIALIZED.
    pub fn initialize(&mut self, variant: SchemeVariant) -> Result<(), ChatError> {
        let params = SessionParams {
            system_instruction: persona::system_instruction(variant),
            model: self.settings.model.clone(),
            temperature: self.settings.temperature,
            search_tool_enabled: self.settings.search_tool_enabled,
        };
        let session = self.client.open_session(params)?;
        self.state = SessionState::Active(session);
        self.variant = variant;
        info!(scheme = %variant, "Chat session initialized");
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active(_))
    }

    pub fn variant(&self) -> SchemeVariant {
        self.variant
    }

    /// The active session, initializing lazily with the last-known
    /// variant when necessary.
    pub fn active_session(&mut self) -> Result<&ModelSession, ChatError> {
        if !self.is_active() {
            self.initialize(self.variant)?;
        }
        match &self.state {
            SessionState::Active(session) => Ok(session),
            SessionState::Uninitialized => {
                // initialize() either left us Active or returned early.
                Err(ChatError::SessionUnavailable(
                    "session initialization did not complete".to_string(),
                ))
            }
        }
    }

    /// Start a turn against the active session.
    pub async fn stream_turn(&mut self, message: &str) -> Result<ChunkStream, ChatError> {
        if !self.is_active() {
            self.initialize(self.variant)?;
        }
        match &self.state {
            SessionState::Active(session) => self.client.stream_turn(session, message).await,
            SessionState::Uninitialized => Err(ChatError::SessionUnavailable(
                "session initialization did not complete".to_string(),
            )),
        }
    }

    /// Commit a completed exchange to the session history.
    ///
    /// Called only after a turn finished normally; failed turns leave the
    /// history untouched.
    pub fn commit_turn(&mut self, user: &str, model: &str) {
        if let SessionState::Active(session) = &mut self.state {
            session.record_turn(user, model);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
