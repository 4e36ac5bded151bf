//! Streaming model client.
//!
//! `HostedModelClient` speaks the generative-language streaming protocol:
//! one POST per turn to `models/{model}:streamGenerateContent?alt=sse`,
//! carrying the session's system instruction, generation config, the
//! search tool, and the full turn history. The SSE response is decoded
//! line by line into [`StreamChunk`]s.
//!
//! `ScriptedModelClient` replays canned chunk/error sequences so the rest
//! of the pipeline can be exercised without a network.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;
use crate::session::ModelSession;
use crate::types::{ChunkStream, Citation, SessionParams, StreamChunk};

/// Client for a streaming chat model.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Create a session with the given parameters.
    ///
    /// Fails with [`ChatError::SessionUnavailable`] when the model
    /// credential is missing; session creation is where credential
    /// problems surface, not message sending.
    fn open_session(&self, params: SessionParams) -> Result<ModelSession, ChatError>;

    /// Send one turn and return its ordered chunk stream.
    async fn stream_turn(
        &self,
        session: &ModelSession,
        message: &str,
    ) -> Result<ChunkStream, ChatError>;
}

// ---------------------------------------------------------------------------
// HostedModelClient
// ---------------------------------------------------------------------------

/// HTTP client for the hosted streaming endpoint.
pub struct HostedModelClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HostedModelClient {
    /// Create a client. `api_key` may be absent; sessions then fail to
    /// open with a configuration hint instead of a transport error.
    pub fn new(endpoint: &str, api_key: Option<String>) -> Result<Self, ChatError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| ChatError::Stream(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl ModelClient for HostedModelClient {
    fn open_session(&self, params: SessionParams) -> Result<ModelSession, ChatError> {
        if self.api_key.is_none() {
            return Err(ChatError::SessionUnavailable(
                "model API credential is not set (JANSATHI_API_KEY)".to_string(),
            ));
        }
        Ok(ModelSession::new(params))
    }

    async fn stream_turn(
        &self,
        session: &ModelSession,
        message: &str,
    ) -> Result<ChunkStream, ChatError> {
        let api_key = self.api_key.clone().ok_or_else(|| {
            ChatError::SessionUnavailable(
                "model API credential is not set (JANSATHI_API_KEY)".to_string(),
            )
        })?;

        let params = session.params();
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.endpoint, params.model
        );
        let request = build_request(session, message);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::Stream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Model {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes_stream()
            .map(|r| r.map(|b| b.to_vec()))
            .boxed();
        let state = SseState {
            bytes,
            buffer: String::new(),
            pending: VecDeque::new(),
            done: false,
        };

        let stream = futures::stream::try_unfold(state, |mut st| async move {
            loop {
                if let Some(chunk) = st.pending.pop_front() {
                    return Ok(Some((chunk, st)));
                }
                if st.done {
                    return Ok(None);
                }
                match st.bytes.next().await {
                    Some(Ok(data)) => {
                        st.buffer.push_str(&String::from_utf8_lossy(&data));
                        while let Some(pos) = st.buffer.find('\n') {
                            let line: String = st.buffer.drain(..=pos).collect();
                            if let Some(chunk) = parse_sse_line(line.trim_end())? {
                                st.pending.push_back(chunk);
                            }
                        }
                    }
                    Some(Err(e)) => return Err(ChatError::Stream(e.to_string())),
                    None => {
                        st.done = true;
                        let rest = std::mem::take(&mut st.buffer);
                        if let Some(chunk) = parse_sse_line(rest.trim_end())? {
                            st.pending.push_back(chunk);
                        }
                    }
                }
            }
        });

        Ok(Box::pin(stream))
    }
}

struct SseState {
    bytes: futures::stream::BoxStream<'static, Result<Vec<u8>, reqwest::Error>>,
    buffer: String,
    pending: VecDeque<StreamChunk>,
    done: bool,
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct GenerateRequest {
    #[serde(rename = "systemInstruction")]
    system_instruction: ContentBody,
    contents: Vec<ContentBody>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Serialize)]
struct ContentBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Serialize)]
struct Tool {
    #[serde(rename = "googleSearch")]
    google_search: EmptyObject,
}

#[derive(Serialize)]
struct EmptyObject {}

#[derive(Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    candidates: Vec<ChunkCandidate>,
}

#[derive(Deserialize)]
struct ChunkCandidate {
    content: Option<CandidateContent>,
    #[serde(rename = "groundingMetadata")]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct GroundingMetadata {
    #[serde(rename = "groundingChunks", default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Deserialize)]
struct GroundingChunk {
    web: Option<WebSource>,
}

#[derive(Deserialize)]
struct WebSource {
    uri: Option<String>,
    title: Option<String>,
}

fn build_request(session: &ModelSession, message: &str) -> GenerateRequest {
    let params = session.params();

    let mut contents = Vec::with_capacity(session.history().len() * 2 + 1);
    for turn in session.history() {
        contents.push(ContentBody {
            role: Some("user"),
            parts: vec![RequestPart {
                text: turn.user.clone(),
            }],
        });
        contents.push(ContentBody {
            role: Some("model"),
            parts: vec![RequestPart {
                text: turn.model.clone(),
            }],
        });
    }
    contents.push(ContentBody {
        role: Some("user"),
        parts: vec![RequestPart {
            text: message.to_string(),
        }],
    });

    let tools = if params.search_tool_enabled {
        vec![Tool {
            google_search: EmptyObject {},
        }]
    } else {
        Vec::new()
    };

    GenerateRequest {
        system_instruction: ContentBody {
            role: None,
            parts: vec![RequestPart {
                text: params.system_instruction.clone(),
            }],
        },
        contents,
        generation_config: GenerationConfig {
            temperature: params.temperature,
        },
        tools,
    }
}

/// Decode one SSE line into a chunk, if it carries any content.
fn parse_sse_line(line: &str) -> Result<Option<StreamChunk>, ChatError> {
    let Some(payload) = line.strip_prefix("data:") else {
        // Blank keep-alives and comment lines are part of the protocol.
        return Ok(None);
    };
    let payload = payload.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return Ok(None);
    }

    let wire: GenerateChunk = serde_json::from_str(payload)
        .map_err(|e| ChatError::ResponseParsing(format!("bad stream payload: {}", e)))?;

    let Some(candidate) = wire.candidates.into_iter().next() else {
        return Ok(None);
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    let citations: Vec<Citation> = candidate
        .grounding_metadata
        .map(|g| {
            g.grounding_chunks
                .into_iter()
                .filter_map(|gc| gc.web)
                .map(|w| Citation {
                    uri: w.uri.unwrap_or_default(),
                    title: w.title.unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() && citations.is_empty() {
        return Ok(None);
    }

    Ok(Some(StreamChunk {
        text: (!text.is_empty()).then_some(text),
        citations,
    }))
}

// ---------------------------------------------------------------------------
// ScriptedModelClient - canned turns for tests
// ---------------------------------------------------------------------------

/// One scripted event in a canned turn.
#[derive(Debug, Clone)]
pub enum ScriptEvent {
    Chunk(StreamChunk),
    /// A mid-turn transport failure; everything after it is unreachable.
    Error(String),
}

/// Model client replaying pre-scripted turns in order.
///
/// Turns are consumed front to back, one per `stream_turn` call; a call
/// beyond the script yields an empty stream. Clones share the same script
/// and recorded messages, so a test can keep a handle while the
/// orchestrator owns another.
#[derive(Clone)]
pub struct ScriptedModelClient {
    inner: std::sync::Arc<ScriptedInner>,
}

struct ScriptedInner {
    turns: Mutex<VecDeque<Vec<ScriptEvent>>>,
    sent_messages: Mutex<Vec<String>>,
    refuse_sessions: bool,
}

impl ScriptedModelClient {
    pub fn new() -> Self {
        Self::build(false)
    }

    /// A client whose `open_session` always fails, as when the model
    /// credential is missing.
    pub fn refusing_sessions() -> Self {
        Self::build(true)
    }

    fn build(refuse_sessions: bool) -> Self {
        Self {
            inner: std::sync::Arc::new(ScriptedInner {
                turns: Mutex::new(VecDeque::new()),
                sent_messages: Mutex::new(Vec::new()),
                refuse_sessions,
            }),
        }
    }

    /// Append a scripted turn.
    pub fn with_turn(self, events: Vec<ScriptEvent>) -> Self {
        if let Ok(mut turns) = self.inner.turns.lock() {
            turns.push_back(events);
        }
        self
    }

    /// Messages received so far, in order: the final augmented prompts.
    pub fn sent_messages(&self) -> Vec<String> {
        self.inner
            .sent_messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

impl Default for ScriptedModelClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelClient for ScriptedModelClient {
    fn open_session(&self, params: SessionParams) -> Result<ModelSession, ChatError> {
        if self.inner.refuse_sessions {
            return Err(ChatError::SessionUnavailable(
                "model API credential is not set (JANSATHI_API_KEY)".to_string(),
            ));
        }
        Ok(ModelSession::new(params))
    }

    async fn stream_turn(
        &self,
        _session: &ModelSession,
        message: &str,
    ) -> Result<ChunkStream, ChatError> {
        if let Ok(mut sent) = self.inner.sent_messages.lock() {
            sent.push(message.to_string());
        }
        let events = self
            .inner
            .turns
            .lock()
            .map(|mut turns| turns.pop_front().unwrap_or_default())
            .unwrap_or_default();

        let items: Vec<Result<StreamChunk, ChatError>> = events
            .into_iter()
            .map(|event| match event {
                ScriptEvent::Chunk(chunk) => Ok(chunk),
                ScriptEvent::Error(message) => Err(ChatError::Stream(message)),
            })
            .collect();

        Ok(Box::pin(futures::stream::iter(items)))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::{system_instruction, SchemeVariant};

    fn params() -> SessionParams {
        SessionParams {
            system_instruction: system_instruction(SchemeVariant::General),
            model: "gemini-3-pro-preview".to_string(),
            temperature: 0.3,
            search_tool_enabled: true,
        }
    }

    // ---- SSE line parsing ----

    #[test]
    fn test_parse_text_chunk() {
        let line = r#"data: {"candidates":[{"content":{"parts":[{"text":"Namaste"}]}}]}"#;
        let chunk = parse_sse_line(line).unwrap().unwrap();
        assert_eq!(chunk.text.as_deref(), Some("Namaste"));
        assert!(chunk.citations.is_empty());
    }

    #[test]
    fn test_parse_grounding_chunk() {
        let line = r#"data: {"candidates":[{"groundingMetadata":{"groundingChunks":[{"web":{"uri":"https://wcd.gov.in/","title":"WCD"}}]}}]}"#;
        let chunk = parse_sse_line(line).unwrap().unwrap();
        assert!(chunk.text.is_none());
        assert_eq!(chunk.citations.len(), 1);
        assert_eq!(chunk.citations[0].uri, "https://wcd.gov.in/");
        assert_eq!(chunk.citations[0].title, "WCD");
    }

    #[test]
    fn test_parse_chunk_with_text_and_citations() {
        let line = r#"data: {"candidates":[{"content":{"parts":[{"text":"See the portal."}]},"groundingMetadata":{"groundingChunks":[{"web":{"uri":"https://pmmvy.nic.in/","title":"PMMVY"}}]}}]}"#;
        let chunk = parse_sse_line(line).unwrap().unwrap();
        assert_eq!(chunk.text.as_deref(), Some("See the portal."));
        assert_eq!(chunk.citations.len(), 1);
    }

    #[test]
    fn test_parse_missing_citation_fields_become_empty() {
        let line = r#"data: {"candidates":[{"groundingMetadata":{"groundingChunks":[{"web":{"uri":"https://wcd.gov.in/"}}]}}]}"#;
        let chunk = parse_sse_line(line).unwrap().unwrap();
        assert_eq!(chunk.citations[0].title, "");
    }

    #[test]
    fn test_non_data_lines_are_skipped() {
        assert!(parse_sse_line("").unwrap().is_none());
        assert!(parse_sse_line(": keep-alive").unwrap().is_none());
        assert!(parse_sse_line("event: message").unwrap().is_none());
        assert!(parse_sse_line("data:").unwrap().is_none());
        assert!(parse_sse_line("data: [DONE]").unwrap().is_none());
    }

    #[test]
    fn test_empty_candidates_yield_nothing() {
        assert!(parse_sse_line(r#"data: {"candidates":[]}"#).unwrap().is_none());
        assert!(parse_sse_line(r#"data: {}"#).unwrap().is_none());
    }

    #[test]
    fn test_malformed_payload_is_an_error() {
        let result = parse_sse_line("data: {broken json");
        assert!(matches!(result, Err(ChatError::ResponseParsing(_))));
    }

    #[test]
    fn test_multiple_parts_are_concatenated() {
        let line = r#"data: {"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"there"}]}}]}"#;
        let chunk = parse_sse_line(line).unwrap().unwrap();
        assert_eq!(chunk.text.as_deref(), Some("Hello there"));
    }

    // ---- Request building ----

    #[test]
    fn test_request_includes_history_and_message() {
        let mut session = ModelSession::new(params());
        session.record_turn("first question", "first answer");

        let request = build_request(&session, "second question");
        assert_eq!(request.contents.len(), 3);
        assert_eq!(request.contents[0].role, Some("user"));
        assert_eq!(request.contents[0].parts[0].text, "first question");
        assert_eq!(request.contents[1].role, Some("model"));
        assert_eq!(request.contents[1].parts[0].text, "first answer");
        assert_eq!(request.contents[2].role, Some("user"));
        assert_eq!(request.contents[2].parts[0].text, "second question");
    }

    #[test]
    fn test_request_carries_generation_settings() {
        let session = ModelSession::new(params());
        let request = build_request(&session, "hi");
        assert!((request.generation_config.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(request.tools.len(), 1);
        assert!(request
            .system_instruction
            .parts[0]
            .text
            .contains("Asha"));
    }

    #[test]
    fn test_request_omits_tools_when_search_disabled() {
        let session = ModelSession::new(SessionParams {
            search_tool_enabled: false,
            ..params()
        });
        let request = build_request(&session, "hi");
        assert!(request.tools.is_empty());
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("googleSearch"));
    }

    #[test]
    fn test_request_wire_names() {
        let session = ModelSession::new(params());
        let json = serde_json::to_string(&build_request(&session, "hi")).unwrap();
        assert!(json.contains("\"systemInstruction\""));
        assert!(json.contains("\"generationConfig\""));
        assert!(json.contains("\"googleSearch\""));
    }

    // ---- Hosted client ----

    #[test]
    fn test_open_session_without_key_fails() {
        let client = HostedModelClient::new("https://example.net/v1beta", None).unwrap();
        let result = client.open_session(params());
        assert!(matches!(result, Err(ChatError::SessionUnavailable(_))));
    }

    #[test]
    fn test_open_session_with_key_succeeds() {
        let client =
            HostedModelClient::new("https://example.net/v1beta", Some("key".to_string())).unwrap();
        let session = client.open_session(params()).unwrap();
        assert_eq!(session.params().model, "gemini-3-pro-preview");
        assert!(session.history().is_empty());
    }

    // ---- Scripted client ----

    #[tokio::test]
    async fn test_scripted_client_replays_turn() {
        use futures::StreamExt;

        let client = ScriptedModelClient::new().with_turn(vec![
            ScriptEvent::Chunk(StreamChunk::text("I can ")),
            ScriptEvent::Chunk(StreamChunk::text("help.")),
        ]);
        let session = client.open_session(params()).unwrap();
        let mut stream = client.stream_turn(&session, "hello").await.unwrap();

        let mut collected = String::new();
        while let Some(item) = stream.next().await {
            if let Some(text) = item.unwrap().text {
                collected.push_str(&text);
            }
        }
        assert_eq!(collected, "I can help.");
    }

    #[tokio::test]
    async fn test_scripted_client_emits_error_event() {
        use futures::StreamExt;

        let client = ScriptedModelClient::new().with_turn(vec![
            ScriptEvent::Chunk(StreamChunk::text("partial")),
            ScriptEvent::Error("connection reset".to_string()),
        ]);
        let session = client.open_session(params()).unwrap();
        let mut stream = client.stream_turn(&session, "hello").await.unwrap();

        assert!(stream.next().await.unwrap().is_ok());
        let err = stream.next().await.unwrap().unwrap_err();
        assert!(matches!(err, ChatError::Stream(_)));
    }

    #[test]
    fn test_refusing_client_fails_open_session() {
        let client = ScriptedModelClient::refusing_sessions();
        assert!(matches!(
            client.open_session(params()),
            Err(ChatError::SessionUnavailable(_))
        ));
    }
}
