//! End-to-end turn tests for the chat pipeline.
//!
//! Drives the orchestrator with mock retrieval services and a scripted
//! model client: retrieval augmentation, degraded-retrieval fallback,
//! streaming updates with citation filtering and action extraction, and
//! the session/stream failure paths. Each test builds its own
//! orchestrator with independent state.

use jansathi_chat::model::{ScriptEvent, ScriptedModelClient};
use jansathi_chat::session::{SessionManager, SessionSettings};
use jansathi_chat::{
    ChatOrchestrator, SchemeVariant, SourceFilter, StreamChunk, StreamConsumer,
};
use jansathi_core::DisplayMessage;
use jansathi_retrieval::{ContextAssembler, MockEmbedding, MockIndex, CONTEXT_SEPARATOR};

// =============================================================================
// Helpers
// =============================================================================

type TestOrchestrator = ChatOrchestrator<ScriptedModelClient, MockEmbedding, MockIndex>;

fn orchestrator_with(
    client: ScriptedModelClient,
    embedder: MockEmbedding,
    index: Option<MockIndex>,
) -> TestOrchestrator {
    let sessions = SessionManager::new(client, SessionSettings::default(), SchemeVariant::General);
    let assembler = ContextAssembler::new(embedder, index, 5, true);
    ChatOrchestrator::new(
        sessions,
        assembler,
        StreamConsumer::new(SourceFilter::official()),
        2000,
    )
}

fn reply_turn(text: &str) -> Vec<ScriptEvent> {
    vec![ScriptEvent::Chunk(StreamChunk::text(text))]
}

async fn run_turn(
    orch: &TestOrchestrator,
    text: &str,
) -> (DisplayMessage, Vec<DisplayMessage>) {
    let mut updates = Vec::new();
    let final_message = orch
        .send_message(text, |m| updates.push(m.clone()))
        .await
        .expect("valid input must not error");
    (final_message, updates)
}

// =============================================================================
// Retrieval augmentation
// =============================================================================

#[tokio::test]
async fn augmented_prompt_carries_retrieved_context() {
    // The scripted client records what it was sent; keep a handle.
    let client = ScriptedModelClient::new().with_turn(reply_turn("Answer."));
    let orch = orchestrator_with(
        client.clone(),
        MockEmbedding::new(),
        Some(MockIndex::with_texts(&["Text1", "Text2"])),
    );

    run_turn(&orch, "What is PMMVY?").await;

    let sent = client.sent_messages();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("**RETRIEVED CONTEXT:**"));
    assert!(sent[0].contains(&format!("Text1{}Text2", CONTEXT_SEPARATOR)));
    assert!(sent[0].contains("**USER QUESTION:**\nWhat is PMMVY?"));
}

#[tokio::test]
async fn missing_credentials_fall_back_to_raw_query() {
    // Embedding reports unavailable, so the index (though configured)
    // is never consulted and the raw query goes out unaugmented.
    let client = ScriptedModelClient::new().with_turn(reply_turn("Answer."));
    let orch = orchestrator_with(
        client.clone(),
        MockEmbedding::unavailable(),
        Some(MockIndex::with_texts(&["Text1"])),
    );

    let (final_message, _) = run_turn(&orch, "What is PMMVY?").await;
    assert!(!final_message.is_error);

    let sent = client.sent_messages();
    assert_eq!(sent, vec!["What is PMMVY?".to_string()]);
}

#[tokio::test]
async fn failing_index_never_aborts_the_turn() {
    let orch = orchestrator_with(
        ScriptedModelClient::new().with_turn(reply_turn("Still fine.")),
        MockEmbedding::new(),
        Some(MockIndex::failing()),
    );

    let (final_message, _) = run_turn(&orch, "Where is my Anganwadi?").await;
    assert!(!final_message.is_error);
    assert_eq!(final_message.text, "Still fine.");
}

// =============================================================================
// Streaming behavior
// =============================================================================

#[tokio::test]
async fn full_turn_extracts_text_sources_and_actions() {
    let client = ScriptedModelClient::new().with_turn(vec![
        ScriptEvent::Chunk(
            StreamChunk::text("PMMVY pays Rs 5000 in installments. ")
                .with_citation("https://wcd.gov.in/pmmvy", "PMMVY Guidelines")
                .with_citation("https://newsblog.example.com/pmmvy", "News Blog"),
        ),
        ScriptEvent::Chunk(StreamChunk::text("Apply at your Anganwadi.")),
        ScriptEvent::Chunk(StreamChunk::text(
            "<actions>[\"Check eligibility\", \"Required documents\"]</actions>",
        )),
    ]);
    let orch = orchestrator_with(client, MockEmbedding::new(), None);

    let (final_message, updates) = run_turn(&orch, "Tell me about PMMVY").await;

    assert_eq!(
        final_message.text,
        "PMMVY pays Rs 5000 in installments. Apply at your Anganwadi."
    );
    assert_eq!(final_message.sources.len(), 1);
    assert_eq!(final_message.sources[0].title, "PMMVY Guidelines");
    assert_eq!(
        final_message.actions,
        Some(vec![
            "Check eligibility".to_string(),
            "Required documents".to_string()
        ])
    );

    // Progressive rendering: every update shares the turn's message id,
    // and the tag arrived whole in its own chunk, so no snapshot ever
    // shows it.
    assert!(updates.len() >= 2);
    assert!(updates.iter().all(|u| u.id == final_message.id));
    assert!(updates.iter().all(|u| !u.text.contains("<actions>")));
}

#[tokio::test]
async fn duplicate_citations_across_chunks_collapse() {
    let client = ScriptedModelClient::new().with_turn(vec![
        ScriptEvent::Chunk(
            StreamChunk::text("One. ").with_citation("https://wcd.gov.in/x", "X"),
        ),
        ScriptEvent::Chunk(
            StreamChunk::text("Two.").with_citation("https://wcd.gov.in/x", "X"),
        ),
    ]);
    let orch = orchestrator_with(client, MockEmbedding::new(), None);

    let (final_message, _) = run_turn(&orch, "query").await;
    assert_eq!(final_message.sources.len(), 1);
}

// =============================================================================
// Failure paths
// =============================================================================

#[tokio::test]
async fn stream_error_yields_partial_then_one_error_message() {
    let client = ScriptedModelClient::new().with_turn(vec![
        ScriptEvent::Chunk(StreamChunk::text("I can help.")),
        ScriptEvent::Error("connection reset".to_string()),
    ]);
    let orch = orchestrator_with(client, MockEmbedding::new(), None);

    let (final_message, updates) = run_turn(&orch, "help").await;

    assert!(final_message.is_error);
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].text, "I can help.");
    assert!(!updates[0].is_error);
    assert!(updates[1].is_error);
    assert_ne!(updates[0].id, updates[1].id);
}

#[tokio::test]
async fn missing_model_credential_surfaces_config_hint() {
    let orch = orchestrator_with(
        ScriptedModelClient::refusing_sessions(),
        MockEmbedding::new(),
        None,
    );

    let (final_message, updates) = run_turn(&orch, "hello").await;
    assert!(final_message.is_error);
    assert!(final_message.text.contains("API key"));
    assert_eq!(updates.len(), 1);
}

#[tokio::test]
async fn conversation_continues_across_turns() {
    let client = ScriptedModelClient::new()
        .with_turn(reply_turn("First answer."))
        .with_turn(reply_turn("Second answer."));
    let orch = orchestrator_with(client, MockEmbedding::new(), None);

    let (first, _) = run_turn(&orch, "first question").await;
    let (second, _) = run_turn(&orch, "second question").await;
    assert_eq!(first.text, "First answer.");
    assert_eq!(second.text, "Second answer.");
}

#[tokio::test]
async fn scheme_switch_starts_a_fresh_session() {
    let client = ScriptedModelClient::new()
        .with_turn(reply_turn("General answer."))
        .with_turn(reply_turn("Shakti answer."));
    let orch = orchestrator_with(client, MockEmbedding::new(), None);

    run_turn(&orch, "general question").await;
    orch.switch_scheme(SchemeVariant::Shakti).await.unwrap();
    let (reply, _) = run_turn(&orch, "shakti question").await;
    assert_eq!(reply.text, "Shakti answer.");
}
