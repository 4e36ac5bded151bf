//! JanSathi application binary - composition root.
//!
//! Ties the crates together into a line-oriented chat loop:
//! 1. Load configuration from TOML and credentials from the environment
//! 2. Build the retrieval stack (hosted embedding + vector index)
//! 3. Build the model client and session manager
//! 4. Read user lines from stdin and render streamed display updates
//!
//! The terminal stands in for the real presentation layer: stdin is the
//! plain-text input event source and stdout consumes the DisplayMessage
//! stream.

use std::io::{BufRead, Write};
use std::str::FromStr;

use clap::Parser;

use jansathi_chat::{
    ChatError, ChatOrchestrator, HostedModelClient, SchemeVariant, SourceFilter, StreamConsumer,
};
use jansathi_chat::session::{SessionManager, SessionSettings};
use jansathi_core::config::{self, JanSathiConfig};
use jansathi_core::DisplayMessage;
use jansathi_retrieval::{ContextAssembler, HostedEmbeddingClient, HostedIndexClient};

mod cli;

type AppOrchestrator =
    ChatOrchestrator<HostedModelClient, HostedEmbeddingClient, HostedIndexClient>;

/// Print one streamed snapshot, extending the previous render in place
/// when the new text is a pure append.
fn render_update(previous: &mut String, message: &DisplayMessage) {
    if message.is_error {
        println!("\n\n[asha] {}", message.text);
        return;
    }
    if let Some(delta) = message.text.strip_prefix(previous.as_str()) {
        print!("{}", delta);
    } else {
        // The closed actions tag was stripped; reprint the reshaped text.
        print!("\n{}", message.text);
    }
    *previous = message.text.clone();
    let _ = std::io::stdout().flush();
}

/// Print citations and suggested replies once a turn settles.
fn render_footer(message: &DisplayMessage) {
    if !message.sources.is_empty() {
        println!("\n\nSources:");
        for source in &message.sources {
            println!("  - {} <{}>", source.title, source.uri);
        }
    }
    if let Some(actions) = &message.actions {
        if !actions.is_empty() {
            println!("\nSuggested replies:");
            for (i, action) in actions.iter().enumerate() {
                println!("  [{}] {}", i + 1, action);
            }
        }
    }
}

fn print_message(message: &DisplayMessage) {
    println!("\n[asha] {}", message.text);
    render_footer(message);
}

async fn run_turn(orchestrator: &AppOrchestrator, text: &str) {
    print!("\n[asha] ");
    let _ = std::io::stdout().flush();

    let mut rendered = String::new();
    let result = orchestrator
        .send_message(text, |update| render_update(&mut rendered, update))
        .await;

    match result {
        Ok(final_message) => {
            if !final_message.is_error {
                render_footer(&final_message);
            }
            println!();
        }
        Err(e @ (ChatError::EmptyMessage | ChatError::MessageTooLong(_))) => {
            println!("{}", e);
        }
        Err(e) => {
            tracing::error!(error = %e, "Turn failed unexpectedly");
            println!("Something went wrong. Please try again.");
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::CliArgs::parse();

    // Config (needed before tracing to resolve the default log level).
    let config_path = args.resolve_config_path();
    let cfg = JanSathiConfig::load_or_default(&config_path);

    // Tracing.
    let log_level = args
        .resolve_log_level()
        .unwrap_or_else(|| cfg.general.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    tracing::info!("Starting JanSathi v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_path.display(), "Configuration loaded");

    // Credentials from the environment.
    let api_key = config::model_api_key();
    if api_key.is_none() {
        tracing::warn!(
            "JANSATHI_API_KEY is not set — sessions will fail until it is configured"
        );
    }

    // Retrieval stack (optional: disabled without index credentials).
    let embedder = HostedEmbeddingClient::new(
        &cfg.model.endpoint,
        &cfg.retrieval.embedding_model,
        api_key.clone(),
        cfg.retrieval.embedding_dimensions,
    )?;
    let index = HostedIndexClient::from_credentials(
        config::index_host(&cfg.retrieval),
        config::index_api_key(),
    )?;
    if index.is_none() {
        tracing::info!("Vector index credentials missing — retrieval disabled");
    }
    let assembler = ContextAssembler::new(
        embedder,
        index,
        cfg.retrieval.top_k,
        cfg.retrieval.include_metadata,
    );

    // Session stack.
    let scheme = match args.scheme.as_deref() {
        Some(name) => SchemeVariant::from_str(name).map_err(std::io::Error::other)?,
        None => SchemeVariant::General,
    };
    let model = HostedModelClient::new(&cfg.model.endpoint, api_key)?;
    let sessions = SessionManager::new(
        model,
        SessionSettings {
            model: cfg.model.model.clone(),
            temperature: cfg.model.temperature,
            search_tool_enabled: cfg.model.search_tool_enabled,
        },
        scheme,
    );

    let orchestrator = ChatOrchestrator::new(
        sessions,
        assembler,
        StreamConsumer::new(SourceFilter::new(&cfg.chat.allowed_source_domains)),
        cfg.chat.max_message_length,
    );

    // Greeting, then the chat loop.
    print_message(&AppOrchestrator::welcome_message());
    println!("\nType a question, '/scheme <name>' to switch focus, or '/quit' to exit.");

    let stdin = std::io::stdin();
    loop {
        print!("\n[you] ");
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line == "/quit" || line == "/exit" {
            break;
        }
        if let Some(name) = line.strip_prefix("/scheme ") {
            match SchemeVariant::from_str(name) {
                Ok(variant) => match orchestrator.switch_scheme(variant).await {
                    Ok(()) => println!("Now focusing on {}.", variant),
                    Err(e) => println!("Could not switch scheme: {}", e),
                },
                Err(e) => println!("{}", e),
            }
            continue;
        }

        run_turn(&orchestrator, line).await;
    }

    tracing::info!("Goodbye");
    Ok(())
}
