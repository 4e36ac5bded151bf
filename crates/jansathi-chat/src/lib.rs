//! Conversational pipeline for JanSathi.
//!
//! Drives one persona-bound chat session against a hosted streaming model:
//! retrieval-augmented prompts go in, incremental display updates come out,
//! with citations filtered to official domains and suggested quick replies
//! extracted from an inline `<actions>` tag.

pub mod augment;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod parser;
pub mod persona;
pub mod session;
pub mod sources;
pub mod stream;
pub mod types;

pub use augment::augment_prompt;
pub use error::ChatError;
pub use model::{HostedModelClient, ModelClient, ScriptedModelClient};
pub use orchestrator::ChatOrchestrator;
pub use parser::{ActionTagParser, TagScan};
pub use persona::SchemeVariant;
pub use session::{ModelSession, SessionManager, SessionSettings};
pub use sources::{SourceCollector, SourceFilter};
pub use stream::StreamConsumer;
pub use types::{ChunkStream, Citation, SessionParams, StreamChunk};
