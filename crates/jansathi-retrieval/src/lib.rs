//! Knowledge-base retrieval for JanSathi.
//!
//! Turns a user query into an optional block of retrieved scheme context:
//! embed the query with a hosted embedding model, look up nearest
//! neighbors in a hosted vector index, and concatenate the stored passage
//! texts. Retrieval is advisory: every failure degrades to "no context"
//! and the conversation proceeds with the unaugmented query.

pub mod assembler;
pub mod embedding;
pub mod error;
pub mod index;

pub use assembler::{ContextAssembler, CONTEXT_SEPARATOR};
pub use embedding::{EmbeddingService, HostedEmbeddingClient, MockEmbedding};
pub use error::RetrievalError;
pub use index::{HostedIndexClient, MockIndex, RetrievalMatch, VectorIndexService};
