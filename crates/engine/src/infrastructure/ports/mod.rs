//! Port traits for infrastructure boundaries.
//!
//! These are the only abstractions in the engine. Everything else is concrete
//! types. Ports exist for:
//! - Graph store access (could swap Neo4j -> another property graph)
//! - LLM calls (could swap Ollama -> another provider)
//! - Embeddings (same)

mod error;
mod external;
mod store;

pub use error::{EmbedError, ExtractError, LlmError, StoreError};
pub use external::{ChatMessage, EmbeddingPort, LlmPort, LlmRequest, LlmResponse, MessageRole};
pub use store::{params, GraphStore, Params, Record, StoreValue};

#[cfg(test)]
pub use external::{MockEmbeddingPort, MockLlmPort};
