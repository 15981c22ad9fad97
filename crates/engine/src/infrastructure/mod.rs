//! Infrastructure - external dependency implementations.

pub mod cache;
pub mod neo4j;
pub mod ollama;
pub mod ports;
pub mod resilient_llm;
