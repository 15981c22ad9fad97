//! Handwritten fakes shared across unit tests.

mod graph;

pub use graph::InMemoryGraphStore;
