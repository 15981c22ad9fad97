//! Storyloom engine library.
//!
//! Server-side code for the Storyloom interactive narrative engine.
//!
//! ## Structure
//!
//! - `use_cases/` - The state machine core: action resolution, beat
//!   transitions, session persistence, enrichment, narration, turns
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - HTTP entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod prompt_templates;
pub mod use_cases;

/// Test fixtures: in-memory graph store fake shared by unit tests.
#[cfg(test)]
pub mod test_fixtures;

pub use app::{App, EngineConfig};
