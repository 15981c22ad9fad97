//! Use cases - turn orchestration over the story graph.
//!
//! Each module covers one concern of the scene progression loop. Use cases
//! hold their dependencies behind the port traits so they stay testable
//! against in-memory fakes.

pub mod content;
pub mod extraction;
pub mod movement;
pub mod narration;
pub mod persistence;
pub mod resolver;
pub mod session;
pub mod story;
pub mod transition;
pub mod turn;

pub use content::ContentImporter;
pub use extraction::{EntityExtractor, GraphEnricher};
pub use movement::{move_player, MoveOutcome};
pub use narration::{MapAnalyst, Narrator};
pub use persistence::SessionPersistence;
pub use resolver::{ActionResolver, Resolution};
pub use session::SessionUseCases;
pub use story::StoryGraph;
pub use transition::{BeatTransitionEngine, TerminalReason, TransitionState};
pub use turn::{TurnError, TurnOutcome, TurnRunner};
