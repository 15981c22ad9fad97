//! Storyloom domain model.
//!
//! Pure data types shared by the engine: typed identifiers, the per-player
//! session state, read-models for authored story content, and the structured
//! records produced by entity extraction. No I/O lives here.

pub mod extraction;
pub mod ids;
pub mod session;
pub mod story;

pub use extraction::{ExtractedData, ExtractedNode, ExtractedRelationship};
pub use ids::{BeatId, CharacterId, IdParseError, MapId, SceneId, SessionId, StoryNodeId};
pub use session::{
    Direction, NpcRecord, Player, Position, SessionState, StartPosition, DEFAULT_HISTORY_CAP,
};
pub use story::{Beat, MapInfo, Scene};
