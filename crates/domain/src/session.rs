//! Per-player session state.
//!
//! One [`SessionState`] value is the whole of a player's progress. It is an
//! explicit value passed through the engine and persisted at the turn
//! boundary; it never holds live handles, so the persisted representation is
//! the type itself.

use serde::{Deserialize, Serialize};

use crate::extraction::ExtractedData;
use crate::ids::{CharacterId, MapId, SceneId, SessionId, StoryNodeId};

/// Default number of history entries kept for generation context.
pub const DEFAULT_HISTORY_CAP: usize = 10;

/// Where a new session starts: the authored entry point of the content pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartPosition {
    pub scene: SceneId,
    pub beat: StoryNodeId,
    pub map: MapId,
}

/// Grid coordinates of the player on the current map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub map: MapId,
    pub x: i64,
    pub y: i64,
}

/// Facing/movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// Parse a direction from player phrasing. Accepts cardinal names and
    /// the movement verbs used by the narrative prompts.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "north" | "up" => Some(Self::North),
            "south" | "down" => Some(Self::South),
            "east" | "right" => Some(Self::East),
            "west" | "left" => Some(Self::West),
            _ => None,
        }
    }

    /// Unit step on the map grid. North decreases `y`.
    pub fn delta(self) -> (i64, i64) {
        match self {
            Self::North => (0, -1),
            Self::South => (0, 1),
            Self::East => (1, 0),
            Self::West => (-1, 0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
        }
    }
}

/// The player character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: CharacterId,
    pub name: String,
    pub sex: String,
    pub position: Position,
    pub direction: Direction,
    pub field_of_view: u32,
    pub inventory: Vec<String>,
    pub stamina: i64,
    pub status: String,
}

impl Player {
    pub fn bootstrap(start_map: MapId) -> Self {
        Self {
            id: CharacterId::new("character:Player"),
            name: "Player".to_string(),
            sex: "unknown".to_string(),
            position: Position {
                map: start_map,
                x: 1,
                y: 1,
            },
            direction: Direction::North,
            field_of_view: 3,
            inventory: Vec::new(),
            stamina: 100,
            status: "normal".to_string(),
        }
    }
}

/// An NPC present in the current narrative context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcRecord {
    pub id: CharacterId,
    pub name: String,
    #[serde(default)]
    pub kind: String,
}

/// The serializable record of one player's progress.
///
/// `current_beat` is the authoritative position in the narrative;
/// `current_scene` and `current_map` are derived from it and kept consistent
/// by the transition engine. `available_actions` is recomputed from the store
/// every turn and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: SessionId,
    pub player: Player,
    pub current_map: MapId,
    pub current_scene: SceneId,
    pub current_beat: StoryNodeId,
    /// Generation context, bounded; oldest entries evicted beyond the cap.
    pub history: Vec<String>,
    /// Everything ever shown to the player, append-only.
    pub display_history: Vec<String>,
    pub last_user_input: String,
    #[serde(default)]
    pub available_actions: Vec<String>,
    pub extracted_data: ExtractedData,
    pub characters: Vec<NpcRecord>,
}

impl SessionState {
    /// Fresh state for a new game at the configured start position.
    pub fn bootstrap(session_id: SessionId, start: &StartPosition) -> Self {
        Self {
            session_id,
            player: Player::bootstrap(start.map.clone()),
            current_map: start.map.clone(),
            current_scene: start.scene.clone(),
            current_beat: start.beat.clone(),
            history: Vec::new(),
            display_history: Vec::new(),
            last_user_input: String::new(),
            available_actions: Vec::new(),
            extracted_data: ExtractedData::default(),
            characters: Vec::new(),
        }
    }

    /// Append to the generation history, evicting the oldest entries beyond
    /// `cap`, and mirror into the append-only display history.
    pub fn record_narrative(&mut self, text: impl Into<String>, cap: usize) {
        let text = text.into();
        self.display_history.push(text.clone());
        self.history.push(text);
        while self.history.len() > cap {
            self.history.remove(0);
        }
    }

    /// Record the raw player input into history and the last-input slot.
    pub fn record_input(&mut self, input: impl Into<String>, cap: usize) {
        let input = input.into();
        self.last_user_input = input.clone();
        self.display_history.push(input.clone());
        self.history.push(input);
        while self.history.len() > cap {
            self.history.remove(0);
        }
    }
}
