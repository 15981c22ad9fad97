//! Read-models for authored story content.
//!
//! Scenes, beats and maps are authored offline, loaded once into the graph
//! store, and read-only during play. These structs are what the engine sees
//! when it asks the store about the current position.

use serde::{Deserialize, Serialize};

use crate::ids::{BeatId, MapId, SceneId};

/// A grouping of beats sharing a location, with a default action set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub id: SceneId,
    /// Set via the scene's TAKES_PLACE_IN edge; absent for untethered scenes.
    pub map: Option<MapId>,
    #[serde(default)]
    pub available_actions: Vec<String>,
}

/// Smallest unit of narrative progression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beat {
    pub id: BeatId,
    pub scene: SceneId,
    /// Action labels on this beat's outgoing CONDITION edges, in authored order.
    #[serde(default)]
    pub actions: Vec<String>,
}

/// Static map data: description, narrative context, and the ASCII grid the
/// movement logic walks over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapInfo {
    pub id: MapId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub context: String,
    /// Rows of the ASCII grid; `#` cells are walls.
    #[serde(default)]
    pub grid: Vec<String>,
}

impl MapInfo {
    /// Whether the cell is inside the grid and walkable.
    pub fn is_walkable(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        let Some(row) = self.grid.get(y as usize) else {
            return false;
        };
        match row.chars().nth(x as usize) {
            Some(c) => c != '#',
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walkability_respects_walls_and_bounds() {
        let map = MapInfo {
            id: MapId::new("map:test"),
            name: String::new(),
            description: String::new(),
            context: String::new(),
            grid: vec!["###".to_string(), "#..".to_string()],
        };
        assert!(!map.is_walkable(0, 0));
        assert!(map.is_walkable(1, 1));
        assert!(map.is_walkable(2, 1));
        assert!(!map.is_walkable(3, 1));
        assert!(!map.is_walkable(-1, 1));
        assert!(!map.is_walkable(1, 2));
    }
}
