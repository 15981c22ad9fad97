//! Read-side queries over the story graph.
//!
//! Traversal queries match story nodes by id without a label so that scene
//! nodes, which double as the entry beat of their scene, participate in the
//! same NEXT/CONDITION walk as beat nodes.

use std::sync::Arc;

use storyloom_domain::{MapId, MapInfo, SceneId, StoryNodeId};

use crate::infrastructure::ports::{params, GraphStore, StoreError, StoreValue};

pub(crate) const CONDITION_TARGET: &str = "MATCH (b {id: $beat_id})-[c:CONDITION]->(next) \
     WHERE c.action = $action RETURN next.id AS next_id";

pub(crate) const NEXT_TARGET: &str =
    "MATCH (b {id: $beat_id})-[:NEXT]->(next) RETURN next.id AS next_id";

pub(crate) const SCENE_MAP: &str =
    "MATCH (s:Scene {id: $scene_id})-[:TAKES_PLACE_IN]->(m:Map) RETURN m.id AS map_id";

pub(crate) const BEAT_ACTIONS: &str =
    "MATCH (b {id: $beat_id})-[c:CONDITION]->() RETURN c.action AS action";

pub(crate) const SCENE_ACTIONS: &str =
    "MATCH (s:Scene {id: $scene_id}) RETURN s.available_actions AS actions";

pub(crate) const MAP_INFO: &str = "MATCH (m:Map {id: $map_id}) RETURN m.name AS name, \
     m.description AS description, m.context AS context, m.grid AS grid";

/// Story graph read access shared by the transition engine and turn runner.
#[derive(Clone)]
pub struct StoryGraph {
    store: Arc<dyn GraphStore>,
}

impl StoryGraph {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Target of the CONDITION edge labeled with exactly `action`, if any.
    pub async fn condition_target(
        &self,
        beat: &StoryNodeId,
        action: &str,
    ) -> Result<Option<StoryNodeId>, StoreError> {
        let rows = self
            .store
            .query(
                CONDITION_TARGET,
                params([
                    ("beat_id", beat.as_str().into()),
                    ("action", action.into()),
                ]),
                &["next_id"],
            )
            .await?;
        Self::first_node_id(&rows, "next_id")
    }

    /// Target of the unconditional NEXT edge, if any.
    pub async fn next_target(&self, beat: &StoryNodeId) -> Result<Option<StoryNodeId>, StoreError> {
        let rows = self
            .store
            .query(
                NEXT_TARGET,
                params([("beat_id", beat.as_str().into())]),
                &["next_id"],
            )
            .await?;
        Self::first_node_id(&rows, "next_id")
    }

    /// Map the scene takes place in. `None` when the edge is missing.
    pub async fn scene_map(&self, scene: &SceneId) -> Result<Option<MapId>, StoreError> {
        let rows = self
            .store
            .query(
                SCENE_MAP,
                params([("scene_id", scene.as_str().into())]),
                &["map_id"],
            )
            .await?;
        Ok(rows
            .first()
            .and_then(|row| row.get("map_id"))
            .and_then(StoreValue::as_str)
            .map(MapId::from))
    }

    /// Actions the player can take right now: the labels of the current
    /// node's CONDITION edges followed by the scene's default action list,
    /// first occurrence winning on duplicates.
    pub async fn available_actions(
        &self,
        beat: &StoryNodeId,
        scene: &SceneId,
    ) -> Result<Vec<String>, StoreError> {
        let mut actions = Vec::new();

        let rows = self
            .store
            .query(
                BEAT_ACTIONS,
                params([("beat_id", beat.as_str().into())]),
                &["action"],
            )
            .await?;
        for row in &rows {
            if let Some(action) = row.get("action").and_then(StoreValue::as_str) {
                if !actions.iter().any(|a| a == action) {
                    actions.push(action.to_string());
                }
            }
        }

        let rows = self
            .store
            .query(
                SCENE_ACTIONS,
                params([("scene_id", scene.as_str().into())]),
                &["actions"],
            )
            .await?;
        if let Some(defaults) = rows
            .first()
            .and_then(|row| row.get("actions"))
            .and_then(StoreValue::as_string_list)
        {
            for action in defaults {
                if !actions.iter().any(|a| a == action) {
                    actions.push(action.clone());
                }
            }
        }

        Ok(actions)
    }

    /// Full map record, `None` when the map node does not exist.
    pub async fn map_info(&self, map: &MapId) -> Result<Option<MapInfo>, StoreError> {
        let rows = self
            .store
            .query(
                MAP_INFO,
                params([("map_id", map.as_str().into())]),
                &["name", "description", "context", "grid"],
            )
            .await?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };

        let field = |name: &str| -> String {
            row.get(name)
                .and_then(StoreValue::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let grid = row
            .get("grid")
            .and_then(StoreValue::as_string_list)
            .map(<[String]>::to_vec)
            .unwrap_or_default();

        Ok(Some(MapInfo {
            id: map.clone(),
            name: field("name"),
            description: field("description"),
            context: field("context"),
            grid,
        }))
    }

    fn first_node_id(
        rows: &[crate::infrastructure::ports::Record],
        column: &str,
    ) -> Result<Option<StoryNodeId>, StoreError> {
        let Some(raw) = rows
            .first()
            .and_then(|row| row.get(column))
            .and_then(StoreValue::as_str)
        else {
            return Ok(None);
        };
        StoryNodeId::parse(raw)
            .map(Some)
            .map_err(|e| StoreError::serialization(format!("story node id '{raw}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::InMemoryGraphStore;
    use storyloom_domain::BeatId;

    fn beat(id: &str) -> StoryNodeId {
        StoryNodeId::Beat(BeatId::from(id))
    }

    #[tokio::test]
    async fn condition_target_requires_exact_label() {
        let store = InMemoryGraphStore::new()
            .with_condition("scene_beat:station_3", "help", "scene_beat:station_4");
        let graph = StoryGraph::new(Arc::new(store));

        let hit = graph
            .condition_target(&beat("scene_beat:station_3"), "help")
            .await
            .unwrap();
        assert_eq!(hit, Some(beat("scene_beat:station_4")));

        let miss = graph
            .condition_target(&beat("scene_beat:station_3"), "Help")
            .await
            .unwrap();
        assert_eq!(miss, None);
    }

    #[tokio::test]
    async fn available_actions_merge_beat_then_scene_defaults() {
        let store = InMemoryGraphStore::new()
            .with_condition("scene_beat:station_3", "help", "scene_beat:station_4")
            .with_condition("scene_beat:station_3", "pass", "scene:platform")
            .with_scene_actions("scene:station", &["look around", "help"]);
        let graph = StoryGraph::new(Arc::new(store));

        let actions = graph
            .available_actions(&beat("scene_beat:station_3"), &SceneId::from("scene:station"))
            .await
            .unwrap();

        assert_eq!(actions, vec!["help", "pass", "look around"]);
    }

    #[tokio::test]
    async fn missing_map_edge_yields_none() {
        let store = InMemoryGraphStore::new();
        let graph = StoryGraph::new(Arc::new(store));

        let map = graph.scene_map(&SceneId::from("scene:void")).await.unwrap();
        assert_eq!(map, None);
    }
}
