//! Session lifecycle.

use std::sync::Arc;

use storyloom_domain::{NpcRecord, SessionId, SessionState, StartPosition};

use crate::infrastructure::ports::{params, GraphStore, StoreError};

use super::persistence::SessionPersistence;
use super::story::StoryGraph;

const UPSERT_PLAYER: &str = "MERGE (p:Player {id: $id}) \
     SET p.name = $name, p.sex = $sex, p.stamina = $stamina, p.status = $status";

const UPSERT_CHARACTER: &str =
    "MERGE (c:Character {id: $id}) SET c.name = $name, c.type = $type";

const LINK_PLAYER_CHARACTER: &str = "MATCH (p:Player {id: $player_id}), (c:Character {id: $char_id}) \
     MERGE (p)-[r:FRIEND]->(c) SET r.status = $status";

/// Creates and loads sessions.
pub struct SessionUseCases {
    store: Arc<dyn GraphStore>,
    persistence: Arc<SessionPersistence>,
    graph: StoryGraph,
    start: StartPosition,
    npcs: Vec<NpcRecord>,
}

impl SessionUseCases {
    pub fn new(
        store: Arc<dyn GraphStore>,
        persistence: Arc<SessionPersistence>,
        graph: StoryGraph,
        start: StartPosition,
        npcs: Vec<NpcRecord>,
    ) -> Self {
        Self {
            store,
            persistence,
            graph,
            start,
            npcs,
        }
    }

    /// Start a new session at the configured start position.
    ///
    /// Seeds the player node and the initial cast into the graph, persists
    /// the bootstrap state, and returns it with the opening action list.
    pub async fn create(&self) -> Result<SessionState, StoreError> {
        let mut state = SessionState::bootstrap(SessionId::new(), &self.start);
        state.characters = self.npcs.clone();

        self.store
            .run(
                UPSERT_PLAYER,
                params([
                    ("id", state.player.id.as_str().into()),
                    ("name", state.player.name.as_str().into()),
                    ("sex", state.player.sex.as_str().into()),
                    ("stamina", state.player.stamina.into()),
                    ("status", state.player.status.as_str().into()),
                ]),
            )
            .await?;

        for npc in &self.npcs {
            self.store
                .run(
                    UPSERT_CHARACTER,
                    params([
                        ("id", npc.id.as_str().into()),
                        ("name", npc.name.as_str().into()),
                        ("type", npc.kind.as_str().into()),
                    ]),
                )
                .await?;
            // Relationships start neutral; play rewrites them over time.
            self.store
                .run(
                    LINK_PLAYER_CHARACTER,
                    params([
                        ("player_id", state.player.id.as_str().into()),
                        ("char_id", npc.id.as_str().into()),
                        ("status", "initial".into()),
                    ]),
                )
                .await?;
        }

        state.available_actions = self
            .graph
            .available_actions(&state.current_beat, &state.current_scene)
            .await?;

        self.persistence.save(&state).await?;
        tracing::info!(session = %state.session_id, "session created");
        Ok(state)
    }

    /// Load a session and recompute its action list.
    pub async fn get(&self, session_id: &SessionId) -> Result<Option<SessionState>, StoreError> {
        let Some(mut state) = self.persistence.load(session_id).await? else {
            return Ok(None);
        };
        state.available_actions = self
            .graph
            .available_actions(&state.current_beat, &state.current_scene)
            .await?;
        Ok(Some(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::InMemoryGraphStore;
    use storyloom_domain::{BeatId, CharacterId, MapId, SceneId, StoryNodeId};

    fn start() -> StartPosition {
        StartPosition {
            scene: SceneId::from("scene:station"),
            beat: StoryNodeId::Beat(BeatId::from("scene_beat:station_1")),
            map: MapId::from("map:station"),
        }
    }

    fn npcs() -> Vec<NpcRecord> {
        vec![NpcRecord {
            id: CharacterId::new("character:OldMan"),
            name: "Old Man".into(),
            kind: "npc".into(),
        }]
    }

    fn use_cases(store: Arc<InMemoryGraphStore>) -> SessionUseCases {
        SessionUseCases::new(
            store.clone(),
            Arc::new(SessionPersistence::new(store.clone())),
            StoryGraph::new(store),
            start(),
            npcs(),
        )
    }

    #[tokio::test]
    async fn create_seeds_player_and_cast() {
        let store = Arc::new(
            InMemoryGraphStore::new()
                .with_condition("scene_beat:station_1", "wake up", "scene_beat:station_2"),
        );
        let sessions = use_cases(store.clone());

        let state = sessions.create().await.unwrap();

        assert_eq!(state.current_beat.as_str(), "scene_beat:station_1");
        assert_eq!(state.available_actions, vec!["wake up"]);
        assert_eq!(state.characters.len(), 1);

        let writes = store.writes();
        assert!(writes.iter().any(|(q, _)| q.contains("MERGE (p:Player")));
        assert!(writes.iter().any(|(q, _)| q.contains("MERGE (c:Character")));
        assert!(writes.iter().any(|(q, _)| q.contains("[r:FRIEND]")));
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn get_recomputes_actions() {
        let store = Arc::new(
            InMemoryGraphStore::new()
                .with_condition("scene_beat:station_1", "wake up", "scene_beat:station_2"),
        );
        let sessions = use_cases(store.clone());
        let created = sessions.create().await.unwrap();

        let loaded = sessions.get(&created.session_id).await.unwrap().unwrap();

        assert_eq!(loaded.session_id, created.session_id);
        assert_eq!(loaded.available_actions, vec!["wake up"]);
    }

    #[tokio::test]
    async fn get_unknown_session_is_none() {
        let sessions = use_cases(Arc::new(InMemoryGraphStore::new()));
        assert!(sessions.get(&SessionId::new()).await.unwrap().is_none());
    }
}
