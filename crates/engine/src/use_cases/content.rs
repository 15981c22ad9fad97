//! Authored content import.
//!
//! A story pack is a JSON document carrying maps, the initial cast, and
//! scenes with their beats and edges. Importing MERGEs everything, so
//! re-importing the same pack is idempotent: nodes first, then edges, so
//! edge targets always exist.

use std::sync::Arc;

use serde::Deserialize;

use storyloom_domain::{
    BeatId, IdParseError, MapId, NpcRecord, SceneId, StartPosition, StoryNodeId,
};

use crate::infrastructure::ports::{params, GraphStore, StoreError, StoreValue};

#[derive(Debug, Deserialize)]
pub struct StoryPack {
    pub start: StartDef,
    #[serde(default)]
    pub maps: Vec<MapDef>,
    #[serde(default)]
    pub characters: Vec<CharacterDef>,
    #[serde(default)]
    pub scenes: Vec<SceneDef>,
}

#[derive(Debug, Deserialize)]
pub struct StartDef {
    pub scene: String,
    pub beat: String,
    pub map: String,
}

#[derive(Debug, Deserialize)]
pub struct MapDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub grid: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CharacterDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
pub struct SceneDef {
    pub id: String,
    #[serde(default)]
    pub map: Option<String>,
    #[serde(default)]
    pub available_actions: Vec<String>,
    #[serde(default)]
    pub beats: Vec<BeatDef>,
    /// Edges out of the scene node itself (it doubles as the entry beat).
    #[serde(default)]
    pub next: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<ConditionDef>,
}

#[derive(Debug, Deserialize)]
pub struct BeatDef {
    pub id: String,
    #[serde(default)]
    pub next: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<ConditionDef>,
}

#[derive(Debug, Deserialize)]
pub struct ConditionDef {
    pub action: String,
    pub to: String,
}

impl StoryPack {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Where new sessions begin.
    pub fn start_position(&self) -> Result<StartPosition, IdParseError> {
        Ok(StartPosition {
            scene: SceneId::from(self.start.scene.as_str()),
            beat: StoryNodeId::parse(&self.start.beat)?,
            map: MapId::from(self.start.map.as_str()),
        })
    }

    /// The initial cast as session NPC records.
    pub fn cast(&self) -> Vec<NpcRecord> {
        self.characters
            .iter()
            .map(|c| NpcRecord {
                id: storyloom_domain::CharacterId::new(c.id.as_str()),
                name: c.name.clone(),
                kind: c.kind.clone(),
            })
            .collect()
    }
}

const UPSERT_MAP: &str = "MERGE (m:Map {id: $id}) SET m.name = $name, \
     m.description = $description, m.context = $context, m.grid = $grid";

const UPSERT_SCENE: &str =
    "MERGE (s:Scene {id: $id}) SET s.available_actions = $available_actions";

const UPSERT_BEAT: &str = "MERGE (b:SceneBeat {id: $id})";

const UPSERT_CHARACTER: &str =
    "MERGE (c:Character {id: $id}) SET c.name = $name, c.type = $type";

const LINK_TAKES_PLACE_IN: &str = "MATCH (s:Scene {id: $scene_id}), (m:Map {id: $map_id}) \
     MERGE (s)-[:TAKES_PLACE_IN]->(m)";

const LINK_PART_OF: &str = "MATCH (b:SceneBeat {id: $beat_id}), (s:Scene {id: $scene_id}) \
     MERGE (b)-[:PART_OF]->(s)";

const LINK_NEXT: &str =
    "MATCH (a {id: $from_id}), (b {id: $to_id}) MERGE (a)-[:NEXT]->(b)";

const LINK_CONDITION: &str = "MATCH (a {id: $from_id}), (b {id: $to_id}) \
     MERGE (a)-[:CONDITION {action: $action}]->(b)";

/// Merges a story pack into the graph.
pub struct ContentImporter {
    store: Arc<dyn GraphStore>,
}

impl ContentImporter {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    pub async fn import(&self, pack: &StoryPack) -> Result<(), StoreError> {
        for map in &pack.maps {
            self.store
                .run(
                    UPSERT_MAP,
                    params([
                        ("id", map.id.as_str().into()),
                        ("name", map.name.as_str().into()),
                        ("description", map.description.as_str().into()),
                        ("context", map.context.as_str().into()),
                        ("grid", StoreValue::StringList(map.grid.clone())),
                    ]),
                )
                .await?;
        }

        for character in &pack.characters {
            self.store
                .run(
                    UPSERT_CHARACTER,
                    params([
                        ("id", character.id.as_str().into()),
                        ("name", character.name.as_str().into()),
                        ("type", character.kind.as_str().into()),
                    ]),
                )
                .await?;
        }

        for scene in &pack.scenes {
            self.store
                .run(
                    UPSERT_SCENE,
                    params([
                        ("id", scene.id.as_str().into()),
                        (
                            "available_actions",
                            StoreValue::StringList(scene.available_actions.clone()),
                        ),
                    ]),
                )
                .await?;
            for beat in &scene.beats {
                self.store
                    .run(UPSERT_BEAT, params([("id", beat.id.as_str().into())]))
                    .await?;
            }
        }

        // Nodes exist now; wire the edges.
        for scene in &pack.scenes {
            if let Some(map_id) = &scene.map {
                self.store
                    .run(
                        LINK_TAKES_PLACE_IN,
                        params([
                            ("scene_id", scene.id.as_str().into()),
                            ("map_id", map_id.as_str().into()),
                        ]),
                    )
                    .await?;
            }
            self.link_edges(&scene.id, &scene.next, &scene.conditions)
                .await?;
            for beat in &scene.beats {
                self.store
                    .run(
                        LINK_PART_OF,
                        params([
                            ("beat_id", beat.id.as_str().into()),
                            ("scene_id", scene.id.as_str().into()),
                        ]),
                    )
                    .await?;
                self.link_edges(&beat.id, &beat.next, &beat.conditions)
                    .await?;
            }
        }

        tracing::info!(
            maps = pack.maps.len(),
            characters = pack.characters.len(),
            scenes = pack.scenes.len(),
            "story pack imported"
        );
        Ok(())
    }

    async fn link_edges(
        &self,
        from: &str,
        next: &[String],
        conditions: &[ConditionDef],
    ) -> Result<(), StoreError> {
        for to in next {
            self.store
                .run(
                    LINK_NEXT,
                    params([("from_id", from.into()), ("to_id", to.as_str().into())]),
                )
                .await?;
        }
        for condition in conditions {
            self.store
                .run(
                    LINK_CONDITION,
                    params([
                        ("from_id", from.into()),
                        ("to_id", condition.to.as_str().into()),
                        ("action", condition.action.as_str().into()),
                    ]),
                )
                .await?;
        }
        Ok(())
    }
}
