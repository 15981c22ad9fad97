//! In-memory graph store fake.
//!
//! Holds a small authored story graph plus a session record table and
//! answers the engine's fixed read queries against it. Failure toggles let
//! tests exercise the store-error paths without a running database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::infrastructure::ports::{GraphStore, Params, Record, StoreError, StoreValue};
use crate::use_cases::story;

struct MapFixture {
    id: String,
    name: String,
    grid: Vec<String>,
}

#[derive(Default)]
pub struct InMemoryGraphStore {
    conditions: Vec<(String, String, String)>,
    nexts: Vec<(String, String)>,
    scene_maps: Vec<(String, String)>,
    scene_actions: Vec<(String, Vec<String>)>,
    maps: Vec<MapFixture>,
    sessions: Mutex<HashMap<String, Record>>,
    writes: Mutex<Vec<(String, Params)>>,
    saves: AtomicUsize,
    fail_queries: AtomicBool,
    fail_saves: AtomicBool,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_condition(mut self, from: &str, action: &str, to: &str) -> Self {
        self.conditions
            .push((from.to_string(), action.to_string(), to.to_string()));
        self
    }

    pub fn with_next(mut self, from: &str, to: &str) -> Self {
        self.nexts.push((from.to_string(), to.to_string()));
        self
    }

    pub fn with_scene_map(mut self, scene: &str, map: &str) -> Self {
        self.scene_maps.push((scene.to_string(), map.to_string()));
        self
    }

    pub fn with_scene_actions(mut self, scene: &str, actions: &[&str]) -> Self {
        self.scene_actions.push((
            scene.to_string(),
            actions.iter().map(|a| a.to_string()).collect(),
        ));
        self
    }

    pub fn with_map(mut self, id: &str, name: &str, grid: &[&str]) -> Self {
        self.maps.push(MapFixture {
            id: id.to_string(),
            name: name.to_string(),
            grid: grid.iter().map(|row| row.to_string()).collect(),
        });
        self
    }

    /// Make every read query fail from now on.
    pub fn fail_queries(&self) {
        self.fail_queries.store(true, Ordering::SeqCst);
    }

    /// Make every session save fail from now on.
    pub fn fail_saves(&self) {
        self.fail_saves.store(true, Ordering::SeqCst);
    }

    /// Every write statement issued through `run`, in order.
    pub fn writes(&self) -> Vec<(String, Params)> {
        self.writes.lock().unwrap().clone()
    }

    /// Number of successful session saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn session_record(&self, key: &str) -> Option<Record> {
        self.sessions.lock().unwrap().get(key).cloned()
    }

    fn param<'a>(params: &'a Params, name: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_str())
    }

    fn id_row(column: &str, id: &str) -> Record {
        let mut row = Record::new();
        row.insert(column.to_string(), StoreValue::String(id.to_string()));
        row
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn query(
        &self,
        text: &str,
        params: Params,
        _columns: &[&str],
    ) -> Result<Vec<Record>, StoreError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StoreError::database("query", "injected failure"));
        }

        match text {
            story::CONDITION_TARGET => {
                let beat = Self::param(&params, "beat_id").unwrap_or_default();
                let action = Self::param(&params, "action").unwrap_or_default();
                Ok(self
                    .conditions
                    .iter()
                    .filter(|(from, label, _)| from == beat && label == action)
                    .map(|(_, _, to)| Self::id_row("next_id", to))
                    .collect())
            }
            story::NEXT_TARGET => {
                let beat = Self::param(&params, "beat_id").unwrap_or_default();
                Ok(self
                    .nexts
                    .iter()
                    .filter(|(from, _)| from == beat)
                    .map(|(_, to)| Self::id_row("next_id", to))
                    .collect())
            }
            story::SCENE_MAP => {
                let scene = Self::param(&params, "scene_id").unwrap_or_default();
                Ok(self
                    .scene_maps
                    .iter()
                    .filter(|(s, _)| s == scene)
                    .map(|(_, map)| Self::id_row("map_id", map))
                    .collect())
            }
            story::BEAT_ACTIONS => {
                let beat = Self::param(&params, "beat_id").unwrap_or_default();
                Ok(self
                    .conditions
                    .iter()
                    .filter(|(from, _, _)| from == beat)
                    .map(|(_, action, _)| Self::id_row("action", action))
                    .collect())
            }
            story::SCENE_ACTIONS => {
                let scene = Self::param(&params, "scene_id").unwrap_or_default();
                Ok(self
                    .scene_actions
                    .iter()
                    .filter(|(s, _)| s == scene)
                    .map(|(_, actions)| {
                        let mut row = Record::new();
                        row.insert(
                            "actions".to_string(),
                            StoreValue::StringList(actions.clone()),
                        );
                        row
                    })
                    .collect())
            }
            story::MAP_INFO => {
                let map_id = Self::param(&params, "map_id").unwrap_or_default();
                Ok(self
                    .maps
                    .iter()
                    .filter(|map| map.id == map_id)
                    .map(|map| {
                        let mut row = Record::new();
                        row.insert("name".to_string(), StoreValue::String(map.name.clone()));
                        row.insert("description".to_string(), StoreValue::String(String::new()));
                        row.insert("context".to_string(), StoreValue::String(String::new()));
                        row.insert("grid".to_string(), StoreValue::StringList(map.grid.clone()));
                        row
                    })
                    .collect())
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn run(&self, text: &str, params: Params) -> Result<(), StoreError> {
        self.writes.lock().unwrap().push((text.to_string(), params));
        Ok(())
    }

    async fn save(&self, key: &str, record: Record) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::database("save", "injected failure"));
        }
        self.sessions
            .lock()
            .unwrap()
            .insert(key.to_string(), record);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load(&self, key: &str, fields: &[&str]) -> Result<Option<Record>, StoreError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StoreError::database("load", "injected failure"));
        }
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions.get(key).map(|record| {
            fields
                .iter()
                .map(|&field| {
                    (
                        field.to_string(),
                        record.get(field).cloned().unwrap_or(StoreValue::Null),
                    )
                })
                .collect()
        }))
    }

    async fn close(&self) {}
}
