//! Session persistence schema.
//!
//! The backing store holds flat properties only, so every nested field of
//! [`SessionState`] is JSON-encoded into a string and every scalar is stored
//! as-is. The schema is the single place that knows which field is which;
//! loading never guesses by trying to parse strings as JSON.

use std::sync::Arc;

use storyloom_domain::{
    ExtractedData, MapId, NpcRecord, Player, SceneId, SessionId, SessionState, StoryNodeId,
};

use crate::infrastructure::ports::{GraphStore, Record, StoreError, StoreValue};

/// Persisted fields, also the load projection. `available_actions` is
/// deliberately absent: it is derived from the graph every turn.
pub const FIELDS: &[&str] = &[
    "session_id",
    "player",
    "current_map",
    "current_scene",
    "current_beat",
    "history",
    "display_history",
    "last_user_input",
    "characters",
    "extracted_data",
];

pub struct SessionPersistence {
    store: Arc<dyn GraphStore>,
}

impl SessionPersistence {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Upsert the whole session record in one write.
    pub async fn save(&self, state: &SessionState) -> Result<(), StoreError> {
        let record = encode(state)?;
        self.store
            .save(&state.session_id.to_string(), record)
            .await
    }

    /// Load a session by id. `Ok(None)` when it was never saved.
    pub async fn load(&self, session_id: &SessionId) -> Result<Option<SessionState>, StoreError> {
        let record = self
            .store
            .load(&session_id.to_string(), FIELDS)
            .await?;
        record.map(|record| decode(&record)).transpose()
    }
}

/// Flatten the state per the schema: nested fields to JSON strings, scalars
/// as plain strings.
pub fn encode(state: &SessionState) -> Result<Record, StoreError> {
    fn json<T: serde::Serialize>(value: &T) -> Result<StoreValue, StoreError> {
        serde_json::to_string(value)
            .map(StoreValue::String)
            .map_err(StoreError::serialization)
    }

    let mut record = Record::new();
    record.insert(
        "session_id".into(),
        StoreValue::String(state.session_id.to_string()),
    );
    record.insert("player".into(), json(&state.player)?);
    record.insert(
        "current_map".into(),
        StoreValue::String(state.current_map.to_string()),
    );
    record.insert(
        "current_scene".into(),
        StoreValue::String(state.current_scene.to_string()),
    );
    record.insert(
        "current_beat".into(),
        StoreValue::String(state.current_beat.as_str().to_string()),
    );
    record.insert("history".into(), json(&state.history)?);
    record.insert("display_history".into(), json(&state.display_history)?);
    record.insert(
        "last_user_input".into(),
        StoreValue::String(state.last_user_input.clone()),
    );
    record.insert("characters".into(), json(&state.characters)?);
    record.insert("extracted_data".into(), json(&state.extracted_data)?);
    Ok(record)
}

/// Rebuild the state from a flat record. Strict: a missing or malformed
/// field is an error, not a default.
pub fn decode(record: &Record) -> Result<SessionState, StoreError> {
    let string_field = |name: &str| -> Result<&str, StoreError> {
        record
            .get(name)
            .and_then(StoreValue::as_str)
            .ok_or_else(|| StoreError::serialization(format!("missing session field '{name}'")))
    };
    fn json_field<T: serde::de::DeserializeOwned>(
        record: &Record,
        name: &str,
    ) -> Result<T, StoreError> {
        let raw = record
            .get(name)
            .and_then(StoreValue::as_str)
            .ok_or_else(|| StoreError::serialization(format!("missing session field '{name}'")))?;
        serde_json::from_str(raw)
            .map_err(|e| StoreError::serialization(format!("session field '{name}': {e}")))
    }

    let session_id = SessionId::parse(string_field("session_id")?)
        .map_err(|e| StoreError::serialization(format!("session field 'session_id': {e}")))?;
    let current_beat = StoryNodeId::parse(string_field("current_beat")?)
        .map_err(|e| StoreError::serialization(format!("session field 'current_beat': {e}")))?;
    let player: Player = json_field(record, "player")?;
    let history: Vec<String> = json_field(record, "history")?;
    let display_history: Vec<String> = json_field(record, "display_history")?;
    let characters: Vec<NpcRecord> = json_field(record, "characters")?;
    let extracted_data: ExtractedData = json_field(record, "extracted_data")?;

    Ok(SessionState {
        session_id,
        player,
        current_map: MapId::from(string_field("current_map")?),
        current_scene: SceneId::from(string_field("current_scene")?),
        current_beat,
        history,
        display_history,
        last_user_input: string_field("last_user_input")?.to_string(),
        available_actions: Vec::new(),
        extracted_data,
        characters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::InMemoryGraphStore;
    use storyloom_domain::{BeatId, CharacterId, StartPosition};

    fn sample_state() -> SessionState {
        let start = StartPosition {
            scene: SceneId::from("scene:00_Pangyo_Station"),
            beat: StoryNodeId::Beat(BeatId::from("scene_beat:00_Pangyo_Station_3")),
            map: MapId::from("map:Pangyo_B2_Concourse"),
        };
        let mut state = SessionState::bootstrap(SessionId::new(), &start);
        state.record_input("help the old man", 10);
        state.record_narrative("The old man looks up.", 10);
        state.available_actions = vec!["help".into(), "pass".into()];
        state.characters.push(NpcRecord {
            id: CharacterId::new("character:OldMan"),
            name: "Old Man".into(),
            kind: "npc".into(),
        });
        state
    }

    #[test]
    fn nested_fields_encode_as_json_strings() {
        let state = sample_state();
        let record = encode(&state).unwrap();

        let player_raw = record.get("player").unwrap().as_str().unwrap();
        assert!(serde_json::from_str::<serde_json::Value>(player_raw).is_ok());

        let history_raw = record.get("history").unwrap().as_str().unwrap();
        let history: Vec<String> = serde_json::from_str(history_raw).unwrap();
        assert_eq!(history, state.history);
    }

    #[test]
    fn scalar_fields_encode_as_plain_strings() {
        let state = sample_state();
        let record = encode(&state).unwrap();

        assert_eq!(
            record.get("current_beat").unwrap().as_str(),
            Some("scene_beat:00_Pangyo_Station_3")
        );
        assert_eq!(
            record.get("last_user_input").unwrap().as_str(),
            Some("help the old man")
        );
    }

    #[test]
    fn available_actions_are_never_persisted() {
        let record = encode(&sample_state()).unwrap();
        assert!(!record.contains_key("available_actions"));
        assert_eq!(record.len(), FIELDS.len());
    }

    #[test]
    fn round_trip_preserves_state_except_actions() {
        let state = sample_state();
        let decoded = decode(&encode(&state).unwrap()).unwrap();

        let mut expected = state.clone();
        expected.available_actions = Vec::new();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn decode_rejects_missing_fields() {
        let mut record = encode(&sample_state()).unwrap();
        record.remove("player");
        assert!(decode(&record).is_err());
    }

    #[test]
    fn decode_rejects_unprefixed_beat_id() {
        let mut record = encode(&sample_state()).unwrap();
        record.insert(
            "current_beat".into(),
            StoreValue::String("just_some_id".into()),
        );
        assert!(decode(&record).is_err());
    }

    #[tokio::test]
    async fn save_then_load_via_store() {
        let store = Arc::new(InMemoryGraphStore::new());
        let persistence = SessionPersistence::new(store.clone());
        let state = sample_state();

        persistence.save(&state).await.unwrap();
        let loaded = persistence.load(&state.session_id).await.unwrap().unwrap();

        assert_eq!(loaded.current_beat, state.current_beat);
        assert_eq!(loaded.history, state.history);
        assert!(loaded.available_actions.is_empty());
    }

    #[tokio::test]
    async fn load_of_unknown_session_is_none() {
        let persistence = SessionPersistence::new(Arc::new(InMemoryGraphStore::new()));
        let loaded = persistence.load(&SessionId::new()).await.unwrap();
        assert!(loaded.is_none());
    }
}
