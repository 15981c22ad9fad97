//! Application state and composition.

use std::sync::Arc;
use std::time::Duration;

use storyloom_domain::{NpcRecord, StartPosition, DEFAULT_HISTORY_CAP};

use crate::infrastructure::ports::{EmbeddingPort, GraphStore, LlmPort};
use crate::use_cases::resolver::DEFAULT_SIMILARITY_THRESHOLD;
use crate::use_cases::{
    ActionResolver, BeatTransitionEngine, EntityExtractor, GraphEnricher, MapAnalyst, Narrator,
    SessionPersistence, SessionUseCases, StoryGraph, TurnRunner,
};

/// Runtime knobs read from the environment.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    pub neo4j_database: String,
    pub server_host: String,
    pub server_port: u16,
    /// Path to a story pack JSON to import at startup.
    pub story_pack: Option<String>,
    pub turn_timeout: Duration,
    pub history_cap: usize,
    pub similarity_threshold: f32,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let env_or = |name: &str, default: &str| -> String {
            std::env::var(name).unwrap_or_else(|_| default.to_string())
        };
        Self {
            neo4j_uri: env_or("NEO4J_URI", "bolt://localhost:7687"),
            neo4j_user: env_or("NEO4J_USER", "neo4j"),
            neo4j_password: env_or("NEO4J_PASSWORD", "password"),
            neo4j_database: env_or("NEO4J_DATABASE", "neo4j"),
            server_host: env_or("SERVER_HOST", "0.0.0.0"),
            server_port: env_or("SERVER_PORT", "3000").parse().unwrap_or(3000),
            story_pack: std::env::var("STORY_PACK").ok(),
            turn_timeout: Duration::from_secs(
                env_or("TURN_TIMEOUT_SECS", "60").parse().unwrap_or(60),
            ),
            history_cap: env_or("HISTORY_CAP", "")
                .parse()
                .unwrap_or(DEFAULT_HISTORY_CAP),
            similarity_threshold: env_or("SIMILARITY_THRESHOLD", "")
                .parse()
                .unwrap_or(DEFAULT_SIMILARITY_THRESHOLD),
        }
    }
}

/// Main application state, passed to HTTP handlers via Axum state.
pub struct App {
    pub sessions: SessionUseCases,
    pub turns: TurnRunner,
    pub store: Arc<dyn GraphStore>,
}

impl App {
    pub fn new(
        store: Arc<dyn GraphStore>,
        llm: Arc<dyn LlmPort>,
        embedder: Arc<dyn EmbeddingPort>,
        start: StartPosition,
        cast: Vec<NpcRecord>,
        config: &EngineConfig,
    ) -> Self {
        let persistence = Arc::new(SessionPersistence::new(store.clone()));
        let graph = StoryGraph::new(store.clone());

        let sessions = SessionUseCases::new(
            store.clone(),
            persistence.clone(),
            graph.clone(),
            start,
            cast,
        );

        let turns = TurnRunner::new(
            persistence,
            graph.clone(),
            Arc::new(ActionResolver::with_threshold(
                embedder,
                config.similarity_threshold,
            )),
            BeatTransitionEngine::new(graph),
            Arc::new(EntityExtractor::new(llm.clone())),
            Arc::new(GraphEnricher::new(store.clone())),
            Narrator::new(llm.clone()),
            MapAnalyst::new(llm),
        )
        .with_timeout(config.turn_timeout)
        .with_history_cap(config.history_cap);

        Self {
            sessions,
            turns,
            store,
        }
    }
}
