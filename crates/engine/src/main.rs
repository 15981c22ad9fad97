//! Storyloom engine - main entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::routing::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storyloom_domain::{MapId, SceneId, StartPosition, StoryNodeId};
use storyloom_engine::api;
use storyloom_engine::infrastructure::neo4j::Neo4jGraphStore;
use storyloom_engine::infrastructure::ollama::OllamaClient;
use storyloom_engine::infrastructure::ports::{EmbeddingPort, GraphStore, LlmPort};
use storyloom_engine::infrastructure::resilient_llm::{ResilientLlmClient, RetryConfig};
use storyloom_engine::use_cases::content::{ContentImporter, StoryPack};
use storyloom_engine::{App, EngineConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storyloom_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Storyloom engine");

    let config = EngineConfig::from_env();

    let store = Neo4jGraphStore::connect(
        &config.neo4j_uri,
        &config.neo4j_user,
        &config.neo4j_password,
        &config.neo4j_database,
    )
    .await?;
    store.ensure_schema().await?;
    let store: Arc<dyn GraphStore> = Arc::new(store);

    // An authored pack both seeds the graph and fixes the start position;
    // without one the start comes from the environment.
    let (start, cast) = match &config.story_pack {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading story pack {path}"))?;
            let pack = StoryPack::from_json(&raw)
                .with_context(|| format!("parsing story pack {path}"))?;
            ContentImporter::new(store.clone()).import(&pack).await?;
            (pack.start_position()?, pack.cast())
        }
        None => (start_from_env()?, Vec::new()),
    };

    let ollama = Arc::new(OllamaClient::from_env());
    let retry_config = RetryConfig::default();
    let llm: Arc<dyn LlmPort> = Arc::new(ResilientLlmClient::new(ollama.clone(), retry_config));
    let embedder: Arc<dyn EmbeddingPort> = ollama;

    let app = Arc::new(App::new(store, llm, embedder, start, cast, &config));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router: Router = api::http::routes()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app);

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port)
        .parse()
        .context("invalid server address")?;
    tracing::info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

fn start_from_env() -> anyhow::Result<StartPosition> {
    let scene = std::env::var("START_SCENE").context("START_SCENE not set and no STORY_PACK")?;
    let beat = std::env::var("START_BEAT").context("START_BEAT not set and no STORY_PACK")?;
    let map = std::env::var("START_MAP").context("START_MAP not set and no STORY_PACK")?;
    Ok(StartPosition {
        scene: SceneId::from(scene.as_str()),
        beat: StoryNodeId::parse(&beat)?,
        map: MapId::from(map.as_str()),
    })
}
