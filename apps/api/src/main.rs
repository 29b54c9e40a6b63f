mod attribution;
mod config;
mod db;
mod errors;
mod extract;
mod flow;
mod hr;
mod llm_client;
mod models;
mod redirect;
mod repository;
mod routes;
mod state;
mod store;
mod videos;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::attribution::recorder::VisitRecorder;
use crate::config::Config;
use crate::db::create_pool;
use crate::flow::analysis::LlmAnalyzer;
use crate::flow::session::{RedisSessionStore, SessionLocks};
use crate::llm_client::LlmClient;
use crate::repository::Repository;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::PgDocumentStore;
use crate::videos::{VideoSearch, YoutubeVideoSearch};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Pathway API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL document store
    let db = create_pool(&config.database_url).await?;
    let repo = Repository::new(Arc::new(PgDocumentStore::new(db)));

    // Initialize Redis session store
    let redis = redis::Client::open(config.redis_url.clone())?;
    let sessions = Arc::new(RedisSessionStore::new(redis));
    info!("Redis session store initialized");

    // Initialize video search
    let videos: Arc<dyn VideoSearch> = Arc::new(YoutubeVideoSearch::new(
        config.youtube_api_key.clone(),
        config.use_mock_videos,
    )?);
    info!(
        "Video search initialized (mock: {}, api key: {})",
        config.use_mock_videos,
        config.youtube_api_key.is_some()
    );

    // Initialize LLM client and analyzer
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.llm.clone())?;
    info!("LLM client initialized (model: {})", llm.model());
    let analyzer = Arc::new(LlmAnalyzer::new(llm, videos.clone()));

    let visits = VisitRecorder::new(repo.clone(), config.redirect_delay);

    // Build app state
    let state = AppState {
        repo,
        sessions,
        session_locks: SessionLocks::new(),
        analyzer,
        videos,
        visits,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
