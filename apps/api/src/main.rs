mod config;
mod db;
mod errors;
mod llm_client;
mod matching;
mod models;
mod normalize;
mod pipeline;
mod routes;
mod scoring;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::pipeline::sync::SyncMap;
use crate::routes::build_router;
use crate::scoring::cache::ScoreCache;
use crate::scoring::heuristic::HeuristicCompatScorer;
use crate::scoring::llm::LlmCompatScorer;
use crate::scoring::CompatScorer;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Crate name uses a hyphen; tracing targets use the underscored form.
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting TalentBase API v{}", env!("CARGO_PKG_VERSION"));

    // Fail fast on a stage without a status mapping.
    let sync_map = SyncMap::new();
    sync_map.validate()?;

    let db = create_pool(&config.database_url, config.db_max_connections).await?;

    let scorer: Arc<dyn CompatScorer> = match (&config.anthropic_api_key, config.enable_llm_scoring)
    {
        (Some(key), true) => {
            info!("Compatibility scorer: LLM (model: {})", llm_client::MODEL);
            Arc::new(LlmCompatScorer::new(LlmClient::new(key.clone())))
        }
        _ => {
            info!("Compatibility scorer: heuristic (LLM scoring disabled)");
            Arc::new(HeuristicCompatScorer)
        }
    };

    let score_cache = Arc::new(ScoreCache::new(Duration::from_secs(
        config.score_cache_ttl_secs,
    )));
    info!("Score cache TTL: {}s", config.score_cache_ttl_secs);

    let state = AppState {
        db,
        config: config.clone(),
        scorer,
        score_cache,
        sync_map: Arc::new(sync_map),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
