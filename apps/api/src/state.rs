use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::pipeline::sync::SyncMap;
use crate::scoring::cache::ScoreCache;
use crate::scoring::CompatScorer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Pluggable compatibility scorer. Heuristic by default; LLM-backed when
    /// ENABLE_LLM_SCORING is on and an API key is configured.
    pub scorer: Arc<dyn CompatScorer>,
    /// TTL cache for compatibility scores, one instance per process.
    pub score_cache: Arc<ScoreCache>,
    /// Stage ↔ status sync map, validated at startup.
    pub sync_map: Arc<SyncMap>,
}
