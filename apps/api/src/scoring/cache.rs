//! TTL cache for compatibility scores, keyed by (entity, vacancy).
//!
//! An explicit service object constructed once at startup and injected via
//! `AppState` — no process-wide singletons. A single async mutex serializes
//! access; scoring throughput is bounded by LLM latency, not cache
//! contention. Single-process only: a horizontally scaled deployment would
//! need an external key-value store behind the same contract.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use uuid::Uuid;

use super::CompatibilityScore;

struct CacheEntry {
    score: CompatibilityScore,
    inserted_at: Instant,
}

pub struct ScoreCache {
    ttl: Duration,
    entries: Mutex<HashMap<(Uuid, Uuid), CacheEntry>>,
}

impl ScoreCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached score if present and fresh; evicts a stale entry.
    pub async fn get(&self, entity_id: Uuid, vacancy_id: Uuid) -> Option<CompatibilityScore> {
        let mut entries = self.entries.lock().await;
        let key = (entity_id, vacancy_id);
        match entries.get(&key) {
            Some(entry) if entry.inserted_at.elapsed() <= self.ttl => Some(entry.score.clone()),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    pub async fn put(&self, entity_id: Uuid, vacancy_id: Uuid, score: CompatibilityScore) {
        let mut entries = self.entries.lock().await;
        entries.insert(
            (entity_id, vacancy_id),
            CacheEntry {
                score,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drops every cached score involving the entity. Called when a
    /// scoring-relevant candidate field changes.
    pub async fn invalidate_entity(&self, entity_id: Uuid) {
        let mut entries = self.entries.lock().await;
        entries.retain(|(e, _), _| *e != entity_id);
    }

    /// Drops every cached score involving the vacancy. Called when a
    /// scoring-relevant vacancy field changes.
    pub async fn invalidate_vacancy(&self, vacancy_id: Uuid) {
        let mut entries = self.entries.lock().await;
        entries.retain(|(_, v), _| *v != vacancy_id);
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
