use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    /// Absent key disables the LLM scoring path entirely — the heuristic
    /// scorer then serves every compatibility request.
    pub anthropic_api_key: Option<String>,
    pub enable_llm_scoring: bool,
    /// TTL for cached compatibility scores, in seconds.
    pub score_cache_ttl_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let anthropic_api_key = std::env::var("ANTHROPIC_API_KEY").ok();
        let enable_llm_scoring = std::env::var("ENABLE_LLM_SCORING")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(anthropic_api_key.is_some());

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse::<u32>()
                .context("DB_MAX_CONNECTIONS must be a positive integer")?,
            anthropic_api_key,
            enable_llm_scoring,
            score_cache_ttl_secs: std::env::var("SCORE_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse::<u64>()
                .context("SCORE_CACHE_TTL_SECS must be an integer number of seconds")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

#[cfg(test)]
mod tests {
    use super::*;

    // The only test in the crate that touches process env.
    #[test]
    fn test_from_env_defaults_and_overrides() {
        std::env::set_var("DATABASE_URL", "postgres://localhost/talentbase_test");
        std::env::set_var("DB_MAX_CONNECTIONS", "25");
        std::env::remove_var("ANTHROPIC_API_KEY");
        std::env::remove_var("ENABLE_LLM_SCORING");
        std::env::remove_var("SCORE_CACHE_TTL_SECS");
        std::env::remove_var("PORT");

        let config = Config::from_env().unwrap();
        assert_eq!(config.db_max_connections, 25);
        assert_eq!(config.port, 8080);
        assert_eq!(config.score_cache_ttl_secs, 3600);
        assert!(!config.enable_llm_scoring);
    }
}
