use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Opens the Postgres pool every handler shares. Pool size is a deployment
/// tunable (`DB_MAX_CONNECTIONS`); everything else stays at sqlx defaults.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    info!("Postgres pool ready (up to {max_connections} connections)");
    Ok(pool)
}
