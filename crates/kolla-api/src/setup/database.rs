use anyhow::Result;
use kolla_core::Config;
use kolla_db::SqlitePool;

/// Open the SQLite pool and apply pending migrations.
pub async fn setup_database(config: &Config) -> Result<SqlitePool> {
    tracing::info!("Connecting to database...");
    let pool = kolla_db::connect(
        config.database_url(),
        config.db_max_connections(),
        config.db_timeout_seconds(),
    )
    .await?;

    tracing::info!(
        max_connections = config.db_max_connections(),
        "Database connected and migrated"
    );
    Ok(pool)
}
