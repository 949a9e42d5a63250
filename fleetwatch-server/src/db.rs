use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Outage records
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS outages (
            id UUID PRIMARY KEY,
            worker_id VARCHAR(255) NOT NULL,
            started_at TIMESTAMPTZ NOT NULL,
            ended_at TIMESTAMPTZ,
            duration_ms BIGINT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // At most one open outage per worker, enforced at the storage level
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_outages_open ON outages(worker_id) WHERE ended_at IS NULL",
    )
    .execute(pool)
    .await?;

    // Indexes for range queries and per-worker lookups
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_outages_worker_id ON outages(worker_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_outages_started_at ON outages(started_at DESC)")
        .execute(pool)
        .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
