use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS job_applications (
        id          BIGSERIAL PRIMARY KEY,
        title       TEXT NOT NULL,
        company     TEXT NOT NULL,
        location    TEXT,
        length      TEXT,
        url         TEXT,
        posting     TEXT,
        status      TEXT NOT NULL DEFAULT 'Not Applied',
        added       DATE NOT NULL DEFAULT CURRENT_DATE,
        applied     DATE,
        coverletter BOOLEAN NOT NULL DEFAULT FALSE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cover_letters (
        id      BIGINT PRIMARY KEY REFERENCES job_applications (id) ON DELETE CASCADE,
        content TEXT NOT NULL
    )
    "#,
];

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to PostgreSQL")?;

    info!("PostgreSQL connection pool established ({max_connections} connections max)");
    Ok(pool)
}

/// Creates the application tables when they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("failed to apply schema")?;
    }
    info!("Database schema ready");
    Ok(())
}
