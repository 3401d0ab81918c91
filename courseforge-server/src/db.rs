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
    // Create users table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT,
            email TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create courses table; a layout is stored exactly when generation succeeded
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS courses (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title TEXT,
            description TEXT,
            difficulty TEXT,
            status VARCHAR(32) NOT NULL DEFAULT 'PENDING',
            layout JSONB,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            CONSTRAINT courses_status_check CHECK (
                status IN ('PENDING', 'LAYOUT_PROCESSING', 'LAYOUT_SUCCESS', 'LAYOUT_FAILED')
            ),
            CONSTRAINT courses_layout_iff_success CHECK (
                (status = 'LAYOUT_SUCCESS') = (layout IS NOT NULL)
            )
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Claim ordering: oldest pending first
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_courses_status_created_at ON courses(status, created_at)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_courses_user_id ON courses(user_id)")
        .execute(pool)
        .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
