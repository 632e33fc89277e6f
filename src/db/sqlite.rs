use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

/// Creates a SQLite connection pool and ensures the schema exists
///
/// The catalog is a local cache; the schema is small enough that idempotent
/// `CREATE TABLE IF NOT EXISTS` statements at startup replace a migration
/// framework.
pub async fn create_pool(database_url: &str) -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// Creates the catalog tables if they do not exist yet
pub async fn init_schema(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS videos (
            id            TEXT PRIMARY KEY NOT NULL,
            title         TEXT NOT NULL,
            description   TEXT NOT NULL,
            thumbnail_url TEXT NOT NULL,
            channel_title TEXT NOT NULL,
            published_at  TEXT NOT NULL,
            duration      TEXT,
            watched       INTEGER NOT NULL DEFAULT 0,
            added_at      INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS playlists (
            id             TEXT PRIMARY KEY NOT NULL,
            title          TEXT NOT NULL,
            description    TEXT,
            thumbnail_url  TEXT,
            item_count     INTEGER NOT NULL DEFAULT 0,
            last_sync_time INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
