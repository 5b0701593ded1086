//! Database access layer
//!
//! SQLite key-value store for settings that survive restarts.

pub mod init;
pub mod settings;

use crate::error::Result;
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Open (creating if missing) the SQLite database and apply the schema
pub async fn connect(database_path: &Path) -> Result<Pool<Sqlite>> {
    let db_url = format!("sqlite:{}?mode=rwc", database_path.display());
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Some(Duration::from_secs(60)))
        .connect(&db_url)
        .await?;

    info!("Connected to database: {:?}", database_path);

    init::initialize(&pool).await?;
    Ok(pool)
}
