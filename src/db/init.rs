//! Database initialization
//!
//! Creates the settings table and seeds defaults for any missing keys.

use crate::error::Result;
use sqlx::{Pool, Sqlite};
use tracing::info;

/// Create schema and seed default settings
pub async fn initialize(pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    init_settings_defaults(pool).await
}

/// Seed default values for settings that are not yet present
///
/// Existing values are never overwritten, so user preferences survive
/// upgrades that add new keys.
pub async fn init_settings_defaults(pool: &Pool<Sqlite>) -> Result<()> {
    let defaults = vec![
        // Linear volume level (0.0 - 1.0), clamped into the dB safety
        // range before it reaches the transport
        ("volume_level", "0.7"),
        // Whether the next track loads automatically when one ends
        ("auto_advance", "true"),
        // "manual" or "motion"
        ("control_mode", "manual"),
        // Motion sensitivity percentage (0-100)
        ("motion_sensitivity", "50"),
    ];

    for (key, default_value) in defaults {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM settings WHERE key = ?)")
                .bind(key)
                .fetch_one(pool)
                .await?;

        if !exists {
            sqlx::query("INSERT INTO settings (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(default_value)
                .execute(pool)
                .await?;

            info!(
                "Initialized setting '{}' with default value: {}",
                key, default_value
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    #[tokio::test]
    async fn test_initialize_seeds_defaults() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        initialize(&pool).await.unwrap();

        let volume: String = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind("volume_level")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(volume, "0.7");
    }

    #[tokio::test]
    async fn test_initialize_preserves_existing_values() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        initialize(&pool).await.unwrap();

        sqlx::query("UPDATE settings SET value = ? WHERE key = ?")
            .bind("0.25")
            .bind("volume_level")
            .execute(&pool)
            .await
            .unwrap();

        // Re-running init must not clobber the stored value
        initialize(&pool).await.unwrap();

        let volume: String = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind("volume_level")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(volume, "0.25");
    }
}
