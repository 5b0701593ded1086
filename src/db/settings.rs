//! Settings database access
//!
//! Read/write settings from the settings table (key-value store).
//! All settings are global, not per-client: every connected UI sees the
//! same volume, control mode, and sensitivity.

use crate::error::{Error, Result};
use crate::events::ControlMode;
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

/// Get volume setting (linear 0.0-1.0)
pub async fn get_volume(db: &Pool<Sqlite>) -> Result<f64> {
    match get_setting::<f64>(db, "volume_level").await? {
        Some(vol) => Ok(vol.clamp(0.0, 1.0)),
        None => {
            set_volume(db, 0.7).await?;
            Ok(0.7)
        }
    }
}

/// Set volume setting (linear 0.0-1.0)
pub async fn set_volume(db: &Pool<Sqlite>, volume: f64) -> Result<()> {
    set_setting(db, "volume_level", volume.clamp(0.0, 1.0)).await
}

/// Get the auto-advance flag
pub async fn get_auto_advance(db: &Pool<Sqlite>) -> Result<bool> {
    match get_setting::<bool>(db, "auto_advance").await? {
        Some(enabled) => Ok(enabled),
        None => {
            set_auto_advance(db, true).await?;
            Ok(true)
        }
    }
}

/// Set the auto-advance flag
pub async fn set_auto_advance(db: &Pool<Sqlite>, enabled: bool) -> Result<()> {
    set_setting(db, "auto_advance", enabled).await
}

/// Get the persisted control mode
///
/// Stored as "manual" or "motion". Unknown values fall back to manual
/// rather than failing startup.
pub async fn get_control_mode(db: &Pool<Sqlite>) -> Result<ControlMode> {
    match get_setting::<String>(db, "control_mode").await? {
        Some(s) => Ok(ControlMode::parse(&s).unwrap_or(ControlMode::Manual)),
        None => {
            set_control_mode(db, ControlMode::Manual).await?;
            Ok(ControlMode::Manual)
        }
    }
}

/// Set the persisted control mode
pub async fn set_control_mode(db: &Pool<Sqlite>, mode: ControlMode) -> Result<()> {
    set_setting(db, "control_mode", mode.as_str()).await
}

/// Get motion sensitivity percentage (0-100)
pub async fn get_motion_sensitivity(db: &Pool<Sqlite>) -> Result<u8> {
    match get_setting::<u8>(db, "motion_sensitivity").await? {
        Some(s) => Ok(s.min(100)),
        None => {
            set_motion_sensitivity(db, 50).await?;
            Ok(50)
        }
    }
}

/// Set motion sensitivity percentage (0-100)
pub async fn set_motion_sensitivity(db: &Pool<Sqlite>, sensitivity: u8) -> Result<()> {
    set_setting(db, "motion_sensitivity", sensitivity.min(100)).await
}

/// Generic setting getter
///
/// Returns None if the key does not exist; parse failures are errors.
pub async fn get_setting<T: FromStr>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;

    match value {
        Some(s) => match s.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(Error::Config(format!(
                "Failed to parse setting '{}' value: {}",
                key, s
            ))),
        },
        None => Ok(None),
    }
}

/// Generic setting setter
///
/// Inserts or updates setting in database.
pub async fn set_setting<T: ToString>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()> {
    let value_str = value.to_string();

    sqlx::query(
        r#"
        INSERT INTO settings (key, value)
        VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(value_str)
    .execute(db)
    .await?;

    Ok(())
}
