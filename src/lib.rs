//! # kinetune
//!
//! Motion-controlled music player core.
//!
//! **Purpose:** Classify accelerometer input into a moving/still state,
//! gate it behind an explicit control mode, and coordinate a playback
//! transport so motion, user actions, and visibility changes never fight
//! over player state. Control surface is HTTP/SSE.
//!
//! **Architecture:** Single coordinator task owning all mutable state;
//! every async source (transport, sensor, HTTP) is a message producer.

pub mod api;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod motion;
pub mod player;

pub use error::{Error, Result};
pub use events::{ControlMode, EventBus, PlayerEvent, SystemMode, UserMode};
pub use player::{PlayerHandle, PlayerStatus};
