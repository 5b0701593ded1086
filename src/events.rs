//! Event system for kinetune
//!
//! Hybrid communication model:
//! - **EventBus** (tokio::broadcast): one-to-many event fan-out to SSE clients
//! - **Command channel** (tokio::mpsc): request → single coordinator task
//!
//! Every async source owns exactly one slice of player state: transport
//! events write the system mode, user commands write the user mode, and
//! classifier commits write the motion state. Events published here are
//! observations of those writes, never a second write path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Which input source is authoritative for play/pause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    Manual,
    Motion,
}

impl ControlMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlMode::Manual => "manual",
            ControlMode::Motion => "motion",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(ControlMode::Manual),
            "motion" => Some(ControlMode::Motion),
            _ => None,
        }
    }
}

/// The user's last explicit playback wish
///
/// Persists across track changes and drives auto-advance. Written only by
/// explicit user actions, never by transport callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserMode {
    Playing,
    Paused,
}

/// Transport-observed playback state
///
/// Written only from transport completion events or load orchestration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemMode {
    Playing,
    Paused,
    Loading,
}

/// Player event types broadcast to SSE subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    /// Playback state changed (either mode axis)
    PlaybackStateChanged {
        user_mode: UserMode,
        system_mode: SystemMode,
        is_audible: bool,
        timestamp: DateTime<Utc>,
    },

    /// Current track changed
    TrackChanged {
        track_id: String,
        title: String,
        timestamp: DateTime<Utc>,
    },

    /// A track failed to load; playback state rolled back to paused
    TrackLoadFailed {
        track_id: String,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Transport rejected a play request or reported an error
    PlaybackError {
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Playback position update
    PlaybackProgress {
        track_id: String,
        position_s: f64,
        duration_s: f64,
        timestamp: DateTime<Utc>,
    },

    /// Committed motion classification flipped
    MotionStateChanged {
        is_moving: bool,
        timestamp: DateTime<Utc>,
    },

    /// Control mode switched
    ControlModeChanged {
        mode: ControlMode,
        timestamp: DateTime<Utc>,
    },

    /// Motion sensor permission result
    PermissionChanged {
        granted: bool,
        timestamp: DateTime<Utc>,
    },

    /// Sensitivity updated, with the variance threshold it maps to
    SensitivityChanged {
        sensitivity: u8,
        threshold: f64,
        timestamp: DateTime<Utc>,
    },

    /// Volume changed (linear 0.0-1.0 after safety limiting)
    VolumeChanged {
        volume: f64,
        timestamp: DateTime<Utc>,
    },

    /// Auto-advance toggled
    AutoAdvanceChanged {
        enabled: bool,
        timestamp: DateTime<Utc>,
    },
}

impl PlayerEvent {
    /// Event type string used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            PlayerEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            PlayerEvent::TrackChanged { .. } => "TrackChanged",
            PlayerEvent::TrackLoadFailed { .. } => "TrackLoadFailed",
            PlayerEvent::PlaybackError { .. } => "PlaybackError",
            PlayerEvent::PlaybackProgress { .. } => "PlaybackProgress",
            PlayerEvent::MotionStateChanged { .. } => "MotionStateChanged",
            PlayerEvent::ControlModeChanged { .. } => "ControlModeChanged",
            PlayerEvent::PermissionChanged { .. } => "PermissionChanged",
            PlayerEvent::SensitivityChanged { .. } => "SensitivityChanged",
            PlayerEvent::VolumeChanged { .. } => "VolumeChanged",
            PlayerEvent::AutoAdvanceChanged { .. } => "AutoAdvanceChanged",
        }
    }
}

/// One-to-many event broadcaster backed by tokio::sync::broadcast
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PlayerEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring the no-subscribers case
    pub fn emit_lossy(&self, event: PlayerEvent) {
        let _ = self.tx.send(event);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eventbus_new() {
        let bus = EventBus::new(100);
        assert_eq!(bus.capacity(), 100);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_emit_lossy_without_subscribers() {
        let bus = EventBus::new(10);
        // Must not panic with nobody listening
        bus.emit_lossy(PlayerEvent::VolumeChanged {
            volume: 0.7,
            timestamp: Utc::now(),
        });
    }

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();

        bus.emit_lossy(PlayerEvent::MotionStateChanged {
            is_moving: true,
            timestamp: Utc::now(),
        });

        match rx.recv().await.unwrap() {
            PlayerEvent::MotionStateChanged { is_moving, .. } => assert!(is_moving),
            other => panic!("wrong event type: {:?}", other),
        }
    }

    #[test]
    fn test_event_serialization_tag() {
        let event = PlayerEvent::ControlModeChanged {
            mode: ControlMode::Motion,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"ControlModeChanged\""));
        assert!(json.contains("\"mode\":\"motion\""));
    }

    #[test]
    fn test_control_mode_round_trip() {
        assert_eq!(ControlMode::parse("manual"), Some(ControlMode::Manual));
        assert_eq!(ControlMode::parse("motion"), Some(ControlMode::Motion));
        assert_eq!(ControlMode::parse("bogus"), None);
        assert_eq!(ControlMode::Motion.as_str(), "motion");
    }
}
