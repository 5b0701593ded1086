//! Playback engine
//!
//! The coordinator actor owns all player state; the transport is the
//! driver it delegates media operations to.

pub mod coordinator;
pub mod transport;
pub mod volume;

pub use coordinator::{Command, PlayerHandle, PlayerStatus};
pub use transport::{AudioTransport, SimTransport, TransportEvent, TransportSink};
