//! Motion sensing and classification
//!
//! `sensor` delivers raw tri-axial samples, `classifier` turns them into a
//! debounced moving/still state, and `gate` decides whether that state is
//! allowed to drive playback at all.

pub mod classifier;
pub mod gate;
pub mod sensor;

pub use classifier::{MotionClassifier, MotionSample, MotionSnapshot};
pub use gate::ControlModeGate;
pub use sensor::{ChannelSensor, MotionSensor, SampleSink, SensorFeed};
