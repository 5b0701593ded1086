//! Control-mode arbitration
//!
//! Decides which of {manual input, classifier output} is authoritative and
//! keeps the sensor subscription in lockstep with that decision:
//!
//! - Manual: manual input authoritative, sensor subscription inactive
//! - Motion: classifier authoritative, subscription active; only reachable
//!   when the sensor is available and permission was granted
//!
//! Because the gate runs inside the coordinator's single message loop, the
//! unsubscribe on a Manual switch happens synchronously with the mode
//! change; samples still queued behind the switch are dropped by the
//! coordinator's `is_motion_active` check instead of being classified.

use crate::error::{Error, Result};
use crate::events::ControlMode;
use crate::motion::classifier::MotionClassifier;
use crate::motion::sensor::{MotionSensor, SampleSink};
use tracing::{info, warn};

pub struct ControlModeGate {
    mode: ControlMode,
    sensor: Box<dyn MotionSensor>,
}

impl ControlModeGate {
    /// Gate starts in Manual mode with no active subscription
    pub fn new(sensor: Box<dyn MotionSensor>) -> Self {
        Self {
            mode: ControlMode::Manual,
            sensor,
        }
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn is_manual_control_enabled(&self) -> bool {
        self.mode == ControlMode::Manual
    }

    pub fn is_motion_active(&self) -> bool {
        self.mode == ControlMode::Motion
    }

    pub fn sensor_available(&self) -> bool {
        self.sensor.is_available()
    }

    pub fn has_permission(&self) -> bool {
        self.sensor.has_permission()
    }

    /// Ask the sensor platform for sample access
    ///
    /// A denial is a normal result; the gate stays in Manual mode either way
    /// and the caller decides whether a grant should switch to Motion.
    pub async fn request_permission(&mut self) -> Result<bool> {
        self.sensor.request_permission().await
    }

    /// Switch control mode
    ///
    /// Re-requesting the active mode is a no-op: no subscription churn, no
    /// classifier reset. Switching to Motion is refused unless the sensor is
    /// available and permitted. Both real switches reset the classifier;
    /// leaving Motion additionally forces the committed state back to still,
    /// since nothing will produce a still transition once unsubscribed.
    pub fn set_mode(
        &mut self,
        mode: ControlMode,
        classifier: &mut MotionClassifier,
        make_sink: impl FnOnce() -> SampleSink,
    ) -> Result<ControlMode> {
        if mode == self.mode {
            return Ok(self.mode);
        }

        match mode {
            ControlMode::Motion => {
                if !self.sensor.is_available() {
                    warn!("Refusing motion mode: sensor not available");
                    return Err(Error::MotionUnavailable);
                }
                if !self.sensor.has_permission() {
                    warn!("Refusing motion mode: permission not granted");
                    return Err(Error::PermissionDenied);
                }
                classifier.reset();
                self.sensor.subscribe(make_sink());
                self.mode = ControlMode::Motion;
                info!("Control mode switched to motion");
            }
            ControlMode::Manual => {
                self.sensor.unsubscribe();
                classifier.reset();
                classifier.force_still();
                self.mode = ControlMode::Manual;
                info!("Control mode switched to manual");
            }
        }

        Ok(self.mode)
    }

    /// Tear down the sensor subscription on shutdown
    pub fn shutdown(&mut self) {
        self.sensor.unsubscribe();
    }
}
