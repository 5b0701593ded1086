//! Motion sensor abstraction
//!
//! The coordinator owns exactly one sensor behind the [`MotionSensor`]
//! trait. Subscription hands the sensor a [`SampleSink`]; every raw sample
//! the sensor produces while subscribed is delivered through that sink and
//! nowhere else, so "exactly one active subscription" holds by construction.
//!
//! The shipped implementation is [`ChannelSensor`]: samples are pushed in
//! from outside the process (the HTTP sample-ingest endpoint) through a
//! cloneable [`SensorFeed`]. Samples fed while unsubscribed are dropped at
//! the sensor, before they ever reach the player.

use crate::error::Result;
use crate::motion::classifier::MotionSample;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Delivery callback handed to a sensor on subscribe
pub struct SampleSink {
    deliver: Box<dyn Fn(MotionSample) + Send + Sync>,
}

impl SampleSink {
    pub fn new<F>(deliver: F) -> Self
    where
        F: Fn(MotionSample) + Send + Sync + 'static,
    {
        Self {
            deliver: Box::new(deliver),
        }
    }

    pub fn deliver(&self, sample: MotionSample) {
        (self.deliver)(sample)
    }
}

/// Device-motion source contract
///
/// `request_permission` models the platform permission step: it resolves to
/// whether samples may be subscribed to, and a denial is a normal outcome,
/// not an error.
#[async_trait]
pub trait MotionSensor: Send {
    /// Whether the device has a usable motion source at all
    fn is_available(&self) -> bool;

    /// Whether permission has been granted
    fn has_permission(&self) -> bool;

    /// Ask the platform for sample access
    async fn request_permission(&mut self) -> Result<bool>;

    /// Begin delivering samples into `sink`; replaces any previous sink
    fn subscribe(&mut self, sink: SampleSink);

    /// Stop delivering samples; pending feeds are dropped at the sensor
    fn unsubscribe(&mut self);
}

#[derive(Default)]
struct ChannelSensorInner {
    sink: Option<SampleSink>,
    granted: bool,
}

/// Sensor fed from outside the process via [`SensorFeed`]
pub struct ChannelSensor {
    available: bool,
    inner: Arc<Mutex<ChannelSensorInner>>,
}

/// Cloneable producer half of a [`ChannelSensor`]
///
/// Held by the HTTP layer; `feed` forwards a raw sample to the active
/// subscriber, if any.
#[derive(Clone)]
pub struct SensorFeed {
    inner: Arc<Mutex<ChannelSensorInner>>,
}

impl ChannelSensor {
    pub fn new(available: bool) -> (Self, SensorFeed) {
        let inner = Arc::new(Mutex::new(ChannelSensorInner::default()));
        (
            Self {
                available,
                inner: Arc::clone(&inner),
            },
            SensorFeed { inner },
        )
    }
}

#[async_trait]
impl MotionSensor for ChannelSensor {
    fn is_available(&self) -> bool {
        self.available
    }

    fn has_permission(&self) -> bool {
        self.inner.lock().unwrap().granted
    }

    async fn request_permission(&mut self) -> Result<bool> {
        if !self.available {
            info!("Motion permission denied: sensor not available");
            return Ok(false);
        }
        self.inner.lock().unwrap().granted = true;
        info!("Motion permission granted");
        Ok(true)
    }

    fn subscribe(&mut self, sink: SampleSink) {
        debug!("Motion sensor subscribed");
        self.inner.lock().unwrap().sink = Some(sink);
    }

    fn unsubscribe(&mut self) {
        debug!("Motion sensor unsubscribed");
        self.inner.lock().unwrap().sink = None;
    }
}

impl SensorFeed {
    /// Forward one raw sample; returns whether a subscriber received it
    pub fn feed(&self, sample: MotionSample) -> bool {
        let inner = self.inner.lock().unwrap();
        match inner.sink.as_ref() {
            Some(sink) => {
                sink.deliver(sample);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[tokio::test]
    async fn test_permission_requires_availability() {
        let (mut sensor, _feed) = ChannelSensor::new(false);
        assert!(!sensor.request_permission().await.unwrap());
        assert!(!sensor.has_permission());

        let (mut sensor, _feed) = ChannelSensor::new(true);
        assert!(sensor.request_permission().await.unwrap());
        assert!(sensor.has_permission());
    }

    #[test]
    fn test_feed_only_reaches_active_subscriber() {
        let (mut sensor, feed) = ChannelSensor::new(true);
        let (tx, rx) = mpsc::channel();

        // Unsubscribed: dropped at the sensor
        assert!(!feed.feed(MotionSample::new(1.0, 2.0, 3.0)));

        sensor.subscribe(SampleSink::new(move |s| {
            let _ = tx.send(s);
        }));
        assert!(feed.feed(MotionSample::new(1.0, 2.0, 3.0)));
        assert_eq!(rx.recv().unwrap(), MotionSample::new(1.0, 2.0, 3.0));

        sensor.unsubscribe();
        assert!(!feed.feed(MotionSample::new(4.0, 5.0, 6.0)));
        assert!(rx.try_recv().is_err());
    }
}
