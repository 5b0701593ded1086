//! Variance-based motion classifier
//!
//! Converts raw tri-axial accelerometer samples into a debounced
//! moving/still state. Per-sample processing is O(window) with a fixed
//! memory footprint:
//!
//! 1. magnitude = |(x, y, z)| appended to a fixed-capacity window
//! 2. population variance of the window vs. a sensitivity-derived threshold
//!    yields a *candidate* classification
//! 3. a hysteresis filter commits the candidate only after enough
//!    consecutive agreeing readings separated from the previous flip by the
//!    debounce delay
//!
//! The current time is passed into [`MotionClassifier::ingest_sample`] so the
//! transition logic is deterministic under test, with no real timers.

use crate::config::MotionConfig;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// One raw accelerometer reading
///
/// Axes may be absent (some sensors deliver partial readings); a sample with
/// any missing or non-finite axis is invalid and dropped without touching
/// classifier state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl MotionSample {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: Some(z),
        }
    }

    /// Euclidean norm of the three axis readings, or None if invalid
    fn magnitude(&self) -> Option<f64> {
        let (x, y, z) = (self.x?, self.y?, self.z?);
        if !x.is_finite() || !y.is_finite() || !z.is_finite() {
            return None;
        }
        Some((x * x + y * y + z * z).sqrt())
    }
}

/// Read-only view of classifier state for the status API
#[derive(Debug, Clone, Serialize)]
pub struct MotionSnapshot {
    pub is_moving: bool,
    pub sensitivity: u8,
    pub variance_threshold: f64,
    pub window_len: usize,
    pub consecutive_moving: u32,
    pub consecutive_still: u32,
}

/// Streaming moving/still classifier with hysteresis
pub struct MotionClassifier {
    base_threshold: f64,
    min_threshold: f64,
    debounce_delay: Duration,
    history_size: usize,
    required_consecutive: u32,

    sensitivity: u8,
    threshold: f64,

    window: VecDeque<f64>,
    is_moving: bool,
    consecutive_moving: u32,
    consecutive_still: u32,
    last_transition: Option<Instant>,
}

impl MotionClassifier {
    pub fn new(config: &MotionConfig) -> Self {
        let mut classifier = Self {
            base_threshold: config.base_variance_threshold,
            min_threshold: config.min_variance_threshold,
            debounce_delay: Duration::from_millis(config.debounce_delay_ms),
            history_size: config.history_size.max(2),
            required_consecutive: config.consecutive_readings_required.max(1),
            sensitivity: 0,
            threshold: config.base_variance_threshold,
            window: VecDeque::with_capacity(config.history_size.max(2)),
            is_moving: false,
            consecutive_moving: 0,
            consecutive_still: 0,
            last_transition: None,
        };
        // set_sensitivity cannot fail for an in-range config default
        let _ = classifier.set_sensitivity(config.default_sensitivity.min(100));
        classifier
    }

    /// Feed one sample; returns the new committed state when it flips
    ///
    /// Invalid samples (missing or non-finite axes) are discarded silently.
    /// With fewer than two magnitudes in the window there is not enough data
    /// to compute a variance, so no classification happens.
    pub fn ingest_sample(&mut self, sample: MotionSample, now: Instant) -> Option<bool> {
        let magnitude = match sample.magnitude() {
            Some(m) => m,
            None => {
                trace!("Dropping invalid motion sample: {:?}", sample);
                return None;
            }
        };

        if self.window.len() == self.history_size {
            self.window.pop_front();
        }
        self.window.push_back(magnitude);

        if self.window.len() < 2 {
            return None;
        }

        let mean = self.window.iter().sum::<f64>() / self.window.len() as f64;
        let variance = self
            .window
            .iter()
            .map(|m| (m - mean) * (m - mean))
            .sum::<f64>()
            / self.window.len() as f64;

        let candidate_moving = variance > self.threshold;

        // Each sample resets the opposite counter, so at most one is nonzero.
        if candidate_moving {
            self.consecutive_moving += 1;
            self.consecutive_still = 0;
        } else {
            self.consecutive_still += 1;
            self.consecutive_moving = 0;
        }

        let debounce_elapsed = self
            .last_transition
            .map_or(true, |t| now.duration_since(t) >= self.debounce_delay);
        let consecutive = if candidate_moving {
            self.consecutive_moving
        } else {
            self.consecutive_still
        };

        if candidate_moving != self.is_moving
            && debounce_elapsed
            && consecutive >= self.required_consecutive
        {
            debug!(
                "Motion state change: {} -> {} (variance {:.3}, threshold {:.3})",
                self.is_moving, candidate_moving, variance, self.threshold
            );
            self.is_moving = candidate_moving;
            self.last_transition = Some(now);
            return Some(self.is_moving);
        }

        None
    }

    /// Update sensitivity on the 0-100 scale
    ///
    /// Higher sensitivity lowers the variance threshold, flipping to moving
    /// more easily: `threshold = max(min, base * (1 - s/100))`. Changing the
    /// threshold does not reclassify magnitudes already in the window.
    pub fn set_sensitivity(&mut self, sensitivity: u8) -> Result<(), u8> {
        if sensitivity > 100 {
            warn!("Ignoring out-of-range sensitivity: {}", sensitivity);
            return Err(sensitivity);
        }

        self.sensitivity = sensitivity;
        self.threshold = (self.base_threshold * (1.0 - f64::from(sensitivity) / 100.0))
            .max(self.min_threshold);
        debug!(
            "Sensitivity {} -> variance threshold {:.3}",
            sensitivity, self.threshold
        );
        Ok(())
    }

    /// Clear the window and both counters
    ///
    /// The committed state is untouched; the caller decides whether to also
    /// force still.
    pub fn reset(&mut self) {
        self.window.clear();
        self.consecutive_moving = 0;
        self.consecutive_still = 0;
    }

    /// Force the committed state back to still (used when leaving motion mode)
    pub fn force_still(&mut self) {
        self.is_moving = false;
    }

    pub fn is_moving(&self) -> bool {
        self.is_moving
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn sensitivity(&self) -> u8 {
        self.sensitivity
    }

    pub fn snapshot(&self) -> MotionSnapshot {
        MotionSnapshot {
            is_moving: self.is_moving,
            sensitivity: self.sensitivity,
            variance_threshold: self.threshold,
            window_len: self.window.len(),
            consecutive_moving: self.consecutive_moving,
            consecutive_still: self.consecutive_still,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MotionConfig {
        MotionConfig::default()
    }

    fn small_config() -> MotionConfig {
        MotionConfig {
            history_size: 4,
            consecutive_readings_required: 3,
            debounce_delay_ms: 1000,
            ..MotionConfig::default()
        }
    }

    /// Alternating large/small magnitudes keep window variance high
    fn noisy_sample(i: u32) -> MotionSample {
        if i % 2 == 0 {
            MotionSample::new(4.0, 0.0, 0.0)
        } else {
            MotionSample::new(0.0, 0.0, 0.0)
        }
    }

    fn still_sample() -> MotionSample {
        MotionSample::new(1.0, 0.0, 0.0)
    }

    #[test]
    fn test_threshold_mapping() {
        let mut c = MotionClassifier::new(&config());

        c.set_sensitivity(50).unwrap();
        assert!((c.threshold() - 1.0).abs() < 1e-9);

        c.set_sensitivity(100).unwrap();
        assert!((c.threshold() - 0.1).abs() < 1e-9); // clamped from 0.0

        c.set_sensitivity(0).unwrap();
        assert!((c.threshold() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_range_sensitivity_is_noop() {
        let mut c = MotionClassifier::new(&config());
        let before = c.threshold();
        assert!(c.set_sensitivity(101).is_err());
        assert_eq!(c.threshold(), before);
        assert_eq!(c.sensitivity(), 50);
    }

    #[test]
    fn test_invalid_samples_dropped() {
        let mut c = MotionClassifier::new(&config());
        let now = Instant::now();

        let missing = MotionSample {
            x: Some(1.0),
            y: None,
            z: Some(2.0),
        };
        assert_eq!(c.ingest_sample(missing, now), None);
        assert_eq!(c.snapshot().window_len, 0);

        let nan = MotionSample::new(f64::NAN, 0.0, 0.0);
        assert_eq!(c.ingest_sample(nan, now), None);
        assert_eq!(c.snapshot().window_len, 0);
    }

    #[test]
    fn test_window_is_bounded_fifo() {
        let mut c = MotionClassifier::new(&small_config());
        let now = Instant::now();
        for i in 0..20 {
            c.ingest_sample(noisy_sample(i), now);
            assert!(c.snapshot().window_len <= 4);
        }
        assert_eq!(c.snapshot().window_len, 4);
    }

    #[test]
    fn test_single_sample_does_not_classify() {
        let mut c = MotionClassifier::new(&config());
        assert_eq!(
            c.ingest_sample(MotionSample::new(9.0, 9.0, 9.0), Instant::now()),
            None
        );
        assert_eq!(c.snapshot().consecutive_moving, 0);
        assert_eq!(c.snapshot().consecutive_still, 0);
    }

    #[test]
    fn test_requires_consecutive_readings() {
        let mut c = MotionClassifier::new(&small_config());
        let now = Instant::now();

        // First sample has no classification; candidates start at the second
        // sample. Two moving candidates are not enough for threshold 3.
        assert_eq!(c.ingest_sample(noisy_sample(0), now), None);
        assert_eq!(c.ingest_sample(noisy_sample(1), now), None);
        assert_eq!(c.ingest_sample(noisy_sample(2), now), None);
        assert!(!c.is_moving());

        // Third consecutive moving candidate commits the flip.
        assert_eq!(c.ingest_sample(noisy_sample(3), now), Some(true));
        assert!(c.is_moving());
    }

    #[test]
    fn test_debounce_blocks_rapid_flips() {
        let mut c = MotionClassifier::new(&small_config());
        let t0 = Instant::now();

        // Drive to moving
        let mut i = 0;
        while !c.is_moving() {
            c.ingest_sample(noisy_sample(i), t0);
            i += 1;
            assert!(i < 32, "classifier never flipped to moving");
        }

        // Plenty of still candidates, but within the 1000 ms debounce window
        let soon = t0 + Duration::from_millis(100);
        for _ in 0..10 {
            assert_eq!(c.ingest_sample(still_sample(), soon), None);
        }
        assert!(c.is_moving());

        // Same evidence after the debounce delay commits the flip
        let later = t0 + Duration::from_millis(1200);
        let mut flipped = false;
        for _ in 0..10 {
            if c.ingest_sample(still_sample(), later) == Some(false) {
                flipped = true;
                break;
            }
        }
        assert!(flipped);
        assert!(!c.is_moving());
    }

    #[test]
    fn test_reset_clears_window_but_keeps_state() {
        let mut c = MotionClassifier::new(&small_config());
        let t0 = Instant::now();
        let mut i = 0;
        while !c.is_moving() {
            c.ingest_sample(noisy_sample(i), t0);
            i += 1;
            assert!(i < 32);
        }

        c.reset();
        let snap = c.snapshot();
        assert_eq!(snap.window_len, 0);
        assert_eq!(snap.consecutive_moving, 0);
        assert_eq!(snap.consecutive_still, 0);
        assert!(snap.is_moving, "reset must not change the committed state");

        c.force_still();
        assert!(!c.is_moving());
    }

    #[test]
    fn test_threshold_change_is_not_retroactive() {
        let mut c = MotionClassifier::new(&small_config());
        let now = Instant::now();
        c.ingest_sample(noisy_sample(0), now);
        c.ingest_sample(noisy_sample(1), now);
        let window_before = c.snapshot().window_len;

        c.set_sensitivity(0).unwrap();
        // Window contents survive a threshold change untouched
        assert_eq!(c.snapshot().window_len, window_before);
        assert!(!c.is_moving());
    }
}
