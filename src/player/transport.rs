//! Audio transport abstraction
//!
//! The transport is the thin driver that actually plays a media resource.
//! It is owned exclusively by the playback coordinator: nobody else may call
//! load/play/pause/seek on it, which rules out conflicting concurrent
//! requests at the type level.
//!
//! Load and play are async and may fail; everything the transport observes
//! on its own (time passing, the track ending, driver errors) comes back as
//! [`TransportEvent`] values pushed through the [`TransportSink`] and is
//! processed by the coordinator as ordinary queued messages.

use crate::catalog::TrackCatalog;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

/// Asynchronous notifications from the transport
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Playback started from an externally observed cause
    Play,
    /// Playback stopped from an externally observed cause
    Pause,
    /// Position update in seconds
    TimeUpdate(f64),
    /// Resource duration became known, in seconds
    DurationChange(f64),
    /// The current resource played to its end
    Ended,
    /// Driver-level error
    Error(String),
    LoadStart,
    LoadEnd,
}

/// Delivery callback handed to a transport at attach time
pub struct TransportSink {
    deliver: Box<dyn Fn(TransportEvent) + Send + Sync>,
}

impl TransportSink {
    pub fn new<F>(deliver: F) -> Self
    where
        F: Fn(TransportEvent) + Send + Sync + 'static,
    {
        Self {
            deliver: Box::new(deliver),
        }
    }

    pub fn deliver(&self, event: TransportEvent) {
        (self.deliver)(event)
    }
}

/// Media playback driver contract
#[async_trait]
pub trait AudioTransport: Send {
    /// Install the event sink; replaces any previous sink
    fn set_sink(&mut self, sink: TransportSink);

    /// Load a media resource; previous resource is discarded
    async fn load(&mut self, source: &str) -> Result<()>;

    /// Start playback; fails if no resource is loaded
    async fn play(&mut self) -> Result<()>;

    /// Stop playback, keeping the loaded resource and position
    fn pause(&mut self);

    /// Jump to a position in seconds (clamped by the driver)
    fn seek(&mut self, position_s: f64);

    /// Linear volume 0.0-1.0
    fn set_volume(&mut self, volume: f64);
}

struct SimState {
    source: Option<String>,
    duration_s: f64,
    position_s: f64,
    playing: bool,
    sink: Option<Arc<TransportSink>>,
}

/// Wall-clock simulated transport
///
/// Stands in for a real audio driver so the daemon runs end-to-end without
/// an audio stack: a ticker task advances the position once per second while
/// playing and reports `Ended` when the position reaches the duration taken
/// from the catalog entry for the loaded source.
pub struct SimTransport {
    catalog: Arc<TrackCatalog>,
    state: Arc<Mutex<SimState>>,
}

impl SimTransport {
    pub fn new(catalog: Arc<TrackCatalog>) -> Self {
        let state = Arc::new(Mutex::new(SimState {
            source: None,
            duration_s: 0.0,
            position_s: 0.0,
            playing: false,
            sink: None,
        }));

        let ticker_state = Arc::clone(&state);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_secs(1));
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tick.tick().await;
                let mut events = Vec::new();
                {
                    let mut s = ticker_state.lock().unwrap();
                    if !s.playing {
                        continue;
                    }
                    s.position_s += 1.0;
                    if let Some(sink) = s.sink.as_ref() {
                        events.push((Arc::clone(sink), TransportEvent::TimeUpdate(s.position_s)));
                    }
                    if s.position_s >= s.duration_s {
                        s.playing = false;
                        s.position_s = 0.0;
                        if let Some(sink) = s.sink.as_ref() {
                            events.push((Arc::clone(sink), TransportEvent::Ended));
                        }
                    }
                }
                for (sink, event) in events {
                    sink.deliver(event);
                }
            }
        });

        Self { catalog, state }
    }

    fn emit(&self, event: TransportEvent) {
        let sink = self.state.lock().unwrap().sink.as_ref().map(Arc::clone);
        if let Some(sink) = sink {
            sink.deliver(event);
        }
    }
}

#[async_trait]
impl AudioTransport for SimTransport {
    fn set_sink(&mut self, sink: TransportSink) {
        self.state.lock().unwrap().sink = Some(Arc::new(sink));
    }

    async fn load(&mut self, source: &str) -> Result<()> {
        self.emit(TransportEvent::LoadStart);

        let duration_s = self
            .catalog
            .tracks()
            .iter()
            .find(|t| t.file == source)
            .and_then(|t| t.duration_seconds().ok())
            .map(f64::from);

        let duration_s = match duration_s {
            Some(d) => d,
            None => {
                warn!("SimTransport: unknown source {}", source);
                self.emit(TransportEvent::Error(format!("unknown source {}", source)));
                return Err(Error::Transport(format!("unknown source {}", source)));
            }
        };

        {
            let mut s = self.state.lock().unwrap();
            s.source = Some(source.to_string());
            s.duration_s = duration_s;
            s.position_s = 0.0;
            s.playing = false;
        }

        debug!("SimTransport: loaded {} ({}s)", source, duration_s);
        self.emit(TransportEvent::DurationChange(duration_s));
        self.emit(TransportEvent::LoadEnd);
        Ok(())
    }

    async fn play(&mut self) -> Result<()> {
        {
            let mut s = self.state.lock().unwrap();
            if s.source.is_none() {
                return Err(Error::Transport("no resource loaded".into()));
            }
            s.playing = true;
        }
        self.emit(TransportEvent::Play);
        Ok(())
    }

    fn pause(&mut self) {
        let was_playing = {
            let mut s = self.state.lock().unwrap();
            let was = s.playing;
            s.playing = false;
            was
        };
        if was_playing {
            self.emit(TransportEvent::Pause);
        }
    }

    fn seek(&mut self, position_s: f64) {
        let mut s = self.state.lock().unwrap();
        s.position_s = position_s.clamp(0.0, s.duration_s);
    }

    fn set_volume(&mut self, _volume: f64) {
        // The simulated transport produces no audio; volume is tracked by
        // the coordinator and only forwarded here for driver parity.
    }
}
