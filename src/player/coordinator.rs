//! Playback coordinator
//!
//! Single-task actor that owns all mutable player state. Every input
//! source (HTTP handlers, transport callbacks, motion samples, visibility
//! changes) is funneled into one mpsc queue and processed strictly in
//! arrival order, so no two sources ever race on the same field.
//!
//! State is split along ownership lines:
//! - user mode: written only by explicit user play/pause actions
//! - system mode + audibility: written only by transport completions
//! - motion state: written only by classifier commits
//!
//! Transport calls never happen on the actor task. Each request is handed
//! to a spawned task that locks the transport, performs the call, and
//! reports back as another queued command, so a slow driver can never
//! stall command processing.

use crate::catalog::TrackCatalog;
use crate::config::Config;
use crate::db::settings;
use crate::error::{Error, Result};
use crate::events::{ControlMode, EventBus, PlayerEvent, SystemMode, UserMode};
use crate::motion::{ControlModeGate, MotionClassifier, MotionSample, MotionSnapshot, MotionSensor, SampleSink};
use crate::player::transport::{AudioTransport, TransportEvent, TransportSink};
use crate::player::volume;
use chrono::Utc;
use serde::Serialize;
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, error, info, warn};

/// Requests processed by the coordinator task
pub enum Command {
    ManualPlay {
        respond_to: oneshot::Sender<Result<()>>,
    },
    ManualPause {
        respond_to: oneshot::Sender<Result<()>>,
    },
    SelectTrack {
        track_id: String,
        respond_to: oneshot::Sender<Result<()>>,
    },
    NextTrack {
        respond_to: oneshot::Sender<Result<()>>,
    },
    PreviousTrack {
        respond_to: oneshot::Sender<Result<()>>,
    },
    Seek {
        position_s: f64,
        respond_to: oneshot::Sender<Result<()>>,
    },
    SetVolume {
        volume: f64,
        respond_to: oneshot::Sender<Result<f64>>,
    },
    SetAutoAdvance {
        enabled: bool,
        respond_to: oneshot::Sender<Result<()>>,
    },
    SetControlMode {
        mode: ControlMode,
        respond_to: oneshot::Sender<Result<ControlMode>>,
    },
    RequestPermission {
        respond_to: oneshot::Sender<Result<bool>>,
    },
    SetSensitivity {
        sensitivity: u8,
        respond_to: oneshot::Sender<Result<()>>,
    },
    SetVisibility {
        visible: bool,
    },
    MotionSample {
        sample: MotionSample,
    },
    Transport(TransportEvent),
    LoadFinished {
        track_id: String,
        result: std::result::Result<(), String>,
    },
    PlayFinished {
        result: std::result::Result<(), String>,
    },
    Status {
        respond_to: oneshot::Sender<PlayerStatus>,
    },
    Shutdown {
        respond_to: oneshot::Sender<()>,
    },
}

/// Point-in-time view of the whole player, for the status endpoint
#[derive(Debug, Clone, Serialize)]
pub struct PlayerStatus {
    pub track_id: Option<String>,
    pub track_title: Option<String>,
    pub user_mode: UserMode,
    pub system_mode: SystemMode,
    pub is_audible: bool,
    pub position_s: f64,
    pub duration_s: f64,
    pub volume: f64,
    pub auto_advance: bool,
    pub control_mode: ControlMode,
    pub sensor_available: bool,
    pub has_permission: bool,
    pub visible: bool,
    pub motion: MotionSnapshot,
}

struct PlayerState {
    user_mode: UserMode,
    system_mode: SystemMode,
    is_audible: bool,
    current_track_id: Option<String>,
    position_s: f64,
    duration_s: f64,
    volume: f64,
    auto_advance: bool,
    visible: bool,
}

/// Cloneable handle for talking to the coordinator task
#[derive(Clone)]
pub struct PlayerHandle {
    tx: mpsc::UnboundedSender<Command>,
}

struct Coordinator {
    state: PlayerState,
    classifier: MotionClassifier,
    gate: ControlModeGate,
    catalog: Arc<TrackCatalog>,
    transport: Arc<Mutex<Box<dyn AudioTransport>>>,
    db: Pool<Sqlite>,
    events: EventBus,
    tx: mpsc::UnboundedSender<Command>,
}

impl PlayerHandle {
    /// Start the coordinator task
    ///
    /// Restores persisted volume, auto-advance, and sensitivity from the
    /// settings table. Control mode always starts in Manual: sensor
    /// permission does not outlive the process, so a persisted Motion mode
    /// is only a UI default, never an automatic resubscription.
    pub async fn spawn(
        config: &Config,
        catalog: Arc<TrackCatalog>,
        mut transport: Box<dyn AudioTransport>,
        sensor: Box<dyn MotionSensor>,
        db: Pool<Sqlite>,
        events: EventBus,
    ) -> Result<PlayerHandle> {
        // Stored settings win; config supplies the value for a fresh table
        let stored_volume = settings::get_setting::<f64>(&db, "volume_level")
            .await?
            .map(|v| v.clamp(0.0, 1.0))
            .unwrap_or(config.player.default_volume);
        let auto_advance = settings::get_setting::<bool>(&db, "auto_advance")
            .await?
            .unwrap_or(config.player.default_auto_advance);
        let sensitivity = settings::get_setting::<u8>(&db, "motion_sensitivity")
            .await?
            .map(|s| s.min(100))
            .unwrap_or(config.motion.default_sensitivity);

        let mut classifier = MotionClassifier::new(&config.motion);
        if classifier.set_sensitivity(sensitivity).is_err() {
            warn!("Ignoring out-of-range stored sensitivity {}", sensitivity);
        }

        let (tx, rx) = mpsc::unbounded_channel();

        let event_tx = tx.clone();
        transport.set_sink(TransportSink::new(move |event| {
            let _ = event_tx.send(Command::Transport(event));
        }));

        let applied_volume = volume::apply_safety_limits(stored_volume);
        transport.set_volume(applied_volume);

        let coordinator = Coordinator {
            state: PlayerState {
                user_mode: UserMode::Paused,
                system_mode: SystemMode::Paused,
                is_audible: false,
                current_track_id: None,
                position_s: 0.0,
                duration_s: 0.0,
                volume: applied_volume,
                auto_advance,
                visible: true,
            },
            classifier,
            gate: ControlModeGate::new(sensor),
            catalog,
            transport: Arc::new(Mutex::new(transport)),
            db,
            events,
            tx: tx.clone(),
        };

        tokio::spawn(coordinator.run(rx));
        info!("Playback coordinator started");

        Ok(PlayerHandle { tx })
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T> {
        let (respond_to, rx) = oneshot::channel();
        self.tx
            .send(make(respond_to))
            .map_err(|_| Error::ChannelClosed)?;
        rx.await.map_err(|_| Error::ChannelClosed)
    }

    /// User play request (Manual mode only)
    pub async fn play(&self) -> Result<()> {
        self.request(|respond_to| Command::ManualPlay { respond_to })
            .await?
    }

    /// User pause request (Manual mode only)
    pub async fn pause(&self) -> Result<()> {
        self.request(|respond_to| Command::ManualPause { respond_to })
            .await?
    }

    pub async fn select_track(&self, track_id: String) -> Result<()> {
        self.request(|respond_to| Command::SelectTrack {
            track_id,
            respond_to,
        })
        .await?
    }

    pub async fn next_track(&self) -> Result<()> {
        self.request(|respond_to| Command::NextTrack { respond_to })
            .await?
    }

    pub async fn previous_track(&self) -> Result<()> {
        self.request(|respond_to| Command::PreviousTrack { respond_to })
            .await?
    }

    pub async fn seek(&self, position_s: f64) -> Result<()> {
        self.request(|respond_to| Command::Seek {
            position_s,
            respond_to,
        })
        .await?
    }

    /// Set volume; returns the level actually applied after safety limiting
    pub async fn set_volume(&self, volume: f64) -> Result<f64> {
        self.request(|respond_to| Command::SetVolume { volume, respond_to })
            .await?
    }

    pub async fn set_auto_advance(&self, enabled: bool) -> Result<()> {
        self.request(|respond_to| Command::SetAutoAdvance {
            enabled,
            respond_to,
        })
        .await?
    }

    /// Switch control mode; returns the mode now in effect
    pub async fn set_control_mode(&self, mode: ControlMode) -> Result<ControlMode> {
        self.request(|respond_to| Command::SetControlMode { mode, respond_to })
            .await?
    }

    pub async fn request_permission(&self) -> Result<bool> {
        self.request(|respond_to| Command::RequestPermission { respond_to })
            .await?
    }

    pub async fn set_sensitivity(&self, sensitivity: u8) -> Result<()> {
        self.request(|respond_to| Command::SetSensitivity {
            sensitivity,
            respond_to,
        })
        .await?
    }

    /// Page/display visibility notification (fire and forget)
    pub fn set_visibility(&self, visible: bool) -> Result<()> {
        self.tx
            .send(Command::SetVisibility { visible })
            .map_err(|_| Error::ChannelClosed)
    }

    pub async fn status(&self) -> Result<PlayerStatus> {
        self.request(|respond_to| Command::Status { respond_to })
            .await
    }

    /// Stop the coordinator, pausing the transport first
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|respond_to| Command::Shutdown { respond_to })
            .await
    }
}

impl Coordinator {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = rx.recv().await {
            if self.handle_command(command).await {
                break;
            }
        }
        info!("Playback coordinator stopped");
    }

    /// Returns true when the loop should exit
    async fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::ManualPlay { respond_to } => {
                let _ = respond_to.send(self.manual_play());
            }
            Command::ManualPause { respond_to } => {
                let _ = respond_to.send(self.manual_pause());
            }
            Command::SelectTrack {
                track_id,
                respond_to,
            } => {
                let _ = respond_to.send(self.start_load(&track_id));
            }
            Command::NextTrack { respond_to } => {
                let _ = respond_to.send(self.step_track(true));
            }
            Command::PreviousTrack { respond_to } => {
                let _ = respond_to.send(self.step_track(false));
            }
            Command::Seek {
                position_s,
                respond_to,
            } => {
                let _ = respond_to.send(self.seek(position_s));
            }
            Command::SetVolume { volume, respond_to } => {
                let result = self.set_volume(volume).await;
                let _ = respond_to.send(result);
            }
            Command::SetAutoAdvance {
                enabled,
                respond_to,
            } => {
                let result = self.set_auto_advance(enabled).await;
                let _ = respond_to.send(result);
            }
            Command::SetControlMode { mode, respond_to } => {
                let result = self.set_control_mode(mode).await;
                let _ = respond_to.send(result);
            }
            Command::RequestPermission { respond_to } => {
                let result = self.request_permission().await;
                let _ = respond_to.send(result);
            }
            Command::SetSensitivity {
                sensitivity,
                respond_to,
            } => {
                let result = self.set_sensitivity(sensitivity).await;
                let _ = respond_to.send(result);
            }
            Command::SetVisibility { visible } => self.set_visibility(visible),
            Command::MotionSample { sample } => self.ingest_motion_sample(sample),
            Command::Transport(event) => self.handle_transport_event(event),
            Command::LoadFinished { track_id, result } => {
                self.handle_load_finished(track_id, result)
            }
            Command::PlayFinished { result } => self.handle_play_finished(result),
            Command::Status { respond_to } => {
                let _ = respond_to.send(self.status());
            }
            Command::Shutdown { respond_to } => {
                self.gate.shutdown();
                self.transport.lock().await.pause();
                let _ = respond_to.send(());
                return true;
            }
        }
        false
    }

    // --- User playback actions ---------------------------------------

    /// Explicit user play. Writes user intent immediately; the transport
    /// request runs in the background and only its completion may change
    /// the system mode. While a load is in flight the intent is recorded
    /// but no transport request is issued; load completion re-derives
    /// whether to play from the recorded intent.
    fn manual_play(&mut self) -> Result<()> {
        if !self.gate.is_manual_control_enabled() {
            return Err(Error::InvalidState(
                "manual playback control is disabled in motion mode".into(),
            ));
        }
        if self.state.current_track_id.is_none() {
            return Err(Error::InvalidState("no track loaded".into()));
        }

        if self.state.user_mode != UserMode::Playing {
            self.state.user_mode = UserMode::Playing;
            self.emit_playback_state();
        }
        if self.state.system_mode != SystemMode::Loading {
            self.spawn_play();
        }
        Ok(())
    }

    fn manual_pause(&mut self) -> Result<()> {
        if !self.gate.is_manual_control_enabled() {
            return Err(Error::InvalidState(
                "manual playback control is disabled in motion mode".into(),
            ));
        }
        if self.state.current_track_id.is_none() {
            return Err(Error::InvalidState("no track loaded".into()));
        }

        if self.state.user_mode != UserMode::Paused {
            self.state.user_mode = UserMode::Paused;
            self.emit_playback_state();
        }
        if self.state.system_mode != SystemMode::Loading {
            self.spawn_pause();
        }
        Ok(())
    }

    fn step_track(&mut self, forward: bool) -> Result<()> {
        let next = match self.state.current_track_id.as_deref() {
            Some(current) => {
                let stepped = if forward {
                    self.catalog.next_id(current)
                } else {
                    self.catalog.previous_id(current)
                };
                stepped.ok_or_else(|| Error::TrackNotFound(current.to_string()))?
            }
            None => self
                .catalog
                .first_id()
                .ok_or_else(|| Error::Catalog("playlist is empty".into()))?,
        };
        self.start_load(&next.to_string())
    }

    fn seek(&mut self, position_s: f64) -> Result<()> {
        if self.state.current_track_id.is_none() {
            return Err(Error::InvalidState("no track loaded".into()));
        }
        if !position_s.is_finite() {
            return Err(Error::BadRequest("seek position must be finite".into()));
        }

        let clamped = position_s.clamp(0.0, self.state.duration_s);
        self.state.position_s = clamped;
        self.emit_progress();

        let transport = Arc::clone(&self.transport);
        tokio::spawn(async move {
            transport.lock().await.seek(clamped);
        });
        Ok(())
    }

    async fn set_volume(&mut self, requested: f64) -> Result<f64> {
        if !requested.is_finite() {
            return Err(Error::BadRequest("volume must be finite".into()));
        }

        let applied = volume::apply_safety_limits(requested.clamp(0.0, 1.0));
        self.state.volume = applied;

        let transport = Arc::clone(&self.transport);
        tokio::spawn(async move {
            transport.lock().await.set_volume(applied);
        });

        if let Err(e) = settings::set_volume(&self.db, applied).await {
            warn!("Failed to persist volume: {}", e);
        }
        self.emit(PlayerEvent::VolumeChanged {
            volume: applied,
            timestamp: Utc::now(),
        });
        Ok(applied)
    }

    async fn set_auto_advance(&mut self, enabled: bool) -> Result<()> {
        if self.state.auto_advance != enabled {
            self.state.auto_advance = enabled;
            if let Err(e) = settings::set_auto_advance(&self.db, enabled).await {
                warn!("Failed to persist auto-advance: {}", e);
            }
            self.emit(PlayerEvent::AutoAdvanceChanged {
                enabled,
                timestamp: Utc::now(),
            });
        }
        Ok(())
    }

    // --- Motion control ----------------------------------------------

    async fn set_control_mode(&mut self, mode: ControlMode) -> Result<ControlMode> {
        let previous = self.gate.mode();
        let was_moving = self.classifier.is_moving();

        let sample_tx = self.tx.clone();
        let now = self.gate.set_mode(mode, &mut self.classifier, move || {
            SampleSink::new(move |sample| {
                let _ = sample_tx.send(Command::MotionSample { sample });
            })
        })?;

        if now != previous {
            if let Err(e) = settings::set_control_mode(&self.db, now).await {
                warn!("Failed to persist control mode: {}", e);
            }
            self.emit(PlayerEvent::ControlModeChanged {
                mode: now,
                timestamp: Utc::now(),
            });
            if was_moving && !self.classifier.is_moving() {
                self.emit(PlayerEvent::MotionStateChanged {
                    is_moving: false,
                    timestamp: Utc::now(),
                });
            }
        }
        Ok(now)
    }

    async fn request_permission(&mut self) -> Result<bool> {
        let granted = self.gate.request_permission().await?;
        self.emit(PlayerEvent::PermissionChanged {
            granted,
            timestamp: Utc::now(),
        });
        Ok(granted)
    }

    async fn set_sensitivity(&mut self, sensitivity: u8) -> Result<()> {
        self.classifier.set_sensitivity(sensitivity).map_err(|s| {
            Error::BadRequest(format!("sensitivity {} is out of range (0-100)", s))
        })?;

        if let Err(e) = settings::set_motion_sensitivity(&self.db, sensitivity).await {
            warn!("Failed to persist sensitivity: {}", e);
        }
        self.emit(PlayerEvent::SensitivityChanged {
            sensitivity,
            threshold: self.classifier.threshold(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Samples are only classified while motion mode is active. A sample
    /// queued behind a switch back to Manual arrives here after the switch
    /// and is dropped, so no stale reading can flip playback afterwards.
    fn ingest_motion_sample(&mut self, sample: MotionSample) {
        if !self.gate.is_motion_active() {
            debug!("Dropping motion sample outside motion mode");
            return;
        }

        if let Some(is_moving) = self.classifier.ingest_sample(sample, Instant::now()) {
            info!("Motion state committed: {}", if is_moving { "moving" } else { "still" });
            self.emit(PlayerEvent::MotionStateChanged {
                is_moving,
                timestamp: Utc::now(),
            });

            if self.state.current_track_id.is_none()
                || self.state.system_mode == SystemMode::Loading
            {
                return;
            }
            if is_moving && !self.state.is_audible && self.state.visible {
                self.spawn_play();
            } else if !is_moving && self.state.is_audible {
                self.spawn_pause();
            }
        }
    }

    // --- Visibility --------------------------------------------------

    fn set_visibility(&mut self, visible: bool) {
        if self.state.visible == visible {
            return;
        }
        self.state.visible = visible;

        if !visible {
            // Hidden: silence unconditionally, leaving user intent alone so
            // the restore path below can re-derive it.
            if self.state.is_audible {
                self.spawn_pause();
            }
        } else {
            let wants_playback = self.state.user_mode == UserMode::Playing
                && self.motion_allows_playback();
            if wants_playback
                && !self.state.is_audible
                && self.state.system_mode != SystemMode::Loading
                && self.state.current_track_id.is_some()
            {
                self.spawn_play();
            }
        }
    }

    // --- Track loading -----------------------------------------------

    /// Begin loading a track (manual selection, next/previous, or
    /// auto-advance all end up here)
    fn start_load(&mut self, track_id: &str) -> Result<()> {
        let track = self
            .catalog
            .get(track_id)
            .cloned()
            .ok_or_else(|| Error::TrackNotFound(track_id.to_string()))?;

        self.state.current_track_id = Some(track.id.clone());
        self.state.position_s = 0.0;
        self.state.duration_s = track.duration_seconds().map(f64::from).unwrap_or(0.0);

        info!("Loading track {} ({})", track.id, track.title);
        self.emit(PlayerEvent::TrackChanged {
            track_id: track.id.clone(),
            title: track.title.clone(),
            timestamp: Utc::now(),
        });
        self.set_system(SystemMode::Loading, false);

        let file = track.file.clone();
        let id = track.id.clone();
        let transport = Arc::clone(&self.transport);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = transport
                .lock()
                .await
                .load(&file)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(Command::LoadFinished {
                track_id: id,
                result,
            });
        });
        Ok(())
    }

    /// Load completions are tagged with the track they loaded; a completion
    /// for anything other than the current track is stale (the user moved on
    /// while it was in flight) and is discarded.
    fn handle_load_finished(
        &mut self,
        track_id: String,
        result: std::result::Result<(), String>,
    ) {
        if self.state.current_track_id.as_deref() != Some(track_id.as_str()) {
            debug!("Ignoring stale load completion for track {}", track_id);
            return;
        }

        match result {
            Err(message) => {
                error!("Track {} failed to load: {}", track_id, message);
                self.emit(PlayerEvent::TrackLoadFailed {
                    track_id,
                    message,
                    timestamp: Utc::now(),
                });
                // User intent is untouched; with auto-advance on, intent
                // set by the advance step survives for the next attempt.
                self.set_system(SystemMode::Paused, false);
            }
            Ok(()) => {
                let should_play = self.state.user_mode == UserMode::Playing
                    && self.motion_allows_playback()
                    && self.state.visible;
                if should_play {
                    // System mode stays Loading until the play completion
                    // lands; a user pause recorded meanwhile is re-checked
                    // there via the ordinary pause path.
                    self.spawn_play();
                } else {
                    self.set_system(SystemMode::Paused, false);
                }
            }
        }
    }

    fn handle_play_finished(&mut self, result: std::result::Result<(), String>) {
        match result {
            Ok(()) => {
                // Re-derive intent: a pause may have been queued while the
                // play request was in flight.
                if self.state.user_mode == UserMode::Paused
                    && self.gate.is_manual_control_enabled()
                {
                    self.spawn_pause();
                    return;
                }
                self.set_system(SystemMode::Playing, true);
            }
            Err(message) => {
                error!("Transport play failed: {}", message);
                self.emit(PlayerEvent::PlaybackError {
                    message,
                    timestamp: Utc::now(),
                });
                self.set_system(SystemMode::Paused, false);
            }
        }
    }

    // --- Transport events --------------------------------------------

    fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Play => self.set_system(SystemMode::Playing, true),
            TransportEvent::Pause => self.set_system(SystemMode::Paused, false),
            TransportEvent::TimeUpdate(position_s) => {
                self.state.position_s = position_s;
                self.emit_progress();
            }
            TransportEvent::DurationChange(duration_s) => {
                self.state.duration_s = duration_s;
            }
            TransportEvent::Ended => self.handle_track_ended(),
            TransportEvent::Error(message) => {
                error!("Transport error: {}", message);
                self.emit(PlayerEvent::PlaybackError {
                    message,
                    timestamp: Utc::now(),
                });
                self.set_system(SystemMode::Paused, false);
            }
            TransportEvent::LoadStart | TransportEvent::LoadEnd => {
                debug!("Transport event: {:?}", event);
            }
        }
    }

    /// Auto-advance. Audibility at the moment the track ended is captured
    /// before any state is cleared: a track that played to its end should
    /// roll into the next one even if the user never pressed play this
    /// session, and a user who pressed play during a failed load should get
    /// their wish on the next track.
    fn handle_track_ended(&mut self) {
        let was_audible = self.state.is_audible;
        self.state.position_s = 0.0;
        self.set_system(SystemMode::Paused, false);

        if !self.state.auto_advance {
            debug!("Track ended; auto-advance disabled");
            return;
        }

        let next = match self
            .state
            .current_track_id
            .as_deref()
            .and_then(|id| self.catalog.next_id(id))
        {
            Some(id) => id.to_string(),
            None => return,
        };

        let user_wants_play = self.state.user_mode == UserMode::Playing;
        let should_continue = was_audible || user_wants_play;
        self.state.user_mode = if should_continue {
            UserMode::Playing
        } else {
            UserMode::Paused
        };
        self.emit_playback_state();

        if let Err(e) = self.start_load(&next) {
            error!("Auto-advance failed: {}", e);
        }
    }

    // --- Helpers ------------------------------------------------------

    fn motion_allows_playback(&self) -> bool {
        match self.gate.mode() {
            ControlMode::Manual => true,
            ControlMode::Motion => self.classifier.is_moving(),
        }
    }

    fn spawn_play(&self) {
        let transport = Arc::clone(&self.transport);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = transport
                .lock()
                .await
                .play()
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(Command::PlayFinished { result });
        });
    }

    fn spawn_pause(&self) {
        let transport = Arc::clone(&self.transport);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            transport.lock().await.pause();
            let _ = tx.send(Command::Transport(TransportEvent::Pause));
        });
    }

    fn set_system(&mut self, mode: SystemMode, audible: bool) {
        if self.state.system_mode == mode && self.state.is_audible == audible {
            return;
        }
        self.state.system_mode = mode;
        self.state.is_audible = audible;
        self.emit_playback_state();
    }

    fn emit_playback_state(&self) {
        self.emit(PlayerEvent::PlaybackStateChanged {
            user_mode: self.state.user_mode,
            system_mode: self.state.system_mode,
            is_audible: self.state.is_audible,
            timestamp: Utc::now(),
        });
    }

    fn emit_progress(&self) {
        if let Some(track_id) = self.state.current_track_id.as_ref() {
            self.emit(PlayerEvent::PlaybackProgress {
                track_id: track_id.clone(),
                position_s: self.state.position_s,
                duration_s: self.state.duration_s,
                timestamp: Utc::now(),
            });
        }
    }

    fn emit(&self, event: PlayerEvent) {
        self.events.emit_lossy(event);
    }

    fn status(&self) -> PlayerStatus {
        let track_title = self
            .state
            .current_track_id
            .as_deref()
            .and_then(|id| self.catalog.get(id))
            .map(|t| t.title.clone());

        PlayerStatus {
            track_id: self.state.current_track_id.clone(),
            track_title,
            user_mode: self.state.user_mode,
            system_mode: self.state.system_mode,
            is_audible: self.state.is_audible,
            position_s: self.state.position_s,
            duration_s: self.state.duration_s,
            volume: self.state.volume,
            auto_advance: self.state.auto_advance,
            control_mode: self.gate.mode(),
            sensor_available: self.gate.sensor_available(),
            has_permission: self.gate.has_permission(),
            visible: self.state.visible,
            motion: self.classifier.snapshot(),
        }
    }
}
