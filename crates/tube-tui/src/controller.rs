//! Playback controller — single-owner event loop for all playback state.
//!
//! All tasks that need to change playback send `Command`s into this loop.
//! The controller owns `PlayerState` and the `MpvDriver` exclusively; no
//! other task touches them.  After each event that mutates state it
//! broadcasts a fresh `PlayerState` snapshot to the UI.
//!
//! Starting playback is two-phase: the resolver runs on its own task and
//! reports back with the generation it was started under.  The controller
//! only acts on results whose generation still matches; anything else is a
//! leftover from a session the user already abandoned.

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use tube_core::session::{
    validate_page_url, Command, PlaybackStatus, PlayerError, PlayerState, SessionInfo,
};

use crate::mpv::{MpvDriver, MpvEvent, MpvHandle};
use crate::resolver::{self, ResolvedStream};
use crate::BroadcastMessage;

/// Feedback from background work into the controller loop.  UI commands
/// arrive on their own channel; these carry everything else.
#[derive(Debug)]
enum ControllerEvent {
    /// A background resolve completed (possibly for a stale generation).
    ResolveFinished {
        generation: u64,
        page_url: String,
        result: Result<ResolvedStream, PlayerError>,
    },
    /// Raw mpv unsolicited event (forwarded from the IO task).
    Mpv(MpvEvent),
}

// ── pure state machine ────────────────────────────────────────────────────────

/// Playback state transitions, separated from IO so they can be tested
/// without an mpv process.  Every mutating method answers whether it applied;
/// callers broadcast only when it did.
struct ControllerState {
    state: PlayerState,
}

impl ControllerState {
    fn new(volume: u8) -> Self {
        Self {
            state: PlayerState {
                volume: volume.min(100),
                ..PlayerState::default()
            },
        }
    }

    fn snapshot(&self) -> PlayerState {
        self.state.clone()
    }

    /// Validate the URL and enter `Loading`.  Bumps the generation so any
    /// in-flight resolve from a previous start becomes stale.  Returns the
    /// new generation for the background task to carry.
    fn begin_start(&mut self, url: &str) -> Result<u64, PlayerError> {
        validate_page_url(url)?;
        self.state.generation += 1;
        self.state.status = PlaybackStatus::Loading;
        self.state.session = None;
        Ok(self.state.generation)
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.state.generation
    }

    /// A resolve for `generation` failed.  Applies only when current and
    /// still loading.
    fn resolve_failed(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) || self.state.status != PlaybackStatus::Loading {
            return false;
        }
        self.state.status = PlaybackStatus::Idle;
        true
    }

    /// The stream for `generation` was handed to the player.
    fn attach_succeeded(&mut self, generation: u64, session: SessionInfo) -> bool {
        if !self.is_current(generation) || self.state.status != PlaybackStatus::Loading {
            return false;
        }
        self.state.status = PlaybackStatus::Playing;
        self.state.session = Some(session);
        true
    }

    /// The player rejected the stream for `generation`.
    fn attach_failed(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) || self.state.status != PlaybackStatus::Loading {
            return false;
        }
        self.state.status = PlaybackStatus::Idle;
        true
    }

    /// Stop whatever is happening.  No-op when already idle.  Bumps the
    /// generation so a resolve still in flight gets discarded on arrival.
    fn stop(&mut self) -> bool {
        if self.state.status == PlaybackStatus::Idle {
            return false;
        }
        self.state.generation += 1;
        self.state.status = PlaybackStatus::Idle;
        self.state.session = None;
        true
    }

    /// The player reached the end of the stream on its own.
    fn playback_ended(&mut self) -> bool {
        if self.state.status != PlaybackStatus::Playing {
            return false;
        }
        self.state.generation += 1;
        self.state.status = PlaybackStatus::Idle;
        self.state.session = None;
        true
    }

    /// The player process died underneath us.
    fn player_died(&mut self) -> bool {
        if self.state.status == PlaybackStatus::Idle {
            return false;
        }
        self.state.generation += 1;
        self.state.status = PlaybackStatus::Idle;
        self.state.session = None;
        true
    }

    /// Remember the volume.  Returns the clamped value actually stored.
    fn set_volume(&mut self, value: u8) -> u8 {
        self.state.volume = value.min(100);
        self.state.volume
    }

    fn has_session(&self) -> bool {
        self.state.session.is_some()
    }
}

// ── controller ────────────────────────────────────────────────────────────────

pub struct Controller {
    state: ControllerState,
    mpv_driver: MpvDriver,
    /// Live handle to the mpv IO task.  `None` until first playback.
    mpv_handle: Option<MpvHandle>,
    broadcast_tx: broadcast::Sender<BroadcastMessage>,
    /// Sender for feeding events back into our own loop (resolver results,
    /// mpv events).
    event_tx: mpsc::Sender<ControllerEvent>,
    event_rx: Option<mpsc::Receiver<ControllerEvent>>,
}

impl Controller {
    pub fn new(default_volume: u8, broadcast_tx: broadcast::Sender<BroadcastMessage>) -> Self {
        let (event_tx, event_rx) = mpsc::channel::<ControllerEvent>(64);
        Self {
            state: ControllerState::new(default_volume),
            mpv_driver: MpvDriver::new(),
            mpv_handle: None,
            broadcast_tx,
            event_tx,
            event_rx: Some(event_rx),
        }
    }

    /// Run the controller event loop.  Returns when the command channel is
    /// closed (UI exited).
    pub async fn run(mut self, mut command_rx: mpsc::Receiver<Command>) -> anyhow::Result<()> {
        info!("controller: starting event loop");

        let mut event_rx = self
            .event_rx
            .take()
            .ok_or_else(|| anyhow::anyhow!("controller already running"))?;

        let mut heartbeat = tokio::time::interval(tokio::time::Duration::from_secs(10));
        heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // Initial snapshot so the UI renders the configured volume.
        self.broadcast_state();

        loop {
            tokio::select! {
                cmd = command_rx.recv() => {
                    let Some(cmd) = cmd else {
                        info!("controller: command channel closed, shutting down");
                        break;
                    };
                    info!("controller: command {:?}", cmd);
                    self.handle_command(cmd).await;
                }

                Some(evt) = event_rx.recv() => match evt {
                    ControllerEvent::ResolveFinished {
                        generation,
                        page_url,
                        result,
                    } => {
                        self.handle_resolve_finished(generation, page_url, result).await;
                    }
                    ControllerEvent::Mpv(evt) => {
                        self.handle_mpv_event(evt);
                    }
                },

                _ = heartbeat.tick() => {
                    if self.mpv_handle.is_some() && !self.mpv_driver.process_alive() {
                        warn!("controller: heartbeat: mpv process died");
                        self.mpv_handle = None;
                        if self.state.player_died() {
                            self.broadcast_error("player exited unexpectedly");
                            self.broadcast_state();
                        }
                    }
                }
            }
        }

        self.mpv_driver.kill().await;
        Ok(())
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Start { url } => {
                let generation = match self.state.begin_start(&url) {
                    Ok(g) => g,
                    Err(e) => {
                        // Rejected before any background work starts.
                        self.broadcast_error(e.to_string());
                        return;
                    }
                };
                self.broadcast_state();

                let resolve_tx = self.event_tx.clone();
                tokio::spawn(async move {
                    let result = resolver::resolve(&url).await;
                    let _ = resolve_tx
                        .send(ControllerEvent::ResolveFinished {
                            generation,
                            page_url: url,
                            result,
                        })
                        .await;
                });
            }

            Command::Stop => {
                if !self.state.stop() {
                    return;
                }
                if let Some(handle) = &self.mpv_handle {
                    if let Err(e) = handle.stop().await {
                        warn!("controller: stop failed: {}", e);
                    }
                }
                self.broadcast_state();
            }

            Command::Volume { value } => {
                let applied = self.state.set_volume(value);
                // Pushed to the live player only while something is loaded.
                if self.state.has_session() {
                    if let Some(handle) = &self.mpv_handle {
                        if let Err(e) = handle.set_volume(applied).await {
                            warn!("controller: set_volume failed: {}", e);
                        }
                    }
                }
                self.broadcast_state();
            }
        }
    }

    async fn handle_resolve_finished(
        &mut self,
        generation: u64,
        page_url: String,
        result: Result<ResolvedStream, PlayerError>,
    ) {
        if !self.state.is_current(generation) {
            debug!("controller: discarding stale resolve gen={}", generation);
            return;
        }

        let resolved = match result {
            Ok(r) => r,
            Err(e) => {
                if self.state.resolve_failed(generation) {
                    error!("controller: resolve failed: {}", e);
                    self.broadcast_error(e.to_string());
                    self.broadcast_state();
                }
                return;
            }
        };

        // Resolve done; hand the stream to mpv.
        match self.attach(&resolved).await {
            Ok(()) => {
                let session = SessionInfo {
                    page_url,
                    stream_url: resolved.stream_url.clone(),
                    title: resolved.title.clone(),
                };
                if self.state.attach_succeeded(generation, session) {
                    self.broadcast_log(format!("Playing: {}", resolved.title));
                    self.broadcast_state();
                }
            }
            Err(e) => {
                if self.state.attach_failed(generation) {
                    error!("controller: attach failed: {}", e);
                    self.broadcast_error(PlayerError::Attach(e.to_string()).to_string());
                    self.broadcast_state();
                }
            }
        }
    }

    /// Make sure an mpv process is up and load the stream into it.
    async fn attach(&mut self, resolved: &ResolvedStream) -> anyhow::Result<()> {
        let need_spawn = match &self.mpv_handle {
            None => true,
            Some(handle) => {
                !self.mpv_driver.process_alive() || handle.ping().await.is_err()
            }
        };

        if need_spawn {
            let (mpv_event_tx, mut mpv_event_rx) = mpsc::channel::<MpvEvent>(64);
            let handle = self
                .mpv_driver
                .spawn_and_connect(self.state.snapshot().volume, mpv_event_tx)
                .await?;
            self.mpv_handle = Some(handle);

            // Pipe mpv events back into the controller loop.
            let forward_tx = self.event_tx.clone();
            tokio::spawn(async move {
                while let Some(evt) = mpv_event_rx.recv().await {
                    if forward_tx.send(ControllerEvent::Mpv(evt)).await.is_err() {
                        break;
                    }
                }
            });
        }

        let handle = self
            .mpv_handle
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("no mpv handle"))?;
        handle
            .load_stream(&resolved.stream_url, self.state.snapshot().volume)
            .await
    }

    fn handle_mpv_event(&mut self, evt: MpvEvent) {
        if evt.event_name() != Some("end-file") || !self.state.playback_ended() {
            return;
        }
        match evt.end_file_reason() {
            Some("error") | Some("network") => {
                warn!("controller: stream died: {:?}", evt.raw);
                self.broadcast_error("stream ended with an error");
            }
            _ => {
                info!("controller: playback reached end of stream");
                self.broadcast_log("Playback finished");
            }
        }
        self.broadcast_state();
    }

    fn broadcast_state(&self) {
        let _ = self
            .broadcast_tx
            .send(BroadcastMessage::State(self.state.snapshot()));
    }

    fn broadcast_log(&self, msg: impl Into<String>) {
        let _ = self.broadcast_tx.send(BroadcastMessage::Log(msg.into()));
    }

    fn broadcast_error(&self, msg: impl Into<String>) {
        let _ = self.broadcast_tx.send(BroadcastMessage::Error(msg.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing_state(volume: u8) -> ControllerState {
        let mut s = ControllerState::new(volume);
        let generation = s.begin_start("https://youtu.be/abc").unwrap();
        assert!(s.attach_succeeded(
            generation,
            SessionInfo {
                page_url: "https://youtu.be/abc".into(),
                stream_url: "https://cdn.example/a.m4a".into(),
                title: "Some Mix".into(),
            }
        ));
        s
    }

    #[test]
    fn test_invalid_url_never_leaves_idle() {
        let mut s = ControllerState::new(100);
        let gen_before = s.snapshot().generation;
        match s.begin_start("not a url") {
            Err(PlayerError::Validation(_)) => {}
            other => panic!("expected validation error, got {other:?}"),
        }
        let snap = s.snapshot();
        assert_eq!(snap.status, PlaybackStatus::Idle);
        assert_eq!(snap.generation, gen_before);
    }

    #[test]
    fn test_start_enters_loading_and_bumps_generation() {
        let mut s = ControllerState::new(100);
        let generation = s.begin_start("https://youtu.be/abc").unwrap();
        let snap = s.snapshot();
        assert_eq!(snap.status, PlaybackStatus::Loading);
        assert_eq!(snap.generation, generation);
        assert!(snap.session.is_none());
    }

    #[test]
    fn test_resolve_failure_returns_to_idle() {
        let mut s = ControllerState::new(100);
        let generation = s.begin_start("https://youtu.be/abc").unwrap();
        assert!(s.resolve_failed(generation));
        assert_eq!(s.snapshot().status, PlaybackStatus::Idle);
    }

    #[test]
    fn test_stale_resolve_is_discarded() {
        let mut s = ControllerState::new(100);
        let first = s.begin_start("https://youtu.be/abc").unwrap();
        let second = s.begin_start("https://youtu.be/def").unwrap();
        assert_ne!(first, second);

        // The first resolve coming back late must not touch state.
        assert!(!s.is_current(first));
        assert!(!s.resolve_failed(first));
        assert!(!s.attach_succeeded(
            first,
            SessionInfo {
                page_url: String::new(),
                stream_url: "https://cdn.example/stale.m4a".into(),
                title: "Stale".into(),
            }
        ));
        assert_eq!(s.snapshot().status, PlaybackStatus::Loading);
        assert_eq!(s.snapshot().generation, second);
    }

    #[test]
    fn test_resolve_after_stop_is_discarded() {
        let mut s = ControllerState::new(100);
        let generation = s.begin_start("https://youtu.be/abc").unwrap();
        assert!(s.stop());
        assert!(!s.attach_succeeded(
            generation,
            SessionInfo {
                page_url: String::new(),
                stream_url: "https://cdn.example/a.m4a".into(),
                title: "Some Mix".into(),
            }
        ));
        assert_eq!(s.snapshot().status, PlaybackStatus::Idle);
    }

    #[test]
    fn test_attach_success_enters_playing_with_session() {
        let s = playing_state(80);
        let snap = s.snapshot();
        assert_eq!(snap.status, PlaybackStatus::Playing);
        assert_eq!(snap.session.as_ref().unwrap().title, "Some Mix");
    }

    #[test]
    fn test_stop_while_playing_clears_session() {
        let mut s = playing_state(80);
        assert!(s.stop());
        let snap = s.snapshot();
        assert_eq!(snap.status, PlaybackStatus::Idle);
        assert!(snap.session.is_none());
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let mut s = ControllerState::new(100);
        let gen_before = s.snapshot().generation;
        assert!(!s.stop());
        assert_eq!(s.snapshot().generation, gen_before);
    }

    #[test]
    fn test_volume_is_clamped_and_kept_while_idle() {
        let mut s = ControllerState::new(100);
        assert_eq!(s.set_volume(250), 100);
        assert_eq!(s.set_volume(30), 30);
        assert!(!s.has_session());
        assert_eq!(s.snapshot().volume, 30);
    }

    #[test]
    fn test_end_file_only_applies_while_playing() {
        let mut s = ControllerState::new(100);
        assert!(!s.playback_ended());

        let mut s = playing_state(100);
        assert!(s.playback_ended());
        assert_eq!(s.snapshot().status, PlaybackStatus::Idle);
    }

    #[test]
    fn test_player_death_while_loading_returns_to_idle() {
        let mut s = ControllerState::new(100);
        s.begin_start("https://youtu.be/abc").unwrap();
        assert!(s.player_died());
        assert_eq!(s.snapshot().status, PlaybackStatus::Idle);
    }

    fn end_file(reason: &str) -> MpvEvent {
        MpvEvent {
            raw: serde_json::json!({"event": "end-file", "reason": reason}),
        }
    }

    #[test]
    fn test_end_file_error_reason_broadcasts_error() {
        let (tx, mut rx) = broadcast::channel(16);
        let mut c = Controller::new(100, tx);
        c.state = playing_state(100);
        c.handle_mpv_event(end_file("error"));
        match rx.try_recv().unwrap() {
            BroadcastMessage::Error(msg) => assert!(msg.contains("error")),
            other => panic!("expected error broadcast, got {other:?}"),
        }
        assert_eq!(c.state.snapshot().status, PlaybackStatus::Idle);
    }

    #[test]
    fn test_end_file_eof_reason_finishes_quietly() {
        let (tx, mut rx) = broadcast::channel(16);
        let mut c = Controller::new(100, tx);
        c.state = playing_state(100);
        c.handle_mpv_event(end_file("eof"));
        match rx.try_recv().unwrap() {
            BroadcastMessage::Log(msg) => assert_eq!(msg, "Playback finished"),
            other => panic!("expected log broadcast, got {other:?}"),
        }
    }
}
