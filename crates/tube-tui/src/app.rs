//! App — the TUI event loop.
//!
//! - `App` owns the saved-URL store and all widgets.
//! - A `tokio::mpsc` channel carries `AppMessage` events in from background
//!   tasks (keyboard reader, controller broadcasts).
//! - The event loop draws each frame, then awaits the next message.
//! - Commands to the playback controller flow out through `command_tx`.

use std::io;
use std::time::Duration;

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame, Terminal,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use tube_core::session::{validate_page_url, Command, PlaybackStatus, PlayerState};
use tube_core::store::{SavedUrl, StoreError, UrlStore};

use crate::theme::{style_muted, C_BG};
use crate::widgets::{
    controls::Controls,
    saved_list::SavedList,
    status_line::StatusLine,
    url_input::{InputAction, UrlInput},
};
use crate::BroadcastMessage;

enum AppMessage {
    Event(Event),
    Broadcast(BroadcastMessage),
}

/// Which widget currently receives keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Normal,
    EditUrl,
    SaveName,
}

pub struct App {
    store: UrlStore,
    command_tx: mpsc::Sender<Command>,
    /// Latest snapshot broadcast by the controller.
    player: PlayerState,
    mode: InputMode,
    url_input: UrlInput,
    name_input: UrlInput,
    saved_list: SavedList,
    status: StatusLine,
    should_quit: bool,
}

impl App {
    pub fn new(store: UrlStore, command_tx: mpsc::Sender<Command>, default_volume: u8) -> Self {
        Self {
            store,
            command_tx,
            player: PlayerState {
                volume: default_volume.min(100),
                ..PlayerState::default()
            },
            mode: InputMode::Normal,
            url_input: UrlInput::new("URL", "paste a video URL, press e to edit"),
            name_input: UrlInput::new("Save as", "name for this URL"),
            saved_list: SavedList::new(),
            status: StatusLine::new(),
            should_quit: false,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(
        mut self,
        mut broadcast_rx: broadcast::Receiver<BroadcastMessage>,
    ) -> anyhow::Result<()> {
        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let (tx, mut rx) = mpsc::channel::<AppMessage>(256);

        // ── Background task: keyboard events ──────────────────────────────────
        let event_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Background task: controller broadcasts ────────────────────────────
        let bc_tx = tx.clone();
        tokio::spawn(async move {
            loop {
                match broadcast_rx.recv().await {
                    Ok(msg) => {
                        if bc_tx.send(AppMessage::Broadcast(msg)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("broadcast receiver lagged by {} messages", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        // Status-flash expiry check.
        let mut ui_tick = tokio::time::interval(Duration::from_millis(100));
        ui_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    needs_redraw = self.handle_message(msg).await;
                }
                _ = ui_tick.tick() => {
                    self.status.tick();
                    needs_redraw = true;
                }
            }
        }

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        Ok(())
    }

    // ── Message handling ──────────────────────────────────────────────────────

    async fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                self.handle_key(key).await;
                true
            }
            AppMessage::Event(Event::Resize(_, _)) => true,
            AppMessage::Event(_) => false,
            AppMessage::Broadcast(msg) => {
                match msg {
                    BroadcastMessage::State(state) => self.player = state,
                    BroadcastMessage::Log(s) => self.status.success(s),
                    BroadcastMessage::Error(s) => self.status.error(s),
                }
                true
            }
        }
    }

    async fn handle_key(&mut self, key: KeyEvent) {
        // Ctrl-C quits from any mode.
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.mode {
            InputMode::EditUrl => match self.url_input.handle_key(key) {
                InputAction::Confirmed(_) | InputAction::Cancelled => {
                    self.mode = InputMode::Normal;
                }
                InputAction::None => {}
            },

            InputMode::SaveName => match self.name_input.handle_key(key) {
                InputAction::Confirmed(name) => {
                    self.mode = InputMode::Normal;
                    self.save_current_url(&name);
                }
                InputAction::Cancelled => {
                    self.mode = InputMode::Normal;
                }
                InputAction::None => {}
            },

            InputMode::Normal => self.handle_normal_key(key).await,
        }
    }

    async fn handle_normal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,

            KeyCode::Enter | KeyCode::Char(' ') => self.toggle_playback().await,

            KeyCode::Char('e') | KeyCode::Char('/') => {
                self.mode = InputMode::EditUrl;
                self.url_input.activate();
            }

            KeyCode::Char('s') => {
                // Only well-formed URLs may enter the store.
                match validate_page_url(self.url_input.text()) {
                    Ok(()) => {
                        self.mode = InputMode::SaveName;
                        self.name_input.clear();
                        self.name_input.activate();
                    }
                    Err(e) => self.status.error(e.to_string()),
                }
            }

            KeyCode::Char('d') => self.delete_selected(),

            KeyCode::Down | KeyCode::Char('j') => {
                self.saved_list.select_next(self.store.len());
                self.load_selected();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.saved_list.select_prev(self.store.len());
                self.load_selected();
            }

            KeyCode::Left => self.nudge_volume(-5).await,
            KeyCode::Right => self.nudge_volume(5).await,

            _ => {}
        }
    }

    // ── Actions ───────────────────────────────────────────────────────────────

    async fn toggle_playback(&mut self) {
        match self.player.status {
            PlaybackStatus::Loading => {
                // Toggling is disabled until the pending start settles.
                self.status.info("still loading…");
            }
            PlaybackStatus::Playing => {
                let _ = self.command_tx.send(Command::Stop).await;
            }
            PlaybackStatus::Idle => {
                let url = self.url_input.text().trim().to_string();
                let _ = self.command_tx.send(Command::Start { url }).await;
            }
        }
    }

    async fn nudge_volume(&mut self, delta: i16) {
        let value = (self.player.volume as i16 + delta).clamp(0, 100) as u8;
        // Update locally for immediate feedback; the controller echoes it back.
        self.player.volume = value;
        let _ = self.command_tx.send(Command::Volume { value }).await;
    }

    fn save_current_url(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            self.status.error("please enter a name");
            return;
        }
        let url = self.url_input.text().trim().to_string();
        if let Err(e) = validate_page_url(&url) {
            self.status.error(e.to_string());
            return;
        }
        match self.store.add(SavedUrl::new(name, url)) {
            Ok(()) => self.status.success(format!("Saved: {name}")),
            Err(StoreError::AlreadyExists) => self.status.error("this URL is already saved"),
            Err(e) => self.status.error(format!("could not save: {e}")),
        }
    }

    fn delete_selected(&mut self) {
        let Some(idx) = self.saved_list.selected() else {
            self.status.error("nothing selected");
            return;
        };
        let Some(entry) = self.store.entries().get(idx).cloned() else {
            return;
        };
        match self.store.remove(&entry.encode()) {
            Ok(()) => {
                self.status.info(format!("Deleted: {}", entry.name));
                self.saved_list.clamp(self.store.len());
            }
            Err(e) => self.status.error(format!("could not delete: {e}")),
        }
    }

    /// Copy the selected entry's URL into the URL field.
    fn load_selected(&mut self) {
        let Some(idx) = self.saved_list.selected() else {
            return;
        };
        if let Some(entry) = self.store.entries().get(idx) {
            self.url_input.set_value(&entry.url);
            self.status.info(format!("Loaded: {}", entry.name));
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(Style::default().bg(C_BG)), area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // URL field
                Constraint::Length(4), // playback controls
                Constraint::Min(3),    // saved list
                Constraint::Length(1), // status line
                Constraint::Length(1), // key hints
            ])
            .split(area);

        self.url_input.draw(frame, rows[0]);
        Controls::draw(frame, rows[1], &self.player);

        if self.mode == InputMode::SaveName {
            let prompt = Rect {
                height: rows[2].height.min(3),
                ..rows[2]
            };
            self.name_input.draw(frame, prompt);
        } else {
            self.saved_list
                .draw(frame, rows[2], self.store.entries(), self.mode == InputMode::Normal);
        }

        self.status.draw(frame, rows[3]);

        let hints = match self.mode {
            InputMode::Normal => {
                " enter play/stop · e edit url · s save · d delete · ↑↓ select · ←→ volume · q quit"
            }
            InputMode::EditUrl | InputMode::SaveName => " enter confirm · esc cancel",
        };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(hints, style_muted()))),
            rows[4],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app() -> (tempfile::TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let store = UrlStore::load(dir.path().join("saved_urls.json"));
        let (tx, _rx) = mpsc::channel(8);
        (dir, App::new(store, tx, 100))
    }

    #[test]
    fn test_save_rejects_invalid_url() {
        let (_dir, mut app) = test_app();
        app.url_input.set_value("not a url");
        app.save_current_url("Music");
        assert!(app.store.is_empty());
    }

    #[test]
    fn test_save_rejects_empty_name() {
        let (_dir, mut app) = test_app();
        app.url_input.set_value("https://youtu.be/abc");
        app.save_current_url("   ");
        assert!(app.store.is_empty());
    }

    #[test]
    fn test_save_valid_url_enters_store() {
        let (_dir, mut app) = test_app();
        app.url_input.set_value("https://youtu.be/abc");
        app.save_current_url("Music");
        assert_eq!(app.store.len(), 1);
        assert_eq!(app.store.entries()[0].encode(), "Music - https://youtu.be/abc");
    }

    #[test]
    fn test_selection_populates_url_field() {
        let (_dir, mut app) = test_app();
        app.store
            .add(SavedUrl::new("Music", "https://youtu.be/abc"))
            .unwrap();
        app.saved_list.select_next(app.store.len());
        app.load_selected();
        assert_eq!(app.url_input.text(), "https://youtu.be/abc");
    }

    #[test]
    fn test_delete_selected_removes_entry() {
        let (_dir, mut app) = test_app();
        app.store
            .add(SavedUrl::new("Music", "https://youtu.be/abc"))
            .unwrap();
        app.saved_list.select_next(app.store.len());
        app.delete_selected();
        assert!(app.store.is_empty());
        assert_eq!(app.saved_list.selected(), None);
    }
}
