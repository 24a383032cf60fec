mod app;
mod controller;
mod mpv;
mod resolver;
mod theme;
mod widgets;

use tokio::sync::{broadcast, mpsc};

use tube_core::session::PlayerState;

/// What the playback controller broadcasts to the UI.
#[derive(Debug, Clone)]
pub enum BroadcastMessage {
    /// The full player state changed; carries a fresh snapshot.
    State(PlayerState),
    /// A transient informational message for the status line.
    Log(String),
    /// A user-facing error message for the status line.
    Error(String),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = tube_core::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let log_path = data_dir.join("tubefm.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code.
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("tubefm log: {}", log_path.display());

    tracing::info!("tubefm starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = tube_core::config::Config::load().unwrap_or_default();

    // ── Saved URL store ──────────────────────────────────────────────────────
    let store = tube_core::store::UrlStore::load(config.paths.saved_urls.clone());
    tracing::info!(
        "loaded {} saved URLs from {}",
        store.len(),
        config.paths.saved_urls.display()
    );

    // ── Broadcast channel (controller → TUI) ─────────────────────────────────
    let (broadcast_tx, broadcast_rx) = broadcast::channel::<BroadcastMessage>(256);

    // ── Command channel (TUI → controller) ───────────────────────────────────
    let (command_tx, command_rx) = mpsc::channel::<tube_core::session::Command>(64);

    // ── Spawn playback controller event loop ─────────────────────────────────
    let controller =
        controller::Controller::new(config.player.default_volume, broadcast_tx.clone());
    let controller_task = tokio::spawn(async move {
        if let Err(e) = controller.run(command_rx).await {
            tracing::error!("controller exited with error: {}", e);
        }
    });

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let app = app::App::new(store, command_tx, config.player.default_volume);
    app.run(broadcast_rx).await?;

    // Closing the command channel above ends the controller loop; give it a
    // moment to kill the mpv child before the process exits.
    let _ = tokio::time::timeout(std::time::Duration::from_secs(2), controller_task).await;

    Ok(())
}
