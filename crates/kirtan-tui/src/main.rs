mod action;
mod app;
mod app_state;
mod companion;
mod component;
mod components;
mod core;
mod mpv;
mod theme;
mod widgets;

use tokio::sync::{broadcast, mpsc};

/// What the PlayerCore broadcasts to the TUI.
#[derive(Debug, Clone)]
pub enum BroadcastMessage {
    /// The playback session changed (status, mute, retry count).
    Session(kirtan_core::session::PlaybackSession),
    /// The ICY metadata title changed (None = cleared).
    IcyUpdated(Option<String>),
    /// A log message from the core event loop.
    Log(String),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = kirtan_core::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let log_path = data_dir.join("kirtan.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code but suppress noisy
    // connection-level DEBUG from HTTP client internals (hyper_util, reqwest).
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("kirtan log: {}", log_path.display());

    tracing::info!("kirtan starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = kirtan_core::config::Config::load().unwrap_or_default();

    // ── Broadcast channel (PlayerCore → TUI) ────────────────────────────────
    let (broadcast_tx, broadcast_rx) = broadcast::channel::<BroadcastMessage>(256);

    // ── PlayerEvent channel (TUI / timers / mpv → PlayerCore) ───────────────
    let (player_tx, player_rx) = mpsc::channel::<core::PlayerEvent>(256);

    let player_core = core::PlayerCore::new(
        config.stream.url.clone(),
        config.stream.mpv_binary.clone(),
        broadcast_tx.clone(),
        player_tx.clone(),
    );
    tokio::spawn(async move {
        if let Err(e) = player_core.run(player_rx).await {
            tracing::error!("PlayerCore exited with error: {}", e);
        }
    });

    // ── Companion worker ─────────────────────────────────────────────────────
    let (reply_tx, reply_rx) = mpsc::channel::<companion::CompanionReply>(8);
    let prompt_tx = companion::spawn(config.assistant.model.clone(), reply_tx);

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let app = app::App::new(
        config.stream.url.clone(),
        log_path,
        player_tx,
        prompt_tx,
        reply_rx,
    );
    app.run(broadcast_rx).await?;

    Ok(())
}
