//! AppState — shared read-only data passed to all components during render/event.
//!
//! Components read this for player and chat state, but never mutate it.
//! The App event-loop is the only thing that writes to AppState.

use std::path::PathBuf;

use kirtan_core::chat::ChatLog;
use kirtan_core::session::PlaybackSession;

/// The full shared state of the application.
/// Components read this; only the App event-loop writes to it.
pub struct AppState {
    // ── Player ──────────────────────────────────────────────────────────────
    pub session: PlaybackSession,
    /// Stream title from ICY metadata, when the host sends a real one.
    pub icy_title: Option<String>,
    pub stream_url: String,

    // ── Chat ────────────────────────────────────────────────────────────────
    pub chat: ChatLog,
    /// True while a prompt is in flight; gates further sends.
    pub chat_pending: bool,

    // ── Logs ────────────────────────────────────────────────────────────────
    /// In-session event messages (reconnects, failures).
    pub logs: Vec<String>,
    /// Cached lines from kirtan.log (refreshed periodically by App).
    pub log_file_lines: Vec<String>,
    pub log_path: PathBuf,
}

impl AppState {
    pub fn new(stream_url: String, log_path: PathBuf) -> Self {
        Self {
            session: PlaybackSession::new(),
            icy_title: None,
            stream_url,
            chat: ChatLog::new(),
            chat_pending: false,
            logs: Vec::new(),
            log_file_lines: Vec::new(),
            log_path,
        }
    }
}
