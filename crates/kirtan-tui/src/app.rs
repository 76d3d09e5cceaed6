//! App — component-based event loop.
//!
//! Architecture:
//! - `App` owns all components and `AppState` (shared read-only data for components).
//! - A `tokio::mpsc` channel carries `AppMessage` events in from background tasks.
//! - The event loop draws each frame, then awaits the next message.
//! - Components return `Vec<Action>`; App dispatches each Action.
//! - Playback commands flow out to the PlayerCore through `player_tx`;
//!   chat prompts go to the companion worker through `prompt_tx`.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};

use kirtan_core::chat::{is_blank, ChatMessage, GREETING};
use kirtan_core::session::PlaybackSession;

use crate::companion::CompanionReply;
use crate::core::{PlayerCommand, PlayerEvent};
use crate::BroadcastMessage;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    components::{
        chat_panel::ChatPanel, header::Header, log_panel::LogPanel, player_panel::PlayerPanel,
    },
};

// ── Internal event bus ────────────────────────────────────────────────────────

enum AppMessage {
    Event(Event),
    Session(PlaybackSession),
    IcyUpdated(Option<String>),
    CompanionReply(CompanionReply),
    Log(String),
}

// ── App ───────────────────────────────────────────────────────────────────────

pub struct App {
    pub state: AppState,

    header: Header,
    player_panel: PlayerPanel,
    chat_panel: ChatPanel,
    log_panel: LogPanel,

    focused: ComponentId,

    player_tx: mpsc::Sender<PlayerEvent>,
    prompt_tx: mpsc::Sender<String>,
    reply_rx: Option<mpsc::Receiver<CompanionReply>>,

    should_quit: bool,
}

impl App {
    pub fn new(
        stream_url: String,
        log_path: PathBuf,
        player_tx: mpsc::Sender<PlayerEvent>,
        prompt_tx: mpsc::Sender<String>,
        reply_rx: mpsc::Receiver<CompanionReply>,
    ) -> Self {
        let mut state = AppState::new(stream_url, log_path);
        state.chat.push(ChatMessage::model(GREETING));

        Self {
            state,
            header: Header::new(),
            player_panel: PlayerPanel::new(),
            chat_panel: ChatPanel::new(),
            log_panel: LogPanel::new(),
            focused: ComponentId::Player,
            player_tx,
            prompt_tx,
            reply_rx: Some(reply_rx),
            should_quit: false,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(
        mut self,
        mut broadcast_rx: broadcast::Receiver<BroadcastMessage>,
    ) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let (tx, mut rx) = mpsc::channel::<AppMessage>(256);

        self.push_log("kirtan started".to_string());

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

        // ── Background task: broadcast receiver (PlayerCore → AppMessage) ─────
        let bc_tx = tx.clone();
        tokio::spawn(async move {
            loop {
                match broadcast_rx.recv().await {
                    Ok(msg) => {
                        let app_msg = match msg {
                            BroadcastMessage::Session(s) => AppMessage::Session(s),
                            BroadcastMessage::IcyUpdated(title) => AppMessage::IcyUpdated(title),
                            BroadcastMessage::Log(s) => AppMessage::Log(s),
                        };
                        if bc_tx.send(app_msg).await.is_err() {
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

        // ── Background task: companion reply bridge ───────────────────────────
        if let Some(mut reply_rx) = self.reply_rx.take() {
            let reply_tx = tx.clone();
            tokio::spawn(async move {
                while let Some(reply) = reply_rx.recv().await {
                    if reply_tx
                        .send(AppMessage::CompanionReply(reply))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
            });
        }

        // ── Periodic timers ───────────────────────────────────────────────────
        // kirtan.log tail refresh: every 2s, only when the log panel is open
        let mut log_refresh = tokio::time::interval(Duration::from_secs(2));
        log_refresh.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        self.reload_log_file();

        // ── Main loop ─────────────────────────────────────────────────────────
        loop {
            terminal.draw(|f| self.draw(f))?;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    self.handle_message(msg).await;
                }

                _ = log_refresh.tick() => {
                    if self.log_panel.expanded {
                        self.reload_log_file();
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        Ok(())
    }

    // ── Message handler ───────────────────────────────────────────────────────

    async fn handle_message(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::Event(ev) => {
                if let Event::Key(key) = ev {
                    if key.kind == KeyEventKind::Release {
                        return;
                    }
                    let actions = self.handle_key(key);
                    for a in actions {
                        self.dispatch(a).await;
                    }
                }
                // Resize just falls through to the redraw at loop top.
            }

            AppMessage::Session(session) => {
                self.state.session = session;
            }

            AppMessage::IcyUpdated(title) => {
                self.state.icy_title = title;
            }

            AppMessage::CompanionReply(reply) => {
                self.state.chat_pending = false;
                let msg = if reply.is_error {
                    ChatMessage::model_error(reply.text)
                } else {
                    ChatMessage::model(reply.text)
                };
                self.state.chat.push(msg);
            }

            AppMessage::Log(msg) => {
                self.push_log(msg);
            }
        }
    }

    // ── Key routing ───────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        // Global keys — always active regardless of focus
        match key.code {
            KeyCode::Char('c') if key.modifiers == KeyModifiers::CONTROL => {
                return vec![Action::Quit];
            }
            KeyCode::Tab => return vec![Action::FocusNext],
            _ => {}
        }

        // Keys below would collide with typing; the chat input wins.
        let typing = self.focused == ComponentId::Chat;
        if !typing {
            match key.code {
                KeyCode::Char('q') if key.modifiers == KeyModifiers::NONE => {
                    return vec![Action::Quit];
                }
                KeyCode::Char(' ') => return vec![Action::TogglePlay],
                KeyCode::Char('m') => return vec![Action::ToggleMute],
                KeyCode::Char('L') => return vec![Action::ToggleLogs],
                KeyCode::Char('1') => return vec![Action::FocusPane(ComponentId::Player)],
                KeyCode::Char('2') => return vec![Action::FocusPane(ComponentId::Chat)],
                KeyCode::Char('3') if self.log_panel.expanded => {
                    return vec![Action::FocusPane(ComponentId::LogPanel)];
                }
                _ => {}
            }
        }

        // Dispatch to the focused component
        let s = &self.state;
        match self.focused {
            ComponentId::Player => self.player_panel.handle_key(key, s),
            ComponentId::Chat => self.chat_panel.handle_key(key, s),
            ComponentId::LogPanel => self.log_panel.handle_key(key, s),
        }
    }

    // ── Action dispatch ───────────────────────────────────────────────────────

    async fn dispatch(&mut self, action: Action) {
        match action {
            Action::TogglePlay => {
                let _ = self
                    .player_tx
                    .send(PlayerEvent::Command(PlayerCommand::TogglePlay))
                    .await;
            }

            Action::ToggleMute => {
                let _ = self
                    .player_tx
                    .send(PlayerEvent::Command(PlayerCommand::ToggleMute))
                    .await;
            }

            Action::SendChat(text) => {
                if is_blank(&text) || self.state.chat_pending {
                    return;
                }
                info!("chat: sending prompt ({} chars)", text.len());
                self.state.chat.push(ChatMessage::user(text.clone()));
                self.state.chat_pending = true;
                if self.prompt_tx.send(text).await.is_err() {
                    self.state.chat_pending = false;
                    self.state
                        .chat
                        .push(ChatMessage::model_error("The companion is unavailable."));
                }
            }

            Action::CopyLastReply => {
                let Some(reply) = self.state.chat.last_reply().map(|m| m.text.clone()) else {
                    self.push_log("nothing to copy yet".to_string());
                    return;
                };
                match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(reply)) {
                    Ok(()) => self.push_log("copied reply to clipboard".to_string()),
                    Err(e) => {
                        warn!("clipboard error: {}", e);
                        self.push_log(format!("clipboard error: {}", e));
                    }
                }
            }

            Action::ToggleLogs => {
                let noop = Action::ToggleLogs;
                self.log_panel.on_action(&noop, &self.state);
                if !self.log_panel.expanded && self.focused == ComponentId::LogPanel {
                    self.focused = ComponentId::Player;
                }
                if self.log_panel.expanded {
                    self.reload_log_file();
                }
            }

            Action::FocusNext => {
                // Focus ring order; the log panel joins only while expanded.
                let order = [
                    self.player_panel.id(),
                    self.chat_panel.id(),
                    self.log_panel.id(),
                ];
                let mut idx = order.iter().position(|id| *id == self.focused).unwrap_or(0);
                loop {
                    idx = (idx + 1) % order.len();
                    let next = order[idx];
                    if next != ComponentId::LogPanel || self.log_panel.expanded {
                        self.focused = next;
                        break;
                    }
                }
            }

            Action::FocusPane(id) => {
                self.focused = id;
            }

            Action::Quit => {
                self.should_quit = true;
            }
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        use crate::theme::C_BG;
        use ratatui::widgets::Block;
        let area = frame.area();

        // Fill with the base background colour so unstyled gaps stay dark.
        frame.render_widget(
            Block::default().style(ratatui::style::Style::default().bg(C_BG)),
            area,
        );

        let log_h = if self.log_panel.expanded { 10u16 } else { 1 };
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(self.player_panel.min_height() + 2),
                Constraint::Min(self.chat_panel.min_height()),
                Constraint::Length(log_h),
            ])
            .split(area);

        self.header.draw(frame, outer[0], false, &self.state);
        self.player_panel.draw(
            frame,
            outer[1],
            self.focused == ComponentId::Player,
            &self.state,
        );
        self.chat_panel.draw(
            frame,
            outer[2],
            self.focused == ComponentId::Chat,
            &self.state,
        );
        self.log_panel.draw(
            frame,
            outer[3],
            self.focused == ComponentId::LogPanel,
            &self.state,
        );
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn push_log(&mut self, msg: String) {
        self.state.logs.push(msg);
        if self.state.logs.len() > 500 {
            self.state.logs.remove(0);
        }
    }

    /// Read the last 500 lines of kirtan.log into state (synchronous, cheap).
    fn reload_log_file(&mut self) {
        if let Ok(content) = std::fs::read_to_string(&self.state.log_path) {
            let lines: Vec<String> = content.lines().map(|l| l.to_string()).collect();
            let start = lines.len().saturating_sub(500);
            self.state.log_file_lines = lines[start..].to_vec();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app() -> (App, mpsc::Receiver<PlayerEvent>, mpsc::Receiver<String>) {
        let (player_tx, player_rx) = mpsc::channel(8);
        let (prompt_tx, prompt_rx) = mpsc::channel(8);
        let (_reply_tx, reply_rx) = mpsc::channel(8);
        let app = App::new(
            "https://live.example.net/".into(),
            PathBuf::new(),
            player_tx,
            prompt_tx,
            reply_rx,
        );
        (app, player_rx, prompt_rx)
    }

    #[tokio::test]
    async fn send_while_pending_records_nothing_until_reply_arrives() {
        let (mut app, _player_rx, mut prompt_rx) = test_app();
        let greeting_only = app.state.chat.len();

        app.dispatch(Action::SendChat("What is Hukamnama?".into()))
            .await;
        assert!(app.state.chat_pending);
        assert_eq!(app.state.chat.len(), greeting_only + 1);
        assert_eq!(prompt_rx.try_recv().unwrap(), "What is Hukamnama?");

        // Second send while the first is in flight: no entry, no prompt.
        app.dispatch(Action::SendChat("Who founded it?".into()))
            .await;
        assert_eq!(app.state.chat.len(), greeting_only + 1);
        assert!(prompt_rx.try_recv().is_err());

        // The reply clears the gate; the next send goes through.
        app.handle_message(AppMessage::CompanionReply(CompanionReply {
            text: "The daily edict.".into(),
            is_error: false,
        }))
        .await;
        assert!(!app.state.chat_pending);
        app.dispatch(Action::SendChat("Who founded it?".into()))
            .await;
        assert_eq!(prompt_rx.try_recv().unwrap(), "Who founded it?");
        assert_eq!(app.state.chat.len(), greeting_only + 3);
    }

    #[tokio::test]
    async fn blank_send_records_nothing() {
        let (mut app, _player_rx, mut prompt_rx) = test_app();
        let before = app.state.chat.len();

        app.dispatch(Action::SendChat("   ".into())).await;
        assert!(!app.state.chat_pending);
        assert_eq!(app.state.chat.len(), before);
        assert!(prompt_rx.try_recv().is_err());
    }
}
