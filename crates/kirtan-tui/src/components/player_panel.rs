//! PlayerPanel component — stream status, now-playing title, and transport.
//!
//! Space toggles play/pause, `m` toggles mute.  The status badge and the
//! body text follow the session state machine; the panel itself holds no
//! playback state.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

use kirtan_core::session::{ConnectionStatus, MAX_AUTO_RETRIES};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_ACCENT, C_CONNECTING, C_ERROR, C_HINT, C_LIVE, C_MUTED, C_PRIMARY, C_SECONDARY},
    widgets::{pane_chrome, Badge},
};

pub struct PlayerPanel;

impl PlayerPanel {
    pub fn new() -> Self {
        Self
    }
}

impl Component for PlayerPanel {
    fn id(&self) -> ComponentId {
        ComponentId::Player
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Char(' ') | KeyCode::Enter => vec![Action::TogglePlay],
            KeyCode::Char('m') => vec![Action::ToggleMute],
            _ => vec![],
        }
    }

    fn min_height(&self) -> u16 {
        7
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        frame.render_widget(Clear, area);

        let session = &state.session;
        let badge_color = match session.status {
            ConnectionStatus::Live => C_LIVE,
            ConnectionStatus::Connecting => C_CONNECTING,
            ConnectionStatus::StreamOffline => C_ERROR,
            ConnectionStatus::Disconnected => C_MUTED,
        };
        let badge = Badge {
            text: session.status.label(),
            color: badge_color,
        };

        let block = pane_chrome("player", Some('1'), focused, Some(badge));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 {
            return;
        }

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // transport line
                Constraint::Length(1), // icy title
                Constraint::Length(1), // source url
                Constraint::Length(1), // venue
                Constraint::Length(1), // city / retry info
            ])
            .split(inner);

        // ── Transport line ────────────────────────────────────────────────────
        let (icon, icon_style) = match session.status {
            ConnectionStatus::Live => ("▶", Style::default().fg(C_LIVE)),
            ConnectionStatus::Connecting => ("◔", Style::default().fg(C_CONNECTING)),
            ConnectionStatus::StreamOffline => ("⛔", Style::default().fg(C_ERROR)),
            ConnectionStatus::Disconnected => ("■", Style::default().fg(C_MUTED)),
        };
        let mut transport = vec![
            Span::raw(" "),
            Span::styled(icon, icon_style),
            Span::raw("  "),
            Span::styled(
                "Live Gurbani Kirtan",
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            ),
        ];
        if session.muted {
            transport.push(Span::styled("  🔇 muted", Style::default().fg(C_MUTED)));
        }
        frame.render_widget(Paragraph::new(Line::from(transport)), rows[0]);

        // ── ICY title ─────────────────────────────────────────────────────────
        if rows[1].height > 0 {
            let title_line = match &state.icy_title {
                Some(title) => Line::from(vec![
                    Span::raw("   "),
                    Span::styled(title.clone(), Style::default().fg(C_ACCENT)),
                ]),
                None => Line::from(Span::styled(
                    "   ~ no stream title ~",
                    Style::default().fg(C_HINT),
                )),
            };
            frame.render_widget(Paragraph::new(title_line), rows[1]);
        }

        // ── Source ────────────────────────────────────────────────────────────
        if rows[2].height > 0 {
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::raw("   "),
                    Span::styled(state.stream_url.clone(), Style::default().fg(C_HINT)),
                ])),
                rows[2],
            );
        }

        // ── Venue ─────────────────────────────────────────────────────────────
        if rows[3].height > 0 {
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::raw(" "),
                    Span::styled(
                        "Live from Sri Harmandir Sahib",
                        Style::default().fg(C_SECONDARY),
                    ),
                ])),
                rows[3],
            );
        }

        if rows[4].height > 0 {
            let detail = match session.status {
                ConnectionStatus::StreamOffline if session.retry_count < MAX_AUTO_RETRIES => {
                    Span::styled(
                        format!(
                            "reconnecting shortly ({}/{} attempts used)",
                            session.retry_count, MAX_AUTO_RETRIES
                        ),
                        Style::default().fg(C_CONNECTING),
                    )
                }
                ConnectionStatus::StreamOffline => Span::styled(
                    "stream offline — press space to try again",
                    Style::default().fg(C_ERROR),
                ),
                _ => Span::styled("Amritsar, Punjab", Style::default().fg(C_HINT)),
            };
            frame.render_widget(
                Paragraph::new(Line::from(vec![Span::raw(" "), detail])),
                rows[4],
            );
        }
    }
}
