//! Header component — single-row top bar.
//!
//! Shows the app title, a status lamp that follows the connection state, and
//! the global key hints.  Not focusable.

use ratatui::crossterm::event::KeyEvent;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

use kirtan_core::session::ConnectionStatus;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_ACCENT, C_CONNECTING, C_ERROR, C_HINT, C_LIVE, C_MUTED, C_PRIMARY},
};

pub struct Header;

impl Header {
    pub fn new() -> Self {
        Self
    }
}

impl Component for Header {
    fn id(&self) -> ComponentId {
        ComponentId::Player
    }

    fn handle_key(&mut self, _key: KeyEvent, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn min_height(&self) -> u16 {
        1
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, state: &AppState) {
        if area.height == 0 {
            return;
        }
        frame.render_widget(Clear, area);

        let lamp: Color = match state.session.status {
            ConnectionStatus::Live => C_LIVE,
            ConnectionStatus::Connecting => C_CONNECTING,
            ConnectionStatus::StreamOffline => C_ERROR,
            ConnectionStatus::Disconnected => C_MUTED,
        };

        let mut spans = vec![
            Span::raw(" "),
            Span::styled("●", Style::default().fg(lamp)),
            Span::raw(" "),
            Span::styled(
                "Darbar Sahib",
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" Live", Style::default().fg(C_ACCENT)),
        ];

        if state.session.muted {
            spans.push(Span::styled("  [muted]", Style::default().fg(C_MUTED)));
        }

        spans.push(Span::styled(
            "   space play · m mute · tab focus · L logs · q quit",
            Style::default().fg(C_HINT),
        ));

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}
