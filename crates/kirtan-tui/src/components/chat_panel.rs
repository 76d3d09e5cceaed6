//! ChatPanel component — the Gyan Companion conversation view.
//!
//! Renders the chat log as left/right-aligned bubbles, a pending indicator
//! while a prompt is in flight, a strip of starter questions while the
//! conversation is short, and a `tui-input` text box at the bottom.
//!
//! Keys (while focused):
//!   Enter        submit the input (blank input is dropped)
//!   Alt+1..4     send a starter question (while the strip is shown)
//!   Ctrl+Y       copy the latest companion reply to the clipboard
//!   PgUp/PgDn    scroll the history
//!   any other    edited into the input box

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use kirtan_core::chat::{is_blank, ChatMessage, ChatRole, INITIAL_QUESTIONS, SUGGESTIONS_CUTOFF};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_ACCENT, C_ERROR, C_HINT, C_MODEL_MSG, C_MUTED, C_SECONDARY, C_USER_MSG},
    widgets::pane_chrome,
};

pub struct ChatPanel {
    input: Input,
    /// Lines scrolled up from the bottom of the history (0 = pinned to newest).
    scroll_back: usize,
    last_msg_count: usize,
}

impl ChatPanel {
    pub fn new() -> Self {
        Self {
            input: Input::default(),
            scroll_back: 0,
            last_msg_count: 0,
        }
    }

    fn suggestions_visible(state: &AppState) -> bool {
        state.chat.len() < SUGGESTIONS_CUTOFF
    }
}

impl Component for ChatPanel {
    fn id(&self) -> ComponentId {
        ComponentId::Chat
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }

        // Starter questions: Alt+digit so typing numbers still works.
        if key.modifiers.contains(KeyModifiers::ALT) {
            if let KeyCode::Char(c @ '1'..='4') = key.code {
                if Self::suggestions_visible(state) && !state.chat_pending {
                    let idx = (c as usize) - ('1' as usize);
                    return vec![Action::SendChat(INITIAL_QUESTIONS[idx].to_string())];
                }
                return vec![];
            }
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if let KeyCode::Char('y') = key.code {
                return vec![Action::CopyLastReply];
            }
        }

        match key.code {
            KeyCode::Enter => {
                let text = self.input.value().to_string();
                if is_blank(&text) || state.chat_pending {
                    return vec![];
                }
                self.input = Input::default();
                self.scroll_back = 0;
                vec![Action::SendChat(text)]
            }
            KeyCode::PageUp => {
                self.scroll_back += 5;
                vec![]
            }
            KeyCode::PageDown => {
                self.scroll_back = self.scroll_back.saturating_sub(5);
                vec![]
            }
            _ => {
                self.input
                    .handle_event(&ratatui::crossterm::event::Event::Key(key));
                vec![]
            }
        }
    }

    fn min_height(&self) -> u16 {
        8
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        frame.render_widget(Clear, area);

        let block = pane_chrome("Gyan Companion", Some('2'), focused, None);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height < 3 {
            return;
        }

        let show_suggestions = Self::suggestions_visible(state);
        let mut constraints = vec![Constraint::Min(1)];
        if show_suggestions {
            constraints.push(Constraint::Length(1));
        }
        constraints.push(Constraint::Length(1));
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);

        self.draw_history(frame, rows[0], state);
        if show_suggestions {
            draw_suggestions(frame, rows[1], state);
        }
        self.draw_input(frame, *rows.last().unwrap_or(&inner), focused, state);
    }
}

impl ChatPanel {
    fn draw_history(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        let width = area.width.saturating_sub(2) as usize;
        if width < 8 {
            return;
        }

        // Snap back to the newest entry when a message arrives.
        if state.chat.len() != self.last_msg_count {
            self.last_msg_count = state.chat.len();
            self.scroll_back = 0;
        }

        let mut lines: Vec<Line> = Vec::new();
        for msg in state.chat.iter() {
            lines.extend(bubble_lines(msg, width));
            lines.push(Line::default());
        }
        if state.chat_pending {
            lines.push(Line::from(vec![
                Span::raw(" "),
                Span::styled("· · ·", Style::default().fg(C_MUTED)),
            ]));
        }

        let height = area.height as usize;
        let max_back = lines.len().saturating_sub(height);
        if self.scroll_back > max_back {
            self.scroll_back = max_back;
        }
        let start = max_back - self.scroll_back;

        let visible: Vec<Line> = lines.into_iter().skip(start).take(height).collect();
        frame.render_widget(Paragraph::new(visible), area);
    }

    fn draw_input(&self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let value = self.input.value();
        let scroll = self.input.visual_scroll(area.width.saturating_sub(4) as usize);

        let line = if value.is_empty() {
            let placeholder = if state.chat_pending {
                "waiting for the companion…"
            } else {
                "Ask about Sikhism or the Temple..."
            };
            Line::from(vec![
                Span::styled(" › ", Style::default().fg(C_ACCENT)),
                Span::styled(placeholder, Style::default().fg(C_HINT)),
            ])
        } else {
            Line::from(vec![
                Span::styled(" › ", Style::default().fg(C_ACCENT)),
                Span::styled(value[scroll..].to_string(), Style::default().fg(C_MODEL_MSG)),
            ])
        };
        frame.render_widget(Paragraph::new(line), area);

        if focused {
            let cursor_x = area.x + 3 + (self.input.visual_cursor().saturating_sub(scroll)) as u16;
            frame.set_cursor_position((cursor_x.min(area.x + area.width.saturating_sub(1)), area.y));
        }
    }
}

fn draw_suggestions(frame: &mut Frame, area: Rect, state: &AppState) {
    if state.chat_pending {
        return;
    }
    let mut spans = vec![Span::styled(" try: ", Style::default().fg(C_HINT))];
    for (i, q) in INITIAL_QUESTIONS.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  ", Style::default()));
        }
        spans.push(Span::styled(
            format!("⌥{} ", i + 1),
            Style::default().fg(C_MUTED),
        ));
        spans.push(Span::styled(*q, Style::default().fg(C_SECONDARY)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Word-wrap one message into aligned bubble lines.
fn bubble_lines(msg: &ChatMessage, width: usize) -> Vec<Line<'static>> {
    let bubble_width = (width * 4) / 5;
    let style = if msg.is_error {
        Style::default().fg(C_ERROR)
    } else {
        match msg.role {
            ChatRole::User => Style::default().fg(C_USER_MSG),
            ChatRole::Model => Style::default().fg(C_MODEL_MSG),
        }
    };
    let tag_style = Style::default().fg(C_MUTED).add_modifier(Modifier::DIM);

    let mut out = Vec::new();
    let wrapped = wrap_text(&msg.text, bubble_width.max(8));
    let right_align = msg.role == ChatRole::User;

    for (i, text_line) in wrapped.iter().enumerate() {
        let mut spans = Vec::new();
        if right_align {
            let pad = width.saturating_sub(text_line.width() + 5);
            spans.push(Span::raw(" ".repeat(pad)));
            spans.push(Span::styled(text_line.clone(), style));
            if i == 0 {
                spans.push(Span::styled("  you", tag_style));
            }
        } else {
            if i == 0 {
                spans.push(Span::styled(" ✦ ", Style::default().fg(C_ACCENT)));
            } else {
                spans.push(Span::raw("   "));
            }
            spans.push(Span::styled(text_line.clone(), style));
        }
        out.push(Line::from(spans));
    }
    out
}

/// Greedy word wrap on display width; long unbreakable words are split hard.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for raw_line in text.lines() {
        let mut current = String::new();
        for word in raw_line.split_whitespace() {
            let needed = if current.is_empty() {
                word.width()
            } else {
                current.width() + 1 + word.width()
            };
            if needed <= width {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
            } else {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                // Hard-split words wider than the bubble, on display width
                // (Gurmukhi and other wide glyphs count as 2 columns).
                let mut piece = String::new();
                for ch in word.chars() {
                    let ch_width = ch.width().unwrap_or(0);
                    if !piece.is_empty() && piece.width() + ch_width > width {
                        lines.push(std::mem::take(&mut piece));
                    }
                    piece.push(ch);
                }
                current = piece;
            }
        }
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_respects_width() {
        let lines = wrap_text("what is the significance of darbar sahib", 16);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.width() <= 16, "line too wide: {:?}", line);
        }
    }

    #[test]
    fn wrap_hard_splits_long_words() {
        let lines = wrap_text("waheguruwaheguruwaheguru", 8);
        assert!(lines.iter().all(|l| l.width() <= 8));
        assert_eq!(lines.concat(), "waheguruwaheguruwaheguru");
    }

    #[test]
    fn wrap_hard_split_counts_wide_glyphs() {
        // Fullwidth glyphs occupy two columns; the split must budget on
        // display width, not char count.
        let word = "ｗａｈｅｇｕｒｕ";
        assert_eq!(word.width(), 16);
        let lines = wrap_text(word, 5);
        for line in &lines {
            assert!(line.width() <= 5, "line too wide: {:?}", line);
        }
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn wrap_preserves_blank_input_as_one_line() {
        assert_eq!(wrap_text("", 10), vec![String::new()]);
    }
}
