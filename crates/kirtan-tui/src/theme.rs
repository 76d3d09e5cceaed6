//! Color palette and style constants for the kirtan TUI.

use ratatui::style::{Color, Style};

// ── Color palette ─────────────────────────────────────────────────────────────

pub const C_BG: Color = Color::Rgb(18, 16, 12);
pub const C_ACCENT: Color = Color::Rgb(255, 184, 80);
pub const C_LIVE: Color = Color::Rgb(80, 200, 120);
pub const C_CONNECTING: Color = Color::Rgb(255, 184, 80);
pub const C_ERROR: Color = Color::Rgb(255, 95, 95);
pub const C_MUTED: Color = Color::Rgb(72, 72, 88);
pub const C_SECONDARY: Color = Color::Rgb(138, 130, 115);
pub const C_PRIMARY: Color = Color::Rgb(225, 218, 205);
pub const C_PANEL_BORDER: Color = Color::Rgb(52, 46, 36);
pub const C_PANEL_BORDER_FOCUSED: Color = Color::Rgb(210, 160, 70);
pub const C_USER_MSG: Color = Color::Rgb(120, 170, 220);
pub const C_MODEL_MSG: Color = Color::Rgb(225, 218, 205);
pub const C_HINT: Color = Color::Rgb(100, 92, 78);

// ── Predefined styles ─────────────────────────────────────────────────────────

pub fn style_focused_border() -> Style {
    Style::default().fg(C_PANEL_BORDER_FOCUSED)
}

pub fn style_unfocused_border() -> Style {
    Style::default().fg(C_PANEL_BORDER)
}
