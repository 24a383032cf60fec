//! Color palette and style constants for the tubefm TUI.

use ratatui::style::{Color, Modifier, Style};

// ── Color palette ─────────────────────────────────────────────────────────────

pub const C_BG: Color = Color::Rgb(30, 30, 30);
pub const C_PLAYING: Color = Color::Rgb(76, 175, 80);
pub const C_LOADING: Color = Color::Rgb(255, 184, 80);
pub const C_ERROR: Color = Color::Rgb(255, 107, 107);
pub const C_MUTED: Color = Color::Rgb(85, 85, 100);
pub const C_SECONDARY: Color = Color::Rgb(130, 130, 150);
pub const C_PRIMARY: Color = Color::Rgb(220, 220, 230);
pub const C_SELECTION_BG: Color = Color::Rgb(45, 45, 58);
pub const C_PANEL_BORDER: Color = Color::Rgb(55, 55, 68);
pub const C_PANEL_BORDER_FOCUSED: Color = Color::Rgb(120, 100, 200);
pub const C_INFO: Color = Color::Rgb(80, 160, 220);
pub const C_SUCCESS: Color = Color::Rgb(76, 175, 80);
pub const C_VOLUME_BAR: Color = Color::Rgb(100, 160, 130);

// ── Predefined styles ─────────────────────────────────────────────────────────

pub fn style_default() -> Style {
    Style::default().fg(C_PRIMARY)
}

pub fn style_secondary() -> Style {
    Style::default().fg(C_SECONDARY)
}

pub fn style_muted() -> Style {
    Style::default().fg(C_MUTED)
}

pub fn style_playing() -> Style {
    Style::default().fg(C_PLAYING).add_modifier(Modifier::BOLD)
}

pub fn style_selected() -> Style {
    Style::default().bg(C_SELECTION_BG).fg(C_PRIMARY)
}

pub fn style_focused_border() -> Style {
    Style::default().fg(C_PANEL_BORDER_FOCUSED)
}

pub fn style_unfocused_border() -> Style {
    Style::default().fg(C_PANEL_BORDER)
}
