//! Controls — now-playing readout, play/stop glyph, and the volume bar.

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use tube_core::session::{PlaybackStatus, PlayerState};

use crate::theme::{
    style_default, style_muted, style_playing, style_secondary, style_unfocused_border, C_LOADING,
    C_VOLUME_BAR,
};

const BLOCKS: &[char] = &[' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];

/// Render `value`/100 as a smooth bar of `width` cells using eighth blocks.
fn volume_bar(value: u8, width: usize) -> String {
    let filled = (value.min(100) as f32 / 100.0) * width as f32;
    let full = filled.floor() as usize;
    let rem = ((filled - full as f32) * 8.0).round() as usize;

    let mut bar = String::with_capacity(width * 3);
    for _ in 0..full.min(width) {
        bar.push('█');
    }
    if full < width {
        bar.push(BLOCKS[rem.min(8)]);
        for _ in full + 1..width {
            bar.push(' ');
        }
    }
    bar
}

pub struct Controls;

impl Controls {
    pub fn draw(frame: &mut Frame, area: Rect, state: &PlayerState) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(style_unfocused_border())
            .title("Playback");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let (glyph, glyph_style, label) = match state.status {
            PlaybackStatus::Idle => ("▶", style_secondary(), "stopped".to_string()),
            PlaybackStatus::Loading => (
                "▶",
                ratatui::style::Style::default().fg(C_LOADING),
                "loading…".to_string(),
            ),
            PlaybackStatus::Playing => {
                let title = state
                    .session
                    .as_ref()
                    .map(|s| s.title.as_str())
                    .unwrap_or("playing");
                ("■", style_playing(), title.to_string())
            }
        };

        let top = Line::from(vec![
            Span::styled(format!(" {glyph} "), glyph_style),
            Span::styled(label, style_default()),
        ]);

        let bar_width = inner.width.saturating_sub(14).max(10) as usize;
        let bottom = Line::from(vec![
            Span::styled(" vol ", style_muted()),
            Span::styled(
                volume_bar(state.volume, bar_width),
                ratatui::style::Style::default().fg(C_VOLUME_BAR),
            ),
            Span::styled(format!(" {:>3}%", state.volume), style_secondary()),
        ]);

        let rows = [top, bottom];
        for (i, line) in rows.into_iter().enumerate() {
            if i as u16 >= inner.height {
                break;
            }
            let row = Rect {
                x: inner.x,
                y: inner.y + i as u16,
                width: inner.width,
                height: 1,
            };
            frame.render_widget(Paragraph::new(line), row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_bar_bounds() {
        assert_eq!(volume_bar(0, 10).chars().filter(|c| *c == '█').count(), 0);
        assert_eq!(volume_bar(100, 10).chars().filter(|c| *c == '█').count(), 10);
    }

    #[test]
    fn test_volume_bar_width_is_stable() {
        for v in [0u8, 13, 50, 99, 100] {
            assert_eq!(volume_bar(v, 10).chars().count(), 10, "volume {v}");
        }
    }
}
