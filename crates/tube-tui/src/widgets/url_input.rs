//! UrlInput — wraps tui-input for the URL field and the save-name prompt.

use ratatui::crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::theme::{
    style_focused_border, style_muted, style_unfocused_border, C_PRIMARY,
};

pub enum InputAction {
    Confirmed(String),
    Cancelled,
    None,
}

pub struct UrlInput {
    input: Input,
    pub active: bool,
    title: String,
    placeholder: String,
}

impl UrlInput {
    pub fn new(title: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            input: Input::default(),
            active: false,
            title: title.into(),
            placeholder: placeholder.into(),
        }
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn clear(&mut self) {
        self.input = Input::default();
    }

    pub fn set_value(&mut self, value: &str) {
        self.input = Input::new(value.to_string());
    }

    pub fn text(&self) -> &str {
        self.input.value()
    }

    pub fn is_empty(&self) -> bool {
        self.input.value().is_empty()
    }

    /// Handle a key event while active.  Enter confirms with the current
    /// text, Esc cancels without clearing it.
    pub fn handle_key(&mut self, key: KeyEvent) -> InputAction {
        match key.code {
            KeyCode::Esc => {
                self.deactivate();
                InputAction::Cancelled
            }
            KeyCode::Enter => {
                self.deactivate();
                InputAction::Confirmed(self.input.value().to_string())
            }
            _ => {
                self.input
                    .handle_event(&ratatui::crossterm::event::Event::Key(key));
                InputAction::None
            }
        }
    }

    /// Render the input as a one-line bordered field.
    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let border = if self.active {
            style_focused_border()
        } else {
            style_unfocused_border()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(self.title.as_str());

        let inner = block.inner(area);
        let scroll = self.input.visual_scroll(inner.width.max(1) as usize);
        let value = self.input.value();
        // Scroll by visual columns; never slice the string itself, the
        // offset is not a byte index (multibyte input would panic).
        let paragraph = if value.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                self.placeholder.clone(),
                style_muted(),
            )))
        } else {
            Paragraph::new(Line::from(Span::styled(
                value.to_string(),
                Style::default().fg(C_PRIMARY),
            )))
            .scroll((0, scroll as u16))
        };

        frame.render_widget(paragraph.block(block), area);

        if self.active {
            let cursor_x = inner.x + (self.input.visual_cursor().saturating_sub(scroll)) as u16;
            frame.set_cursor_position((cursor_x.min(inner.x + inner.width.saturating_sub(1)), inner.y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn draw_into(input: &UrlInput, width: u16) {
        let backend = TestBackend::new(width, 3);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| input.draw(f, f.area())).unwrap();
    }

    #[test]
    fn test_draw_scrolled_multibyte_value() {
        let mut input = UrlInput::new("Save as", "name for this URL");
        input.set_value("Музыкальный плейлист для тренировок");
        input.activate();
        draw_into(&input, 20);
    }

    #[test]
    fn test_draw_long_ascii_value_in_narrow_field() {
        let mut input = UrlInput::new("URL", "paste a video URL");
        input.set_value("https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        input.activate();
        draw_into(&input, 16);
    }
}
