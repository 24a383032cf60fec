//! SavedList — the scrollable list of saved URLs.

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use tube_core::store::SavedUrl;

use crate::theme::{
    style_default, style_focused_border, style_muted, style_selected, style_unfocused_border,
};

pub struct SavedList {
    selected: Option<usize>,
    /// First visible row, adjusted so the selection stays on screen.
    offset: usize,
}

impl SavedList {
    pub fn new() -> Self {
        Self {
            selected: None,
            offset: 0,
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn select_next(&mut self, len: usize) {
        if len == 0 {
            self.selected = None;
            return;
        }
        self.selected = Some(match self.selected {
            None => 0,
            Some(i) => (i + 1).min(len - 1),
        });
    }

    pub fn select_prev(&mut self, len: usize) {
        if len == 0 {
            self.selected = None;
            return;
        }
        self.selected = Some(match self.selected {
            None => 0,
            Some(i) => i.saturating_sub(1),
        });
    }

    /// Keep the selection valid after the list shrank.
    pub fn clamp(&mut self, len: usize) {
        match self.selected {
            Some(_) if len == 0 => self.selected = None,
            Some(i) if i >= len => self.selected = Some(len - 1),
            _ => {}
        }
    }

    pub fn draw(&mut self, frame: &mut Frame, area: Rect, entries: &[SavedUrl], focused: bool) {
        let border = if focused {
            style_focused_border()
        } else {
            style_unfocused_border()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(format!("Saved ({})", entries.len()));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if entries.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("nothing saved yet", style_muted())),
                inner,
            );
            return;
        }

        let visible = inner.height as usize;
        if visible == 0 {
            return;
        }

        // Scroll window follows the selection.
        if let Some(sel) = self.selected {
            if sel < self.offset {
                self.offset = sel;
            } else if sel >= self.offset + visible {
                self.offset = sel + 1 - visible;
            }
        }
        self.offset = self.offset.min(entries.len().saturating_sub(1));

        for (row, (idx, entry)) in entries
            .iter()
            .enumerate()
            .skip(self.offset)
            .take(visible)
            .enumerate()
        {
            let style = if Some(idx) == self.selected {
                style_selected()
            } else {
                style_default()
            };
            let line = Line::from(vec![
                Span::styled(entry.name.clone(), style),
                Span::styled(format!("  {}", entry.url), style_muted()),
            ]);
            let row_area = Rect {
                x: inner.x,
                y: inner.y + row as u16,
                width: inner.width,
                height: 1,
            };
            frame.render_widget(Paragraph::new(line).style(style), row_area);
        }
    }
}

impl Default for SavedList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_moves_and_saturates() {
        let mut list = SavedList::new();
        assert_eq!(list.selected(), None);
        list.select_next(3);
        assert_eq!(list.selected(), Some(0));
        list.select_next(3);
        list.select_next(3);
        list.select_next(3);
        assert_eq!(list.selected(), Some(2));
        list.select_prev(3);
        assert_eq!(list.selected(), Some(1));
    }

    #[test]
    fn test_clamp_after_delete() {
        let mut list = SavedList::new();
        list.select_next(3);
        list.select_next(3);
        list.select_next(3);
        assert_eq!(list.selected(), Some(2));
        list.clamp(2);
        assert_eq!(list.selected(), Some(1));
        list.clamp(0);
        assert_eq!(list.selected(), None);
    }

    #[test]
    fn test_empty_list_has_no_selection() {
        let mut list = SavedList::new();
        list.select_next(0);
        assert_eq!(list.selected(), None);
        list.select_prev(0);
        assert_eq!(list.selected(), None);
    }
}
