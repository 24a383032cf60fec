//! StatusLine — one-line transient status messages.
//!
//! Messages reset to the idle text after a few seconds, the same rhythm the
//! rest of the UI ticks at.

use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_ERROR, C_INFO, C_SUCCESS};

const IDLE_TEXT: &str = "Ready";
const FLASH_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

struct Flash {
    message: String,
    severity: Severity,
    expires: Instant,
}

pub struct StatusLine {
    flash: Option<Flash>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self { flash: None }
    }

    pub fn push(&mut self, message: impl Into<String>, severity: Severity) {
        self.flash = Some(Flash {
            message: message.into(),
            severity,
            expires: Instant::now() + FLASH_DURATION,
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Info);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Success);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Error);
    }

    /// Drop the flash once it expires.  Call each tick.
    pub fn tick(&mut self) {
        if let Some(ref f) = self.flash {
            if f.expires <= Instant::now() {
                self.flash = None;
            }
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let line = match &self.flash {
            Some(f) => {
                let color = match f.severity {
                    Severity::Info => C_INFO,
                    Severity::Success => C_SUCCESS,
                    Severity::Error => C_ERROR,
                };
                Line::from(Span::styled(
                    f.message.clone(),
                    Style::default().fg(color),
                ))
            }
            None => Line::from(Span::styled(
                IDLE_TEXT,
                crate::theme::style_muted(),
            )),
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}

impl Default for StatusLine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_expires_after_tick() {
        let mut status = StatusLine::new();
        status.error("boom");
        assert!(status.flash.is_some());

        // Force expiry instead of sleeping.
        status.flash.as_mut().unwrap().expires = Instant::now() - Duration::from_millis(1);
        status.tick();
        assert!(status.flash.is_none());
    }

    #[test]
    fn test_new_flash_replaces_old() {
        let mut status = StatusLine::new();
        status.info("one");
        status.success("two");
        let f = status.flash.as_ref().unwrap();
        assert_eq!(f.message, "two");
        assert_eq!(f.severity, Severity::Success);
    }
}
