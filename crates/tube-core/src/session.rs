use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What the playback controller is doing right now.
///
/// There is no `Paused` — stopping is the only way out of `Playing`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    /// Nothing loaded / explicitly stopped.
    #[default]
    Idle,
    /// Resolve + attach dispatched, waiting for the background work.
    Loading,
    /// Audio handed to the native player.
    Playing,
}

/// One resolved playback session.  Immutable after creation; at most one
/// exists at a time, held by the controller while `Playing`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionInfo {
    /// The page URL the user entered.
    pub page_url: String,
    /// Direct stream URL the resolver extracted.
    pub stream_url: String,
    /// Display title ("Unknown Title" when the extractor has none).
    pub title: String,
}

/// Full controller state, cloned into every broadcast.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlayerState {
    pub status: PlaybackStatus,
    pub session: Option<SessionInfo>,
    /// Volume slider value, 0–100.  Applied to the live player handle only
    /// while a session exists; remembered across sessions otherwise.
    pub volume: u8,
    /// Monotonic session generation.  Bumped on every start and stop so
    /// late background results can be recognised as stale and discarded.
    pub generation: u64,
}

impl PlayerState {
    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    pub fn is_loading(&self) -> bool {
        self.status == PlaybackStatus::Loading
    }
}

/// Commands from the UI to the playback controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start { url: String },
    Stop,
    Volume { value: u8 },
}

/// Everything that can go wrong between a page URL and audible audio.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlayerError {
    /// Empty or malformed URL — rejected before any background work.
    #[error("{0}")]
    Validation(String),
    /// The extraction tool failed (network, unsupported URL, no audio).
    #[error("stream extraction failed: {0}")]
    Resolve(String),
    /// The native player could not be spawned or driven.
    #[error("player error: {0}")]
    Attach(String),
}

// Same permissive pattern the original used: scheme optional, any path.
const VIDEO_URL_PATTERN: &str = r"^(https?://)?(www\.)?(youtube\.com|youtu\.?be)/.+";

fn video_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(VIDEO_URL_PATTERN).expect("valid pattern"))
}

/// Permissive "looks like a video-sharing URL" check.  Runs before the
/// resolver is ever invoked; strings that fail never reach a subprocess.
pub fn looks_like_video_url(url: &str) -> bool {
    video_url_regex().is_match(url)
}

/// Validate a URL the user asked to play.
pub fn validate_page_url(url: &str) -> Result<(), PlayerError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(PlayerError::Validation("please enter a URL".into()));
    }
    if !looks_like_video_url(url) {
        return Err(PlayerError::Validation(format!("not a video URL: {url}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_url_shapes() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "http://youtube.com/watch?v=abc",
            "youtube.com/watch?v=abc",
            "https://youtu.be/abc",
            "www.youtu.be/abc",
        ] {
            assert!(looks_like_video_url(url), "should accept {url}");
        }
    }

    #[test]
    fn test_rejects_non_urls() {
        for url in [
            "",
            "not a url",
            "https://example.com/watch?v=abc",
            "youtube.com/",
            "ftp://youtube.com/watch", // wrong scheme
        ] {
            assert!(!looks_like_video_url(url), "should reject {url:?}");
        }
    }

    #[test]
    fn test_validate_empty_is_validation_error() {
        match validate_page_url("   ") {
            Err(PlayerError::Validation(_)) => {}
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_ok() {
        assert_eq!(validate_page_url("https://youtu.be/abc"), Ok(()));
    }
}
