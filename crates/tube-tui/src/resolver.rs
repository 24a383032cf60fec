//! Stream resolver — turns a page URL into a direct audio stream URL.
//!
//! Shells out to yt-dlp in metadata-only mode (`-j`, no download) and picks
//! the best-audio format's URL plus the display title from the info JSON.

use serde_json::Value;
use tracing::{debug, info};

use tube_core::session::PlayerError;

const FALLBACK_TITLE: &str = "Unknown Title";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStream {
    pub stream_url: String,
    pub title: String,
}

/// Resolve `page_url` to a playable stream.  Runs a yt-dlp subprocess to
/// completion; callers spawn this on a background task.
pub async fn resolve(page_url: &str) -> Result<ResolvedStream, PlayerError> {
    let binary = tube_core::platform::find_yt_dlp_binary().ok_or_else(|| {
        PlayerError::Resolve("yt-dlp not found, make sure it is installed".into())
    })?;

    debug!("resolver: running {} for {}", binary.display(), page_url);
    let output = tokio::process::Command::new(&binary)
        .arg("-f")
        .arg("bestaudio")
        .arg("--no-warnings")
        .arg("--no-playlist")
        .arg("-j")
        .arg(page_url)
        .stdin(std::process::Stdio::null())
        .output()
        .await
        .map_err(|e| PlayerError::Resolve(format!("failed to run yt-dlp: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let first_line = stderr.lines().next().unwrap_or("yt-dlp failed").trim();
        return Err(PlayerError::Resolve(first_line.to_string()));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let resolved = parse_info_json(&stdout)?;
    info!("resolver: {} → {:?}", page_url, resolved.title);
    Ok(resolved)
}

/// Parse yt-dlp's single-line info JSON.  With `-f bestaudio` the top-level
/// `url` field already points at the selected format.
fn parse_info_json(raw: &str) -> Result<ResolvedStream, PlayerError> {
    let info: Value = serde_json::from_str(raw.trim())
        .map_err(|e| PlayerError::Resolve(format!("unreadable extractor output: {e}")))?;

    let stream_url = info
        .get("url")
        .and_then(|v| v.as_str())
        .ok_or_else(|| PlayerError::Resolve("no audio stream in extractor output".into()))?
        .to_string();

    let title = info
        .get("title")
        .and_then(|v| v.as_str())
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(FALLBACK_TITLE)
        .to_string();

    Ok(ResolvedStream { stream_url, title })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_info() {
        let raw = r#"{"title": "Some Mix", "url": "https://cdn.example/audio.m4a", "ext": "m4a"}"#;
        let resolved = parse_info_json(raw).unwrap();
        assert_eq!(resolved.stream_url, "https://cdn.example/audio.m4a");
        assert_eq!(resolved.title, "Some Mix");
    }

    #[test]
    fn test_parse_missing_title_falls_back() {
        let raw = r#"{"url": "https://cdn.example/audio.m4a"}"#;
        let resolved = parse_info_json(raw).unwrap();
        assert_eq!(resolved.title, FALLBACK_TITLE);
    }

    #[test]
    fn test_parse_empty_title_falls_back() {
        let raw = r#"{"title": "  ", "url": "https://cdn.example/audio.m4a"}"#;
        let resolved = parse_info_json(raw).unwrap();
        assert_eq!(resolved.title, FALLBACK_TITLE);
    }

    #[test]
    fn test_parse_missing_url_is_resolve_error() {
        let raw = r#"{"title": "Some Mix"}"#;
        match parse_info_json(raw) {
            Err(PlayerError::Resolve(_)) => {}
            other => panic!("expected resolve error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_garbage_is_resolve_error() {
        assert!(matches!(
            parse_info_json("not json"),
            Err(PlayerError::Resolve(_))
        ));
    }
}
