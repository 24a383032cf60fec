//! Persisted URL store — a small ordered list of named URLs.
//!
//! On disk this is a JSON array of `"<name> - <url>"` strings, byte-compatible
//! with the file the original app wrote.  In memory each entry is an explicit
//! two-field record; only the first `" - "` in the encoded form is treated as
//! the separator, so URLs containing `" - "` survive a round trip.
//!
//! Single-threaded access from the UI-facing task only; every mutation
//! persists synchronously.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

const SEPARATOR: &str = " - ";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedUrl {
    pub name: String,
    pub url: String,
}

impl SavedUrl {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// The on-disk form, `"<name> - <url>"`.
    pub fn encode(&self) -> String {
        format!("{}{}{}", self.name, SEPARATOR, self.url)
    }

    /// Parse an encoded entry.  Splits on the first `" - "` only.
    /// Returns `None` for strings without a separator.
    pub fn decode(encoded: &str) -> Option<Self> {
        let (name, url) = encoded.split_once(SEPARATOR)?;
        Some(Self::new(name, url))
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("this URL is already saved")]
    AlreadyExists,
    #[error("entry not found")]
    NotFound,
    #[error("failed to write saved URLs: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode saved URLs: {0}")]
    Json(#[from] serde_json::Error),
}

/// The saved-URL list plus its backing file.
pub struct UrlStore {
    path: PathBuf,
    entries: Vec<SavedUrl>,
}

impl UrlStore {
    /// Load the store from `path`.  A missing file yields an empty store; a
    /// file that fails to parse also yields an empty store with a warning —
    /// never an error to the caller.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = read_entries(&path);
        Self { path, entries }
    }

    /// Create an empty store without touching disk (tests, first run).
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[SavedUrl] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry and persist.  Fails with `AlreadyExists` when the
    /// encoded form is already present — two distinct names wrapping the
    /// same URL are distinct entries.
    ///
    /// If persisting fails the entry stays in the in-memory list (the user
    /// does not lose what they typed) and the write error is returned.
    pub fn add(&mut self, entry: SavedUrl) -> Result<(), StoreError> {
        let encoded = entry.encode();
        if self.entries.iter().any(|e| e.encode() == encoded) {
            return Err(StoreError::AlreadyExists);
        }
        self.entries.push(entry);
        self.save()
    }

    /// Remove the entry whose encoded form matches exactly, then persist.
    pub fn remove(&mut self, encoded: &str) -> Result<(), StoreError> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.encode() == encoded)
            .ok_or(StoreError::NotFound)?;
        self.entries.remove(idx);
        self.save()
    }

    /// Overwrite the backing file with the full current list.
    pub fn save(&self) -> Result<(), StoreError> {
        let encoded: Vec<String> = self.entries.iter().map(|e| e.encode()).collect();
        let json = serde_json::to_string(&encoded)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

fn read_entries(path: &Path) -> Vec<SavedUrl> {
    if !path.exists() {
        return Vec::new();
    }
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("failed to read saved URLs from {}: {}", path.display(), e);
            return Vec::new();
        }
    };
    let encoded: Vec<String> = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!("failed to parse saved URLs in {}: {}", path.display(), e);
            return Vec::new();
        }
    };
    // Entries without a separator are skipped rather than dropped silently.
    encoded
        .iter()
        .filter_map(|s| {
            let parsed = SavedUrl::decode(s);
            if parsed.is_none() {
                warn!("skipping malformed saved URL entry: {:?}", s);
            }
            parsed
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, UrlStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = UrlStore::load(dir.path().join("saved_urls.json"));
        (dir, store)
    }

    #[test]
    fn test_encode_decode() {
        let entry = SavedUrl::new("Music", "https://youtu.be/abc");
        let encoded = entry.encode();
        assert_eq!(encoded, "Music - https://youtu.be/abc");
        assert_eq!(SavedUrl::decode(&encoded).unwrap(), entry);
    }

    #[test]
    fn test_decode_splits_on_first_separator_only() {
        let entry = SavedUrl::decode("Mix - https://youtu.be/a - b").unwrap();
        assert_eq!(entry.name, "Mix");
        assert_eq!(entry.url, "https://youtu.be/a - b");
    }

    #[test]
    fn test_decode_rejects_missing_separator() {
        assert!(SavedUrl::decode("just a string").is_none());
    }

    #[test]
    fn test_add_then_load_contains_entry_once() {
        let (dir, mut store) = temp_store();
        let entry = SavedUrl::new("Music", "https://youtu.be/abc");
        store.add(entry.clone()).unwrap();

        let loaded = UrlStore::load(dir.path().join("saved_urls.json"));
        let matches: Vec<_> = loaded.entries().iter().filter(|e| **e == entry).collect();
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn test_duplicate_add_fails_without_duplicating() {
        let (_dir, mut store) = temp_store();
        let entry = SavedUrl::new("Music", "https://youtu.be/abc");
        store.add(entry.clone()).unwrap();
        match store.add(entry) {
            Err(StoreError::AlreadyExists) => {}
            other => panic!("expected AlreadyExists, got {other:?}"),
        }
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_same_url_different_name_is_distinct() {
        let (_dir, mut store) = temp_store();
        store
            .add(SavedUrl::new("Music", "https://youtu.be/abc"))
            .unwrap();
        store
            .add(SavedUrl::new("Workout", "https://youtu.be/abc"))
            .unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_remove_then_load_never_returns_entry() {
        let (dir, mut store) = temp_store();
        let entry = SavedUrl::new("Music", "https://youtu.be/abc");
        store.add(entry.clone()).unwrap();
        store.remove(&entry.encode()).unwrap();

        let loaded = UrlStore::load(dir.path().join("saved_urls.json"));
        assert!(loaded.entries().is_empty());
    }

    #[test]
    fn test_remove_absent_is_not_found_and_list_unchanged() {
        let (_dir, mut store) = temp_store();
        store
            .add(SavedUrl::new("Music", "https://youtu.be/abc"))
            .unwrap();
        match store.remove("Other - https://youtu.be/zzz") {
            Err(StoreError::NotFound) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_save_load_round_trip_preserves_order() {
        let (dir, mut store) = temp_store();
        let entries = vec![
            SavedUrl::new("B", "https://youtu.be/b"),
            SavedUrl::new("A", "https://youtu.be/a"),
            SavedUrl::new("C", "https://youtu.be/c"),
        ];
        for e in &entries {
            store.add(e.clone()).unwrap();
        }

        let loaded = UrlStore::load(dir.path().join("saved_urls.json"));
        let encoded: Vec<String> = loaded.entries().iter().map(|e| e.encode()).collect();
        let expected: Vec<String> = entries.iter().map(|e| e.encode()).collect();
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_load_garbage_file_yields_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved_urls.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = UrlStore::load(&path);
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_missing_file_yields_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = UrlStore::load(dir.path().join("nope.json"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_on_disk_format_is_string_array() {
        let (dir, mut store) = temp_store();
        store
            .add(SavedUrl::new("Music", "https://youtu.be/abc"))
            .unwrap();
        let raw = std::fs::read_to_string(dir.path().join("saved_urls.json")).unwrap();
        let parsed: Vec<String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, vec!["Music - https://youtu.be/abc".to_string()]);
    }
}
