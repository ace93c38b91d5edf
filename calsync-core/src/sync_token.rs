//! Per-calendar sync tokens.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{CalSyncError, CalSyncResult};

/// Maps calendar ids to the last continuation token the remote handed out.
///
/// Tokens are only replaced or invalidated, never expired on a timer: expiry is
/// discovered when the remote rejects a token. When a path is set the map
/// survives restarts as a small TOML file.
#[derive(Debug, Default)]
pub struct SyncTokenStore {
    tokens: BTreeMap<String, String>,
    path: Option<PathBuf>,
    dirty: bool,
}

impl SyncTokenStore {
    /// In-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the store backed by `path`. A missing file is an empty store.
    pub fn load(path: impl Into<PathBuf>) -> CalSyncResult<Self> {
        let path = path.into();

        let tokens = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str(&content).map_err(|e| {
                CalSyncError::TokenStore(format!("{}: {}", path.display(), e))
            })?
        } else {
            BTreeMap::new()
        };

        Ok(SyncTokenStore {
            tokens,
            path: Some(path),
            dirty: false,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, calendar_id: &str) -> Option<&str> {
        self.tokens.get(calendar_id).map(String::as_str)
    }

    pub fn set(&mut self, calendar_id: &str, token: impl Into<String>) {
        let token = token.into();
        if self.get(calendar_id) != Some(token.as_str()) {
            self.tokens.insert(calendar_id.to_string(), token);
            self.dirty = true;
        }
    }

    /// Forget the token for `calendar_id` after the remote rejected it.
    pub fn invalidate(&mut self, calendar_id: &str) -> Option<String> {
        let removed = self.tokens.remove(calendar_id);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    pub fn clear(&mut self) {
        if !self.tokens.is_empty() {
            self.tokens.clear();
            self.dirty = true;
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the map to disk if it changed since the last save.
    pub fn save(&mut self) -> CalSyncResult<()> {
        let Some(path) = &self.path else {
            self.dirty = false;
            return Ok(());
        };

        if !self.dirty {
            return Ok(());
        }

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        // BTreeMap keeps the file sorted and diffable
        let content = toml::to_string(&self.tokens)
            .map_err(|e| CalSyncError::Serialization(e.to_string()))?;

        let temp = path.with_extension("toml.tmp");
        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, path)?;

        self.dirty = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrites_and_invalidate_removes() {
        let mut store = SyncTokenStore::new();
        assert_eq!(store.get("work"), None);

        store.set("work", "T1");
        store.set("work", "T2");
        assert_eq!(store.get("work"), Some("T2"));

        assert_eq!(store.invalidate("work").as_deref(), Some("T2"));
        assert_eq!(store.get("work"), None);
        assert_eq!(store.invalidate("work"), None);
    }

    #[test]
    fn test_tokens_are_scoped_per_calendar() {
        let mut store = SyncTokenStore::new();
        store.set("work", "W");
        store.set("home", "H");
        store.invalidate("work");
        assert_eq!(store.get("home"), Some("H"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("sync_tokens.toml");

        let mut store = SyncTokenStore::load(&path).unwrap();
        assert!(store.is_empty());

        store.set("primary", "abc");
        store.set("team@group.calendar.google.com", "xyz");
        assert!(store.is_dirty());
        store.save().unwrap();
        assert!(!store.is_dirty());

        let reloaded = SyncTokenStore::load(&path).unwrap();
        assert_eq!(reloaded.get("primary"), Some("abc"));
        assert_eq!(reloaded.get("team@group.calendar.google.com"), Some("xyz"));
    }

    #[test]
    fn test_unchanged_token_does_not_mark_dirty() {
        let mut store = SyncTokenStore::new();
        store.set("work", "T1");
        store.save().unwrap();
        store.set("work", "T1");
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync_tokens.toml");
        std::fs::write(&path, "not = [valid").unwrap();

        let err = SyncTokenStore::load(&path).unwrap_err();
        assert!(matches!(err, CalSyncError::TokenStore(_)));
    }
}
