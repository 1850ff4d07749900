//! Tutorial progress tracker.
//!
//! Counts the three onboarding interactions, persists progress after each
//! newly completed one, and celebrates briefly once all three are done.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use scrubkit_common::config::TutorialConfig;
use scrubkit_common::error::{ScrubError, ScrubResult};
use scrubkit_model::{TutorialAction, TutorialState};

/// How long the completion message stays up before the tutorial hides.
pub const CELEBRATION: Duration = Duration::from_secs(2);

/// Key/value persistence for small UI records.
pub trait TutorialStore: Send + Sync {
    fn load(&self, key: &str) -> ScrubResult<Option<String>>;
    fn save(&self, key: &str, value: &str) -> ScrubResult<()>;
    fn remove(&self, key: &str) -> ScrubResult<()>;
}

/// Stores each key as `{dir}/{key}.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config(config: &TutorialConfig) -> Self {
        Self::new(&config.store_dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl TutorialStore for JsonFileStore {
    fn load(&self, key: &str) -> ScrubResult<Option<String>> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, value: &str) -> ScrubResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> ScrubResult<()> {
        match std::fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TutorialStore for MemoryStore {
    fn load(&self, key: &str) -> ScrubResult<Option<String>> {
        Ok(self.get(key))
    }

    fn save(&self, key: &str, value: &str) -> ScrubResult<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> ScrubResult<()> {
        self.lock().remove(key);
        Ok(())
    }
}

/// Visibility of the tutorial panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TutorialPhase {
    Visible,
    /// All actions done; shown for [`CELEBRATION`] then hidden.
    Celebrating,
    Hidden,
}

pub struct TutorialTracker {
    store: Box<dyn TutorialStore>,
    key: String,
    state: TutorialState,
    phase: TutorialPhase,
}

impl TutorialTracker {
    /// Restore progress from `store`. A record that cannot be read or parsed
    /// is replaced by a fresh one.
    pub fn load(store: Box<dyn TutorialStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let state = match store.load(&key) {
            Ok(Some(text)) => serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::warn!(key = %key, error = %e, "Discarding unreadable tutorial record");
                TutorialState::default()
            }),
            Ok(None) => TutorialState::default(),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to read tutorial record");
                TutorialState::default()
            }
        };
        let phase = if state.is_complete() {
            TutorialPhase::Hidden
        } else {
            TutorialPhase::Visible
        };
        tracing::debug!(
            key = %key,
            completed = state.completed_count(),
            ?phase,
            "Tutorial progress loaded"
        );
        Self {
            store,
            key,
            state,
            phase,
        }
    }

    pub fn state(&self) -> &TutorialState {
        &self.state
    }

    pub fn phase(&self) -> TutorialPhase {
        self.phase
    }

    pub fn is_visible(&self) -> bool {
        self.phase != TutorialPhase::Hidden
    }

    /// Record `action`. Returns `true` when it was not done before.
    pub fn complete(&mut self, action: TutorialAction) -> bool {
        if !self.state.mark(action) {
            return false;
        }
        tracing::debug!(%action, completed = self.state.completed_count(), "Tutorial step done");
        self.persist();
        if self.state.is_complete() && self.phase == TutorialPhase::Visible {
            self.phase = TutorialPhase::Celebrating;
        }
        true
    }

    /// Hide the tutorial.
    pub fn dismiss(&mut self) {
        self.phase = TutorialPhase::Hidden;
    }

    /// Forget all progress and show the tutorial again.
    pub fn reset(&mut self) -> ScrubResult<()> {
        self.store.remove(&self.key)?;
        self.state = TutorialState::default();
        self.phase = TutorialPhase::Visible;
        Ok(())
    }

    fn persist(&self) {
        let result = serde_json::to_string(&self.state)
            .map_err(ScrubError::from)
            .and_then(|json| self.store.save(&self.key, &json));
        if let Err(e) = result {
            tracing::warn!(key = %self.key, error = %e, "Failed to persist tutorial progress");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Shares one [`MemoryStore`] between trackers.
    struct Shared(Arc<MemoryStore>);

    impl TutorialStore for Shared {
        fn load(&self, key: &str) -> ScrubResult<Option<String>> {
            self.0.load(key)
        }
        fn save(&self, key: &str, value: &str) -> ScrubResult<()> {
            self.0.save(key, value)
        }
        fn remove(&self, key: &str) -> ScrubResult<()> {
            self.0.remove(key)
        }
    }

    const KEY: &str = "video-scrubber-tutorial";

    #[test]
    fn test_complete_is_idempotent_and_persists() {
        let store = Arc::new(MemoryStore::new());
        let mut tracker = TutorialTracker::load(Box::new(Shared(store.clone())), KEY);
        assert!(tracker.complete(TutorialAction::Space));
        assert!(!tracker.complete(TutorialAction::Space));

        let saved: serde_json::Value =
            serde_json::from_str(&store.get(KEY).unwrap()).unwrap();
        assert_eq!(saved["space"], true);
        assert_eq!(saved["scrub"], false);
    }

    #[test]
    fn test_all_actions_celebrate_then_hide() {
        let mut tracker = TutorialTracker::load(Box::new(MemoryStore::new()), KEY);
        for action in TutorialAction::ALL {
            assert_eq!(tracker.phase(), TutorialPhase::Visible);
            tracker.complete(action);
        }
        assert_eq!(tracker.phase(), TutorialPhase::Celebrating);
        tracker.dismiss();
        assert!(!tracker.is_visible());
    }

    #[test]
    fn test_completed_record_starts_hidden() {
        let store = Arc::new(MemoryStore::new());
        store
            .save(KEY, r#"{"scrub":true,"space":true,"arrows":true}"#)
            .unwrap();
        let tracker = TutorialTracker::load(Box::new(Shared(store)), KEY);
        assert_eq!(tracker.phase(), TutorialPhase::Hidden);
    }

    #[test]
    fn test_corrupt_record_starts_fresh() {
        let store = MemoryStore::new();
        store.save(KEY, "{not json").unwrap();
        let tracker = TutorialTracker::load(Box::new(store), KEY);
        assert_eq!(tracker.state().completed_count(), 0);
        assert!(tracker.is_visible());
    }

    #[test]
    fn test_reset_removes_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = TutorialTracker::load(Box::new(JsonFileStore::new(dir.path())), KEY);
        tracker.complete(TutorialAction::Arrows);
        let path = dir.path().join(format!("{KEY}.json"));
        assert!(path.exists());

        tracker.reset().unwrap();
        assert!(!path.exists());
        assert_eq!(tracker.state().completed_count(), 0);

        let reloaded = TutorialTracker::load(Box::new(JsonFileStore::new(dir.path())), KEY);
        assert!(!reloaded.state().is_done(TutorialAction::Arrows));
    }
}
