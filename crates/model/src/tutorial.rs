//! Onboarding progress record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The three interactions the tutorial teaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TutorialAction {
    /// Drag across the filmstrip.
    Scrub,
    /// Toggle playback with the space bar.
    Space,
    /// Step frames with the arrow keys.
    Arrows,
}

impl TutorialAction {
    pub const ALL: [TutorialAction; 3] = [Self::Scrub, Self::Space, Self::Arrows];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scrub => "scrub",
            Self::Space => "space",
            Self::Arrows => "arrows",
        }
    }
}

impl std::fmt::Display for TutorialAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted progress. Missing fields read as not yet done, so partial
/// records from older builds still load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TutorialState {
    pub scrub: bool,
    pub space: bool,
    pub arrows: bool,

    /// When the last action was first completed. Only written once the
    /// record is complete; plain `{scrub, space, arrows}` records load as is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl TutorialState {
    pub fn is_done(&self, action: TutorialAction) -> bool {
        match action {
            TutorialAction::Scrub => self.scrub,
            TutorialAction::Space => self.space,
            TutorialAction::Arrows => self.arrows,
        }
    }

    /// Mark `action` done. Returns `false` when it already was.
    pub fn mark(&mut self, action: TutorialAction) -> bool {
        if self.is_done(action) {
            return false;
        }
        match action {
            TutorialAction::Scrub => self.scrub = true,
            TutorialAction::Space => self.space = true,
            TutorialAction::Arrows => self.arrows = true,
        }
        if self.is_complete() {
            self.completed_at = Some(Utc::now());
        }
        true
    }

    pub fn completed_count(&self) -> usize {
        TutorialAction::ALL
            .iter()
            .filter(|action| self.is_done(**action))
            .count()
    }

    pub fn total_count(&self) -> usize {
        TutorialAction::ALL.len()
    }

    pub fn is_complete(&self) -> bool {
        self.scrub && self.space && self.arrows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_is_idempotent() {
        let mut state = TutorialState::default();
        assert!(state.mark(TutorialAction::Space));
        assert!(!state.mark(TutorialAction::Space));
        assert_eq!(state.completed_count(), 1);
        assert!(state.completed_at.is_none());
    }

    #[test]
    fn test_completion_stamps_time() {
        let mut state = TutorialState::default();
        for action in TutorialAction::ALL {
            state.mark(action);
        }
        assert!(state.is_complete());
        assert!(state.completed_at.is_some());
        assert_eq!(state.completed_count(), state.total_count());
    }

    #[test]
    fn test_partial_record_loads() {
        let state: TutorialState = serde_json::from_str(r#"{"scrub": true}"#).unwrap();
        assert!(state.scrub);
        assert!(!state.space);
        assert!(!state.arrows);
    }

    #[test]
    fn test_serialized_shape() {
        let mut state = TutorialState::default();
        state.mark(TutorialAction::Arrows);
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"scrub":false,"space":false,"arrows":true}"#);
    }

    #[test]
    fn test_complete_record_shape() {
        let plain: TutorialState =
            serde_json::from_str(r#"{"scrub":true,"space":true,"arrows":true}"#).unwrap();
        assert!(plain.is_complete());
        assert!(plain.completed_at.is_none());
        assert_eq!(
            serde_json::to_string(&plain).unwrap(),
            r#"{"scrub":true,"space":true,"arrows":true}"#
        );

        let mut state = TutorialState::default();
        for action in TutorialAction::ALL {
            state.mark(action);
        }
        let value = serde_json::to_value(&state).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 4);
        assert!(value["completedAt"].is_string());
        let reloaded: TutorialState = serde_json::from_value(value).unwrap();
        assert_eq!(reloaded, state);
    }
}
