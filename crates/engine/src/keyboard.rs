//! Keyboard bindings.

use scrubkit_model::TutorialAction;

use crate::player::Player;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Space,
    ArrowLeft,
    ArrowRight,
    Other,
}

impl Key {
    /// Map a DOM-style key code (`"Space"`, `"ArrowLeft"`, ...).
    pub fn from_code(code: &str) -> Self {
        match code {
            "Space" | " " => Self::Space,
            "ArrowLeft" => Self::ArrowLeft,
            "ArrowRight" => Self::ArrowRight,
            _ => Self::Other,
        }
    }
}

/// Apply a key press. Returns the tutorial action it counts towards.
pub fn handle_key(player: &mut Player, key: Key) -> Option<TutorialAction> {
    match key {
        Key::Space => {
            player.toggle_playback();
            Some(TutorialAction::Space)
        }
        Key::ArrowLeft => {
            player.step_frame(-1);
            Some(TutorialAction::Arrows)
        }
        Key::ArrowRight => {
            player.step_frame(1);
            Some(TutorialAction::Arrows)
        }
        Key::Other => None,
    }
}
