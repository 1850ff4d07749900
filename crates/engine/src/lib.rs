//! scrubkit engine
//!
//! Keeps a full-quality media surface and a sprite-sheet preview in step
//! while the user scrubs, plays, steps and follows links:
//!
//! - **Player:** the playback sync state machine and its seek tickets
//! - **Scrub:** pointer drags coalesced to one frame per animation frame
//! - **Keyboard:** space and arrow bindings
//! - **Ticks:** frame-callback or polled position updates
//! - **Share / tutorial:** link building and onboarding progress
//! - **Session:** loading, wiring and the event loop tying it together

pub mod keyboard;
pub mod media;
pub mod player;
pub mod scrub;
pub mod session;
pub mod share;
pub mod ticks;
pub mod tutorial;

pub use keyboard::{handle_key, Key};
pub use media::{MediaEvent, MediaSurface, SeekTicket};
pub use player::{Phase, PendingSeek, Player, PlayerOptions, ScrubberState, SeekPurpose, SyncOutcome};
pub use scrub::{
    CaptureFlag, FrameScheduler, FrameToken, PointerCapture, ScrubController, StripGeometry,
    TokioFrameScheduler,
};
pub use session::{Flow, Session, SessionEvent, SessionParts, StripLayout};
pub use share::{copy_share_link, incoming_range, share_url, Clipboard, CopyStatus};
pub use ticks::{FrameCallbackHandle, FrameCallbackTicker, PollTicker, PositionUpdates};
pub use tutorial::{
    JsonFileStore, MemoryStore, TutorialPhase, TutorialStore, TutorialTracker, CELEBRATION,
};
