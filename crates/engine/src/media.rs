//! The full-quality media surface.
//!
//! The engine never decodes video itself. It drives an external surface
//! (an HTML video element, a GStreamer sink, a test double) through this
//! trait and learns about seek completion through
//! [`Player::on_seek_complete`](crate::player::Player::on_seek_complete).

use scrubkit_common::error::ScrubResult;

/// Identifies one seek request. Completions carrying an older ticket than
/// the one the player is waiting for are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeekTicket(pub u64);

impl std::fmt::Display for SeekTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "seek#{}", self.0)
    }
}

/// Trait for a seekable, playable media element.
pub trait MediaSurface: Send {
    /// Whether enough of the media has loaded to accept seeks.
    fn is_ready(&self) -> bool;

    /// Begin moving the playhead to `time_secs`. The surface must report
    /// completion of this request with the same ticket.
    fn seek(&mut self, ticket: SeekTicket, time_secs: f64);

    /// Start playback from the current position.
    fn play(&mut self) -> ScrubResult<()>;

    /// Stop playback, keeping the position.
    fn pause(&mut self);

    /// Current playhead in seconds.
    fn current_time(&self) -> f64;

    /// Apply a playback rate multiplier.
    fn set_playback_rate(&mut self, rate: f64);
}

/// Notifications a media surface sends back to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    /// Enough data is buffered to seek.
    Ready,
    /// A seek settled.
    SeekComplete(SeekTicket),
}
