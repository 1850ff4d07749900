//! Playback sync state machine.
//!
//! [`Player`] is the single writer of the scrubber state: current frame and
//! time, play/pause, speed, skip-silence and whether the full-quality video
//! or the sprite preview is visible. It drives a [`MediaSurface`] and a
//! preview [`FramePresenter`] and reacts to seek completions.
//!
//! ```text
//!            finish_loading
//!  Loading ─────────────────► Paused ◄──────────► Playing
//!     │                        │  ▲     play/pause   │
//!     │ fail                   │  │ end_scrub        │ begin_scrub
//!     ▼                        ▼  │                  ▼
//!  Failed                 Scrubbing{resume} ◄────────┘
//! ```
//!
//! The video is only revealed (`show_video`) from a seek-completion
//! continuation, so the visible frame never runs ahead of its seek target.
//! At most one seek continuation is pending; issuing a new seek replaces
//! it, and completions for replaced tickets are ignored.

use std::sync::Arc;

use scrubkit_common::config::PlaybackDefaults;
use scrubkit_common::error::{ScrubError, ScrubResult};
use scrubkit_model::{PlayableRegions, Speed, SpriteMetadata};
use scrubkit_render::FramePresenter;
use serde::Serialize;
use tokio::sync::watch;

use crate::media::{MediaSurface, SeekTicket};

/// Coarse lifecycle of the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum Phase {
    /// Metadata is known; sprites or media are still arriving.
    Loading,
    Paused,
    Playing,
    /// A drag is in progress. `resume` records whether playback should
    /// restart when it ends.
    Scrubbing { resume: bool },
    /// Loading failed; the session is unusable.
    Failed,
}

/// What happens when a seek settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekPurpose {
    /// Reveal the video and start playback from where it landed.
    StartPlayback,
    /// Reveal the video after a scrub; resume playback if it was active.
    ScrubRelease { resume: bool },
    /// Reveal the video.
    Reveal,
    /// Keep the surface aligned with the current frame.
    Follow,
}

impl SeekPurpose {
    /// Purpose of a seek that replaces one with purpose `prior`. A seek that
    /// only moves the target keeps the intent of the one it replaces.
    fn replacing(self, prior: SeekPurpose) -> SeekPurpose {
        match (prior, self) {
            (SeekPurpose::StartPlayback, SeekPurpose::Follow | SeekPurpose::Reveal) => {
                SeekPurpose::StartPlayback
            }
            (SeekPurpose::ScrubRelease { resume }, SeekPurpose::Follow | SeekPurpose::Reveal) => {
                SeekPurpose::ScrubRelease { resume }
            }
            (SeekPurpose::Reveal, SeekPurpose::Follow) => SeekPurpose::Reveal,
            (_, next) => next,
        }
    }
}

/// The seek the player is waiting on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingSeek {
    /// `None` while deferred until the surface is ready.
    pub ticket: Option<SeekTicket>,
    pub target: f64,
    pub purpose: SeekPurpose,
}

/// Observable scrubber state, published after every operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrubberState {
    pub current_frame: usize,
    pub current_time: f64,
    pub is_playing: bool,
    pub speed: f64,
    pub skip_silence: bool,
    pub show_video: bool,
    pub phase: Phase,
}

/// Result of one playback-position update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncOutcome {
    /// Not playing; nothing to do.
    Idle,
    /// Position tracked to `frame`.
    Tracked { frame: usize },
    /// Playback was outside every playable region and jumped ahead.
    Skipped { to: f64 },
    /// No playable region remains; playback paused.
    Ended,
}

/// Tunables the player takes from configuration.
#[derive(Debug, Clone)]
pub struct PlayerOptions {
    pub region_margin_secs: f64,
    pub timestamp_offset_secs: f64,
    pub speed: Speed,
    pub skip_silence: bool,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self::from(&PlaybackDefaults::default())
    }
}

impl From<&PlaybackDefaults> for PlayerOptions {
    fn from(defaults: &PlaybackDefaults) -> Self {
        Self {
            region_margin_secs: defaults.region_margin_secs,
            timestamp_offset_secs: defaults.timestamp_offset_secs,
            speed: Speed::saturating(defaults.speed),
            skip_silence: defaults.skip_silence,
        }
    }
}

/// Owns the scrubber state and keeps the media surface in step with it.
pub struct Player {
    metadata: Arc<SpriteMetadata>,
    regions: PlayableRegions,
    media: Box<dyn MediaSurface>,
    presenter: Option<Arc<dyn FramePresenter>>,
    phase: Phase,
    current_frame: usize,
    current_time: f64,
    speed: Speed,
    skip_silence: bool,
    show_video: bool,
    timestamp_offset: f64,
    pending: Option<PendingSeek>,
    next_ticket: u64,
    failure: Option<String>,
    state_tx: watch::Sender<ScrubberState>,
}

impl Player {
    /// Create a player in the `Loading` phase at frame 0.
    pub fn new(
        metadata: Arc<SpriteMetadata>,
        media: Box<dyn MediaSurface>,
        options: PlayerOptions,
    ) -> Self {
        let regions = PlayableRegions::from_metadata(&metadata, options.region_margin_secs);
        if regions.rejected() > 0 {
            tracing::warn!(
                rejected = regions.rejected(),
                "Ignored malformed speech segments"
            );
        }

        let initial = ScrubberState {
            current_frame: 0,
            current_time: 0.0,
            is_playing: false,
            speed: options.speed.value(),
            skip_silence: options.skip_silence,
            show_video: false,
            phase: Phase::Loading,
        };
        let (state_tx, _) = watch::channel(initial);

        Self {
            metadata,
            regions,
            media,
            presenter: None,
            phase: Phase::Loading,
            current_frame: 0,
            current_time: 0.0,
            speed: options.speed,
            skip_silence: options.skip_silence,
            show_video: false,
            timestamp_offset: options.timestamp_offset_secs,
            pending: None,
            next_ticket: 1,
            failure: None,
            state_tx,
        }
    }

    /// Attach the preview renderer shown while the video is hidden.
    pub fn with_presenter(mut self, presenter: Arc<dyn FramePresenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    // ── Accessors ───────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }

    pub fn is_scrubbing(&self) -> bool {
        matches!(self.phase, Phase::Scrubbing { .. })
    }

    pub fn show_video(&self) -> bool {
        self.show_video
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    pub fn skip_silence(&self) -> bool {
        self.skip_silence
    }

    pub fn metadata(&self) -> &Arc<SpriteMetadata> {
        &self.metadata
    }

    pub fn regions(&self) -> &PlayableRegions {
        &self.regions
    }

    pub fn pending_seek(&self) -> Option<&PendingSeek> {
        self.pending.as_ref()
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn media(&self) -> &dyn MediaSurface {
        self.media.as_ref()
    }

    pub fn snapshot(&self) -> ScrubberState {
        ScrubberState {
            current_frame: self.current_frame,
            current_time: self.current_time,
            is_playing: self.is_playing(),
            speed: self.speed.value(),
            skip_silence: self.skip_silence,
            show_video: self.show_video,
            phase: self.phase,
        }
    }

    /// Receive a fresh [`ScrubberState`] after every change.
    pub fn subscribe(&self) -> watch::Receiver<ScrubberState> {
        self.state_tx.subscribe()
    }

    // ── Lifecycle ───────────────────────────────────────────────

    /// Sprites are in place: leave `Loading`, draw the first preview and,
    /// if the surface is already usable, reveal it.
    pub fn finish_loading(&mut self) -> ScrubResult<()> {
        match self.phase {
            Phase::Loading => {}
            Phase::Failed => {
                return Err(ScrubError::loading(
                    self.failure.clone().unwrap_or_default(),
                ))
            }
            _ => return Ok(()),
        }

        self.phase = Phase::Paused;
        self.media.set_playback_rate(self.speed.playback_rate());
        self.present(self.current_frame);
        tracing::debug!(frame = self.current_frame, "Player ready");
        self.flush_or_reveal();
        self.publish();
        Ok(())
    }

    /// Enter the terminal `Failed` phase.
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(error = %message, "Player failed to load");
        self.phase = Phase::Failed;
        self.pending = None;
        self.failure = Some(message);
        self.publish();
    }

    /// The media surface can now accept seeks.
    pub fn on_media_ready(&mut self) {
        tracing::debug!(phase = ?self.phase, "Media surface ready");
        if matches!(self.phase, Phase::Loading | Phase::Failed) {
            return;
        }
        self.flush_or_reveal();
        self.publish();
    }

    fn flush_or_reveal(&mut self) {
        if !self.media.is_ready() {
            return;
        }
        match self.pending {
            Some(PendingSeek {
                ticket: None,
                target,
                purpose,
            }) => {
                let purpose = if self.show_video {
                    purpose
                } else {
                    SeekPurpose::Reveal.replacing(purpose)
                };
                self.dispatch_seek(target, purpose)
            }
            None if !self.show_video && !self.is_scrubbing() => {
                self.issue_seek(self.current_time, SeekPurpose::Reveal)
            }
            _ => {}
        }
    }

    // ── Playback ────────────────────────────────────────────────

    pub fn play(&mut self) {
        match self.phase {
            Phase::Loading | Phase::Failed | Phase::Playing => return,
            Phase::Scrubbing { .. } => {
                self.phase = Phase::Scrubbing { resume: true };
                self.publish();
                return;
            }
            Phase::Paused => {}
        }

        match self.pending.as_mut() {
            Some(PendingSeek {
                purpose: SeekPurpose::StartPlayback,
                ..
            }) => return,
            Some(PendingSeek {
                purpose: SeekPurpose::ScrubRelease { resume },
                ..
            }) => {
                *resume = true;
                self.publish();
                return;
            }
            _ => {}
        }

        if self.show_video {
            self.start_media();
        } else {
            tracing::debug!(time = self.current_time, "Seeking surface before playback");
            self.issue_seek(self.current_time, SeekPurpose::StartPlayback);
        }
        self.publish();
    }

    pub fn pause(&mut self) {
        match self.pending.as_mut() {
            Some(pending) if pending.purpose == SeekPurpose::StartPlayback => {
                tracing::debug!("Cancelled pending playback start");
                self.pending = None;
            }
            Some(PendingSeek {
                purpose: SeekPurpose::ScrubRelease { resume },
                ..
            }) => *resume = false,
            _ => {}
        }

        match self.phase {
            Phase::Playing => {
                self.media.pause();
                let landed = self.media.current_time();
                self.set_position(landed);
                self.phase = Phase::Paused;
                tracing::debug!(time = self.current_time, frame = self.current_frame, "Paused");
            }
            Phase::Scrubbing { .. } => self.phase = Phase::Scrubbing { resume: false },
            _ => {}
        }
        self.publish();
    }

    /// Whether playback is running or about to start.
    pub fn wants_playback(&self) -> bool {
        match self.phase {
            Phase::Playing | Phase::Scrubbing { resume: true } => true,
            _ => matches!(
                self.pending,
                Some(PendingSeek {
                    purpose: SeekPurpose::StartPlayback | SeekPurpose::ScrubRelease { resume: true },
                    ..
                })
            ),
        }
    }

    pub fn toggle_playback(&mut self) {
        if self.wants_playback() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Pause, then move exactly `delta` frames.
    pub fn step_frame(&mut self, delta: i64) {
        self.pause();
        let last = self.metadata.last_frame() as i64;
        let target = (self.current_frame as i64).saturating_add(delta).clamp(0, last);
        self.seek_to_frame(target as usize);
    }

    /// Apply a speed; the playback rate is updated whatever the phase.
    pub fn set_speed(&mut self, speed: f64) -> Speed {
        self.speed = Speed::saturating(speed);
        self.media.set_playback_rate(self.speed.playback_rate());
        tracing::debug!(speed = %self.speed, "Playback speed changed");
        self.publish();
        self.speed
    }

    pub fn set_skip_silence(&mut self, enabled: bool) {
        self.skip_silence = enabled;
        tracing::debug!(enabled, "Skip silence toggled");
        self.publish();
    }

    // ── Seeking ─────────────────────────────────────────────────

    /// Jump to a sampled frame.
    pub fn seek_to_frame(&mut self, frame: usize) {
        if self.phase == Phase::Failed {
            return;
        }
        let frame = frame.min(self.metadata.last_frame());
        if frame == self.current_frame {
            return;
        }

        self.current_frame = frame;
        self.current_time = self.metadata.time_at(frame);
        self.present(frame);

        if !self.is_scrubbing() {
            self.issue_seek(self.current_time, SeekPurpose::Follow);
        }
        self.publish();
    }

    /// Jump to the frame nearest `time_secs`.
    pub fn seek_to_time(&mut self, time_secs: f64) {
        let time = self.clamp_to_duration(time_secs);
        let frame = self.metadata.frame_at(time);
        self.seek_to_frame(frame);
    }

    /// Jump to an exact time from an external timestamp, compensating for
    /// recording latency, and reveal the video there.
    pub fn seek_to_exact_time(&mut self, time_secs: f64) {
        if self.phase == Phase::Failed {
            return;
        }
        let time = self.clamp_to_duration(time_secs + self.timestamp_offset);
        self.current_time = time;
        self.current_frame = self.metadata.frame_at(time);
        self.present(self.current_frame);

        if !self.is_scrubbing() {
            self.issue_seek(time, SeekPurpose::Reveal);
        }
        self.publish();
    }

    // ── Scrubbing ───────────────────────────────────────────────

    /// Enter scrubbing. Returns `false` when scrubbing is not possible.
    pub fn begin_scrub(&mut self) -> bool {
        let resume = match self.phase {
            Phase::Loading | Phase::Failed => return false,
            Phase::Scrubbing { .. } => return true,
            Phase::Playing => {
                self.media.pause();
                true
            }
            Phase::Paused => self.wants_playback(),
        };

        if let Some(pending) = self.pending.take() {
            tracing::debug!(purpose = ?pending.purpose, "Scrub supersedes pending seek");
        }
        self.phase = Phase::Scrubbing { resume };
        self.show_video = false;
        tracing::debug!(resume, "Scrub started");
        self.publish();
        true
    }

    /// Move the preview during a scrub. The media surface is left alone
    /// until the scrub ends.
    pub fn scrub_to_frame(&mut self, frame: usize) {
        if !self.is_scrubbing() {
            return;
        }
        let frame = frame.min(self.metadata.last_frame());
        if frame == self.current_frame {
            return;
        }
        self.current_frame = frame;
        self.current_time = self.metadata.time_at(frame);
        self.present(frame);
        self.publish();
    }

    /// Leave scrubbing and bring the surface to the scrubbed frame.
    pub fn end_scrub(&mut self) {
        let Phase::Scrubbing { resume } = self.phase else {
            return;
        };
        self.phase = Phase::Paused;
        let target = self.metadata.time_at(self.current_frame);
        self.current_time = target;
        tracing::debug!(frame = self.current_frame, resume, "Scrub ended");
        self.issue_seek(target, SeekPurpose::ScrubRelease { resume });
        self.publish();
    }

    // ── Surface feedback ────────────────────────────────────────

    /// A seek issued with `ticket` has settled. Returns whether it was the
    /// one being waited on.
    pub fn on_seek_complete(&mut self, ticket: SeekTicket) -> bool {
        let Some(pending) = self.pending else {
            tracing::trace!(%ticket, "Seek completed with nothing pending");
            return false;
        };
        if pending.ticket != Some(ticket) {
            tracing::trace!(%ticket, "Ignoring superseded seek completion");
            return false;
        }
        self.pending = None;

        if matches!(self.phase, Phase::Failed | Phase::Scrubbing { .. }) {
            self.publish();
            return true;
        }

        let landed = self.media.current_time();
        match pending.purpose {
            SeekPurpose::StartPlayback => {
                self.set_position(landed);
                self.show_video = true;
                self.start_media();
            }
            SeekPurpose::ScrubRelease { resume } => {
                self.set_position(landed);
                self.show_video = true;
                if resume {
                    self.start_media();
                }
            }
            SeekPurpose::Reveal => self.show_video = true,
            SeekPurpose::Follow => {}
        }
        tracing::debug!(%ticket, purpose = ?pending.purpose, show_video = self.show_video, "Seek settled");
        self.publish();
        true
    }

    /// Apply one playback-position update from the surface.
    pub fn sync_from_surface(&mut self) -> SyncOutcome {
        if self.phase != Phase::Playing {
            return SyncOutcome::Idle;
        }

        let time = self.media.current_time();
        self.set_position(time);

        let outcome = if self.skip_silence && !self.regions.contains(time) {
            match self.regions.next_playable_time(time) {
                Some(next) => {
                    tracing::debug!(from = time, to = next, "Skipping silence");
                    self.set_position(next);
                    self.issue_seek(next, SeekPurpose::Follow);
                    SyncOutcome::Skipped { to: next }
                }
                None => {
                    tracing::debug!(time, "No playable region left; pausing");
                    self.pause();
                    SyncOutcome::Ended
                }
            }
        } else {
            SyncOutcome::Tracked {
                frame: self.current_frame,
            }
        };

        self.publish();
        outcome
    }

    // ── Internals ───────────────────────────────────────────────

    fn clamp_to_duration(&self, time_secs: f64) -> f64 {
        if time_secs.is_nan() {
            return 0.0;
        }
        time_secs.clamp(0.0, self.metadata.duration)
    }

    fn set_position(&mut self, time_secs: f64) {
        self.current_time = self.metadata.clamp_time(time_secs);
        self.current_frame = self.metadata.frame_at(self.current_time);
    }

    fn start_media(&mut self) {
        match self.media.play() {
            Ok(()) => {
                self.phase = Phase::Playing;
                tracing::debug!(time = self.current_time, "Playback started");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Media surface refused to play");
                self.phase = Phase::Paused;
            }
        }
    }

    fn present(&self, frame: usize) {
        if let Some(presenter) = &self.presenter {
            presenter.present(frame);
        }
    }

    fn issue_seek(&mut self, target: f64, purpose: SeekPurpose) {
        let purpose = match self.pending.take() {
            Some(prior) => {
                let merged = purpose.replacing(prior.purpose);
                tracing::trace!(prior = ?prior.purpose, next = ?merged, "Superseding pending seek");
                merged
            }
            None => purpose,
        };

        // Seeks wait for both the surface and the sprites; a reveal must not
        // land while the player is still loading.
        if self.media.is_ready() && self.phase != Phase::Loading {
            self.dispatch_seek(target, purpose);
        } else {
            tracing::debug!(target, ?purpose, phase = ?self.phase, "Deferring seek");
            self.pending = Some(PendingSeek {
                ticket: None,
                target,
                purpose,
            });
        }
    }

    fn dispatch_seek(&mut self, target: f64, purpose: SeekPurpose) {
        let ticket = SeekTicket(self.next_ticket);
        self.next_ticket += 1;
        self.pending = Some(PendingSeek {
            ticket: Some(ticket),
            target,
            purpose,
        });
        self.media.seek(ticket, target);
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Surface {
        ready: bool,
        time: f64,
        playing: bool,
        rate: f64,
        seeks: Vec<(SeekTicket, f64)>,
    }

    #[derive(Clone, Default)]
    struct FakeMedia(Arc<Mutex<Surface>>);

    impl FakeMedia {
        fn ready() -> Self {
            let media = Self::default();
            media.0.lock().unwrap().ready = true;
            media
        }

        fn last_seek(&self) -> Option<(SeekTicket, f64)> {
            self.0.lock().unwrap().seeks.last().copied()
        }
    }

    impl MediaSurface for FakeMedia {
        fn is_ready(&self) -> bool {
            self.0.lock().unwrap().ready
        }

        fn seek(&mut self, ticket: SeekTicket, time_secs: f64) {
            let mut s = self.0.lock().unwrap();
            s.time = time_secs;
            s.seeks.push((ticket, time_secs));
        }

        fn play(&mut self) -> ScrubResult<()> {
            self.0.lock().unwrap().playing = true;
            Ok(())
        }

        fn pause(&mut self) {
            self.0.lock().unwrap().playing = false;
        }

        fn current_time(&self) -> f64 {
            self.0.lock().unwrap().time
        }

        fn set_playback_rate(&mut self, rate: f64) {
            self.0.lock().unwrap().rate = rate;
        }
    }

    fn player(media: &FakeMedia) -> Player {
        let meta = Arc::new(SpriteMetadata::uniform(100, 1.0, 100.0));
        let mut player = Player::new(meta, Box::new(media.clone()), PlayerOptions::default());
        player.finish_loading().unwrap();
        player
    }

    fn settle(player: &mut Player, media: &FakeMedia) {
        let (ticket, _) = media.last_seek().expect("a seek was issued");
        assert!(player.on_seek_complete(ticket));
    }

    #[test]
    fn test_ready_media_is_revealed_after_loading() {
        let media = FakeMedia::ready();
        let mut player = player(&media);
        assert_eq!(player.phase(), Phase::Paused);
        assert!(!player.show_video());
        settle(&mut player, &media);
        assert!(player.show_video());
    }

    #[test]
    fn test_play_from_preview_waits_for_seek() {
        let media = FakeMedia::ready();
        let mut player = player(&media);
        settle(&mut player, &media);
        player.begin_scrub();
        player.scrub_to_frame(40);
        player.end_scrub();
        settle(&mut player, &media);

        player.begin_scrub();
        player.end_scrub();
        player.play();
        assert!(!player.is_playing());
        assert_eq!(
            player.pending_seek().map(|p| p.purpose),
            Some(SeekPurpose::ScrubRelease { resume: true })
        );
        settle(&mut player, &media);
        assert!(player.is_playing());
        assert!(player.show_video());
        assert!(media.0.lock().unwrap().playing);
    }

    #[test]
    fn test_play_is_noop_while_start_pending() {
        let media = FakeMedia::ready();
        let mut player = player(&media);
        // Reveal still pending, so the video is hidden: play must seek first.
        player.play();
        let seeks = media.0.lock().unwrap().seeks.len();
        player.play();
        assert_eq!(media.0.lock().unwrap().seeks.len(), seeks);
        assert_eq!(
            player.pending_seek().map(|p| p.purpose),
            Some(SeekPurpose::StartPlayback)
        );
    }

    #[test]
    fn test_pause_cancels_pending_start() {
        let media = FakeMedia::ready();
        let mut player = player(&media);
        player.play();
        player.pause();
        assert!(player.pending_seek().is_none());
        let (ticket, _) = media.last_seek().unwrap();
        assert!(!player.on_seek_complete(ticket));
        assert!(!player.is_playing());
    }

    #[test]
    fn test_superseded_completion_is_ignored() {
        let media = FakeMedia::ready();
        let mut player = player(&media);
        settle(&mut player, &media);

        player.seek_to_frame(10);
        let (first, _) = media.last_seek().unwrap();
        player.seek_to_frame(20);
        let (second, target) = media.last_seek().unwrap();

        assert!(!player.on_seek_complete(first));
        assert!(player.on_seek_complete(second));
        assert_eq!(target, 20.0);
        assert_eq!(player.current_frame(), 20);
    }

    #[test]
    fn test_seeks_are_deferred_until_ready() {
        let media = FakeMedia::default();
        let mut player = player(&media);
        player.seek_to_exact_time(10.0);
        assert!(media.last_seek().is_none());
        assert_eq!(player.pending_seek().and_then(|p| p.ticket), None);

        media.0.lock().unwrap().ready = true;
        player.on_media_ready();
        let (_, target) = media.last_seek().unwrap();
        assert!((target - 10.3).abs() < 1e-9);
        settle(&mut player, &media);
        assert!(player.show_video());
    }

    #[test]
    fn test_speed_is_applied_in_any_phase() {
        let media = FakeMedia::default();
        let meta = Arc::new(SpriteMetadata::uniform(10, 1.0, 10.0));
        let mut player = Player::new(meta, Box::new(media.clone()), PlayerOptions::default());
        player.set_speed(2.5);
        assert_eq!(media.0.lock().unwrap().rate, 2.5);
        assert_eq!(player.set_speed(99.0).value(), 16.0);
    }

    #[test]
    fn test_failed_player_rejects_loading() {
        let media = FakeMedia::ready();
        let meta = Arc::new(SpriteMetadata::uniform(10, 1.0, 10.0));
        let mut player = Player::new(meta, Box::new(media.clone()), PlayerOptions::default());
        player.fail("sheet 0 missing");
        assert!(matches!(
            player.finish_loading(),
            Err(ScrubError::Loading { .. })
        ));
        player.play();
        player.seek_to_frame(3);
        assert_eq!(player.phase(), Phase::Failed);
        assert_eq!(player.current_frame(), 0);
    }

    #[test]
    fn test_state_is_published() {
        let media = FakeMedia::ready();
        let mut player = player(&media);
        let rx = player.subscribe();
        player.seek_to_frame(7);
        assert_eq!(rx.borrow().current_frame, 7);
        assert_eq!(rx.borrow().current_time, 7.0);
    }

    #[test]
    fn test_step_frame_saturates_extreme_deltas() {
        let media = FakeMedia::ready();
        let mut player = player(&media);
        player.step_frame(i64::MAX);
        assert_eq!(player.current_frame(), 99);
        player.step_frame(i64::MIN);
        assert_eq!(player.current_frame(), 0);
    }

    #[test]
    fn test_exact_seek_while_loading_waits_for_sprites() {
        let media = FakeMedia::ready();
        let meta = Arc::new(SpriteMetadata::uniform(100, 1.0, 100.0));
        let mut player = Player::new(meta, Box::new(media.clone()), PlayerOptions::default());

        player.seek_to_exact_time(10.0);
        assert!(media.last_seek().is_none());
        assert_eq!(player.pending_seek().and_then(|p| p.ticket), None);
        assert!(!player.show_video());

        player.finish_loading().unwrap();
        let (_, target) = media.last_seek().unwrap();
        assert!((target - 10.3).abs() < 1e-9);
        assert!(!player.show_video());
        settle(&mut player, &media);
        assert!(player.show_video());
        assert_eq!(player.phase(), Phase::Paused);
    }

    #[test]
    fn test_seek_while_loading_reveals_after_loading() {
        let media = FakeMedia::ready();
        let meta = Arc::new(SpriteMetadata::uniform(100, 1.0, 100.0));
        let mut player = Player::new(meta, Box::new(media.clone()), PlayerOptions::default());
        player.seek_to_frame(40);
        assert!(media.last_seek().is_none());
        player.finish_loading().unwrap();
        assert_eq!(
            player.pending_seek().map(|p| p.purpose),
            Some(SeekPurpose::Reveal)
        );
        settle(&mut player, &media);
        assert!(player.show_video());
        assert_eq!(player.current_frame(), 40);
    }
}
