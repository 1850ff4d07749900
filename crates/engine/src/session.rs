//! Scrubbing session orchestration.
//!
//! A [`Session`] owns everything one recording needs: the player, the
//! preview renderer, the filmstrip, the scrub controller, activities and
//! tutorial progress. Input arrives as [`SessionEvent`]s, either applied
//! directly with [`Session::handle`] or fed to the [`Session::run`] actor
//! loop together with animation-frame tokens and position ticks.

use std::sync::{Arc, Mutex};

use scrubkit_common::config::{AppConfig, PlaybackDefaults, VideoScrubberConfig};
use scrubkit_common::error::{ScrubError, ScrubResult};
use scrubkit_model::{
    parse_activities, timestamp_entries, Activity, ShareSelection, SharedRange, SpriteMetadata,
    TimestampEntry, TutorialAction,
};
use scrubkit_render::{
    load_sprite, AssetSource, Filmstrip, FramePresenter, PreviewRenderer, SheetLoader, Surface,
};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use crate::keyboard::{handle_key, Key};
use crate::media::{MediaEvent, MediaSurface};
use crate::player::{Player, PlayerOptions, ScrubberState};
use crate::scrub::{FrameScheduler, FrameToken, PointerCapture, ScrubController, StripGeometry};
use crate::share::incoming_range;
use crate::ticks::PositionUpdates;
use crate::tutorial::{TutorialPhase, TutorialStore, TutorialTracker, CELEBRATION};

/// Placement of the filmstrip in pointer coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StripLayout {
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl StripLayout {
    fn geometry(&self) -> StripGeometry {
        StripGeometry {
            left: self.left,
            width: self.width,
        }
    }
}

/// Host-provided pieces a session drives.
pub struct SessionParts<S> {
    pub media: Box<dyn MediaSurface>,
    pub preview_surface: Arc<Mutex<S>>,
    pub scheduler: Box<dyn FrameScheduler>,
    pub capture: Box<dyn PointerCapture>,
    pub tutorial_store: Box<dyn TutorialStore>,
    pub strip: StripLayout,
}

/// Input to a running session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Media(MediaEvent),
    /// Resync from the media surface.
    PositionTick,
    Key(Key),
    PointerDown { x: f64 },
    PointerMove { x: f64 },
    PointerUp,
    AnimationFrame(FrameToken),
    Resize(StripLayout),
    /// A timestamp entry or external link was followed.
    SeekToTimestamp(f64),
    SetSpeed(f64),
    SetSkipSilence(bool),
    /// Clear a failed preview sheet and show the current frame again.
    RetryPreview,
    DismissTutorial,
    ResetTutorial,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub struct Session<S: Surface + 'static> {
    assets: VideoScrubberConfig,
    defaults: PlaybackDefaults,
    source: Arc<dyn AssetSource>,
    metadata: Arc<SpriteMetadata>,
    player: Player,
    preview: PreviewRenderer<S>,
    filmstrip: Option<Filmstrip>,
    strip: StripLayout,
    activities: Vec<Activity>,
    scrub: ScrubController,
    tutorial: TutorialTracker,
    celebration_deadline: Option<Instant>,
}

impl<S: Surface + 'static> Session<S> {
    /// Fetch metadata and wire up the session. The player starts in
    /// `Loading`; call [`Session::load_assets`] next.
    pub async fn open(
        assets: VideoScrubberConfig,
        config: &AppConfig,
        source: Arc<dyn AssetSource>,
        parts: SessionParts<S>,
    ) -> ScrubResult<Self> {
        tracing::info!(
            metadata = %assets.metadata_path,
            source = source.name(),
            "Opening scrub session"
        );
        let metadata = Arc::new(fetch_metadata(source.as_ref(), &assets.metadata_path).await?);
        tracing::debug!(
            frames = metadata.frame_count,
            sheets = metadata.num_sheets,
            duration = metadata.duration,
            "Metadata loaded"
        );

        let loader = Arc::new(SheetLoader::new(
            Arc::clone(&source),
            assets.preview_sprite_path_prefix.clone(),
            metadata.num_sheets,
        ));
        let preview = PreviewRenderer::new(Arc::clone(&metadata), loader, parts.preview_surface)?;
        let player = Player::new(
            Arc::clone(&metadata),
            parts.media,
            PlayerOptions::from(&config.playback),
        )
        .with_presenter(Arc::new(preview.clone()));
        let scrub = ScrubController::new(parts.scheduler, parts.capture, parts.strip.geometry());
        let tutorial = TutorialTracker::load(parts.tutorial_store, config.tutorial.key.clone());

        Ok(Self {
            assets,
            defaults: config.playback.clone(),
            source,
            metadata,
            player,
            preview,
            filmstrip: None,
            strip: parts.strip,
            activities: Vec::new(),
            scrub,
            tutorial,
            celebration_deadline: None,
        })
    }

    /// Load the first preview sheet, the timeline sprite and the optional
    /// activities feed, then leave `Loading`. A missing sheet or sprite
    /// fails the session.
    pub async fn load_assets(&mut self) -> ScrubResult<()> {
        let loader = Arc::clone(self.preview.loader());
        let (first_sheet, timeline) = tokio::join!(
            loader.ensure(0),
            load_sprite(self.source.as_ref(), &self.assets.timeline_sprite_path)
        );

        let timeline = match (first_sheet, timeline) {
            (Ok(_), Ok(timeline)) => timeline,
            (Err(e), _) | (_, Err(e)) => {
                let message = e.to_string();
                self.player.fail(message.clone());
                return Err(ScrubError::loading(message));
            }
        };

        self.filmstrip = Some(Filmstrip::new(
            &self.metadata,
            timeline,
            self.strip.width,
            self.strip.height,
        ));

        if let Some(location) = self.assets.activities_path() {
            self.activities = load_activities(self.source.as_ref(), &location).await;
        }

        self.player.finish_loading()?;
        tracing::info!(activities = self.activities.len(), "Scrub session ready");
        Ok(())
    }

    /// [`open`](Self::open) followed by [`load_assets`](Self::load_assets).
    pub async fn start(
        assets: VideoScrubberConfig,
        config: &AppConfig,
        source: Arc<dyn AssetSource>,
        parts: SessionParts<S>,
    ) -> ScrubResult<Self> {
        let mut session = Self::open(assets, config, source, parts).await?;
        session.load_assets().await?;
        Ok(session)
    }

    // ── Accessors ───────────────────────────────────────────────

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn metadata(&self) -> &Arc<SpriteMetadata> {
        &self.metadata
    }

    pub fn preview(&self) -> &PreviewRenderer<S> {
        &self.preview
    }

    pub fn filmstrip(&self) -> Option<&Filmstrip> {
        self.filmstrip.as_ref()
    }

    pub fn tutorial(&self) -> &TutorialTracker {
        &self.tutorial
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn subscribe(&self) -> watch::Receiver<ScrubberState> {
        self.player.subscribe()
    }

    /// Playhead position relative to the strip.
    pub fn playhead_x(&self) -> f64 {
        self.scrub.playhead(&self.player)
    }

    /// Timestamp list for the current position.
    pub fn timestamps(&self) -> Vec<TimestampEntry> {
        timestamp_entries(
            &self.activities,
            self.player.current_time(),
            self.defaults.timestamp_offset_secs,
        )
    }

    /// Share dialog state opened at the current position.
    pub fn share_selection(&self) -> ShareSelection {
        ShareSelection::open_with_span(
            self.player.current_time(),
            self.metadata.duration,
            self.defaults.share_default_span_secs,
        )
    }

    /// Draw the filmstrip. Returns `false` before the timeline sprite is in.
    pub fn draw_filmstrip(&self, surface: &mut dyn Surface) -> bool {
        match &self.filmstrip {
            Some(strip) => {
                strip.draw(surface);
                true
            }
            None => false,
        }
    }

    // ── Input ───────────────────────────────────────────────────

    /// Jump to the range carried by an incoming page URL, if any.
    pub fn follow_link(&mut self, page_url: &str) -> ScrubResult<Option<SharedRange>> {
        let range = incoming_range(page_url)?;
        if let Some(range) = range {
            tracing::info!(start = range.start, end = ?range.end, "Following shared link");
            self.player.seek_to_exact_time(range.start);
        }
        Ok(range)
    }

    /// Apply one event.
    pub fn handle(&mut self, event: SessionEvent) -> Flow {
        match event {
            SessionEvent::Media(MediaEvent::Ready) => self.player.on_media_ready(),
            SessionEvent::Media(MediaEvent::SeekComplete(ticket)) => {
                self.player.on_seek_complete(ticket);
            }
            SessionEvent::PositionTick => {
                self.player.sync_from_surface();
            }
            SessionEvent::Key(key) => {
                let action = handle_key(&mut self.player, key);
                self.record(action);
            }
            SessionEvent::PointerDown { x } => {
                let action = self.scrub.pointer_down(&mut self.player, x);
                self.record(action);
            }
            SessionEvent::PointerMove { x } => self.scrub.pointer_move(x),
            SessionEvent::PointerUp => self.scrub.pointer_up(&mut self.player),
            SessionEvent::AnimationFrame(token) => {
                self.scrub.on_animation_frame(&mut self.player, token)
            }
            SessionEvent::Resize(layout) => self.resize(layout),
            SessionEvent::SeekToTimestamp(secs) => self.player.seek_to_exact_time(secs),
            SessionEvent::SetSpeed(speed) => {
                self.player.set_speed(speed);
            }
            SessionEvent::SetSkipSilence(enabled) => self.player.set_skip_silence(enabled),
            SessionEvent::RetryPreview => self.retry_preview(),
            SessionEvent::DismissTutorial => {
                self.tutorial.dismiss();
                self.celebration_deadline = None;
            }
            SessionEvent::ResetTutorial => {
                if let Err(e) = self.tutorial.reset() {
                    tracing::warn!(error = %e, "Failed to reset tutorial progress");
                }
                self.celebration_deadline = None;
            }
            SessionEvent::Shutdown => return Flow::Stop,
        }
        Flow::Continue
    }

    /// Process events until shutdown or until the event channel closes.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<SessionEvent>,
        mut frames: mpsc::UnboundedReceiver<FrameToken>,
        mut ticks: Box<dyn PositionUpdates>,
    ) -> Self {
        let mut ticks_open = true;

        loop {
            let deadline = self.celebration_deadline;
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        if self.handle(event) == Flow::Stop {
                            break;
                        }
                    }
                    None => break,
                },
                Some(token) = frames.recv() => {
                    self.handle(SessionEvent::AnimationFrame(token));
                }
                open = ticks.tick(), if ticks_open && self.player.is_playing() => {
                    if open {
                        self.player.sync_from_surface();
                    } else {
                        tracing::debug!("Position updates closed");
                        ticks_open = false;
                    }
                }
                _ = wait_until(deadline), if deadline.is_some() => {
                    self.tutorial.dismiss();
                    self.celebration_deadline = None;
                }
            }
        }

        tracing::info!(frame = self.player.current_frame(), "Scrub session stopped");
        self
    }

    fn record(&mut self, action: Option<TutorialAction>) {
        let Some(action) = action else { return };
        if self.tutorial.complete(action) && self.tutorial.phase() == TutorialPhase::Celebrating {
            self.celebration_deadline = Some(Instant::now() + CELEBRATION);
        }
    }

    fn resize(&mut self, layout: StripLayout) {
        self.strip = layout;
        self.scrub.set_geometry(layout.geometry());
        if let Some(strip) = &mut self.filmstrip {
            strip.resize(&self.metadata, layout.width, layout.height);
        }
        self.preview.present(self.player.current_frame());
    }

    fn retry_preview(&mut self) {
        let frame = self.player.current_frame();
        let sheet = self.metadata.sheet_position(frame).sheet;
        if self.preview.loader().retry_failed(sheet) {
            tracing::info!(sheet, "Retrying failed preview sheet");
        }
        self.preview.present(frame);
    }
}

async fn fetch_metadata(source: &dyn AssetSource, location: &str) -> ScrubResult<SpriteMetadata> {
    let bytes = source
        .fetch(location)
        .await
        .map_err(|e| ScrubError::loading(format!("metadata {location}: {e}")))?;
    SpriteMetadata::from_slice(&bytes)
        .map_err(|e| ScrubError::loading(format!("metadata {location}: {e}")))
}

/// The activities feed is optional; anything wrong with it leaves the list
/// empty.
async fn load_activities(source: &dyn AssetSource, location: &str) -> Vec<Activity> {
    let bytes = match source.fetch(location).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(location, error = %e, "No activities feed");
            return Vec::new();
        }
    };
    let parsed = std::str::from_utf8(&bytes)
        .map_err(|e| e.to_string())
        .and_then(|text| parse_activities(text).map_err(|e| e.to_string()));
    match parsed {
        Ok(activities) => activities,
        Err(e) => {
            tracing::warn!(location, error = %e, "Ignoring malformed activities feed");
            Vec::new()
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
