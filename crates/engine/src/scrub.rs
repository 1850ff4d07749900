//! Scrub/drag controller.
//!
//! Translates pointer input on the filmstrip into frame changes. Pointer
//! moves only update the visual playhead and remember the newest position;
//! the frame is resolved at most once per animation frame. Releasing the
//! pointer resolves any position still waiting and hands over to
//! [`Player::end_scrub`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use scrubkit_model::TutorialAction;
use scrubkit_render::{frame_at_x, playhead_x};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::player::Player;

/// Identifies a scheduled animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(pub u64);

/// Schedules one-shot animation frame callbacks.
pub trait FrameScheduler: Send {
    /// Request a callback; it is delivered to the controller through
    /// [`ScrubController::on_animation_frame`] with the returned token.
    fn request_frame(&mut self) -> FrameToken;

    /// Cancel a requested callback that has not run yet.
    fn cancel_frame(&mut self, token: FrameToken);
}

/// Subscribes to pointer events outside the filmstrip for the duration of
/// a drag.
pub trait PointerCapture: Send {
    fn capture(&mut self);
    fn release(&mut self);
}

/// Display refresh used by [`TokioFrameScheduler`].
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Delivers frame tokens over a channel after one display refresh.
pub struct TokioFrameScheduler {
    tx: mpsc::UnboundedSender<FrameToken>,
    runtime: Handle,
    delay: Duration,
    next: u64,
    scheduled: HashMap<FrameToken, JoinHandle<()>>,
}

impl TokioFrameScheduler {
    /// Create a scheduler on `runtime` and the receiver its tokens arrive on.
    pub fn new(runtime: Handle) -> (Self, mpsc::UnboundedReceiver<FrameToken>) {
        Self::with_delay(runtime, FRAME_INTERVAL)
    }

    pub fn with_delay(
        runtime: Handle,
        delay: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<FrameToken>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            tx,
            runtime,
            delay,
            next: 0,
            scheduled: HashMap::new(),
        };
        (scheduler, rx)
    }

    /// Callbacks requested but not yet delivered.
    pub fn outstanding(&self) -> usize {
        self.scheduled
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }
}

impl FrameScheduler for TokioFrameScheduler {
    fn request_frame(&mut self) -> FrameToken {
        self.scheduled.retain(|_, handle| !handle.is_finished());

        self.next += 1;
        let token = FrameToken(self.next);
        let tx = self.tx.clone();
        let delay = self.delay;
        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            // The receiver is gone once the session shuts down.
            let _ = tx.send(token);
        });
        self.scheduled.insert(token, handle);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if let Some(handle) = self.scheduled.remove(&token) {
            handle.abort();
        }
    }
}

/// Pointer capture backed by a shared flag the host polls or routes on.
#[derive(Debug, Clone, Default)]
pub struct CaptureFlag(Arc<AtomicBool>);

impl CaptureFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_captured(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl PointerCapture for CaptureFlag {
    fn capture(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn release(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Horizontal placement of the filmstrip in pointer coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StripGeometry {
    pub left: f64,
    pub width: f64,
}

/// Turns pointer drags on the filmstrip into scrubbing.
pub struct ScrubController {
    scheduler: Box<dyn FrameScheduler>,
    capture: Box<dyn PointerCapture>,
    geometry: StripGeometry,
    dragging: bool,
    pending_x: Option<f64>,
    scheduled: Option<FrameToken>,
    playhead: f64,
}

impl ScrubController {
    pub fn new(
        scheduler: Box<dyn FrameScheduler>,
        capture: Box<dyn PointerCapture>,
        geometry: StripGeometry,
    ) -> Self {
        Self {
            scheduler,
            capture,
            geometry,
            dragging: false,
            pending_x: None,
            scheduled: None,
            playhead: 0.0,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn geometry(&self) -> StripGeometry {
        self.geometry
    }

    pub fn set_geometry(&mut self, geometry: StripGeometry) {
        self.geometry = geometry;
    }

    /// Playhead position relative to the strip. Follows the pointer during
    /// a drag and the player's frame otherwise.
    pub fn playhead(&self, player: &Player) -> f64 {
        if self.dragging {
            self.playhead
        } else {
            playhead_x(player.metadata(), player.current_frame(), self.geometry.width)
        }
    }

    /// Start a drag at pointer `x`. Returns the tutorial action to record,
    /// or `None` when the press was ignored.
    pub fn pointer_down(&mut self, player: &mut Player, x: f64) -> Option<TutorialAction> {
        if self.dragging || !player.begin_scrub() {
            return None;
        }
        self.dragging = true;
        self.capture.capture();
        tracing::debug!(x, "Pointer captured for scrubbing");
        self.pointer_move(x);
        Some(TutorialAction::Scrub)
    }

    /// Track the pointer. Only the newest position is kept.
    pub fn pointer_move(&mut self, x: f64) {
        if !self.dragging {
            return;
        }
        let local = (x - self.geometry.left).clamp(0.0, self.geometry.width.max(0.0));
        self.playhead = local;
        self.pending_x = Some(local);
        if self.scheduled.is_none() {
            self.scheduled = Some(self.scheduler.request_frame());
        }
    }

    /// A scheduled frame fired.
    pub fn on_animation_frame(&mut self, player: &mut Player, token: FrameToken) {
        if self.scheduled != Some(token) {
            tracing::trace!(token = token.0, "Ignoring stale animation frame");
            return;
        }
        self.scheduled = None;
        self.resolve_pending(player);
    }

    /// Finish the drag.
    pub fn pointer_up(&mut self, player: &mut Player) {
        if !self.dragging {
            return;
        }
        self.resolve_pending(player);
        self.cancel_scheduled();
        self.capture.release();
        self.dragging = false;
        player.end_scrub();
    }

    fn resolve_pending(&mut self, player: &mut Player) {
        if let Some(x) = self.pending_x.take() {
            let frame = frame_at_x(player.metadata(), x, self.geometry.width);
            player.scrub_to_frame(frame);
        }
    }

    fn cancel_scheduled(&mut self) {
        if let Some(token) = self.scheduled.take() {
            self.scheduler.cancel_frame(token);
        }
    }
}

impl Drop for ScrubController {
    fn drop(&mut self) {
        self.cancel_scheduled();
        if self.dragging {
            self.capture.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{MediaSurface, SeekTicket};
    use crate::player::{Phase, PlayerOptions};
    use scrubkit_common::error::ScrubResult;
    use scrubkit_model::SpriteMetadata;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Log {
        requested: Vec<FrameToken>,
        cancelled: Vec<FrameToken>,
    }

    #[derive(Clone, Default)]
    struct ManualScheduler(Arc<Mutex<Log>>);

    impl FrameScheduler for ManualScheduler {
        fn request_frame(&mut self) -> FrameToken {
            let mut log = self.0.lock().unwrap();
            let token = FrameToken(log.requested.len() as u64 + 1);
            log.requested.push(token);
            token
        }

        fn cancel_frame(&mut self, token: FrameToken) {
            self.0.lock().unwrap().cancelled.push(token);
        }
    }

    struct IdleMedia;

    impl MediaSurface for IdleMedia {
        fn is_ready(&self) -> bool {
            false
        }
        fn seek(&mut self, _ticket: SeekTicket, _time_secs: f64) {}
        fn play(&mut self) -> ScrubResult<()> {
            Ok(())
        }
        fn pause(&mut self) {}
        fn current_time(&self) -> f64 {
            0.0
        }
        fn set_playback_rate(&mut self, _rate: f64) {}
    }

    fn fixture() -> (ScrubController, ManualScheduler, CaptureFlag, Player) {
        let scheduler = ManualScheduler::default();
        let capture = CaptureFlag::new();
        let controller = ScrubController::new(
            Box::new(scheduler.clone()),
            Box::new(capture.clone()),
            StripGeometry {
                left: 50.0,
                width: 200.0,
            },
        );
        let meta = Arc::new(SpriteMetadata::uniform(101, 1.0, 100.0));
        let mut player = Player::new(meta, Box::new(IdleMedia), PlayerOptions::default());
        player.finish_loading().unwrap();
        (controller, scheduler, capture, player)
    }

    #[test]
    fn test_moves_coalesce_into_one_frame_request() {
        let (mut ctl, scheduler, capture, mut player) = fixture();
        assert_eq!(
            ctl.pointer_down(&mut player, 60.0),
            Some(TutorialAction::Scrub)
        );
        assert!(capture.is_captured());
        ctl.pointer_move(100.0);
        ctl.pointer_move(150.0);
        assert_eq!(scheduler.0.lock().unwrap().requested.len(), 1);
        assert_eq!(ctl.playhead(&player), 100.0);

        ctl.on_animation_frame(&mut player, FrameToken(1));
        assert_eq!(player.current_frame(), 50);
    }

    #[test]
    fn test_release_resolves_pending_and_cancels_frame() {
        let (mut ctl, scheduler, capture, mut player) = fixture();
        ctl.pointer_down(&mut player, 150.0);
        ctl.pointer_up(&mut player);

        assert_eq!(player.current_frame(), 50);
        assert_eq!(player.phase(), Phase::Paused);
        assert!(!capture.is_captured());
        assert_eq!(
            scheduler.0.lock().unwrap().cancelled,
            vec![FrameToken(1)]
        );

        // The cancelled frame firing anyway changes nothing.
        ctl.on_animation_frame(&mut player, FrameToken(1));
        assert_eq!(player.current_frame(), 50);
    }

    #[test]
    fn test_pointer_outside_strip_is_clamped() {
        let (mut ctl, _scheduler, _capture, mut player) = fixture();
        ctl.pointer_down(&mut player, 400.0);
        ctl.pointer_up(&mut player);
        assert_eq!(player.current_frame(), 100);
    }

    #[test]
    fn test_moves_without_press_are_ignored() {
        let (mut ctl, scheduler, _capture, mut player) = fixture();
        ctl.pointer_move(120.0);
        ctl.pointer_up(&mut player);
        assert!(scheduler.0.lock().unwrap().requested.is_empty());
        assert_eq!(player.current_frame(), 0);
    }

    #[test]
    fn test_drop_releases_capture() {
        let (mut ctl, scheduler, capture, mut player) = fixture();
        ctl.pointer_down(&mut player, 80.0);
        drop(ctl);
        assert!(!capture.is_captured());
        assert_eq!(scheduler.0.lock().unwrap().cancelled.len(), 1);
    }

    #[tokio::test]
    async fn test_tokio_scheduler_delivers_and_cancels() {
        let (mut scheduler, mut rx) =
            TokioFrameScheduler::with_delay(Handle::current(), Duration::from_millis(5));
        let cancelled = scheduler.request_frame();
        let kept = scheduler.request_frame();
        scheduler.cancel_frame(cancelled);

        assert_eq!(rx.recv().await, Some(kept));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(scheduler.outstanding(), 0);
    }
}
