//! Playback-position update sources.
//!
//! While playing, the player resyncs from the media surface on every tick.
//! Surfaces that report each presented frame drive a
//! [`FrameCallbackTicker`]; the rest fall back to a fixed poll.

use std::time::Duration;

use async_trait::async_trait;
use scrubkit_common::config::PlaybackDefaults;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::{Interval, MissedTickBehavior};

/// A stream of "check the playback position now" signals.
#[async_trait]
pub trait PositionUpdates: Send {
    /// Wait for the next update. Returns `false` once the source is closed.
    async fn tick(&mut self) -> bool;
}

/// Fixed-rate poll.
pub struct PollTicker {
    interval: Interval,
}

impl PollTicker {
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }

    pub fn from_defaults(defaults: &PlaybackDefaults) -> Self {
        Self::new(Duration::from_millis(defaults.poll_interval_ms.max(1)))
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }
}

#[async_trait]
impl PositionUpdates for PollTicker {
    async fn tick(&mut self) -> bool {
        self.interval.tick().await;
        true
    }
}

/// Ticks once per frame reported through a [`FrameCallbackHandle`].
pub struct FrameCallbackTicker {
    rx: mpsc::Receiver<()>,
}

/// Given to the media surface to report presented frames.
#[derive(Clone)]
pub struct FrameCallbackHandle {
    tx: mpsc::Sender<()>,
}

impl FrameCallbackTicker {
    pub fn channel() -> (FrameCallbackHandle, Self) {
        // One slot: frames reported while a tick is still queued coalesce.
        let (tx, rx) = mpsc::channel(1);
        (FrameCallbackHandle { tx }, Self { rx })
    }
}

impl FrameCallbackHandle {
    /// Report a presented frame. Returns `false` once the ticker is gone.
    pub fn frame_presented(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => true,
            Err(TrySendError::Closed(())) => false,
        }
    }
}

#[async_trait]
impl PositionUpdates for FrameCallbackTicker {
    async fn tick(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }
}
