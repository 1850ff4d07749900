//! Proxy preview renderer.
//!
//! Shows the sampled frame nearest to the scrub position by blitting one
//! tile out of a preview sprite sheet. Sheets load on demand; while a sheet
//! is in flight the previous picture stays up, and a sheet that failed to
//! load is shown as a flat placeholder.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use scrubkit_common::error::{ScrubError, ScrubResult};
use scrubkit_model::{SheetPosition, SpriteMetadata};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::cache::{SheetLoader, SheetState};
use crate::sprite::SpriteSheet;
use crate::surface::{rgb, Color, Rect, Surface};

/// Fill used when a sheet could not be loaded.
pub const PLACEHOLDER_COLOR: Color = rgb(0x33, 0x33, 0x33);

/// Sheets warmed around the one just drawn, relative to it.
const PREFETCH_OFFSETS: [isize; 3] = [-1, 1, 2];

const NO_REQUEST: usize = usize::MAX;

/// Something that can show a preview frame without blocking the caller.
pub trait FramePresenter: Send + Sync {
    fn present(&self, frame: usize);
}

/// What a render request ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    /// The tile was drawn; `cached` when the sheet was already loaded.
    Drawn { sheet: usize, cached: bool },
    /// The sheet failed to load and the placeholder was drawn.
    Placeholder { sheet: usize },
    /// A newer frame was requested before this one's sheet arrived.
    Superseded,
}

struct Shared<S> {
    metadata: Arc<SpriteMetadata>,
    loader: Arc<SheetLoader>,
    surface: Arc<Mutex<S>>,
    latest: AtomicUsize,
}

/// Draws preview tiles into a surface.
pub struct PreviewRenderer<S: Surface> {
    shared: Arc<Shared<S>>,
    runtime: Handle,
}

impl<S: Surface> Clone for PreviewRenderer<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            runtime: self.runtime.clone(),
        }
    }
}

impl<S: Surface + 'static> PreviewRenderer<S> {
    /// Build a renderer on the current tokio runtime.
    pub fn new(
        metadata: Arc<SpriteMetadata>,
        loader: Arc<SheetLoader>,
        surface: Arc<Mutex<S>>,
    ) -> ScrubResult<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| ScrubError::render(format!("preview renderer needs a tokio runtime: {e}")))?;
        Ok(Self::with_runtime(metadata, loader, surface, runtime))
    }

    pub fn with_runtime(
        metadata: Arc<SpriteMetadata>,
        loader: Arc<SheetLoader>,
        surface: Arc<Mutex<S>>,
        runtime: Handle,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                metadata,
                loader,
                surface,
                latest: AtomicUsize::new(NO_REQUEST),
            }),
            runtime,
        }
    }

    pub fn loader(&self) -> &Arc<SheetLoader> {
        &self.shared.loader
    }

    pub fn surface(&self) -> &Arc<Mutex<S>> {
        &self.shared.surface
    }

    /// Most recently requested frame.
    pub fn latest_frame(&self) -> Option<usize> {
        match self.shared.latest.load(Ordering::SeqCst) {
            NO_REQUEST => None,
            frame => Some(frame),
        }
    }

    /// Show `frame`, waiting for its sheet if needed.
    pub async fn render(&self, frame: usize) -> PresentOutcome {
        let frame = self.request(frame);
        self.draw(frame).await
    }

    /// Record `frame` as the latest request. Only the latest request may
    /// touch the surface.
    fn request(&self, frame: usize) -> usize {
        let frame = frame.min(self.shared.metadata.last_frame());
        self.shared.latest.store(frame, Ordering::SeqCst);
        frame
    }

    async fn draw(&self, frame: usize) -> PresentOutcome {
        let pos = self.shared.metadata.sheet_position(frame);

        if let Some(sheet) = self.shared.loader.get(pos.sheet) {
            if !self.blit_if_latest(frame, &sheet, pos) {
                return PresentOutcome::Superseded;
            }
            self.prefetch_around(pos.sheet);
            return PresentOutcome::Drawn {
                sheet: pos.sheet,
                cached: true,
            };
        }

        match self.shared.loader.ensure(pos.sheet).await {
            Ok(sheet) => {
                if !self.blit_if_latest(frame, &sheet, pos) {
                    tracing::trace!(frame, sheet = pos.sheet, "Dropping superseded preview draw");
                    return PresentOutcome::Superseded;
                }
                self.prefetch_around(pos.sheet);
                PresentOutcome::Drawn {
                    sheet: pos.sheet,
                    cached: false,
                }
            }
            Err(e) => {
                if !self.placeholder_if_latest(frame) {
                    return PresentOutcome::Superseded;
                }
                tracing::debug!(frame, sheet = pos.sheet, error = %e, "Drew preview placeholder");
                PresentOutcome::Placeholder { sheet: pos.sheet }
            }
        }
    }

    /// Redraw the most recent frame, e.g. after a resize.
    pub async fn redraw(&self) -> Option<PresentOutcome> {
        let frame = self.latest_frame()?;
        Some(self.render(frame).await)
    }

    /// Clear a recorded failure for the sheet holding `frame` and show the
    /// frame again.
    pub async fn retry(&self, frame: usize) -> PresentOutcome {
        let sheet = self.shared.metadata.sheet_position(frame).sheet;
        self.shared.loader.retry_failed(sheet);
        self.render(frame).await
    }

    /// Start background loads for the neighbours of `sheet` that have not
    /// been requested yet. Returns the spawned loads.
    pub fn prefetch_around(&self, sheet: usize) -> Vec<(usize, JoinHandle<()>)> {
        let loader = &self.shared.loader;
        PREFETCH_OFFSETS
            .iter()
            .filter_map(|offset| sheet.checked_add_signed(*offset))
            .filter(|index| *index < loader.num_sheets())
            .filter(|index| loader.state(*index) == SheetState::Absent)
            .map(|index| {
                let loader = Arc::clone(loader);
                let handle = self.runtime.spawn(async move {
                    // Failures are recorded in the cache and logged there.
                    let _ = loader.ensure(index).await;
                });
                (index, handle)
            })
            .collect()
    }

    fn tile_rect(&self) -> Rect {
        let size = self.shared.metadata.preview_size;
        Rect::new(0.0, 0.0, size.width as f64, size.height as f64)
    }

    fn lock_surface(&self) -> MutexGuard<'_, S> {
        self.shared
            .surface
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn is_latest(&self, frame: usize) -> bool {
        self.shared.latest.load(Ordering::SeqCst) == frame
    }

    /// The latest-request check happens under the surface lock, so an older
    /// request can never paint over a newer one.
    fn blit_if_latest(&self, frame: usize, sheet: &SpriteSheet, pos: SheetPosition) -> bool {
        let size = self.shared.metadata.preview_size;
        let src = Rect::new(
            pos.x as f64,
            pos.y as f64,
            size.width as f64,
            size.height as f64,
        );
        let dst = self.tile_rect();
        let mut surface = self.lock_surface();
        if !self.is_latest(frame) {
            return false;
        }
        surface.draw_image(sheet.image(), src, dst);
        true
    }

    fn placeholder_if_latest(&self, frame: usize) -> bool {
        let dst = self.tile_rect();
        let mut surface = self.lock_surface();
        if !self.is_latest(frame) {
            return false;
        }
        surface.fill_rect(dst, PLACEHOLDER_COLOR);
        true
    }
}

impl<S: Surface + 'static> FramePresenter for PreviewRenderer<S> {
    fn present(&self, frame: usize) {
        // Claim the frame before spawning; tasks may run in any order.
        let frame = self.request(frame);
        let renderer = self.clone();
        self.runtime.spawn(async move {
            renderer.draw(frame).await;
        });
    }
}
