//! scrubkit render
//!
//! Turns sprite assets into pixels:
//!
//! ```text
//! location ──► AssetSource ──► SpriteSheet ──┬──► SheetLoader (per-sheet cache)
//!  (http/fs)                   (decoded)     │          │
//!                                            │          ▼
//!                                            │   PreviewRenderer ──► Surface
//!                                            │
//!                                            └──► Filmstrip ───────► Surface
//! ```
//!
//! Renderers draw through the [`Surface`] trait; [`RasterSurface`] is an
//! in-memory RGBA implementation that can be written out as PNG.

pub mod cache;
pub mod filmstrip;
pub mod preview;
pub mod source;
pub mod sprite;
pub mod surface;

#[cfg(test)]
mod test_support;

pub use cache::{SheetLoader, SheetState};
pub use filmstrip::{frame_at_x, playhead_x, Filmstrip, FilmstripLayout, FilmstripTile};
pub use preview::{FramePresenter, PresentOutcome, PreviewRenderer, PLACEHOLDER_COLOR};
pub use source::{
    default_source, is_remote, AssetSource, FsAssetSource, HttpAssetSource, MemoryAssetSource,
    RoutedAssetSource,
};
pub use sprite::{load_sprite, SharedSprite, SpriteSheet};
pub use surface::{rgb, rgba, Color, RasterSurface, Rect, Surface};
