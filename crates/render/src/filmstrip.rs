//! Filmstrip renderer.
//!
//! A fixed-height strip of thumbnails spanning the full timeline, with an
//! optional speech/silence bar along the bottom edge. The layout is a pure
//! function of the metadata and the strip size and is recomputed on resize.

use scrubkit_model::SpriteMetadata;

use crate::sprite::SpriteSheet;
use crate::surface::{rgb, rgba, Color, Rect, Surface};

pub const BACKGROUND_COLOR: Color = rgb(0x1a, 0x1a, 0x1a);

/// Height of the speech indicator bar in pixels.
pub const SPEECH_BAR_HEIGHT: f64 = 6.0;

/// Narrowest speech marker, so short utterances stay visible.
pub const MIN_SPEECH_WIDTH: f64 = 2.0;

pub fn silence_color() -> Color {
    rgba(120, 40, 40, 0.9)
}

pub fn speech_color() -> Color {
    rgba(50, 180, 80, 0.95)
}

/// One thumbnail placed on the strip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilmstripTile {
    /// Frame shown by the tile.
    pub frame: usize,
    /// Source rectangle in the filmstrip sprite.
    pub src: Rect,
    /// Destination rectangle on the strip.
    pub dst: Rect,
}

/// Precomputed geometry for one strip size.
#[derive(Debug, Clone, PartialEq)]
pub struct FilmstripLayout {
    pub width: f64,
    pub height: f64,
    pub tile_width: f64,
    pub tiles: Vec<FilmstripTile>,
    /// Empty when the recording has no speech segments.
    pub speech_bar: Option<SpeechBar>,
}

/// Geometry of the speech indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechBar {
    pub track: Rect,
    pub segments: Vec<Rect>,
}

impl FilmstripLayout {
    pub fn compute(metadata: &SpriteMetadata, width: f64, height: f64) -> Self {
        let width = width.max(0.0);
        let height = height.max(0.0);
        let tile_width = height * metadata.thumbnail_size.aspect_ratio();
        let thumb_w = metadata.thumbnail_size.width as f64;
        let thumb_h = metadata.thumbnail_size.height as f64;

        let mut tiles = Vec::new();
        if width > 0.0 && tile_width > 0.0 {
            let count = (width / tile_width).ceil() as usize + 1;
            for k in 0..count {
                let x = k as f64 * tile_width;
                if x > width {
                    break;
                }
                let frame = metadata.filmstrip_frame(x / width);
                let grid = metadata.thumbnail_position(frame);
                tiles.push(FilmstripTile {
                    frame,
                    src: Rect::new(grid.x as f64, grid.y as f64, thumb_w, thumb_h),
                    dst: Rect::new(x, 0.0, tile_width, height),
                });
            }
        }

        let speech_bar = speech_bar(metadata, width, height);

        Self {
            width,
            height,
            tile_width,
            tiles,
            speech_bar,
        }
    }

    /// Draw the strip into `surface`.
    pub fn draw<S: Surface + ?Sized>(&self, sprite: &SpriteSheet, surface: &mut S) {
        surface.fill_rect(Rect::new(0.0, 0.0, self.width, self.height), BACKGROUND_COLOR);

        for tile in &self.tiles {
            surface.draw_image(sprite.image(), tile.src, tile.dst);
        }

        if let Some(bar) = &self.speech_bar {
            surface.fill_rect(bar.track, silence_color());
            let speech = speech_color();
            for segment in &bar.segments {
                surface.fill_rect(*segment, speech);
            }
        }
    }
}

fn speech_bar(metadata: &SpriteMetadata, width: f64, height: f64) -> Option<SpeechBar> {
    let segments = metadata.speech_segments();
    if segments.is_empty() || metadata.duration <= 0.0 {
        return None;
    }
    let y = height - SPEECH_BAR_HEIGHT;
    let rects = segments
        .iter()
        .filter(|seg| seg.is_well_formed())
        .map(|seg| {
            let x1 = seg.start / metadata.duration * width;
            let x2 = seg.end / metadata.duration * width;
            Rect::new(x1, y, (x2 - x1).max(MIN_SPEECH_WIDTH), SPEECH_BAR_HEIGHT)
        })
        .collect();
    Some(SpeechBar {
        track: Rect::new(0.0, y, width, SPEECH_BAR_HEIGHT),
        segments: rects,
    })
}

/// Horizontal playhead position for `frame` on a strip `width` wide.
pub fn playhead_x(metadata: &SpriteMetadata, frame: usize, width: f64) -> f64 {
    metadata.progress_of_frame(frame) * width
}

/// Frame under a pointer at `x` on a strip `width` wide.
pub fn frame_at_x(metadata: &SpriteMetadata, x: f64, width: f64) -> usize {
    if width <= 0.0 {
        return 0;
    }
    metadata.frame_for_progress(x / width)
}

/// The filmstrip with its sprite and current layout.
pub struct Filmstrip {
    sprite: SpriteSheet,
    layout: FilmstripLayout,
}

impl Filmstrip {
    pub fn new(metadata: &SpriteMetadata, sprite: SpriteSheet, width: f64, height: f64) -> Self {
        Self {
            layout: FilmstripLayout::compute(metadata, width, height),
            sprite,
        }
    }

    pub fn layout(&self) -> &FilmstripLayout {
        &self.layout
    }

    pub fn sprite(&self) -> &SpriteSheet {
        &self.sprite
    }

    /// Recompute geometry for a new strip size.
    pub fn resize(&mut self, metadata: &SpriteMetadata, width: f64, height: f64) {
        tracing::debug!(width, height, "Filmstrip resized");
        self.layout = FilmstripLayout::compute(metadata, width, height);
    }

    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S) {
        self.layout.draw(&self.sprite, surface);
    }

    pub fn playhead_x(&self, metadata: &SpriteMetadata, frame: usize) -> f64 {
        playhead_x(metadata, frame, self.layout.width)
    }
}
