//! Drawing surfaces.
//!
//! Renderers only need two primitives: fill a rectangle with a colour and
//! blit a sub-rectangle of a sprite into a destination rectangle. The
//! [`RasterSurface`] backs both with an in-memory RGBA buffer.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use scrubkit_common::error::{ScrubError, ScrubResult};

/// Axis-aligned rectangle in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Canvas colour with straight alpha.
pub type Color = Rgba<u8>;

/// `#rrggbb`.
pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
    Rgba([r, g, b, 255])
}

/// CSS-style `rgba(r, g, b, a)` with `a` in `[0, 1]`.
pub fn rgba(r: u8, g: u8, b: u8, alpha: f64) -> Color {
    Rgba([r, g, b, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8])
}

/// A target the preview and filmstrip renderers draw into.
pub trait Surface: Send {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Resize, clearing the contents.
    fn resize(&mut self, width: u32, height: u32);

    /// Fill `rect`, blending by the colour's alpha.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Copy `src` (sprite pixels) into `dst` (surface coordinates), scaling
    /// when the sizes differ.
    fn draw_image(&mut self, sprite: &RgbaImage, src: Rect, dst: Rect);
}

/// In-memory RGBA surface.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    pixels: RgbaImage,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        (x < self.pixels.width() && y < self.pixels.height()).then(|| *self.pixels.get_pixel(x, y))
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }

    /// Write the surface as PNG.
    pub fn save_png(&self, path: &Path) -> ScrubResult<()> {
        self.pixels
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| ScrubError::render(format!("writing {}: {e}", path.display())))
    }

    /// Clip a float rectangle to integer pixel bounds on this surface.
    fn clip(&self, rect: Rect) -> Option<(u32, u32, u32, u32)> {
        let x0 = rect.x.max(0.0).round() as i64;
        let y0 = rect.y.max(0.0).round() as i64;
        let x1 = (rect.right().round() as i64).min(self.pixels.width() as i64);
        let y1 = (rect.bottom().round() as i64).min(self.pixels.height() as i64);
        (x1 > x0 && y1 > y0).then(|| (x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
    }
}

fn blend(dst: &mut Color, src: Color) {
    let alpha = src.0[3] as u32;
    if alpha == 255 {
        *dst = src;
        return;
    }
    let inv = 255 - alpha;
    for channel in 0..3 {
        dst.0[channel] = ((src.0[channel] as u32 * alpha + dst.0[channel] as u32 * inv) / 255) as u8;
    }
    dst.0[3] = (alpha + dst.0[3] as u32 * inv / 255).min(255) as u8;
}

impl Surface for RasterSurface {
    fn width(&self) -> u32 {
        self.pixels.width()
    }

    fn height(&self) -> u32 {
        self.pixels.height()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.pixels = RgbaImage::new(width, height);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let Some((x, y, w, h)) = self.clip(rect) else {
            return;
        };
        for py in y..y + h {
            for px in x..x + w {
                blend(self.pixels.get_pixel_mut(px, py), color);
            }
        }
    }

    fn draw_image(&mut self, sprite: &RgbaImage, src: Rect, dst: Rect) {
        let sx = src.x.max(0.0) as u32;
        let sy = src.y.max(0.0) as u32;
        if sx >= sprite.width() || sy >= sprite.height() {
            return;
        }
        let sw = (src.width as u32).min(sprite.width() - sx);
        let sh = (src.height as u32).min(sprite.height() - sy);
        if sw == 0 || sh == 0 {
            return;
        }

        let dw = dst.width.round().max(0.0) as u32;
        let dh = dst.height.round().max(0.0) as u32;
        if dw == 0 || dh == 0 {
            return;
        }

        let view = imageops::crop_imm(sprite, sx, sy, sw, sh).to_image();
        let tile = if (sw, sh) == (dw, dh) {
            view
        } else {
            imageops::resize(&view, dw, dh, FilterType::Triangle)
        };
        imageops::overlay(
            &mut self.pixels,
            &tile,
            dst.x.round() as i64,
            dst.y.round() as i64,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_alpha_rounding() {
        assert_eq!(rgba(120, 40, 40, 0.9), Rgba([120, 40, 40, 230]));
        assert_eq!(rgba(50, 180, 80, 0.95), Rgba([50, 180, 80, 242]));
    }

    #[test]
    fn test_fill_rect_clips_to_surface() {
        let mut surface = RasterSurface::new(4, 4);
        surface.fill_rect(Rect::new(2.0, 2.0, 10.0, 10.0), rgb(255, 0, 0));
        assert_eq!(surface.pixel(3, 3), Some(rgb(255, 0, 0)));
        assert_eq!(surface.pixel(1, 1), Some(Rgba([0, 0, 0, 0])));
    }

    #[test]
    fn test_translucent_fill_blends() {
        let mut surface = RasterSurface::new(1, 1);
        surface.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), rgb(0, 0, 0));
        surface.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Rgba([255, 255, 255, 128]));
        let px = surface.pixel(0, 0).unwrap();
        assert_eq!(px.0[3], 255);
        assert!((px.0[0] as i32 - 128).abs() <= 1);
    }

    #[test]
    fn test_draw_image_copies_sub_rect() {
        let mut sprite = RgbaImage::new(4, 2);
        for (x, _, px) in sprite.enumerate_pixels_mut() {
            *px = if x >= 2 { rgb(0, 255, 0) } else { rgb(255, 0, 0) };
        }
        let mut surface = RasterSurface::new(2, 2);
        surface.draw_image(
            &sprite,
            Rect::new(2.0, 0.0, 2.0, 2.0),
            Rect::new(0.0, 0.0, 2.0, 2.0),
        );
        assert_eq!(surface.pixel(0, 0), Some(rgb(0, 255, 0)));
        assert_eq!(surface.pixel(1, 1), Some(rgb(0, 255, 0)));
    }
}
