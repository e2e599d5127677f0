//! Owned raster pixel buffer and its fill primitives.
//!
//! All drawing primitives clip to `[0,width) x [0,height)` before touching
//! the buffer: out-of-bounds reads return [`TRANSPARENT`], out-of-bounds
//! writes are no-ops, and an empty or negative clip area yields zero spans.
//! Nothing in this module panics on geometry.

use emath::Rect;
use image::{Rgba, RgbaImage};

use crate::error::{Error, Result};

/// Sentinel returned for reads outside the surface.
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// An owned width×height RGBA pixel buffer.
///
/// Straight (non-premultiplied) 8-bit RGBA throughout, matching the rest of
/// the crate.
#[derive(Clone)]
pub struct Surface {
    pixels: RgbaImage,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidSize {
                what: "surface",
                width,
                height,
            });
        }
        Ok(Self {
            pixels: RgbaImage::new(width, height),
        })
    }

    pub fn new_filled(width: u32, height: u32, colour: Rgba<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidSize {
                what: "surface",
                width,
                height,
            });
        }
        Ok(Self {
            pixels: RgbaImage::from_pixel(width, height, colour),
        })
    }

    pub fn from_image(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width() && (y as u32) < self.height()
    }

    /// Read a pixel; out-of-bounds positions return [`TRANSPARENT`].
    pub fn pixel_at(&self, x: i32, y: i32) -> Rgba<u8> {
        if self.contains(x, y) {
            *self.pixels.get_pixel(x as u32, y as u32)
        } else {
            TRANSPARENT
        }
    }

    /// Bounds-checked single-pixel write; out-of-bounds is a no-op.
    pub fn draw_pixel(&mut self, x: i32, y: i32, colour: Rgba<u8>) {
        if self.contains(x, y) {
            self.pixels.put_pixel(x as u32, y as u32, colour);
        }
    }

    /// Horizontal run write on row `y` from `x0` to `x1` (exclusive),
    /// clipped to the surface.
    pub fn draw_span(&mut self, x0: i32, x1: i32, y: i32, colour: Rgba<u8>) {
        if y < 0 || y as u32 >= self.height() {
            return;
        }
        let x0 = x0.max(0);
        let x1 = x1.min(self.width() as i32);
        for x in x0..x1 {
            self.pixels.put_pixel(x as u32, y as u32, colour);
        }
    }

    /// Fill a rectangle, rounding each edge via `floor(coord + 0.5)` so the
    /// fill is pixel-center-sampled, then emitting spans row by row.
    pub fn fill_rectangle(&mut self, rect: Rect, colour: Rgba<u8>) {
        let x0 = round_half_up(rect.min.x);
        let x1 = round_half_up(rect.max.x);
        let y0 = round_half_up(rect.min.y).max(0);
        let y1 = round_half_up(rect.max.y).min(self.height() as i32);
        for y in y0..y1 {
            self.draw_span(x0, x1, y, colour);
        }
    }

    /// Fill the ellipse inscribed in `rect`: for each row of the clipped
    /// bounding box the half-chord width is computed analytically from the
    /// ellipse equation (`sqrt(r_y² - dy²) * (r_x / r_y)`) and emitted as a
    /// single span, with the same round-half-up edge policy as
    /// [`fill_rectangle`](Self::fill_rectangle).
    pub fn fill_ellipse(&mut self, rect: Rect, colour: Rgba<u8>) {
        let rx = (rect.max.x - rect.min.x) * 0.5;
        let ry = (rect.max.y - rect.min.y) * 0.5;
        if rx <= 0.0 || ry <= 0.0 {
            return;
        }
        let cx = (rect.min.x + rect.max.x) * 0.5;
        let cy = (rect.min.y + rect.max.y) * 0.5;

        let y0 = round_half_up(rect.min.y).max(0);
        let y1 = round_half_up(rect.max.y).min(self.height() as i32);
        for y in y0..y1 {
            // Sample the row at its pixel center.
            let dy = (y as f32 + 0.5) - cy;
            if dy.abs() > ry {
                continue;
            }
            let half_chord = (ry * ry - dy * dy).sqrt() * (rx / ry);
            let x0 = round_half_up(cx - half_chord);
            let x1 = round_half_up(cx + half_chord);
            self.draw_span(x0, x1, y, colour);
        }
    }

    pub fn fill(&mut self, colour: Rgba<u8>) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = colour;
        }
    }

    pub fn clear(&mut self) {
        self.fill(TRANSPARENT);
    }

    /// Copy the `width`×`height` rectangle at (`x`, `y`) out into a new
    /// surface. Source pixels outside the surface read as transparent.
    pub fn copy_region(&self, x: i32, y: i32, width: u32, height: u32) -> Result<Surface> {
        let mut out = Surface::new(width, height)?;
        for dy in 0..height {
            for dx in 0..width {
                let pixel = self.pixel_at(x + dx as i32, y + dy as i32);
                out.pixels.put_pixel(dx, dy, pixel);
            }
        }
        Ok(out)
    }

    /// Paste `src` with its top-left corner at (`x`, `y`), overwriting.
    /// Destination pixels outside the surface are dropped.
    pub fn paste_region(&mut self, src: &Surface, x: i32, y: i32) {
        for sy in 0..src.height() {
            for sx in 0..src.width() {
                self.draw_pixel(
                    x + sx as i32,
                    y + sy as i32,
                    *src.pixels.get_pixel(sx, sy),
                );
            }
        }
    }

    pub fn memory_bytes(&self) -> usize {
        self.pixels.as_raw().len()
    }
}

impl PartialEq for Surface {
    fn eq(&self, other: &Self) -> bool {
        self.pixels.as_raw() == other.pixels.as_raw()
            && self.width() == other.width()
            && self.height() == other.height()
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

#[inline]
fn round_half_up(coord: f32) -> i32 {
    (coord + 0.5).floor() as i32
}
