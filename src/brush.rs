//! Brush stamps.
//!
//! A brush is an immutable stamp with a handle (hotspot). Square and circle
//! brushes rasterize their shape once at construction and act as stencils
//! masked on the caller's colour; image brushes carry full-colour pixels of
//! their own and ignore the colour parameter, preserving custom brush
//! imagery.

use emath::{Pos2, Rect, Vec2, pos2, vec2};
use image::{Rgba, RgbaImage};

use crate::canvas::{BlendMode, blend_pixel};
use crate::error::{Error, Result};
use crate::surface::Surface;

/// How stamped pixels combine with the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositeMode {
    /// Alpha-blend the stamp over the existing pixels.
    SourceOver,
    /// Overwrite existing pixels outright.
    Replace,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BrushKind {
    Square,
    Circle,
    Image,
}

/// An immutable stamp plus its handle, in pixel coordinates.
///
/// The handle is fixed at construction (callers specify it as a fraction of
/// the size, converted once); the stamp buffer is never mutated afterwards.
#[derive(Clone, PartialEq)]
pub struct Brush {
    kind: BrushKind,
    width: u32,
    height: u32,
    handle: Vec2,
    stamp: Surface,
}

/// Stencil colour used for generated square/circle stamps.
const STENCIL_ON: Rgba<u8> = Rgba([255, 255, 255, 255]);

impl Brush {
    /// A filled-rectangle stencil brush.
    pub fn square(width: u32, height: u32, handle_fraction: Vec2) -> Result<Self> {
        let mut stamp = Surface::new(width, height)?;
        stamp.fill_rectangle(
            Rect::from_min_max(pos2(0.0, 0.0), pos2(width as f32, height as f32)),
            STENCIL_ON,
        );
        Ok(Self {
            kind: BrushKind::Square,
            width,
            height,
            handle: handle_from_fraction(width, height, handle_fraction),
            stamp,
        })
    }

    /// A filled-ellipse stencil brush inscribed in the size rectangle.
    pub fn circle(width: u32, height: u32, handle_fraction: Vec2) -> Result<Self> {
        let mut stamp = Surface::new(width, height)?;
        stamp.fill_ellipse(
            Rect::from_min_max(pos2(0.0, 0.0), pos2(width as f32, height as f32)),
            STENCIL_ON,
        );
        Ok(Self {
            kind: BrushKind::Circle,
            width,
            height,
            handle: handle_from_fraction(width, height, handle_fraction),
            stamp,
        })
    }

    /// A full-colour brush from caller-supplied imagery.
    pub fn from_image(image: RgbaImage, handle_fraction: Vec2) -> Result<Self> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(Error::InvalidSize {
                what: "brush stamp",
                width,
                height,
            });
        }
        Ok(Self {
            kind: BrushKind::Image,
            width,
            height,
            handle: handle_from_fraction(width, height, handle_fraction),
            stamp: Surface::from_image(image),
        })
    }

    pub fn kind(&self) -> BrushKind {
        self.kind
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn handle(&self) -> Vec2 {
        self.handle
    }

    pub fn stamp(&self) -> &Surface {
        &self.stamp
    }

    /// Stamp the brush onto `target` through
    /// `translate(position) ∘ rotate(rotation) ∘ scale(scale) ∘ translate(-handle)`.
    ///
    /// Stencil brushes (square/circle) write `colour` wherever the stencil is
    /// set and nothing elsewhere; image brushes write their own pixels and
    /// ignore `colour`. Returns the touched rect, [`Rect::NOTHING`] when the
    /// stamp lands entirely off-surface.
    pub fn draw(
        &self,
        target: &mut Surface,
        colour: Rgba<u8>,
        position: Pos2,
        scale: f32,
        rotation: f32,
        mode: CompositeMode,
    ) -> Rect {
        if scale <= 0.0 {
            return Rect::NOTHING;
        }
        let (sin, cos) = rotation.sin_cos();
        let forward = |stamp_pos: Vec2| -> Pos2 {
            let local = (stamp_pos - self.handle) * scale;
            position + vec2(local.x * cos - local.y * sin, local.x * sin + local.y * cos)
        };

        // Bounding box of the transformed stamp, clipped to the target.
        let corners = [
            forward(vec2(0.0, 0.0)),
            forward(vec2(self.width as f32, 0.0)),
            forward(vec2(0.0, self.height as f32)),
            forward(vec2(self.width as f32, self.height as f32)),
        ];
        let mut bounds = Rect::NOTHING;
        for corner in corners {
            bounds.extend_with(corner);
        }
        let x0 = (bounds.min.x.floor() as i32).max(0);
        let y0 = (bounds.min.y.floor() as i32).max(0);
        let x1 = (bounds.max.x.ceil() as i32).min(target.width() as i32);
        let y1 = (bounds.max.y.ceil() as i32).min(target.height() as i32);
        if x0 >= x1 || y0 >= y1 {
            return Rect::NOTHING;
        }

        // Inverse-map each covered target pixel center back into stamp space
        // and nearest-sample the stamp.
        for y in y0..y1 {
            for x in x0..x1 {
                let d = pos2(x as f32 + 0.5, y as f32 + 0.5) - position;
                let unrotated = vec2(cos * d.x + sin * d.y, -sin * d.x + cos * d.y);
                let stamp_pos = unrotated / scale + self.handle;
                let sx = stamp_pos.x.floor() as i32;
                let sy = stamp_pos.y.floor() as i32;
                if sx < 0 || sy < 0 || sx as u32 >= self.width || sy as u32 >= self.height {
                    continue;
                }
                let stamp_pixel = self.stamp.pixel_at(sx, sy);
                if stamp_pixel.0[3] == 0 {
                    continue;
                }
                let src = match self.kind {
                    BrushKind::Image => stamp_pixel,
                    _ => colour,
                };
                match mode {
                    CompositeMode::Replace => target.draw_pixel(x, y, src),
                    CompositeMode::SourceOver => {
                        let dst = target.pixel_at(x, y);
                        target.draw_pixel(x, y, blend_pixel(dst, src, BlendMode::Normal, 1.0));
                    }
                }
            }
        }

        Rect::from_min_max(pos2(x0 as f32, y0 as f32), pos2(x1 as f32, y1 as f32))
    }
}

impl std::fmt::Debug for Brush {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Brush")
            .field("kind", &self.kind)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("handle", &self.handle)
            .finish()
    }
}

fn handle_from_fraction(width: u32, height: u32, fraction: Vec2) -> Vec2 {
    vec2(width as f32 * fraction.x, height as f32 * fraction.y)
}
