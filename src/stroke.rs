//! Pressure-weighted stroke interpolation.
//!
//! A stroke is an ordered run of sub-pixel samples; drawing walks each
//! consecutive pair at a fixed stamp cadence, carrying the fractional
//! stepping remainder across segment joins so the spacing stays continuous
//! instead of double-stamping or gapping at the seams.

use emath::{Pos2, Rect};
use image::Rgba;

use crate::brush::{Brush, CompositeMode};
use crate::surface::Surface;

/// One input sample: sub-pixel position plus pen pressure in `0..=1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokePoint {
    pub position: Pos2,
    pub pressure: f32,
}

impl StrokePoint {
    pub fn new(position: Pos2, pressure: f32) -> Self {
        Self { position, pressure }
    }
}

/// An ordered sequence of [`StrokePoint`]s. Insertion order defines the
/// path; empty strokes draw nothing and a single point draws a dot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stroke {
    points: Vec<StrokePoint>,
}

impl Stroke {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: Vec<StrokePoint>) -> Self {
        Self { points }
    }

    pub fn push(&mut self, point: StrokePoint) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[StrokePoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Stamp `brush` along the whole stroke, threading the stepping
    /// remainder through every segment. Returns the union of touched rects.
    pub fn draw(
        &self,
        target: &mut Surface,
        brush: &Brush,
        colour: Rgba<u8>,
        scale_min: f32,
        scale_max: f32,
        mode: CompositeMode,
    ) -> Rect {
        let mut dirty = Rect::NOTHING;
        match self.points.len() {
            0 => {}
            1 => {
                // A dot: one degenerate self-segment.
                let (_, rect) = stroke_segment(
                    target,
                    brush,
                    colour,
                    self.points[0],
                    self.points[0],
                    scale_min,
                    scale_max,
                    0.0,
                    mode,
                );
                dirty = rect;
            }
            _ => {
                let mut offset = 0.0;
                for pair in self.points.windows(2) {
                    let (next_offset, rect) = stroke_segment(
                        target, brush, colour, pair[0], pair[1], scale_min, scale_max, offset,
                        mode,
                    );
                    offset = next_offset;
                    dirty = dirty.union(rect);
                }
            }
        }
        dirty
    }
}

/// Stamp `brush` along the segment `p0 → p1`.
///
/// The step count is the Chebyshev distance `max(|Δx|, |Δy|, 1)` — kept
/// fractional so sub-pixel strides are honored. `t` walks from
/// `step_offset * step` to `1.0` inclusive; at each stop the brush lands at
/// the interpolated position with scale lerped between `scale_min` and
/// `scale_max` by the interpolated pressure.
///
/// Returns `(leftover, touched_rect)` where `leftover = (final_t - 1.0) *
/// steps` is the fractional offset the next segment must start at to keep
/// the cadence across the join.
#[allow(clippy::too_many_arguments)]
pub fn stroke_segment(
    target: &mut Surface,
    brush: &Brush,
    colour: Rgba<u8>,
    p0: StrokePoint,
    p1: StrokePoint,
    scale_min: f32,
    scale_max: f32,
    step_offset: f32,
    mode: CompositeMode,
) -> (f32, Rect) {
    let delta = p1.position - p0.position;
    let steps = delta.x.abs().max(delta.y.abs()).max(1.0);
    let step = 1.0 / steps;

    // Stamp count derived once instead of accumulating t by repeated
    // addition, which drifts across the 1.0-inclusive boundary on long
    // segments.
    let stamps = (((steps - step_offset) + 1e-4).floor() as i32 + 1).max(0);

    let mut dirty = Rect::NOTHING;
    for i in 0..stamps {
        let t = ((step_offset + i as f32) * step).min(1.0);
        let position = p0.position + delta * t;
        let pressure = p0.pressure + (p1.pressure - p0.pressure) * t;
        let scale = scale_min + (scale_max - scale_min) * pressure;
        let rect = brush.draw(target, colour, position, scale, 0.0, mode);
        dirty = dirty.union(rect);
    }

    let final_t = (step_offset + stamps as f32) * step;
    ((final_t - 1.0) * steps, dirty)
}
