//! Brush stamp tests: stencil masking, image tips, handles, rotation.

use emath::{pos2, vec2};
use image::{Rgba, RgbaImage};
use tilecraft::brush::{Brush, BrushKind, CompositeMode};
use tilecraft::surface::{Surface, TRANSPARENT};

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);

fn painted(surface: &Surface, colour: Rgba<u8>) -> Vec<(i32, i32)> {
    let mut out = Vec::new();
    for y in 0..surface.height() as i32 {
        for x in 0..surface.width() as i32 {
            if surface.pixel_at(x, y) == colour {
                out.push((x, y));
            }
        }
    }
    out
}

#[test]
fn square_brush_stamps_exact_footprint() {
    let brush = Brush::square(2, 2, vec2(0.0, 0.0)).unwrap();
    let mut surface = Surface::new(8, 8).unwrap();
    brush.draw(
        &mut surface,
        RED,
        pos2(3.0, 4.0),
        1.0,
        0.0,
        CompositeMode::Replace,
    );
    assert_eq!(painted(&surface, RED), vec![(3, 4), (4, 4), (3, 5), (4, 5)]);
}

#[test]
fn handle_offsets_the_stamp() {
    // Centered handle on a 2x2 brush shifts the footprint up-left by one.
    let brush = Brush::square(2, 2, vec2(0.5, 0.5)).unwrap();
    let mut surface = Surface::new(8, 8).unwrap();
    brush.draw(
        &mut surface,
        RED,
        pos2(3.0, 4.0),
        1.0,
        0.0,
        CompositeMode::Replace,
    );
    assert_eq!(painted(&surface, RED), vec![(2, 3), (3, 3), (2, 4), (3, 4)]);
}

#[test]
fn circle_brush_four_wide_is_rounded() {
    let brush = Brush::circle(4, 4, vec2(0.0, 0.0)).unwrap();
    let mut surface = Surface::new(8, 8).unwrap();
    brush.draw(
        &mut surface,
        RED,
        pos2(0.0, 0.0),
        1.0,
        0.0,
        CompositeMode::Replace,
    );
    let rows: Vec<usize> = (0..4)
        .map(|y| (0..4).filter(|&x| surface.pixel_at(x, y) == RED).count())
        .collect();
    assert_eq!(rows, vec![2, 4, 4, 2]);
}

#[test]
fn stencil_brushes_use_the_fill_colour() {
    let brush = Brush::square(1, 1, vec2(0.0, 0.0)).unwrap();
    let mut surface = Surface::new(4, 4).unwrap();
    brush.draw(
        &mut surface,
        GREEN,
        pos2(1.0, 1.0),
        1.0,
        0.0,
        CompositeMode::Replace,
    );
    assert_eq!(surface.pixel_at(1, 1), GREEN);
}

#[test]
fn image_brush_ignores_the_colour_parameter() {
    let mut stamp = RgbaImage::new(2, 1);
    stamp.put_pixel(0, 0, RED);
    stamp.put_pixel(1, 0, GREEN);
    let brush = Brush::from_image(stamp, vec2(0.0, 0.0)).unwrap();
    assert_eq!(brush.kind(), BrushKind::Image);

    let mut surface = Surface::new(4, 4).unwrap();
    brush.draw(
        &mut surface,
        Rgba([0, 0, 255, 255]),
        pos2(0.0, 0.0),
        1.0,
        0.0,
        CompositeMode::Replace,
    );
    assert_eq!(surface.pixel_at(0, 0), RED);
    assert_eq!(surface.pixel_at(1, 0), GREEN);
}

#[test]
fn transparent_stamp_pixels_leave_the_target_alone() {
    // Circle stamp corners are transparent: the background must survive.
    let brush = Brush::circle(4, 4, vec2(0.0, 0.0)).unwrap();
    let mut surface = Surface::new_filled(4, 4, GREEN).unwrap();
    brush.draw(
        &mut surface,
        RED,
        pos2(0.0, 0.0),
        1.0,
        0.0,
        CompositeMode::SourceOver,
    );
    assert_eq!(surface.pixel_at(0, 0), GREEN);
    assert_eq!(surface.pixel_at(1, 1), RED);
}

#[test]
fn rotated_stamp_lands_rotated() {
    // A 3x1 horizontal bar rotated a quarter turn paints a vertical run.
    let brush = Brush::square(3, 1, vec2(0.0, 0.0)).unwrap();
    let mut surface = Surface::new(8, 8).unwrap();
    brush.draw(
        &mut surface,
        RED,
        pos2(2.0, 2.0),
        1.0,
        std::f32::consts::FRAC_PI_2,
        CompositeMode::Replace,
    );
    assert_eq!(painted(&surface, RED), vec![(1, 2), (1, 3), (1, 4)]);
}

#[test]
fn scaled_stamp_covers_scaled_footprint() {
    let brush = Brush::square(2, 2, vec2(0.0, 0.0)).unwrap();
    let mut surface = Surface::new(8, 8).unwrap();
    brush.draw(
        &mut surface,
        RED,
        pos2(0.0, 0.0),
        2.0,
        0.0,
        CompositeMode::Replace,
    );
    assert_eq!(painted(&surface, RED).len(), 16);
}

#[test]
fn zero_scale_draws_nothing() {
    let brush = Brush::square(2, 2, vec2(0.0, 0.0)).unwrap();
    let mut surface = Surface::new(8, 8).unwrap();
    let rect = brush.draw(
        &mut surface,
        RED,
        pos2(3.0, 3.0),
        0.0,
        0.0,
        CompositeMode::Replace,
    );
    assert!(painted(&surface, RED).is_empty());
    assert_eq!(rect, emath::Rect::NOTHING);
}

#[test]
fn off_surface_stamp_reports_nothing() {
    let brush = Brush::square(2, 2, vec2(0.0, 0.0)).unwrap();
    let mut surface = Surface::new(8, 8).unwrap();
    let rect = brush.draw(
        &mut surface,
        RED,
        pos2(20.0, 20.0),
        1.0,
        0.0,
        CompositeMode::Replace,
    );
    assert_eq!(rect, emath::Rect::NOTHING);
    assert!(painted(&surface, RED).is_empty());
}

#[test]
fn brush_equality_covers_kind_size_handle_and_stamp() {
    let a = Brush::square(3, 3, vec2(0.5, 0.5)).unwrap();
    let b = Brush::square(3, 3, vec2(0.5, 0.5)).unwrap();
    let c = Brush::circle(3, 3, vec2(0.5, 0.5)).unwrap();
    let d = Brush::square(3, 3, vec2(0.0, 0.0)).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_ne!(a, d);
}

#[test]
fn draw_reports_the_touched_rect() {
    let brush = Brush::square(2, 2, vec2(0.0, 0.0)).unwrap();
    let mut surface = Surface::new(8, 8).unwrap();
    let rect = brush.draw(
        &mut surface,
        RED,
        pos2(3.0, 4.0),
        1.0,
        0.0,
        CompositeMode::Replace,
    );
    assert_eq!(rect.min, pos2(3.0, 4.0));
    assert_eq!(rect.max, pos2(5.0, 6.0));
}
