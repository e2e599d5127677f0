//! Flood fill tests: preconditions, connectivity, and the concrete
//! scenarios the algorithms must reproduce exactly.

use std::collections::HashSet;

use image::Rgba;
use tilecraft::fill::{image_pixel_flood_fill, tileset_tile_flood_fill};
use tilecraft::surface::Surface;
use tilecraft::tileset::TileGrid;

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

fn as_set(positions: &[(u32, u32)]) -> HashSet<(u32, u32)> {
    positions.iter().copied().collect()
}

#[test]
fn fills_the_black_square_in_a_red_image() {
    // 4x4 all red except a 2x2 black square at (1,1)-(2,2).
    let mut surface = Surface::new_filled(4, 4, RED).unwrap();
    for (x, y) in [(1, 1), (1, 2), (2, 1), (2, 2)] {
        surface.draw_pixel(x, y, BLACK);
    }
    let filled = image_pixel_flood_fill(&surface, (1, 1), BLACK, WHITE);
    assert_eq!(
        as_set(&filled),
        HashSet::from([(1, 1), (1, 2), (2, 1), (2, 2)])
    );
    assert_eq!(filled.len(), 4, "every position exactly once");
}

#[test]
fn equal_target_and_replacement_is_a_noop() {
    let surface = Surface::new_filled(4, 4, RED).unwrap();
    // The replacement check fires before the target check, so this must be
    // empty for any start and colour.
    assert!(image_pixel_flood_fill(&surface, (0, 0), RED, RED).is_empty());
    assert!(image_pixel_flood_fill(&surface, (2, 3), BLACK, BLACK).is_empty());
}

#[test]
fn start_already_replacement_coloured_is_a_noop() {
    let mut surface = Surface::new_filled(4, 4, RED).unwrap();
    surface.draw_pixel(1, 1, WHITE);
    assert!(image_pixel_flood_fill(&surface, (1, 1), RED, WHITE).is_empty());
}

#[test]
fn start_not_matching_target_is_a_noop() {
    let surface = Surface::new_filled(4, 4, RED).unwrap();
    assert!(image_pixel_flood_fill(&surface, (1, 1), BLACK, WHITE).is_empty());
}

#[test]
fn out_of_bounds_start_is_a_noop() {
    let surface = Surface::new_filled(4, 4, RED).unwrap();
    assert!(image_pixel_flood_fill(&surface, (4, 0), RED, WHITE).is_empty());
    assert!(image_pixel_flood_fill(&surface, (0, 4), RED, WHITE).is_empty());
}

#[test]
fn whole_surface_fill_reaches_every_pixel_once() {
    let surface = Surface::new_filled(5, 3, RED).unwrap();
    let filled = image_pixel_flood_fill(&surface, (2, 1), RED, WHITE);
    assert_eq!(filled.len(), 15);
    assert_eq!(as_set(&filled).len(), 15);
}

#[test]
fn diagonal_neighbors_are_not_connected() {
    // Two black pixels touching only at a corner: filling one must not
    // leak into the other.
    let mut surface = Surface::new_filled(4, 4, RED).unwrap();
    surface.draw_pixel(1, 1, BLACK);
    surface.draw_pixel(2, 2, BLACK);
    let filled = image_pixel_flood_fill(&surface, (1, 1), BLACK, WHITE);
    assert_eq!(as_set(&filled), HashSet::from([(1, 1)]));
}

#[test]
fn fill_stops_at_a_boundary_ring() {
    // A red ring around a black centre: filling the centre stays inside.
    let mut surface = Surface::new_filled(5, 5, BLACK).unwrap();
    for i in 0..5 {
        surface.draw_pixel(i, 0, RED);
        surface.draw_pixel(i, 4, RED);
        surface.draw_pixel(0, i, RED);
        surface.draw_pixel(4, i, RED);
    }
    let filled = image_pixel_flood_fill(&surface, (2, 2), BLACK, WHITE);
    assert_eq!(filled.len(), 9);
    assert!(filled.iter().all(|&(x, y)| (1..4).contains(&x) && (1..4).contains(&y)));
}

#[test]
fn large_region_does_not_recurse() {
    // A wide open canvas; an implementation with call-stack recursion
    // would blow up long before this finishes.
    let surface = Surface::new_filled(512, 512, RED).unwrap();
    let filled = image_pixel_flood_fill(&surface, (256, 256), RED, WHITE);
    assert_eq!(filled.len(), 512 * 512);
}

// ----------------------------------------------------------------------
// Tile fills
// ----------------------------------------------------------------------

#[test]
fn tile_fill_replaces_a_connected_run() {
    let mut grid = TileGrid::new(4, 3).unwrap();
    grid.set_tile(0, 0, 7);
    grid.set_tile(1, 0, 7);
    grid.set_tile(1, 1, 7);
    grid.set_tile(3, 2, 7); // disconnected

    let filled = tileset_tile_flood_fill(&grid, (0, 0), 7, 9);
    assert_eq!(as_set(&filled), HashSet::from([(0, 0), (1, 0), (1, 1)]));
}

#[test]
fn tile_fill_over_empty_cells() {
    let mut grid = TileGrid::new(3, 3).unwrap();
    grid.set_tile(1, 1, 5);
    // Filling the empty background from a corner touches everything but
    // the occupied cell.
    let filled = tileset_tile_flood_fill(&grid, (0, 0), -1, 5);
    assert_eq!(filled.len(), 8);
    assert!(!filled.contains(&(1, 1)));
}

#[test]
fn tile_fill_same_id_is_a_noop() {
    let mut grid = TileGrid::new(3, 3).unwrap();
    grid.set_tile(0, 0, 4);
    assert!(tileset_tile_flood_fill(&grid, (0, 0), 4, 4).is_empty());
}

#[test]
fn tile_fill_out_of_bounds_start_is_a_noop() {
    let grid = TileGrid::new(3, 3).unwrap();
    assert!(tileset_tile_flood_fill(&grid, (3, 0), -1, 1).is_empty());
}
