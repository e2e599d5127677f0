//! Tileset addressing tests: id bijection, geometry validation, grids, and
//! the composed canvas-pixel lookup.

use image::Rgba;
use tilecraft::canvas::TilesetDoc;
use tilecraft::surface::{Surface, TRANSPARENT};
use tilecraft::tileset::{EMPTY_TILE, TileGrid, Tileset};

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);

/// 5 tiles wide, 3 high, 4x4-pixel tiles.
fn five_wide() -> Tileset {
    Tileset::new(Surface::new(20, 12).unwrap(), 4, 4).unwrap()
}

#[test]
fn first_tile_has_id_one() {
    assert_eq!(five_wide().tile_id_from_tile_pos(0, 0), 1);
}

#[test]
fn id_formula_matches_the_contract() {
    // (2,1) on a 5-wide tileset: 1*5 + 2 + 1 = 8.
    assert_eq!(five_wide().tile_id_from_tile_pos(2, 1), 8);
}

#[test]
fn id_and_position_are_exact_inverses() {
    let tileset = five_wide();
    for row in 0..tileset.tiles_high() {
        for column in 0..tileset.tiles_wide() {
            let id = tileset.tile_id_from_tile_pos(column, row);
            assert!(tileset.contains_id(id));
            assert_eq!(tileset.tile_id_to_tile_pos(id), (column, row));
        }
    }
}

#[test]
fn pixel_position_maps_to_the_covering_tile() {
    let tileset = five_wide();
    assert_eq!(tileset.tile_id_from_pos(0, 0), 1);
    assert_eq!(tileset.tile_id_from_pos(3, 3), 1);
    assert_eq!(tileset.tile_id_from_pos(4, 0), 2);
    assert_eq!(tileset.tile_id_from_pos(11, 5), 8);
}

#[test]
fn ids_outside_the_tileset_are_not_contained() {
    let tileset = five_wide();
    assert!(!tileset.contains_id(0)); // never assigned
    assert!(!tileset.contains_id(EMPTY_TILE));
    assert!(!tileset.contains_id(16)); // 15 tiles total
    assert!(tileset.contains_id(15));
}

#[test]
fn tile_lookup_returns_the_source_rect() {
    let tileset = five_wide();
    let tile = tileset.tile(8).unwrap();
    assert_eq!(tile.id, 8);
    assert_eq!((tile.source_x, tile.source_y), (8, 4));
    assert_eq!((tile.width, tile.height), (4, 4));

    assert!(tileset.tile(EMPTY_TILE).is_none());
    assert!(tileset.tile(0).is_none());
    assert!(tileset.tile(99).is_none());
}

#[test]
fn tile_size_must_divide_the_image() {
    assert!(Tileset::new(Surface::new(20, 12).unwrap(), 3, 4).is_err());
    assert!(Tileset::new(Surface::new(20, 12).unwrap(), 4, 5).is_err());
    assert!(Tileset::new(Surface::new(20, 12).unwrap(), 0, 4).is_err());
    assert!(Tileset::new(Surface::new(20, 12).unwrap(), 4, 0).is_err());
}

#[test]
fn grid_cells_default_to_empty() {
    let grid = TileGrid::new(3, 2).unwrap();
    assert_eq!(grid.tile_at(0, 0), EMPTY_TILE);
    assert_eq!(grid.tile_at(2, 1), EMPTY_TILE);
}

#[test]
fn grid_out_of_bounds_reads_empty_and_writes_are_noops() {
    let mut grid = TileGrid::new(3, 2).unwrap();
    assert_eq!(grid.tile_at(3, 0), EMPTY_TILE);
    assert_eq!(grid.tile_at(0, 2), EMPTY_TILE);
    grid.set_tile(3, 0, 5);
    grid.set_tile(0, 2, 5);
    assert!(grid.tiles().iter().all(|&id| id == EMPTY_TILE));
}

#[test]
fn grid_resize_anchors_top_left() {
    let mut grid = TileGrid::new(3, 3).unwrap();
    grid.set_tile(0, 0, 1);
    grid.set_tile(2, 2, 2);

    let grown = grid.resized(4, 4).unwrap();
    assert_eq!(grown.tile_at(0, 0), 1);
    assert_eq!(grown.tile_at(2, 2), 2);
    assert_eq!(grown.tile_at(3, 3), EMPTY_TILE);

    let shrunk = grid.resized(2, 2).unwrap();
    assert_eq!(shrunk.tile_at(0, 0), 1);
    assert_eq!(shrunk.tile_at(1, 1), EMPTY_TILE);
}

#[test]
fn canvas_pixel_lookup_composes_grid_and_tileset() {
    // 2-tile tileset (4x2 image, 2x2 tiles): tile 1 red, tile 2 green.
    let mut image = Surface::new(4, 2).unwrap();
    image.draw_span(0, 2, 0, RED);
    image.draw_span(0, 2, 1, RED);
    image.draw_span(2, 4, 0, GREEN);
    image.draw_span(2, 4, 1, GREEN);
    let tileset = Tileset::new(image, 2, 2).unwrap();

    let mut grid = TileGrid::new(2, 2).unwrap();
    grid.set_tile(0, 0, 1);
    grid.set_tile(1, 1, 2);
    let doc = TilesetDoc::new(tileset, grid);

    assert_eq!(doc.pixel_size(), (4, 4));
    assert_eq!(doc.pixel_at_canvas(0, 0), RED);
    assert_eq!(doc.pixel_at_canvas(1, 1), RED);
    // Empty cell
    assert_eq!(doc.pixel_at_canvas(2, 0), TRANSPARENT);
    // Cell (1,1) shows tile 2
    assert_eq!(doc.pixel_at_canvas(2, 2), GREEN);
    assert_eq!(doc.pixel_at_canvas(3, 3), GREEN);
}

#[test]
fn render_draws_only_occupied_cells() {
    let mut image = Surface::new(4, 2).unwrap();
    image.draw_span(0, 4, 0, RED);
    image.draw_span(0, 4, 1, RED);
    let tileset = Tileset::new(image, 2, 2).unwrap();
    let mut grid = TileGrid::new(2, 1).unwrap();
    grid.set_tile(1, 0, 1);
    let doc = TilesetDoc::new(tileset, grid);

    let rendered = doc.render();
    assert_eq!(rendered.get_pixel(0, 0), &Rgba([0, 0, 0, 0]));
    assert_eq!(rendered.get_pixel(2, 0), &RED);
    assert_eq!(rendered.get_pixel(3, 1), &RED);
}

#[test]
fn tile_pixel_reads_within_the_tile() {
    let mut image = Surface::new(4, 2).unwrap();
    image.draw_pixel(2, 1, GREEN);
    let tileset = Tileset::new(image, 2, 2).unwrap();
    assert_eq!(tileset.tile_pixel(2, 0, 1), GREEN);
    assert_eq!(tileset.tile_pixel(2, 1, 1), TRANSPARENT);
    // offsets beyond the tile and unknown ids read transparent
    assert_eq!(tileset.tile_pixel(2, 5, 0), TRANSPARENT);
    assert_eq!(tileset.tile_pixel(42, 0, 0), TRANSPARENT);
}
