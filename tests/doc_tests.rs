//! Project-document contract tests: round trips and corrupt-input
//! rejection, run through serde_json as a stand-in for the shell's codec.

use image::Rgba;
use tilecraft::canvas::{BlendMode, Document, TilesetDoc};
use tilecraft::doc::{
    self, CORRUPT_TILE, LayeredProjectDoc, TilesetProjectDoc, TilesetDimensionsDoc,
};
use tilecraft::error::Error;
use tilecraft::project::{Guide, Orientation, Project};
use tilecraft::surface::Surface;
use tilecraft::tileset::{TileGrid, Tileset};

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

fn tileset_surface() -> Surface {
    // 3x2 tiles of 2x2 pixels.
    Surface::new_filled(6, 4, RED).unwrap()
}

fn tileset_project() -> Project {
    let tileset = Tileset::new(tileset_surface(), 2, 2).unwrap();
    let mut grid = TileGrid::new(4, 3).unwrap();
    grid.set_tile(0, 0, 1);
    grid.set_tile(3, 2, 6);
    let mut project = Project::new_untitled(
        1,
        Document::Tileset(TilesetDoc::new(tileset, grid).with_path("tiles.png".into())),
    );
    project.guides.push(Guide {
        offset: 16,
        orientation: Orientation::Vertical,
    });
    project
}

#[test]
fn tileset_doc_round_trips_through_json() {
    let project = tileset_project();
    let written = doc::write_tileset_project(&project).unwrap();

    assert_eq!(written.tiles_wide, 4);
    assert_eq!(written.tiles_high, 3);
    assert_eq!(written.tile_width, 2);
    assert_eq!(written.tile_height, 2);
    assert_eq!(written.tileset_path, "tiles.png");
    assert_eq!(written.tileset.tiles_wide, 3);
    assert_eq!(written.tileset.tiles_high, 2);
    assert_eq!(written.tiles.len(), 12);
    assert_eq!(written.guides.len(), 1);

    let json = serde_json::to_string(&written).unwrap();
    let parsed: TilesetProjectDoc = serde_json::from_str(&json).unwrap();
    let read = doc::read_tileset_project(&parsed, tileset_surface()).unwrap();

    let read_doc = read.document.as_tileset().unwrap();
    let original_doc = project.document.as_tileset().unwrap();
    assert_eq!(read_doc.grid, original_doc.grid);
    assert_eq!(read_doc.tileset, original_doc.tileset);
    assert_eq!(read.guides, project.guides);
    assert!(read.loaded);
}

#[test]
fn corrupt_tile_entry_fails_the_read() {
    let mut written = doc::write_tileset_project(&tileset_project()).unwrap();
    written.tiles[5] = CORRUPT_TILE;
    let error = doc::read_tileset_project(&written, tileset_surface())
        .err()
        .unwrap();
    assert!(matches!(error, Error::CorruptTileEntry { index: 5 }));
}

#[test]
fn unknown_tile_id_fails_the_read() {
    let mut written = doc::write_tileset_project(&tileset_project()).unwrap();
    written.tiles[0] = 7; // tileset defines ids 1..=6
    let error = doc::read_tileset_project(&written, tileset_surface())
        .err()
        .unwrap();
    assert!(matches!(error, Error::UnknownTileId { id: 7 }));
}

#[test]
fn wrong_tile_array_length_fails_the_read() {
    let mut written = doc::write_tileset_project(&tileset_project()).unwrap();
    written.tiles.pop();
    assert!(doc::read_tileset_project(&written, tileset_surface()).is_err());
}

#[test]
fn mismatched_tileset_dimensions_fail_the_read() {
    let written = TilesetProjectDoc {
        tiles_wide: 2,
        tiles_high: 2,
        tile_width: 2,
        tile_height: 2,
        tileset_path: String::new(),
        // Claims 4x2 tiles; the 6x4 image actually holds 3x2.
        tileset: TilesetDimensionsDoc {
            tiles_wide: 4,
            tiles_high: 2,
        },
        tiles: vec![-1; 4],
        guides: Vec::new(),
    };
    assert!(doc::read_tileset_project(&written, tileset_surface()).is_err());
}

#[test]
fn tile_size_not_dividing_the_image_fails_the_read() {
    let written = TilesetProjectDoc {
        tiles_wide: 2,
        tiles_high: 2,
        tile_width: 4,
        tile_height: 3,
        tileset_path: String::new(),
        tileset: TilesetDimensionsDoc {
            tiles_wide: 1,
            tiles_high: 1,
        },
        tiles: vec![-1; 4],
        guides: Vec::new(),
    };
    assert!(doc::read_tileset_project(&written, tileset_surface()).is_err());
}

// ----------------------------------------------------------------------
// Layered documents
// ----------------------------------------------------------------------

fn layered_project() -> Project {
    let mut document = Document::new_layered(3, 2).unwrap();
    {
        let doc = document.as_layered_mut().unwrap();
        doc.layers[0].surface.draw_pixel(1, 1, RED);
        doc.layers[0].blend_mode = BlendMode::Multiply;
        doc.layers[0].opacity = 0.5;
    }
    Project::new_untitled(1, document)
}

#[test]
fn layered_doc_round_trips_through_json() {
    let project = layered_project();
    let written = doc::write_layered_project(&project).unwrap();
    assert_eq!(written.layers.len(), 1);
    assert_eq!(written.layers[0].pixels.len(), 3 * 2 * 4);

    let json = serde_json::to_string(&written).unwrap();
    let parsed: LayeredProjectDoc = serde_json::from_str(&json).unwrap();
    let read = doc::read_layered_project(&parsed).unwrap();

    let read_doc = read.document.as_layered().unwrap();
    let original_doc = project.document.as_layered().unwrap();
    assert_eq!(read_doc.layers[0].surface, original_doc.layers[0].surface);
    assert_eq!(read_doc.layers[0].blend_mode, BlendMode::Multiply);
    assert_eq!(read_doc.layers[0].opacity, 0.5);
}

#[test]
fn truncated_layer_pixels_fail_the_read() {
    let mut written = doc::write_layered_project(&layered_project()).unwrap();
    written.layers[0].pixels.truncate(5);
    assert!(doc::read_layered_project(&written).is_err());
}

#[test]
fn empty_layer_stack_fails_the_read() {
    let written = LayeredProjectDoc {
        width: 3,
        height: 2,
        active_layer_index: 0,
        layers: Vec::new(),
        guides: Vec::new(),
    };
    assert!(doc::read_layered_project(&written).is_err());
}

#[test]
fn image_doc_records_path_and_guides() {
    let surface = Surface::new(2, 2).unwrap();
    let mut project = Project::from_file(
        "art/hero.png".into(),
        Document::Image(tilecraft::canvas::ImageDoc { surface }),
    );
    project.guides.push(Guide {
        offset: 1,
        orientation: Orientation::Horizontal,
    });

    let written = doc::write_image_project(&project).unwrap();
    assert_eq!(written.image_path, "art/hero.png");
    assert_eq!(written.guides.len(), 1);

    let read = doc::read_image_project(&written, Surface::new(2, 2).unwrap()).unwrap();
    assert_eq!(read.guides, project.guides);
    assert_eq!(read.document.size(), (2, 2));
}

#[test]
fn writing_the_wrong_variant_is_rejected() {
    let project = layered_project();
    assert!(doc::write_tileset_project(&project).is_err());
    assert!(doc::write_image_project(&project).is_err());
}
