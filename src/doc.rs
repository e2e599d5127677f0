//! Project-document (de)serialization contract.
//!
//! These structs are the structured form a shell serializes project files
//! through; the byte encoding (JSON, binary, whatever) is the caller's
//! concern. Reads validate everything they can — a half-parsed document
//! never becomes a project.
//!
//! The returned projects carry no path or display name; the caller owns
//! both (it knows where the document came from).

use serde::{Deserialize, Serialize};

use crate::canvas::{BlendMode, Document, ImageDoc, Layer, LayeredDoc, TilesetDoc};
use crate::error::{Error, Result};
use crate::project::{Guide, Project};
use crate::surface::Surface;
use crate::tileset::{EMPTY_TILE, TileGrid, Tileset};

/// Tile-array value marking a corrupt/missing entry introduced upstream
/// during parsing. Any occurrence fails the read.
pub const CORRUPT_TILE: i32 = -2;

// ============================================================================
// DOCUMENT STRUCTS
// ============================================================================

/// A single-image project: the pixels live in the referenced image file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImageProjectDoc {
    pub image_path: String,
    #[serde(default)]
    pub guides: Vec<Guide>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LayerDoc {
    pub name: String,
    pub visible: bool,
    pub opacity: f32,
    pub blend_mode: BlendMode,
    /// Raw RGBA bytes, row-major, `width * height * 4` long.
    pub pixels: Vec<u8>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LayeredProjectDoc {
    pub width: u32,
    pub height: u32,
    pub active_layer_index: usize,
    pub layers: Vec<LayerDoc>,
    #[serde(default)]
    pub guides: Vec<Guide>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TilesetDimensionsDoc {
    pub tiles_wide: u32,
    pub tiles_high: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TilesetProjectDoc {
    /// Tile-canvas size in cells.
    pub tiles_wide: u32,
    pub tiles_high: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tileset_path: String,
    /// Dimensions of the tileset image itself, in tiles.
    pub tileset: TilesetDimensionsDoc,
    /// Flattened row-major tile-id array, `tiles_wide * tiles_high` long.
    pub tiles: Vec<i32>,
    #[serde(default)]
    pub guides: Vec<Guide>,
}

// ============================================================================
// READ
// ============================================================================

/// Build an image project around an already-decoded surface (the codec
/// boundary loads it from `doc.image_path`).
pub fn read_image_project(doc: &ImageProjectDoc, surface: Surface) -> Result<Project> {
    let mut project = loaded_project(Document::Image(ImageDoc { surface }));
    project.guides = doc.guides.clone();
    Ok(project)
}

pub fn read_layered_project(doc: &LayeredProjectDoc) -> Result<Project> {
    let mut layers = Vec::with_capacity(doc.layers.len());
    for layer_doc in &doc.layers {
        let expected = doc.width as usize * doc.height as usize * 4;
        if layer_doc.pixels.len() != expected {
            return Err(Error::InvalidSize {
                what: "layer pixel buffer",
                width: doc.width,
                height: doc.height,
            });
        }
        let image = image::RgbaImage::from_raw(doc.width, doc.height, layer_doc.pixels.clone())
            .ok_or(Error::InvalidSize {
                what: "layer pixel buffer",
                width: doc.width,
                height: doc.height,
            })?;
        layers.push(Layer {
            name: layer_doc.name.clone(),
            visible: layer_doc.visible,
            opacity: layer_doc.opacity,
            blend_mode: layer_doc.blend_mode,
            surface: Surface::from_image(image),
        });
    }
    if layers.is_empty() {
        return Err(Error::InvalidSize {
            what: "layer stack",
            width: doc.width,
            height: doc.height,
        });
    }
    let mut project = loaded_project(Document::Layered(LayeredDoc {
        width: doc.width,
        height: doc.height,
        active_layer_index: doc.active_layer_index.min(layers.len() - 1),
        layers,
    }));
    project.guides = doc.guides.clone();
    Ok(project)
}

/// Build a tileset project around the already-decoded tileset image.
///
/// Fails on tile geometry that doesn't divide the image, a tileset whose
/// tile dimensions disagree with the document, a tile array of the wrong
/// length, any [`CORRUPT_TILE`] entry, or any id the tileset doesn't
/// define.
pub fn read_tileset_project(doc: &TilesetProjectDoc, tileset_surface: Surface) -> Result<Project> {
    let tileset = Tileset::new(tileset_surface, doc.tile_width, doc.tile_height)?;
    if tileset.tiles_wide() != doc.tileset.tiles_wide
        || tileset.tiles_high() != doc.tileset.tiles_high
    {
        return Err(Error::TileSizeMismatch {
            tile_width: doc.tile_width,
            tile_height: doc.tile_height,
            image_width: tileset.surface().width(),
            image_height: tileset.surface().height(),
        });
    }

    if doc.tiles.len() != doc.tiles_wide as usize * doc.tiles_high as usize {
        return Err(Error::InvalidSize {
            what: "tile array",
            width: doc.tiles_wide,
            height: doc.tiles_high,
        });
    }
    for (index, &id) in doc.tiles.iter().enumerate() {
        if id == CORRUPT_TILE {
            return Err(Error::CorruptTileEntry { index });
        }
        if id != EMPTY_TILE && !tileset.contains_id(id) {
            return Err(Error::UnknownTileId { id });
        }
    }

    let grid = TileGrid::from_tiles(doc.tiles_wide, doc.tiles_high, doc.tiles.clone())?;
    let mut tileset_doc = TilesetDoc::new(tileset, grid);
    if !doc.tileset_path.is_empty() {
        tileset_doc.tileset_path = Some(doc.tileset_path.clone().into());
    }
    let mut project = loaded_project(Document::Tileset(tileset_doc));
    project.guides = doc.guides.clone();
    Ok(project)
}

// ============================================================================
// WRITE
// ============================================================================

pub fn write_image_project(project: &Project) -> Result<ImageProjectDoc> {
    match &project.document {
        Document::Image(_) => Ok(ImageProjectDoc {
            image_path: project
                .path
                .as_ref()
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_default(),
            guides: project.guides.clone(),
        }),
        _ => Err(Error::WrongDocumentKind { expected: "image" }),
    }
}

pub fn write_layered_project(project: &Project) -> Result<LayeredProjectDoc> {
    let doc = project.document.as_layered()?;
    Ok(LayeredProjectDoc {
        width: doc.width,
        height: doc.height,
        active_layer_index: doc.active_layer_index,
        layers: doc
            .layers
            .iter()
            .map(|layer| LayerDoc {
                name: layer.name.clone(),
                visible: layer.visible,
                opacity: layer.opacity,
                blend_mode: layer.blend_mode,
                pixels: layer.surface.image().as_raw().clone(),
            })
            .collect(),
        guides: project.guides.clone(),
    })
}

pub fn write_tileset_project(project: &Project) -> Result<TilesetProjectDoc> {
    let doc = project.document.as_tileset()?;
    Ok(TilesetProjectDoc {
        tiles_wide: doc.grid.width(),
        tiles_high: doc.grid.height(),
        tile_width: doc.tileset.tile_width(),
        tile_height: doc.tileset.tile_height(),
        tileset_path: doc
            .tileset_path
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default(),
        tileset: TilesetDimensionsDoc {
            tiles_wide: doc.tileset.tiles_wide(),
            tiles_high: doc.tileset.tiles_high(),
        },
        tiles: doc.grid.tiles().to_vec(),
        guides: project.guides.clone(),
    })
}

fn loaded_project(document: Document) -> Project {
    let mut project = Project::new_untitled(0, document);
    project.loaded = true;
    project.new_project = false;
    project
}
