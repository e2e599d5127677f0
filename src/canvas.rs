//! Document model: layers, blending, and the three project payloads.
//!
//! `Document` is the tagged variant behind every project — a single image, a
//! stack of named layers, or a tileset-backed tile canvas — exposing the
//! shared capability surface (`size`, `exported_image`, `resize`) that
//! commands and the undo engine operate through.

use image::{Rgba, RgbaImage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::surface::{Surface, TRANSPARENT};
use crate::tileset::{EMPTY_TILE, TileGrid, Tileset};

// ============================================================================
// BLENDING
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Additive,
    Subtract,
    Lighten,
    Darken,
}

impl BlendMode {
    pub fn all() -> &'static [BlendMode] {
        &[
            BlendMode::Normal,
            BlendMode::Multiply,
            BlendMode::Screen,
            BlendMode::Overlay,
            BlendMode::Additive,
            BlendMode::Subtract,
            BlendMode::Lighten,
            BlendMode::Darken,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            BlendMode::Normal => "Normal",
            BlendMode::Multiply => "Multiply",
            BlendMode::Screen => "Screen",
            BlendMode::Overlay => "Overlay",
            BlendMode::Additive => "Additive",
            BlendMode::Subtract => "Subtract",
            BlendMode::Lighten => "Lighten",
            BlendMode::Darken => "Darken",
        }
    }
}

/// Blend `top` over `base` with the given mode and layer opacity.
/// Straight-alpha source-over composition of the mode's mixed colour.
pub fn blend_pixel(base: Rgba<u8>, top: Rgba<u8>, mode: BlendMode, opacity: f32) -> Rgba<u8> {
    // Fast path: fully transparent top pixel — nothing to blend
    if top[3] == 0 {
        return base;
    }
    // Fast path: Normal blend, full opacity, fully opaque top pixel
    if matches!(mode, BlendMode::Normal) && opacity >= 1.0 && top[3] == 255 {
        return top;
    }

    let opacity = opacity.clamp(0.0, 1.0);

    let base_r = base[0] as f32 / 255.0;
    let base_g = base[1] as f32 / 255.0;
    let base_b = base[2] as f32 / 255.0;
    let base_a = base[3] as f32 / 255.0;

    let top_r = top[0] as f32 / 255.0;
    let top_g = top[1] as f32 / 255.0;
    let top_b = top[2] as f32 / 255.0;
    let top_a = (top[3] as f32 / 255.0) * opacity;

    let (r, g, b) = match mode {
        BlendMode::Normal => (top_r, top_g, top_b),
        BlendMode::Multiply => (base_r * top_r, base_g * top_g, base_b * top_b),
        BlendMode::Screen => (
            1.0 - (1.0 - base_r) * (1.0 - top_r),
            1.0 - (1.0 - base_g) * (1.0 - top_g),
            1.0 - (1.0 - base_b) * (1.0 - top_b),
        ),
        BlendMode::Overlay => (
            overlay_channel(base_r, top_r),
            overlay_channel(base_g, top_g),
            overlay_channel(base_b, top_b),
        ),
        BlendMode::Additive => (
            (base_r + top_r).min(1.0),
            (base_g + top_g).min(1.0),
            (base_b + top_b).min(1.0),
        ),
        BlendMode::Subtract => (
            (base_r - top_r).max(0.0),
            (base_g - top_g).max(0.0),
            (base_b - top_b).max(0.0),
        ),
        BlendMode::Lighten => (base_r.max(top_r), base_g.max(top_g), base_b.max(top_b)),
        BlendMode::Darken => (base_r.min(top_r), base_g.min(top_g), base_b.min(top_b)),
    };

    let out_a = top_a + base_a * (1.0 - top_a);
    if out_a == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let out_r = (r * top_a + base_r * base_a * (1.0 - top_a)) / out_a;
    let out_g = (g * top_a + base_g * base_a * (1.0 - top_a)) / out_a;
    let out_b = (b * top_a + base_b * base_a * (1.0 - top_a)) / out_a;

    Rgba([
        (out_r * 255.0).clamp(0.0, 255.0) as u8,
        (out_g * 255.0).clamp(0.0, 255.0) as u8,
        (out_b * 255.0).clamp(0.0, 255.0) as u8,
        (out_a * 255.0).clamp(0.0, 255.0) as u8,
    ])
}

fn overlay_channel(base: f32, top: f32) -> f32 {
    if base < 0.5 {
        2.0 * base * top
    } else {
        1.0 - 2.0 * (1.0 - base) * (1.0 - top)
    }
}

// ============================================================================
// LAYERS
// ============================================================================

/// One named raster layer of a layered document.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    pub name: String,
    pub visible: bool,
    pub opacity: f32,
    pub blend_mode: BlendMode,
    pub surface: Surface,
}

impl Layer {
    pub fn new(name: String, width: u32, height: u32, fill_colour: Rgba<u8>) -> Result<Self> {
        Ok(Self {
            name,
            visible: true,
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            surface: Surface::new_filled(width, height, fill_colour)?,
        })
    }

    pub fn memory_bytes(&self) -> usize {
        self.surface.memory_bytes() + self.name.len()
    }
}

// ============================================================================
// DOCUMENT VARIANTS
// ============================================================================

/// A single-surface document.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageDoc {
    pub surface: Surface,
}

/// A stack of equally-sized layers composited bottom-up.
#[derive(Clone, Debug, PartialEq)]
pub struct LayeredDoc {
    pub width: u32,
    pub height: u32,
    pub layers: Vec<Layer>,
    pub active_layer_index: usize,
}

impl LayeredDoc {
    /// A document with a single transparent background layer.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Ok(Self {
            width,
            height,
            layers: vec![Layer::new(
                "Background".to_string(),
                width,
                height,
                TRANSPARENT,
            )?],
            active_layer_index: 0,
        })
    }

    pub fn active_layer(&self) -> Option<&Layer> {
        self.layers.get(self.active_layer_index)
    }

    pub fn active_layer_mut(&mut self) -> Option<&mut Layer> {
        self.layers.get_mut(self.active_layer_index)
    }

    /// Flatten all visible layers, bottom-up, row-parallel.
    pub fn composite(&self) -> RgbaImage {
        let width = self.width;
        let mut result = RgbaImage::new(self.width, self.height);
        let layers = &self.layers;
        result
            .par_chunks_mut(width as usize * 4)
            .enumerate()
            .for_each(|(y, row)| {
                for x in 0..width {
                    let mut pixel = Rgba([0u8, 0, 0, 0]);
                    for layer in layers {
                        if !layer.visible {
                            continue;
                        }
                        let top = layer.surface.pixel_at(x as i32, y as i32);
                        pixel = blend_pixel(pixel, top, layer.blend_mode, layer.opacity);
                    }
                    let offset = x as usize * 4;
                    row[offset..offset + 4].copy_from_slice(&pixel.0);
                }
            });
        result
    }
}

/// A tile canvas: a grid of tile ids over a shared tileset image.
#[derive(Clone, Debug, PartialEq)]
pub struct TilesetDoc {
    pub tileset: Tileset,
    pub grid: TileGrid,
    /// Where the tileset image came from; `None` until it has been saved.
    pub tileset_path: Option<std::path::PathBuf>,
}

impl TilesetDoc {
    pub fn new(tileset: Tileset, grid: TileGrid) -> Self {
        Self {
            tileset,
            grid,
            tileset_path: None,
        }
    }

    pub fn with_path(mut self, path: std::path::PathBuf) -> Self {
        self.tileset_path = Some(path);
        self
    }

    /// Pixel size of the rendered tile canvas.
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            self.grid.width() * self.tileset.tile_width(),
            self.grid.height() * self.tileset.tile_height(),
        )
    }

    /// The composed lookup: canvas position → grid cell → tile id → source
    /// rect → pixel. Empty cells read as transparent.
    pub fn pixel_at_canvas(&self, x: u32, y: u32) -> Rgba<u8> {
        let tile_width = self.tileset.tile_width();
        let tile_height = self.tileset.tile_height();
        let id = self.grid.tile_at(x / tile_width, y / tile_height);
        if id == EMPTY_TILE {
            return TRANSPARENT;
        }
        self.tileset.tile_pixel(id, x % tile_width, y % tile_height)
    }

    /// Render every non-empty cell of the grid.
    pub fn render(&self) -> RgbaImage {
        let (width, height) = self.pixel_size();
        let mut out = RgbaImage::new(width, height);
        let tile_width = self.tileset.tile_width();
        let tile_height = self.tileset.tile_height();
        for cell_y in 0..self.grid.height() {
            for cell_x in 0..self.grid.width() {
                let Some(tile) = self.tileset.tile(self.grid.tile_at(cell_x, cell_y)) else {
                    continue;
                };
                for dy in 0..tile_height {
                    for dx in 0..tile_width {
                        let pixel = self.tileset.surface().pixel_at(
                            (tile.source_x + dx) as i32,
                            (tile.source_y + dy) as i32,
                        );
                        out.put_pixel(cell_x * tile_width + dx, cell_y * tile_height + dy, pixel);
                    }
                }
            }
        }
        out
    }
}

/// The project payload: exactly one of the three canvas shapes.
#[derive(Clone, Debug, PartialEq)]
pub enum Document {
    Image(ImageDoc),
    Layered(LayeredDoc),
    Tileset(TilesetDoc),
}

impl Document {
    pub fn new_image(width: u32, height: u32) -> Result<Self> {
        Ok(Document::Image(ImageDoc {
            surface: Surface::new(width, height)?,
        }))
    }

    pub fn new_layered(width: u32, height: u32) -> Result<Self> {
        Ok(Document::Layered(LayeredDoc::new(width, height)?))
    }

    pub fn new_tileset(tileset: Tileset, grid: TileGrid) -> Self {
        Document::Tileset(TilesetDoc::new(tileset, grid))
    }

    /// Document size: pixels for image/layered documents, grid cells for a
    /// tile canvas.
    pub fn size(&self) -> (u32, u32) {
        match self {
            Document::Image(doc) => (doc.surface.width(), doc.surface.height()),
            Document::Layered(doc) => (doc.width, doc.height),
            Document::Tileset(doc) => (doc.grid.width(), doc.grid.height()),
        }
    }

    /// Flattened export of the whole document.
    pub fn exported_image(&self) -> RgbaImage {
        match self {
            Document::Image(doc) => doc.surface.image().clone(),
            Document::Layered(doc) => doc.composite(),
            Document::Tileset(doc) => doc.render(),
        }
    }

    /// Resize in the document's own units ([`size`](Self::size)): pixels
    /// for image/layered documents (content anchored top-left, new area
    /// transparent), cells for a tile canvas (new cells empty).
    ///
    /// Fails with an invalid-geometry error on a zero dimension, leaving
    /// the document untouched.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        match self {
            Document::Image(doc) => {
                let mut resized = Surface::new(width, height)?;
                resized.paste_region(&doc.surface, 0, 0);
                doc.surface = resized;
            }
            Document::Layered(doc) => {
                // Resize every layer before committing any, so a failure
                // cannot leave the stack half-resized.
                let mut resized_layers = Vec::with_capacity(doc.layers.len());
                for layer in &doc.layers {
                    let mut surface = Surface::new(width, height)?;
                    surface.paste_region(&layer.surface, 0, 0);
                    resized_layers.push(surface);
                }
                for (layer, surface) in doc.layers.iter_mut().zip(resized_layers) {
                    layer.surface = surface;
                }
                doc.width = width;
                doc.height = height;
            }
            Document::Tileset(doc) => {
                doc.grid = doc.grid.resized(width, height)?;
            }
        }
        Ok(())
    }

    /// The surface a drawing command at `layer_index` targets: the image
    /// surface (index ignored), the indexed layer, or the tileset source
    /// image.
    pub fn target_surface(&self, layer_index: usize) -> Result<&Surface> {
        match self {
            Document::Image(doc) => Ok(&doc.surface),
            Document::Layered(doc) => doc
                .layers
                .get(layer_index)
                .map(|layer| &layer.surface)
                .ok_or(Error::NoSuchLayer(layer_index)),
            Document::Tileset(doc) => Ok(doc.tileset.surface()),
        }
    }

    pub fn target_surface_mut(&mut self, layer_index: usize) -> Result<&mut Surface> {
        match self {
            Document::Image(doc) => Ok(&mut doc.surface),
            Document::Layered(doc) => doc
                .layers
                .get_mut(layer_index)
                .map(|layer| &mut layer.surface)
                .ok_or(Error::NoSuchLayer(layer_index)),
            Document::Tileset(doc) => Ok(doc.tileset.surface_mut()),
        }
    }

    pub fn as_layered(&self) -> Result<&LayeredDoc> {
        match self {
            Document::Layered(doc) => Ok(doc),
            _ => Err(Error::WrongDocumentKind { expected: "layered" }),
        }
    }

    pub fn as_layered_mut(&mut self) -> Result<&mut LayeredDoc> {
        match self {
            Document::Layered(doc) => Ok(doc),
            _ => Err(Error::WrongDocumentKind { expected: "layered" }),
        }
    }

    pub fn as_tileset(&self) -> Result<&TilesetDoc> {
        match self {
            Document::Tileset(doc) => Ok(doc),
            _ => Err(Error::WrongDocumentKind { expected: "tileset" }),
        }
    }

    pub fn as_tileset_mut(&mut self) -> Result<&mut TilesetDoc> {
        match self {
            Document::Tileset(doc) => Ok(doc),
            _ => Err(Error::WrongDocumentKind { expected: "tileset" }),
        }
    }

    pub fn memory_bytes(&self) -> usize {
        match self {
            Document::Image(doc) => doc.surface.memory_bytes(),
            Document::Layered(doc) => doc.layers.iter().map(Layer::memory_bytes).sum(),
            Document::Tileset(doc) => {
                doc.tileset.surface().memory_bytes() + doc.grid.memory_bytes()
            }
        }
    }
}
