//! Tileset addressing: tiles, the shared tileset image, and the tile grid.
//!
//! Tile ids are 1-based; id 0 is never assigned and [`EMPTY_TILE`] (`-1`)
//! marks an empty cell. A [`Tile`] is a value (id + source rect) handed out
//! by its owning [`Tileset`] — tiles are never stored with back-pointers, so
//! they cannot outlive the tileset that defines them.

use image::Rgba;

use crate::error::{Error, Result};
use crate::surface::{Surface, TRANSPARENT};

/// Sentinel tile id for "no tile here".
pub const EMPTY_TILE: i32 = -1;

/// A tile's identity and its source rectangle inside the tileset surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tile {
    pub id: i32,
    pub source_x: u32,
    pub source_y: u32,
    pub width: u32,
    pub height: u32,
}

/// The shared tileset image, cut into a fixed grid of equally-sized tiles.
#[derive(Clone, Debug, PartialEq)]
pub struct Tileset {
    surface: Surface,
    tiles_wide: u32,
    tiles_high: u32,
    tile_width: u32,
    tile_height: u32,
}

impl Tileset {
    /// Wrap `surface` as a tileset of `tile_width`×`tile_height` tiles.
    ///
    /// Fails with an invalid-geometry error when either tile dimension is
    /// zero or does not evenly divide the image.
    pub fn new(surface: Surface, tile_width: u32, tile_height: u32) -> Result<Self> {
        if tile_width == 0 || tile_height == 0 {
            return Err(Error::InvalidSize {
                what: "tile",
                width: tile_width,
                height: tile_height,
            });
        }
        if surface.width() % tile_width != 0 || surface.height() % tile_height != 0 {
            return Err(Error::TileSizeMismatch {
                tile_width,
                tile_height,
                image_width: surface.width(),
                image_height: surface.height(),
            });
        }
        let tiles_wide = surface.width() / tile_width;
        let tiles_high = surface.height() / tile_height;
        Ok(Self {
            surface,
            tiles_wide,
            tiles_high,
            tile_width,
            tile_height,
        })
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    pub fn tiles_wide(&self) -> u32 {
        self.tiles_wide
    }

    pub fn tiles_high(&self) -> u32 {
        self.tiles_high
    }

    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    pub fn tile_count(&self) -> u32 {
        self.tiles_wide * self.tiles_high
    }

    /// True for every id this tileset actually defines.
    pub fn contains_id(&self, id: i32) -> bool {
        id >= 1 && (id as u32) <= self.tile_count()
    }

    /// Tile id for the tile at `(column, row)` of the tileset:
    /// `row * tiles_wide + column + 1`.
    pub fn tile_id_from_tile_pos(&self, column: u32, row: u32) -> i32 {
        (row * self.tiles_wide + column + 1) as i32
    }

    /// Tile id for the tile covering the pixel `(x, y)` of the tileset
    /// image.
    pub fn tile_id_from_pos(&self, x: u32, y: u32) -> i32 {
        self.tile_id_from_tile_pos(x / self.tile_width, y / self.tile_height)
    }

    /// Inverse of [`tile_id_from_tile_pos`](Self::tile_id_from_tile_pos):
    /// `(column, row)` for a valid id.
    pub fn tile_id_to_tile_pos(&self, id: i32) -> (u32, u32) {
        let zero_based = (id - 1) as u32;
        (zero_based % self.tiles_wide, zero_based / self.tiles_wide)
    }

    /// The tile for `id`, or `None` for the empty sentinel and ids outside
    /// this tileset.
    pub fn tile(&self, id: i32) -> Option<Tile> {
        if !self.contains_id(id) {
            return None;
        }
        let (column, row) = self.tile_id_to_tile_pos(id);
        Some(Tile {
            id,
            source_x: column * self.tile_width,
            source_y: row * self.tile_height,
            width: self.tile_width,
            height: self.tile_height,
        })
    }

    /// Pixel `(dx, dy)` within the tile `id`; transparent sentinel for
    /// unknown ids or offsets outside the tile.
    pub fn tile_pixel(&self, id: i32, dx: u32, dy: u32) -> Rgba<u8> {
        match self.tile(id) {
            Some(tile) if dx < tile.width && dy < tile.height => self
                .surface
                .pixel_at((tile.source_x + dx) as i32, (tile.source_y + dy) as i32),
            _ => TRANSPARENT,
        }
    }
}

/// The 2-D canvas of tile ids, flattened row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tiles: Vec<i32>,
}

impl TileGrid {
    /// An all-empty grid.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidSize {
                what: "tile grid",
                width,
                height,
            });
        }
        Ok(Self {
            width,
            height,
            tiles: vec![EMPTY_TILE; (width * height) as usize],
        })
    }

    /// A grid from an existing flattened row-major id array.
    pub fn from_tiles(width: u32, height: u32, tiles: Vec<i32>) -> Result<Self> {
        if width == 0 || height == 0 || tiles.len() != (width * height) as usize {
            return Err(Error::InvalidSize {
                what: "tile grid",
                width,
                height,
            });
        }
        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tiles(&self) -> &[i32] {
        &self.tiles
    }

    /// Tile id at `(x, y)`; out-of-bounds cells read as [`EMPTY_TILE`].
    pub fn tile_at(&self, x: u32, y: u32) -> i32 {
        if x < self.width && y < self.height {
            self.tiles[(y * self.width + x) as usize]
        } else {
            EMPTY_TILE
        }
    }

    /// Set the tile id at `(x, y)`; out-of-bounds writes are no-ops.
    pub fn set_tile(&mut self, x: u32, y: u32, id: i32) {
        if x < self.width && y < self.height {
            self.tiles[(y * self.width + x) as usize] = id;
        }
    }

    /// Resize in cells, anchoring existing content top-left; new cells are
    /// empty.
    pub fn resized(&self, width: u32, height: u32) -> Result<TileGrid> {
        let mut out = TileGrid::new(width, height)?;
        for y in 0..height.min(self.height) {
            for x in 0..width.min(self.width) {
                out.set_tile(x, y, self.tile_at(x, y));
            }
        }
        Ok(out)
    }

    pub fn memory_bytes(&self) -> usize {
        self.tiles.len() * std::mem::size_of::<i32>()
    }
}
