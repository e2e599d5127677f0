//! Crate error taxonomy.
//!
//! Three families: invalid geometry (bad sizes, tile grids that don't divide
//! their image), invalid state (wrong document kind, vanished indices), and
//! I/O surfaced from the image codec boundary. Recoverable caller-ordering
//! mistakes (e.g. nested macro begin) are logged and ignored instead of
//! returned — see `UndoStack`.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid {what} size {width}x{height}")]
    InvalidSize {
        what: &'static str,
        width: u32,
        height: u32,
    },

    #[error("tile size {tile_width}x{tile_height} does not evenly divide tileset image {image_width}x{image_height}")]
    TileSizeMismatch {
        tile_width: u32,
        tile_height: u32,
        image_width: u32,
        image_height: u32,
    },

    #[error("no layer at index {0}")]
    NoSuchLayer(usize),

    #[error("operation requires a {expected} document")]
    WrongDocumentKind { expected: &'static str },

    #[error("corrupt tile entry at cell {index}")]
    CorruptTileEntry { index: usize },

    #[error("tile id {id} does not exist in the tileset")]
    UnknownTileId { id: i32 },

    #[error("failed to read image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("failed to write image {path}: {source}")]
    ImageWrite {
        path: PathBuf,
        source: image::ImageError,
    },
}
