//! tilecraft — the editable-image core of a pixel-art/tileset editor.
//!
//! What lives here is the state machine a drawing shell drives: documents
//! (a single image, a layer stack, or a tileset-backed tile canvas), the
//! pixel algorithms that mutate them (brush stamping, stroke interpolation,
//! flood fill), and a command-based undo engine that captures incremental
//! diffs, coalesces rapid-fire edits, and replays everything byte-exactly.
//!
//! What deliberately does not: windowing, menus, dialogs, settings,
//! clipboard integration, rendering beyond layer compositing, and pixel
//! format decoding (delegated to the `image` crate behind [`io`]).

pub mod brush;
pub mod canvas;
pub mod components;
pub mod doc;
pub mod error;
pub mod fill;
pub mod io;
pub mod project;
pub mod stroke;
pub mod surface;
pub mod tileset;

pub use brush::{Brush, BrushKind, CompositeMode};
pub use canvas::{BlendMode, Document, ImageDoc, Layer, LayeredDoc, TilesetDoc, blend_pixel};
pub use components::commands::{
    ApplyTileCommand, BufferedDrawCommand, LayerCommand, LayerOperation, MacroCommand,
    PixelCommand, PixelFillCommand, ResizeCommand, TileFillCommand,
};
pub use components::history::{Command, RegionDiff, UndoStack};
pub use error::{Error, Result};
pub use fill::{image_pixel_flood_fill, tileset_tile_flood_fill};
pub use project::{Guide, Orientation, Project, Session, SessionEvent};
pub use stroke::{Stroke, StrokePoint, stroke_segment};
pub use surface::{Surface, TRANSPARENT};
pub use tileset::{EMPTY_TILE, Tile, TileGrid, Tileset};
