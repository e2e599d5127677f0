//! The concrete command set.
//!
//! Every command captures its inverse at construction time (constructors
//! take the pre-mutation document and may fail); `redo`/`undo` are
//! infallible — a command finding its target gone logs the mismatch and
//! leaves the document untouched rather than half-applying.

use std::any::Any;

use emath::Rect;
use image::Rgba;

use crate::canvas::{Document, Layer};
use crate::error::{Error, Result};
use crate::fill::{image_pixel_flood_fill, tileset_tile_flood_fill};
use crate::surface::{Surface, TRANSPARENT};
use crate::tileset::EMPTY_TILE;

use super::history::{Command, RegionDiff};

// ============================================================================
// PIXEL COMMAND — pen/eraser single-position writes with merging
// ============================================================================

/// Writes one colour at a set of positions; the workhorse of the pixel pen
/// and eraser (the eraser is simply the transparent colour).
///
/// Rapid-fire drags produce one of these per pointer move; the merge hook
/// coalesces them into a single user-visible undo step instead of one step
/// per pixel.
pub struct PixelCommand {
    description: String,
    layer_index: usize,
    colour: Rgba<u8>,
    positions: Vec<(u32, u32)>,
    previous: Vec<Rgba<u8>>,
}

impl PixelCommand {
    /// Capture the previous colours at `positions` so the write can be
    /// inverted.
    pub fn new(
        description: impl Into<String>,
        document: &Document,
        layer_index: usize,
        colour: Rgba<u8>,
        positions: Vec<(u32, u32)>,
    ) -> Result<Self> {
        let surface = document.target_surface(layer_index)?;
        let previous = positions
            .iter()
            .map(|&(x, y)| surface.pixel_at(x as i32, y as i32))
            .collect();
        Ok(Self {
            description: description.into(),
            layer_index,
            colour,
            positions,
            previous,
        })
    }

    /// An eraser write: transparent colour, same merging behavior.
    pub fn erase(
        document: &Document,
        layer_index: usize,
        positions: Vec<(u32, u32)>,
    ) -> Result<Self> {
        Self::new("Erase Pixels", document, layer_index, TRANSPARENT, positions)
    }

    pub fn positions(&self) -> &[(u32, u32)] {
        &self.positions
    }

    pub fn colour(&self) -> Rgba<u8> {
        self.colour
    }
}

impl Command for PixelCommand {
    fn redo(&mut self, document: &mut Document) {
        match document.target_surface_mut(self.layer_index) {
            Ok(surface) => {
                for &(x, y) in &self.positions {
                    surface.draw_pixel(x as i32, y as i32, self.colour);
                }
            }
            Err(error) => log::error!("{}: {}", self.description, error),
        }
    }

    fn undo(&mut self, document: &mut Document) {
        match document.target_surface_mut(self.layer_index) {
            Ok(surface) => {
                for (&(x, y), &previous) in self.positions.iter().zip(&self.previous) {
                    surface.draw_pixel(x as i32, y as i32, previous);
                }
            }
            Err(error) => log::error!("{}: {}", self.description, error),
        }
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn memory_size(&self) -> usize {
        self.positions.len() * (std::mem::size_of::<(u32, u32)>() + std::mem::size_of::<Rgba<u8>>())
            + self.description.len()
    }

    /// Absorb a newer `PixelCommand` on the same layer with the same
    /// colour. A position already recorded is dropped (a true no-op); a new
    /// position is applied and appended, extending this single undo step.
    fn merge_with(&mut self, other: &dyn Command, document: &mut Document) -> bool {
        let Some(other) = other.as_any().downcast_ref::<PixelCommand>() else {
            return false;
        };
        if other.layer_index != self.layer_index || other.colour != self.colour {
            return false;
        }
        let Ok(surface) = document.target_surface_mut(self.layer_index) else {
            return false;
        };
        for (i, &position) in other.positions.iter().enumerate() {
            if self.positions.contains(&position) {
                continue;
            }
            surface.draw_pixel(position.0 as i32, position.1 as i32, self.colour);
            self.positions.push(position);
            self.previous.push(other.previous[i]);
        }
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// FLOOD FILL COMMANDS
// ============================================================================

/// Applies a pixel flood fill: every connected position of the start
/// pixel's colour switches to the fill colour.
pub struct PixelFillCommand {
    description: String,
    layer_index: usize,
    positions: Vec<(u32, u32)>,
    target_colour: Rgba<u8>,
    fill_colour: Rgba<u8>,
}

impl PixelFillCommand {
    /// Run the region growth up front; the command stores only the changed
    /// positions and the two colours involved.
    pub fn new(
        document: &Document,
        layer_index: usize,
        start: (u32, u32),
        fill_colour: Rgba<u8>,
    ) -> Result<Self> {
        let surface = document.target_surface(layer_index)?;
        let target_colour = surface.pixel_at(start.0 as i32, start.1 as i32);
        let positions = image_pixel_flood_fill(surface, start, target_colour, fill_colour);
        Ok(Self {
            description: "Flood Fill".to_string(),
            layer_index,
            positions,
            target_colour,
            fill_colour,
        })
    }

    pub fn positions(&self) -> &[(u32, u32)] {
        &self.positions
    }
}

impl Command for PixelFillCommand {
    fn redo(&mut self, document: &mut Document) {
        match document.target_surface_mut(self.layer_index) {
            Ok(surface) => {
                for &(x, y) in &self.positions {
                    surface.draw_pixel(x as i32, y as i32, self.fill_colour);
                }
            }
            Err(error) => log::error!("{}: {}", self.description, error),
        }
    }

    fn undo(&mut self, document: &mut Document) {
        match document.target_surface_mut(self.layer_index) {
            Ok(surface) => {
                // Every filled position held the target colour beforehand.
                for &(x, y) in &self.positions {
                    surface.draw_pixel(x as i32, y as i32, self.target_colour);
                }
            }
            Err(error) => log::error!("{}: {}", self.description, error),
        }
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn memory_size(&self) -> usize {
        self.positions.len() * std::mem::size_of::<(u32, u32)>() + self.description.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Tile-grid counterpart of [`PixelFillCommand`]: flood-fills connected
/// cells of one tile id with another.
pub struct TileFillCommand {
    description: String,
    positions: Vec<(u32, u32)>,
    target_id: i32,
    fill_id: i32,
}

impl TileFillCommand {
    pub fn new(document: &Document, start: (u32, u32), fill_id: i32) -> Result<Self> {
        let doc = document.as_tileset()?;
        if fill_id != EMPTY_TILE && !doc.tileset.contains_id(fill_id) {
            return Err(Error::UnknownTileId { id: fill_id });
        }
        let target_id = doc.grid.tile_at(start.0, start.1);
        let positions = tileset_tile_flood_fill(&doc.grid, start, target_id, fill_id);
        Ok(Self {
            description: "Tile Fill".to_string(),
            positions,
            target_id,
            fill_id,
        })
    }

    pub fn positions(&self) -> &[(u32, u32)] {
        &self.positions
    }
}

impl Command for TileFillCommand {
    fn redo(&mut self, document: &mut Document) {
        match document.as_tileset_mut() {
            Ok(doc) => {
                for &(x, y) in &self.positions {
                    doc.grid.set_tile(x, y, self.fill_id);
                }
            }
            Err(error) => log::error!("{}: {}", self.description, error),
        }
    }

    fn undo(&mut self, document: &mut Document) {
        match document.as_tileset_mut() {
            Ok(doc) => {
                for &(x, y) in &self.positions {
                    doc.grid.set_tile(x, y, self.target_id);
                }
            }
            Err(error) => log::error!("{}: {}", self.description, error),
        }
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn memory_size(&self) -> usize {
        self.positions.len() * std::mem::size_of::<(u32, u32)>() + self.description.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// APPLY TILE COMMAND — tile pen with drag merging
// ============================================================================

/// Stamps a tile id into grid cells; drag painting pushes one of these per
/// cell and relies on merging to stay a single undo step.
pub struct ApplyTileCommand {
    description: String,
    id: i32,
    positions: Vec<(u32, u32)>,
    previous: Vec<i32>,
}

impl ApplyTileCommand {
    pub fn new(document: &Document, cell: (u32, u32), id: i32) -> Result<Self> {
        let doc = document.as_tileset()?;
        if id != EMPTY_TILE && !doc.tileset.contains_id(id) {
            return Err(Error::UnknownTileId { id });
        }
        let previous = vec![doc.grid.tile_at(cell.0, cell.1)];
        Ok(Self {
            description: "Tile Pen".to_string(),
            id,
            positions: vec![cell],
            previous,
        })
    }

    pub fn positions(&self) -> &[(u32, u32)] {
        &self.positions
    }
}

impl Command for ApplyTileCommand {
    fn redo(&mut self, document: &mut Document) {
        match document.as_tileset_mut() {
            Ok(doc) => {
                for &(x, y) in &self.positions {
                    doc.grid.set_tile(x, y, self.id);
                }
            }
            Err(error) => log::error!("{}: {}", self.description, error),
        }
    }

    fn undo(&mut self, document: &mut Document) {
        match document.as_tileset_mut() {
            Ok(doc) => {
                for (&(x, y), &previous) in self.positions.iter().zip(&self.previous) {
                    doc.grid.set_tile(x, y, previous);
                }
            }
            Err(error) => log::error!("{}: {}", self.description, error),
        }
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn memory_size(&self) -> usize {
        self.positions.len()
            * (std::mem::size_of::<(u32, u32)>() + std::mem::size_of::<i32>())
            + self.description.len()
    }

    fn merge_with(&mut self, other: &dyn Command, document: &mut Document) -> bool {
        let Some(other) = other.as_any().downcast_ref::<ApplyTileCommand>() else {
            return false;
        };
        if other.id != self.id {
            return false;
        }
        let Ok(doc) = document.as_tileset_mut() else {
            return false;
        };
        for (i, &cell) in other.positions.iter().enumerate() {
            if self.positions.contains(&cell) {
                continue;
            }
            doc.grid.set_tile(cell.0, cell.1, self.id);
            self.positions.push(cell);
            self.previous.push(other.previous[i]);
        }
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// BUFFERED DRAW COMMAND — incremental region-diff capture
// ============================================================================

/// A drawing command built up incrementally while a stroke is in flight.
///
/// Each [`record`](Self::record) call captures the pre-mutation pixels of
/// the newly touched rect, runs the draw, and refreshes the after-buffer —
/// so memory stays bounded by the edited region rather than the canvas.
/// The drawing happens during recording, which makes the push-time `redo`
/// a deliberate no-op; only redo-after-undo replays the after-buffer.
pub struct BufferedDrawCommand {
    description: String,
    layer_index: usize,
    diff: RegionDiff,
    applied: bool,
}

impl BufferedDrawCommand {
    pub fn new(description: impl Into<String>, layer_index: usize) -> Self {
        Self {
            description: description.into(),
            layer_index,
            diff: RegionDiff::new(),
            applied: false,
        }
    }

    /// Capture `rect`, run `draw` against the target surface, capture the
    /// result. `rect` must cover everything `draw` touches.
    pub fn record<F>(&mut self, document: &mut Document, rect: Rect, draw: F) -> Result<()>
    where
        F: FnOnce(&mut Surface),
    {
        let surface = document.target_surface_mut(self.layer_index)?;
        self.diff.capture_before(surface, rect);
        draw(surface);
        self.diff.capture_after(surface, rect);
        self.applied = true;
        Ok(())
    }

    /// Bounding rectangle of everything recorded so far.
    pub fn bounds(&self) -> Rect {
        self.diff.bounds()
    }

    pub fn region(&self) -> &[Rect] {
        self.diff.region()
    }
}

impl Command for BufferedDrawCommand {
    fn redo(&mut self, document: &mut Document) {
        // First application already happened during recording; the redo
        // issued by the push must not re-apply.
        if !self.applied {
            match document.target_surface_mut(self.layer_index) {
                Ok(surface) => self.diff.apply_after(surface),
                Err(error) => log::error!("{}: {}", self.description, error),
            }
        }
        self.applied = true;
    }

    fn undo(&mut self, document: &mut Document) {
        match document.target_surface_mut(self.layer_index) {
            Ok(surface) => self.diff.apply_before(surface),
            Err(error) => log::error!("{}: {}", self.description, error),
        }
        self.applied = false;
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn memory_size(&self) -> usize {
        self.diff.memory_size() + self.description.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// RESIZE COMMAND — whole-document snapshot
// ============================================================================

/// Canvas resize with full before/after capture, so every later stack entry
/// always operates on buffers of the size it was recorded against.
pub struct ResizeCommand {
    description: String,
    width: u32,
    height: u32,
    before: Document,
    after: Option<Document>,
}

impl ResizeCommand {
    /// Validates the geometry up front; a zero dimension never reaches the
    /// stack.
    pub fn new(document: &Document, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidSize {
                what: "canvas",
                width,
                height,
            });
        }
        Ok(Self {
            description: format!("Resize to {}x{}", width, height),
            width,
            height,
            before: document.clone(),
            after: None,
        })
    }
}

impl Command for ResizeCommand {
    fn redo(&mut self, document: &mut Document) {
        if let Some(after) = &self.after {
            *document = after.clone();
            return;
        }
        match document.resize(self.width, self.height) {
            Ok(()) => self.after = Some(document.clone()),
            Err(error) => log::error!("{}: {}", self.description, error),
        }
    }

    fn undo(&mut self, document: &mut Document) {
        *document = self.before.clone();
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn memory_size(&self) -> usize {
        self.before.memory_bytes()
            + self.after.as_ref().map_or(0, Document::memory_bytes)
            + self.description.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// LAYER COMMANDS — structure operations on layered documents
// ============================================================================

/// Types of layer operations that can be undone/redone
pub enum LayerOperation {
    /// A layer was added at the given index
    Add {
        index: usize,
        name: String,
        width: u32,
        height: u32,
    },
    /// A layer was deleted (stores the full layer for restore)
    Delete { index: usize, layer: Layer },
    /// Layer was moved from one index to another
    Move { from_index: usize, to_index: usize },
    /// Layer opacity was changed
    Opacity {
        index: usize,
        old_opacity: f32,
        new_opacity: f32,
    },
    /// Layer visibility was toggled
    Visibility { index: usize, was_visible: bool },
    /// Layer was renamed
    Rename {
        index: usize,
        old_name: String,
        new_name: String,
    },
    /// Layer was duplicated (stores the new layer's data for undo)
    Duplicate { new_index: usize, layer: Layer },
}

/// Command for layer structure operations
pub struct LayerCommand {
    operation: LayerOperation,
}

impl LayerCommand {
    pub fn add(document: &Document, index: usize, name: impl Into<String>) -> Result<Self> {
        let doc = document.as_layered()?;
        Ok(Self {
            operation: LayerOperation::Add {
                index: index.min(doc.layers.len()),
                name: name.into(),
                width: doc.width,
                height: doc.height,
            },
        })
    }

    pub fn delete(document: &Document, index: usize) -> Result<Self> {
        let doc = document.as_layered()?;
        let layer = doc.layers.get(index).ok_or(Error::NoSuchLayer(index))?;
        Ok(Self {
            operation: LayerOperation::Delete {
                index,
                layer: layer.clone(),
            },
        })
    }

    pub fn move_layer(document: &Document, from_index: usize, to_index: usize) -> Result<Self> {
        let doc = document.as_layered()?;
        if from_index >= doc.layers.len() {
            return Err(Error::NoSuchLayer(from_index));
        }
        Ok(Self {
            operation: LayerOperation::Move {
                from_index,
                to_index: to_index.min(doc.layers.len().saturating_sub(1)),
            },
        })
    }

    pub fn set_opacity(document: &Document, index: usize, opacity: f32) -> Result<Self> {
        let doc = document.as_layered()?;
        let layer = doc.layers.get(index).ok_or(Error::NoSuchLayer(index))?;
        Ok(Self {
            operation: LayerOperation::Opacity {
                index,
                old_opacity: layer.opacity,
                new_opacity: opacity.clamp(0.0, 1.0),
            },
        })
    }

    pub fn toggle_visibility(document: &Document, index: usize) -> Result<Self> {
        let doc = document.as_layered()?;
        let layer = doc.layers.get(index).ok_or(Error::NoSuchLayer(index))?;
        Ok(Self {
            operation: LayerOperation::Visibility {
                index,
                was_visible: layer.visible,
            },
        })
    }

    pub fn rename(document: &Document, index: usize, new_name: impl Into<String>) -> Result<Self> {
        let doc = document.as_layered()?;
        let layer = doc.layers.get(index).ok_or(Error::NoSuchLayer(index))?;
        Ok(Self {
            operation: LayerOperation::Rename {
                index,
                old_name: layer.name.clone(),
                new_name: new_name.into(),
            },
        })
    }

    pub fn duplicate(document: &Document, source_index: usize) -> Result<Self> {
        let doc = document.as_layered()?;
        let source = doc
            .layers
            .get(source_index)
            .ok_or(Error::NoSuchLayer(source_index))?;
        let mut layer = source.clone();
        layer.name = format!("{} Copy", source.name);
        Ok(Self {
            operation: LayerOperation::Duplicate {
                new_index: source_index + 1,
                layer,
            },
        })
    }
}

impl Command for LayerCommand {
    fn undo(&mut self, document: &mut Document) {
        let doc = match document.as_layered_mut() {
            Ok(doc) => doc,
            Err(error) => {
                log::error!("{}: {}", self.description(), error);
                return;
            }
        };
        match &self.operation {
            LayerOperation::Add { index, .. } => {
                // Undo add = remove the layer
                if *index < doc.layers.len() {
                    doc.layers.remove(*index);
                    if doc.active_layer_index >= doc.layers.len() && !doc.layers.is_empty() {
                        doc.active_layer_index = doc.layers.len() - 1;
                    }
                }
            }
            LayerOperation::Delete { index, layer } => {
                // Undo delete = restore the layer
                let insert_index = (*index).min(doc.layers.len());
                doc.layers.insert(insert_index, layer.clone());
            }
            LayerOperation::Move {
                from_index,
                to_index,
            } => {
                // Undo move = move back
                if *to_index < doc.layers.len() {
                    let layer = doc.layers.remove(*to_index);
                    let insert_index = (*from_index).min(doc.layers.len());
                    doc.layers.insert(insert_index, layer);
                }
            }
            LayerOperation::Opacity {
                index, old_opacity, ..
            } => {
                if let Some(layer) = doc.layers.get_mut(*index) {
                    layer.opacity = *old_opacity;
                }
            }
            LayerOperation::Visibility { index, was_visible } => {
                if let Some(layer) = doc.layers.get_mut(*index) {
                    layer.visible = *was_visible;
                }
            }
            LayerOperation::Rename {
                index, old_name, ..
            } => {
                if let Some(layer) = doc.layers.get_mut(*index) {
                    layer.name = old_name.clone();
                }
            }
            LayerOperation::Duplicate { new_index, .. } => {
                // Undo duplicate = remove the duplicated layer
                if *new_index < doc.layers.len() {
                    doc.layers.remove(*new_index);
                    if doc.active_layer_index >= doc.layers.len() && !doc.layers.is_empty() {
                        doc.active_layer_index = doc.layers.len() - 1;
                    }
                }
            }
        }
    }

    fn redo(&mut self, document: &mut Document) {
        let doc = match document.as_layered_mut() {
            Ok(doc) => doc,
            Err(error) => {
                log::error!("{}: {}", self.description(), error);
                return;
            }
        };
        match &self.operation {
            LayerOperation::Add {
                index,
                name,
                width,
                height,
            } => match Layer::new(name.clone(), *width, *height, TRANSPARENT) {
                Ok(layer) => {
                    let insert_index = (*index).min(doc.layers.len());
                    doc.layers.insert(insert_index, layer);
                }
                Err(error) => log::error!("Add Layer: {}", error),
            },
            LayerOperation::Delete { index, .. } => {
                if *index < doc.layers.len() {
                    doc.layers.remove(*index);
                    if doc.active_layer_index >= doc.layers.len() && !doc.layers.is_empty() {
                        doc.active_layer_index = doc.layers.len() - 1;
                    }
                }
            }
            LayerOperation::Move {
                from_index,
                to_index,
            } => {
                if *from_index < doc.layers.len() {
                    let layer = doc.layers.remove(*from_index);
                    let insert_index = (*to_index).min(doc.layers.len());
                    doc.layers.insert(insert_index, layer);
                }
            }
            LayerOperation::Opacity {
                index, new_opacity, ..
            } => {
                if let Some(layer) = doc.layers.get_mut(*index) {
                    layer.opacity = *new_opacity;
                }
            }
            LayerOperation::Visibility { index, was_visible } => {
                if let Some(layer) = doc.layers.get_mut(*index) {
                    layer.visible = !*was_visible;
                }
            }
            LayerOperation::Rename {
                index, new_name, ..
            } => {
                if let Some(layer) = doc.layers.get_mut(*index) {
                    layer.name = new_name.clone();
                }
            }
            LayerOperation::Duplicate { new_index, layer } => {
                let insert_index = (*new_index).min(doc.layers.len());
                doc.layers.insert(insert_index, layer.clone());
                doc.active_layer_index = insert_index;
            }
        }
    }

    fn description(&self) -> String {
        match &self.operation {
            LayerOperation::Add { name, .. } => format!("Add Layer: {}", name),
            LayerOperation::Delete { layer, .. } => format!("Delete Layer: {}", layer.name),
            LayerOperation::Move {
                from_index,
                to_index,
            } => format!("Move Layer {} to {}", from_index, to_index),
            LayerOperation::Opacity {
                index, new_opacity, ..
            } => format!("Layer {} Opacity: {:.0}%", index, new_opacity * 100.0),
            LayerOperation::Visibility { index, was_visible } => {
                if *was_visible {
                    format!("Hide Layer {}", index)
                } else {
                    format!("Show Layer {}", index)
                }
            }
            LayerOperation::Rename {
                old_name, new_name, ..
            } => format!("Rename: {} to {}", old_name, new_name),
            LayerOperation::Duplicate { layer, .. } => format!("Duplicate: {}", layer.name),
        }
    }

    fn memory_size(&self) -> usize {
        match &self.operation {
            LayerOperation::Delete { layer, .. } | LayerOperation::Duplicate { layer, .. } => {
                layer.memory_bytes()
            }
            LayerOperation::Add { name, .. } => name.len(),
            LayerOperation::Rename {
                old_name, new_name, ..
            } => old_name.len() + new_name.len(),
            _ => std::mem::size_of::<LayerOperation>(),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// MACRO COMMAND — a group undone/redone as one unit
// ============================================================================

/// A named group of commands collected by `begin_macro`/`end_macro`.
pub struct MacroCommand {
    name: String,
    children: Vec<Box<dyn Command>>,
}

impl MacroCommand {
    /// Wrap children that have already been executed; the stack appends the
    /// result without re-running them.
    pub(crate) fn from_applied_children(name: String, children: Vec<Box<dyn Command>>) -> Self {
        Self { name, children }
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Command for MacroCommand {
    fn redo(&mut self, document: &mut Document) {
        for child in &mut self.children {
            child.redo(document);
        }
    }

    fn undo(&mut self, document: &mut Document) {
        for child in self.children.iter_mut().rev() {
            child.undo(document);
        }
    }

    fn description(&self) -> String {
        self.name.clone()
    }

    fn memory_size(&self) -> usize {
        self.name.len() + self.children.iter().map(|c| c.memory_size()).sum::<usize>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
