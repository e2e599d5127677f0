//! Undo/redo engine: the command trait, the undo stack, and the buffered
//! region-diff capture used by incremental drawing commands.
//!
//! The stack is a single ordered command list with a cursor. Everything
//! below the cursor is applied, everything above it has been undone; a push
//! truncates the undone tail, so "redo history" never survives a new edit.
//! A clean index marks the last saved position for dirty tracking.

use std::any::Any;

use emath::{Rect, pos2};

use crate::canvas::Document;
use crate::surface::Surface;

use super::commands::MacroCommand;

// ============================================================================
// COMMAND TRAIT
// ============================================================================

/// An undoable/redoable mutation of a document.
///
/// Commands are constructed with everything they need to invert themselves
/// (constructors capture pre-mutation state and may fail; `redo`/`undo`
/// never do — an impossible application is logged and skipped).
pub trait Command: Any + Send + Sync {
    fn redo(&mut self, document: &mut Document);
    fn undo(&mut self, document: &mut Document);
    fn description(&self) -> String;
    fn memory_size(&self) -> usize;

    /// Offered a newer, not-yet-executed command of possibly the same kind.
    /// Returning `true` means this command now represents the union of both
    /// *and has applied the newcomer's delta to the document*; the newcomer
    /// is then discarded by the stack. The default never merges.
    fn merge_with(&mut self, _other: &dyn Command, _document: &mut Document) -> bool {
        false
    }

    /// Downcast hook for [`merge_with`](Self::merge_with) implementations.
    fn as_any(&self) -> &dyn Any;
}

// ============================================================================
// REGION DIFF — bounded before/after capture for incremental draws
// ============================================================================

/// Incrementally grown before/after pixel diff over a dirty region.
///
/// The region is a union of touched rects; the scratch buffers are sized to
/// its bounding rectangle and reallocated (with recopy) whenever the
/// bounding rectangle grows. Pixels already captured are never re-captured,
/// so `before` always holds the true original values. Memory is bounded by
/// the edited area, not the canvas.
pub struct RegionDiff {
    region: Vec<Rect>,
    /// Integer bounding rect (x0, y0, x1, y1) of the region, exclusive max.
    bounds: Option<(u32, u32, u32, u32)>,
    before: Option<Surface>,
    after: Option<Surface>,
    /// One byte per bounding-rect pixel: nonzero once captured.
    captured: Vec<u8>,
}

impl RegionDiff {
    pub fn new() -> Self {
        Self {
            region: Vec::new(),
            bounds: None,
            before: None,
            after: None,
            captured: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    /// Touched rects, clipped to the surface, in capture order.
    pub fn region(&self) -> &[Rect] {
        &self.region
    }

    /// Bounding rectangle of the tracked region.
    pub fn bounds(&self) -> Rect {
        match self.bounds {
            Some((x0, y0, x1, y1)) => {
                Rect::from_min_max(pos2(x0 as f32, y0 as f32), pos2(x1 as f32, y1 as f32))
            }
            None => Rect::NOTHING,
        }
    }

    /// Capture the pre-mutation pixels of `rect` — new area only; pixels
    /// already inside the tracked region keep their original capture. Call
    /// immediately before drawing into `rect`.
    pub fn capture_before(&mut self, surface: &Surface, rect: Rect) {
        let Some(clipped) = snap_to_surface(surface, rect) else {
            return;
        };
        self.grow_to(union_bounds(self.bounds, clipped));
        self.region.push(rect_from_snapped(clipped));

        let (bx0, by0, bx1, _) = self.bounds.expect("grow_to set bounds");
        let bounds_width = (bx1 - bx0) as usize;
        let before = self.before.as_mut().expect("grow_to allocated buffers");
        let (x0, y0, x1, y1) = clipped;
        for y in y0..y1 {
            for x in x0..x1 {
                let mask_index = (y - by0) as usize * bounds_width + (x - bx0) as usize;
                if self.captured[mask_index] != 0 {
                    continue;
                }
                self.captured[mask_index] = 1;
                before.draw_pixel(
                    (x - bx0) as i32,
                    (y - by0) as i32,
                    surface.pixel_at(x as i32, y as i32),
                );
            }
        }
    }

    /// Refresh the post-mutation pixels of `rect`. Call immediately after
    /// drawing into a rect previously passed to
    /// [`capture_before`](Self::capture_before).
    pub fn capture_after(&mut self, surface: &Surface, rect: Rect) {
        let Some((x0, y0, x1, y1)) = snap_to_surface(surface, rect) else {
            return;
        };
        let Some((bx0, by0, _, _)) = self.bounds else {
            return;
        };
        let after = self.after.as_mut().expect("bounds imply buffers");
        for y in y0..y1 {
            for x in x0..x1 {
                after.draw_pixel(
                    (x - bx0) as i32,
                    (y - by0) as i32,
                    surface.pixel_at(x as i32, y as i32),
                );
            }
        }
    }

    /// Copy the `before` buffer back over the full tracked region.
    pub fn apply_before(&self, surface: &mut Surface) {
        self.apply(surface, self.before.as_ref());
    }

    /// Copy the `after` buffer back over the full tracked region.
    pub fn apply_after(&self, surface: &mut Surface) {
        self.apply(surface, self.after.as_ref());
    }

    fn apply(&self, surface: &mut Surface, buffer: Option<&Surface>) {
        let (Some((bx0, by0, bx1, by1)), Some(buffer)) = (self.bounds, buffer) else {
            return;
        };
        let bounds_width = (bx1 - bx0) as usize;
        for y in by0..by1 {
            for x in bx0..bx1 {
                let mask_index = (y - by0) as usize * bounds_width + (x - bx0) as usize;
                if self.captured[mask_index] == 0 {
                    continue;
                }
                let pixel = buffer.pixel_at((x - bx0) as i32, (y - by0) as i32);
                surface.draw_pixel(x as i32, y as i32, pixel);
            }
        }
    }

    pub fn memory_size(&self) -> usize {
        let buffers = self.before.as_ref().map_or(0, Surface::memory_bytes)
            + self.after.as_ref().map_or(0, Surface::memory_bytes);
        buffers + self.captured.len() + self.region.len() * std::mem::size_of::<Rect>()
    }

    /// Reallocate the scratch buffers for a grown bounding rect, recopying
    /// the already-captured content at its new offset.
    fn grow_to(&mut self, new_bounds: (u32, u32, u32, u32)) {
        if self.bounds == Some(new_bounds) {
            return;
        }
        let (nx0, ny0, nx1, ny1) = new_bounds;
        let width = nx1 - nx0;
        let height = ny1 - ny0;
        // Infallible in practice: snap_to_surface only yields non-empty rects.
        let mut new_before = Surface::new(width, height).expect("non-empty bounds");
        let mut new_after = Surface::new(width, height).expect("non-empty bounds");
        let mut new_captured = vec![0u8; (width * height) as usize];

        if let (Some((ox0, oy0, ox1, oy1)), Some(before), Some(after)) =
            (self.bounds, self.before.as_ref(), self.after.as_ref())
        {
            let dx = (ox0 - nx0) as i32;
            let dy = (oy0 - ny0) as i32;
            new_before.paste_region(before, dx, dy);
            new_after.paste_region(after, dx, dy);
            let old_width = (ox1 - ox0) as usize;
            for y in 0..(oy1 - oy0) as usize {
                for x in 0..old_width {
                    let value = self.captured[y * old_width + x];
                    let nidx = (y + dy as usize) * width as usize + (x + dx as usize);
                    new_captured[nidx] = value;
                }
            }
        }

        self.bounds = Some(new_bounds);
        self.before = Some(new_before);
        self.after = Some(new_after);
        self.captured = new_captured;
    }
}

impl Default for RegionDiff {
    fn default() -> Self {
        Self::new()
    }
}

/// Clip `rect` to the surface and snap it outward to whole pixels
/// (floor min, ceil max). `None` when the clipped area is empty.
fn snap_to_surface(surface: &Surface, rect: Rect) -> Option<(u32, u32, u32, u32)> {
    let x0 = rect.min.x.floor().max(0.0) as u32;
    let y0 = rect.min.y.floor().max(0.0) as u32;
    let x1 = (rect.max.x.ceil().max(0.0) as u32).min(surface.width());
    let y1 = (rect.max.y.ceil().max(0.0) as u32).min(surface.height());
    if x0 >= x1 || y0 >= y1 {
        return None;
    }
    Some((x0, y0, x1, y1))
}

fn union_bounds(
    bounds: Option<(u32, u32, u32, u32)>,
    rect: (u32, u32, u32, u32),
) -> (u32, u32, u32, u32) {
    match bounds {
        None => rect,
        Some((bx0, by0, bx1, by1)) => (
            bx0.min(rect.0),
            by0.min(rect.1),
            bx1.max(rect.2),
            by1.max(rect.3),
        ),
    }
}

fn rect_from_snapped((x0, y0, x1, y1): (u32, u32, u32, u32)) -> Rect {
    Rect::from_min_max(pos2(x0 as f32, y0 as f32), pos2(x1 as f32, y1 as f32))
}

// ============================================================================
// UNDO STACK
// ============================================================================

struct MacroRecorder {
    name: String,
    children: Vec<Box<dyn Command>>,
}

/// Ordered command list with a done/undone cursor, clean-index dirty
/// tracking, push-time merging, macro grouping, and memory-capped pruning.
pub struct UndoStack {
    commands: Vec<Box<dyn Command>>,
    /// Number of applied commands; the done/undone boundary.
    index: usize,
    /// Stack position of the last saved state; `None` once that position
    /// has been truncated or pruned away.
    clean_index: Option<usize>,
    open_macro: Option<MacroRecorder>,
    max_history_size: usize,
    /// Optional memory cap in bytes.
    max_memory_bytes: Option<usize>,
    /// Running memory total across stored commands.
    total_memory: usize,
    /// Bumped on every index change; UI binds enabled-state refresh to it.
    revision: u64,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(50)
    }
}

impl UndoStack {
    pub fn new(max_history_size: usize) -> Self {
        Self {
            commands: Vec::new(),
            index: 0,
            clean_index: Some(0),
            open_macro: None,
            max_history_size,
            max_memory_bytes: Some(100 * 1024 * 1024), // 100 MB default limit
            total_memory: 0,
            revision: 0,
        }
    }

    /// Execute `command` and append it, after truncating any undone tail
    /// and offering the command to the applied top for merging. While a
    /// macro is composing, the command is executed and collected into the
    /// macro instead.
    pub fn push(&mut self, mut command: Box<dyn Command>, document: &mut Document) {
        if let Some(recorder) = self.open_macro.as_mut() {
            command.redo(document);
            recorder.children.push(command);
            return;
        }

        self.truncate_redo();

        if self.index > 0 {
            let top = self.index - 1;
            let top_bytes = self.commands[top].memory_size();
            if self.commands[top].merge_with(command.as_ref(), document) {
                let grown = self.commands[top].memory_size();
                self.total_memory = self
                    .total_memory
                    .saturating_sub(top_bytes)
                    .saturating_add(grown);
                // The document changed but the cursor did not move; a stack
                // sitting at its clean index can no longer claim to be clean.
                if self.clean_index == Some(self.index) {
                    self.clean_index = None;
                }
                self.revision += 1;
                return;
            }
        }

        command.redo(document);
        self.total_memory += command.memory_size();
        self.commands.push(command);
        self.index += 1;
        self.revision += 1;
        self.prune();
    }

    pub fn undo(&mut self, document: &mut Document) -> Option<String> {
        if self.open_macro.is_some() {
            log::warn!("undo requested while a macro is composing; ignored");
            return None;
        }
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        let command = &mut self.commands[self.index];
        command.undo(document);
        self.revision += 1;
        Some(command.description())
    }

    pub fn redo(&mut self, document: &mut Document) -> Option<String> {
        if self.open_macro.is_some() {
            log::warn!("redo requested while a macro is composing; ignored");
            return None;
        }
        if self.index == self.commands.len() {
            return None;
        }
        let command = &mut self.commands[self.index];
        command.redo(document);
        self.index += 1;
        self.revision += 1;
        Some(command.description())
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index < self.commands.len()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.index
            .checked_sub(1)
            .map(|i| self.commands[i].description())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.commands.get(self.index).map(|c| c.description())
    }

    /// Descriptions of all applied commands, most recent first.
    pub fn undo_history(&self) -> Vec<String> {
        self.commands[..self.index]
            .iter()
            .rev()
            .map(|c| c.description())
            .collect()
    }

    // ------------------------------------------------------------------
    // Macro grouping
    // ------------------------------------------------------------------

    /// Begin collecting subsequent pushes into a single undo unit. A begin
    /// while another macro is open is a caller-ordering error: logged and
    /// ignored, never fatal.
    pub fn begin_macro(&mut self, name: &str) {
        if self.open_macro.is_some() {
            log::warn!("begin_macro(\"{name}\") while another macro is composing; ignored");
            return;
        }
        self.truncate_redo();
        self.open_macro = Some(MacroRecorder {
            name: name.to_string(),
            children: Vec::new(),
        });
    }

    /// Close the open macro and append it as one stack entry. The children
    /// were executed as they were pushed, so the entry is appended without
    /// re-execution; an empty macro leaves no entry at all.
    pub fn end_macro(&mut self) {
        let Some(recorder) = self.open_macro.take() else {
            log::warn!("end_macro without an open macro; ignored");
            return;
        };
        if recorder.children.is_empty() {
            return;
        }
        let combined = MacroCommand::from_applied_children(recorder.name, recorder.children);
        self.total_memory += combined.memory_size();
        self.commands.push(Box::new(combined));
        self.index += 1;
        self.revision += 1;
        self.prune();
    }

    pub fn is_composing(&self) -> bool {
        self.open_macro.is_some()
    }

    // ------------------------------------------------------------------
    // Clean tracking
    // ------------------------------------------------------------------

    pub fn is_clean(&self) -> bool {
        self.clean_index == Some(self.index)
    }

    /// Record the current position as the saved state.
    pub fn set_clean(&mut self) {
        self.clean_index = Some(self.index);
    }

    // ------------------------------------------------------------------

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.index
    }

    pub fn redo_count(&self) -> usize {
        self.commands.len() - self.index
    }

    /// Monotonic counter bumped on every cursor movement.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Change the memory cap; `None` disables it. Takes effect at the next
    /// push.
    pub fn set_max_memory_bytes(&mut self, max_memory_bytes: Option<usize>) {
        self.max_memory_bytes = max_memory_bytes;
    }

    /// Get the current memory usage of the history (O(1) via cached total)
    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.index = 0;
        self.clean_index = Some(0);
        self.total_memory = 0;
        self.revision += 1;
    }

    /// Drop all undone commands above the cursor. A clean index inside the
    /// dropped range is gone for good — the stack can only become clean
    /// again at the next save.
    fn truncate_redo(&mut self) {
        if self.index == self.commands.len() {
            return;
        }
        for removed in self.commands.drain(self.index..) {
            self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
        }
        if let Some(clean) = self.clean_index
            && clean > self.index
        {
            self.clean_index = None;
        }
    }

    /// Prune old applied commands from the bottom to stay within limits,
    /// shifting the cursor and clean index with them.
    fn prune(&mut self) {
        while self.commands.len() > self.max_history_size && self.index > 1 {
            self.drop_bottom();
        }
        if let Some(max_bytes) = self.max_memory_bytes {
            while self.total_memory > max_bytes && self.index > 1 {
                self.drop_bottom();
            }
        }
    }

    fn drop_bottom(&mut self) {
        let removed = self.commands.remove(0);
        self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
        self.index -= 1;
        self.clean_index = match self.clean_index {
            // The saved state's command is gone; it can never be reached
            // again by undoing.
            Some(0) => None,
            Some(i) => Some(i - 1),
            None => None,
        };
    }
}
