//! Projects and the editing session.
//!
//! A project is one open document plus its undo history and save state.
//! The session owns the single current project; replacing it (create/open)
//! builds the new project completely before anything is swapped, so a
//! failure can never corrupt the project the user is looking at.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::canvas::Document;
use crate::components::history::UndoStack;
use crate::error::Result;
use crate::io;
use crate::surface::Surface;
use crate::tileset::{TileGrid, Tileset};

/// Orientation of a [`Guide`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// A ruler guide pinned to the canvas at a pixel offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guide {
    pub offset: i32,
    pub orientation: Orientation,
}

/// Single open document with its undo history and save state.
pub struct Project {
    pub id: Uuid,
    pub document: Document,
    pub history: UndoStack,
    pub guides: Vec<Guide>,
    /// `None` for unsaved/untitled projects.
    pub path: Option<PathBuf>,
    /// True once backing data has been read from disk.
    pub loaded: bool,
    /// True for a freshly created, never-saved project.
    pub new_project: bool,

    /// Display name (derived from path or "Untitled-N")
    pub name: String,
}

impl Project {
    pub fn new_untitled(untitled_counter: usize, document: Document) -> Self {
        let name = format!("Untitled-{}", untitled_counter);
        Self {
            id: Uuid::new_v4(),
            document,
            history: UndoStack::new(50),
            guides: Vec::new(),
            path: None,
            loaded: false,
            new_project: true,
            name,
        }
    }

    pub fn from_file(path: PathBuf, document: Document) -> Self {
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        Self {
            id: Uuid::new_v4(),
            document,
            history: UndoStack::new(50),
            guides: Vec::new(),
            path: Some(path),
            loaded: true,
            new_project: false,
            name,
        }
    }

    /// Unsaved-changes flag, delegated to the undo stack's clean index.
    pub fn has_unsaved_changes(&self) -> bool {
        !self.history.is_clean()
    }

    /// Record the current undo position as the saved state.
    pub fn mark_saved(&mut self) {
        self.history.set_clean();
        self.new_project = false;
    }

    pub fn update_name_from_path(&mut self) {
        if let Some(ref path) = self.path {
            self.name = path
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "Unknown".to_string());
        }
    }

    /// Get the display title (name with dirty indicator)
    pub fn display_title(&self) -> String {
        if self.has_unsaved_changes() {
            format!("{}*", self.name)
        } else {
            self.name.clone()
        }
    }

    /// Flatten and save the document to `path`, then mark the history
    /// clean. The project is left untouched when the write fails.
    pub fn save_as(&mut self, path: &Path) -> Result<()> {
        let exported = Surface::from_image(self.document.exported_image());
        io::save_surface(&exported, path)?;
        self.path = Some(path.to_path_buf());
        self.update_name_from_path();
        self.mark_saved();
        Ok(())
    }
}

// ============================================================================
// SESSION — current-project ownership and replacement
// ============================================================================

/// Notifications emitted to session observers.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// The current project was replaced (or closed).
    ProjectChanged,
    /// A create/open/save failed; the current project is unchanged.
    Error(String),
}

type Observer = Box<dyn Fn(&SessionEvent)>;

/// Owns the current project and the observers watching it.
///
/// Replacement discipline: the incoming project is fully constructed before
/// the swap, and the outgoing project stays alive until every observer has
/// seen `ProjectChanged` — observers may still hold references into it and
/// must get the chance to detach before it is dropped.
#[derive(Default)]
pub struct Session {
    current: Option<Project>,
    observers: Vec<Observer>,
    untitled_counter: usize,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Project> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut Project> {
        self.current.as_mut()
    }

    pub fn add_observer(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    /// Swap `project` in as current. The previous project is kept alive in
    /// a local until notification completes, then dropped.
    pub fn set_project(&mut self, project: Project) {
        let previous = self.current.replace(project);
        self.notify(&SessionEvent::ProjectChanged);
        drop(previous);
    }

    /// Close the current project (if any).
    pub fn close_project(&mut self) {
        let previous = self.current.take();
        if previous.is_some() {
            self.notify(&SessionEvent::ProjectChanged);
        }
        drop(previous);
    }

    /// Create a blank single-image project.
    pub fn create_image(&mut self, width: u32, height: u32) -> Result<()> {
        let document = self.guard(Document::new_image(width, height))?;
        self.adopt_untitled(document);
        Ok(())
    }

    /// Create a blank layered project.
    pub fn create_layered(&mut self, width: u32, height: u32) -> Result<()> {
        let document = self.guard(Document::new_layered(width, height))?;
        self.adopt_untitled(document);
        Ok(())
    }

    /// Create a tileset project: load the tileset image, validate the tile
    /// geometry, and start with an empty `grid_width`×`grid_height` canvas.
    pub fn create_tileset(
        &mut self,
        tileset_path: &Path,
        tile_width: u32,
        tile_height: u32,
        grid_width: u32,
        grid_height: u32,
    ) -> Result<()> {
        let document = self.guard(
            io::load_surface(tileset_path)
                .and_then(|surface| Tileset::new(surface, tile_width, tile_height))
                .and_then(|tileset| {
                    let grid = TileGrid::new(grid_width, grid_height)?;
                    Ok(Document::Tileset(
                        crate::canvas::TilesetDoc::new(tileset, grid)
                            .with_path(tileset_path.to_path_buf()),
                    ))
                }),
        )?;
        self.adopt_untitled(document);
        Ok(())
    }

    /// Open an image file as a single-image project.
    pub fn open_image(&mut self, path: &Path) -> Result<()> {
        let document = self.guard(
            io::load_surface(path).map(|surface| Document::Image(crate::canvas::ImageDoc { surface })),
        )?;
        self.set_project(Project::from_file(path.to_path_buf(), document));
        Ok(())
    }

    fn adopt_untitled(&mut self, document: Document) {
        self.untitled_counter += 1;
        let project = Project::new_untitled(self.untitled_counter, document);
        self.set_project(project);
    }

    /// Surface a construction failure to observers without touching the
    /// current project.
    fn guard<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(ref error) = result {
            self.notify(&SessionEvent::Error(error.to_string()));
        }
        result
    }

    fn notify(&self, event: &SessionEvent) {
        for observer in &self.observers {
            observer(event);
        }
    }
}
