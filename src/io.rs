//! Image codec boundary.
//!
//! The core never decodes pixel formats itself: loading and saving surfaces
//! is delegated wholly to the `image` crate, and everything past this module
//! operates on the decoded RGBA buffer.

use std::path::Path;

use crate::error::{Error, Result};
use crate::surface::Surface;

/// Decode the image at `path` into a surface.
pub fn load_surface(path: &Path) -> Result<Surface> {
    let decoded = image::open(path).map_err(|source| Error::ImageRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Surface::from_image(decoded.to_rgba8()))
}

/// Encode `surface` to `path`; the format is chosen from the extension.
pub fn save_surface(surface: &Surface, path: &Path) -> Result<()> {
    surface.image().save(path).map_err(|source| Error::ImageWrite {
        path: path.to_path_buf(),
        source,
    })
}
