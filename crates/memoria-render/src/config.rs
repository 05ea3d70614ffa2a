//! Storage layout configuration.
//!
//! An explicit value passed into the composer and normalizer so tests can
//! inject deterministic roots and URLs; nothing in this crate reads the
//! process environment.

use std::{io, path::{Path, PathBuf}};

use serde::Deserialize;

/// Filesystem and URL layout shared by the renderer and the HTTP layer.
///
/// Everything the system writes lives under `static_root`, which the server
/// exposes at `/static/`. `base_url` is the externally reachable origin
/// embedded in QR codes.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
  pub static_root: PathBuf,
  pub base_url:    String,
}

impl StorageConfig {
  /// Uploaded photos.
  pub fn uploads_dir(&self) -> PathBuf { self.static_root.join("uploads") }

  /// Generated QR images.
  pub fn qr_dir(&self) -> PathBuf { self.static_root.join("qr_codes") }

  /// Rendered obituary documents.
  pub fn pdf_dir(&self) -> PathBuf { self.static_root.join("pdfs") }

  /// Scratch space for image normalization.
  pub fn temp_dir(&self) -> PathBuf { self.static_root.join("temp") }

  /// Map a `/static/...` URL path to a path under `static_root`.
  /// Returns `None` for anything else.
  pub fn resolve_static(&self, reference: &str) -> Option<PathBuf> {
    reference
      .strip_prefix("/static/")
      .map(|rest| self.static_root.join(rest))
  }

  /// Create the full static directory tree. Called once at startup.
  pub fn ensure_dirs(&self) -> io::Result<()> {
    for dir in [
      self.uploads_dir(),
      self.qr_dir(),
      self.pdf_dir(),
      self.temp_dir(),
    ] {
      std::fs::create_dir_all(dir)?;
    }
    Ok(())
  }

  /// Test helper: a config rooted at `root` with a localhost base URL.
  pub fn for_root(root: impl AsRef<Path>) -> Self {
    Self {
      static_root: root.as_ref().to_path_buf(),
      base_url:    "http://localhost:8000".to_string(),
    }
  }
}
