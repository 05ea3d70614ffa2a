//! Obituary document rendering for Memoria.
//!
//! The two core operations live here: the document composer, which turns a
//! program + obituary aggregate into a paginated PDF on disk, and the image
//! normalizer, which turns a photo reference (managed path or remote URL)
//! into a renderer-compatible local file. QR code generation and the
//! temp-image cleanup sweep ride along because they share the same storage
//! layout.
//!
//! Nothing in this crate knows about HTTP or the database; callers hand in
//! fully-loaded domain values and an explicit [`StorageConfig`].

pub mod compose;
pub mod config;
pub mod error;
pub mod pdf;
pub mod photo;
pub mod qr;

pub use config::StorageConfig;
pub use error::{Error, Result};

use std::path::PathBuf;

use memoria_core::{obituary::Obituary, program::Program};

/// Renders obituary documents into the configured storage tree.
///
/// Owns the HTTP client used for remote photo fetches; construct once and
/// share (cloning the inner client is cheap, but there is no reason to).
pub struct ObituaryRenderer {
  storage: StorageConfig,
  http:    reqwest::Client,
}

impl ObituaryRenderer {
  pub fn new(storage: StorageConfig) -> Result<Self> {
    let http = reqwest::Client::builder()
      .timeout(photo::FETCH_TIMEOUT)
      .build()?;
    Ok(Self { storage, http })
  }

  pub fn storage(&self) -> &StorageConfig { &self.storage }

  /// Render the obituary document for `program` and return its relative
  /// access path (`/static/pdfs/...`).
  ///
  /// Requires a non-blank deceased name and biography. A photo that fails
  /// to normalize is skipped silently; a layout failure is fatal and no
  /// partial path is returned. Persisting the returned path on the
  /// obituary record is the caller's job.
  pub async fn render(&self, program: &Program, obituary: &Obituary) -> Result<String> {
    if program.deceased_name.trim().is_empty() {
      return Err(Error::MissingDeceasedName);
    }
    if obituary.biography.trim().is_empty() {
      return Err(Error::MissingBiography);
    }

    let lead_photo = match &program.photo_url {
      Some(reference) => self.normalize(reference).await,
      None => None,
    };

    let blocks = compose::compose(program, obituary, lead_photo);

    let dir = self.storage.pdf_dir();
    std::fs::create_dir_all(&dir)?;
    let file_name = compose::document_file_name(program);
    pdf::render_document(&blocks, &dir.join(&file_name))?;

    tracing::info!(program_id = program.id, file = %file_name, "rendered obituary document");
    Ok(format!("/static/pdfs/{file_name}"))
  }

  /// Normalize a photo reference to a local image path; `None` means "no
  /// usable image" and is never an error.
  pub async fn normalize(&self, reference: &str) -> Option<PathBuf> {
    photo::normalize(&self.http, &self.storage, reference).await
  }

  /// Best-effort sweep of normalization temp files. See
  /// [`photo::cleanup_temp_images`].
  pub fn cleanup_temp_images(&self) {
    photo::cleanup_temp_images(&self.storage);
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  fn renderer() -> (ObituaryRenderer, tempfile::TempDir) {
    let root = tempfile::tempdir().unwrap();
    let storage = StorageConfig::for_root(root.path());
    storage.ensure_dirs().unwrap();
    (ObituaryRenderer::new(storage).unwrap(), root)
  }

  fn program(photo_url: Option<&str>) -> Program {
    Program {
      id:               42,
      deceased_name:    "Jane A. O'Brien".to_string(),
      date_of_birth:    Some("1950".to_string()),
      date_of_death:    Some("2024".to_string()),
      funeral_date:     "March 12, 2024".to_string(),
      funeral_location: "St. Mary's Chapel".to_string(),
      photo_url:        photo_url.map(str::to_string),
      access_id:        "access".to_string(),
      is_active:        true,
      created_at:       Utc::now(),
      updated_at:       None,
    }
  }

  fn obituary(biography: &str) -> Obituary {
    Obituary {
      id:              1,
      program_id:      42,
      biography:       biography.to_string(),
      family_details:  None,
      special_message: None,
      photos:          vec![],
      tributes:        vec![],
      pdf_url:         None,
      created_at:      Utc::now(),
      updated_at:      None,
    }
  }

  #[tokio::test]
  async fn render_writes_the_document_at_the_derived_path() {
    let (renderer, _root) = renderer();
    let url = renderer
      .render(&program(None), &obituary("A long life.\nWell lived."))
      .await
      .unwrap();
    assert_eq!(url, "/static/pdfs/Jane_A_OBrien_obituary_42.pdf");

    let on_disk = renderer
      .storage()
      .pdf_dir()
      .join("Jane_A_OBrien_obituary_42.pdf");
    assert!(on_disk.exists());
  }

  #[tokio::test]
  async fn render_survives_an_unreachable_photo_url() {
    let (renderer, _root) = renderer();
    let url = renderer
      .render(
        &program(Some("http://127.0.0.1:1/portrait.jpg")),
        &obituary("Bio."),
      )
      .await
      .unwrap();
    assert!(url.ends_with("_obituary_42.pdf"));
  }

  #[tokio::test]
  async fn render_rejects_blank_required_fields() {
    let (renderer, _root) = renderer();

    let mut nameless = program(None);
    nameless.deceased_name = "   ".to_string();
    let err = renderer.render(&nameless, &obituary("Bio.")).await.unwrap_err();
    assert!(matches!(err, Error::MissingDeceasedName));
    assert!(err.is_input());

    let err = renderer
      .render(&program(None), &obituary(""))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::MissingBiography));
  }
}
