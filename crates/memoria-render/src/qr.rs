//! QR code generation for program access URLs.
//!
//! Each program's opaque access id resolves to a public HTML view; the QR
//! images encode that URL. Files land under the static root so the HTTP
//! layer can serve them directly.

use image::Luma;
use qrcode::{EcLevel, QrCode, render::svg};
use uuid::Uuid;

use crate::{config::StorageConfig, error::{Error, Result}};

/// Rendered module size in pixels; the quiet zone adds four modules of
/// border, matching the output the admin UI was built around.
const MODULE_PX: u32 = 10;

/// Mint a fresh access identifier. Globally unique, immutable once a
/// program is created with it.
pub fn new_access_id() -> String { Uuid::new_v4().to_string() }

/// The public URL a program's QR code resolves to.
pub fn access_url(storage: &StorageConfig, access_id: &str) -> String {
  format!(
    "{}/api/funeral/program/{access_id}/view",
    storage.base_url.trim_end_matches('/')
  )
}

fn code_for(storage: &StorageConfig, access_id: &str) -> Result<QrCode> {
  QrCode::with_error_correction_level(
    access_url(storage, access_id).as_bytes(),
    EcLevel::L,
  )
  .map_err(|e| Error::Qr(e.to_string()))
}

/// Render the access URL as a PNG under `qr_codes/`, returning the
/// `/static/...` path. Re-rendering overwrites in place.
pub fn write_qr_png(storage: &StorageConfig, access_id: &str) -> Result<String> {
  let code = code_for(storage, access_id)?;
  let image = code
    .render::<Luma<u8>>()
    .module_dimensions(MODULE_PX, MODULE_PX)
    .build();

  let dir = storage.qr_dir();
  std::fs::create_dir_all(&dir)?;
  let file_name = format!("{access_id}.png");
  image.save(dir.join(&file_name))?;

  Ok(format!("/static/qr_codes/{file_name}"))
}

/// Render the access URL as an SVG under `qr_codes/`, returning the
/// `/static/...` path.
pub fn write_qr_svg(storage: &StorageConfig, access_id: &str) -> Result<String> {
  let code = code_for(storage, access_id)?;
  let rendered = code
    .render::<svg::Color>()
    .module_dimensions(MODULE_PX, MODULE_PX)
    .build();

  let dir = storage.qr_dir();
  std::fs::create_dir_all(&dir)?;
  let file_name = format!("{access_id}.svg");
  std::fs::write(dir.join(&file_name), rendered)?;

  Ok(format!("/static/qr_codes/{file_name}"))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn access_ids_are_unique() {
    assert_ne!(new_access_id(), new_access_id());
  }

  #[test]
  fn access_url_tolerates_trailing_slash_in_base() {
    let mut storage = StorageConfig::for_root("/tmp");
    storage.base_url = "http://example.com/".to_string();
    assert_eq!(
      access_url(&storage, "abc"),
      "http://example.com/api/funeral/program/abc/view"
    );
  }

  #[test]
  fn png_is_written_and_decodes_square() {
    let root = tempfile::tempdir().unwrap();
    let storage = StorageConfig::for_root(root.path());

    let id = new_access_id();
    let url_path = write_qr_png(&storage, &id).unwrap();
    assert_eq!(url_path, format!("/static/qr_codes/{id}.png"));

    let file = storage.qr_dir().join(format!("{id}.png"));
    let decoded = image::open(&file).unwrap();
    assert_eq!(decoded.width(), decoded.height());
    assert!(decoded.width() > 0);
  }

  #[test]
  fn svg_is_written_with_svg_markup() {
    let root = tempfile::tempdir().unwrap();
    let storage = StorageConfig::for_root(root.path());

    let id = new_access_id();
    let url_path = write_qr_svg(&storage, &id).unwrap();
    assert_eq!(url_path, format!("/static/qr_codes/{id}.svg"));

    let body =
      std::fs::read_to_string(storage.qr_dir().join(format!("{id}.svg"))).unwrap();
    assert!(body.starts_with("<?xml") || body.starts_with("<svg"));
    assert!(body.contains("<svg"));
  }
}
