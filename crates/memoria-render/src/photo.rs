//! Image normalization — turn a photo reference into a renderer-compatible
//! local file.
//!
//! References under the managed static root pass through untouched. Remote
//! URLs are fetched with a bounded timeout, decoded, flattened to RGB,
//! downsampled, and re-encoded as JPEG into the shared temp directory. Every
//! failure downgrades to "no image"; nothing here is fatal to a render.

use std::{fs::File, io::BufWriter, path::{Path, PathBuf}, time::Duration};

use image::{DynamicImage, codecs::jpeg::JpegEncoder};
use sha2::{Digest as _, Sha256};

use crate::{config::StorageConfig, error::Result};

/// Prefix of raw downloaded files in the temp directory.
pub const TEMP_PREFIX: &str = "temp_image_";

/// Prefix of re-encoded files in the temp directory.
pub const PROCESSED_PREFIX: &str = "processed_";

/// Remote fetches give up after this long, with no cancellation hook once
/// started.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Neither output dimension exceeds this, aspect ratio preserved.
const MAX_DIMENSION: u32 = 400;

const JPEG_QUALITY: u8 = 85;

/// Normalize `reference` to a local image path, or `None` if no usable
/// image can be produced. See the module docs for the failure policy.
pub(crate) async fn normalize(
  http: &reqwest::Client,
  storage: &StorageConfig,
  reference: &str,
) -> Option<PathBuf> {
  // Already under the static root: hand it back unchanged, no re-encoding.
  if let Some(local) = storage.resolve_static(reference) {
    if local.exists() {
      return Some(local);
    }
    tracing::warn!(reference, "static photo reference points at no file");
    return None;
  }

  if !reference.starts_with("http") {
    tracing::warn!(reference, "unrecognised photo reference");
    return None;
  }

  match fetch_and_process(http, storage, reference).await {
    Ok(path) => Some(path),
    Err(e) => {
      tracing::warn!(reference, error = %e, "photo normalization failed");
      None
    }
  }
}

async fn fetch_and_process(
  http: &reqwest::Client,
  storage: &StorageConfig,
  reference: &str,
) -> Result<PathBuf> {
  let response = http.get(reference).send().await?.error_for_status()?;

  let content_type = response
    .headers()
    .get(reqwest::header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .unwrap_or("");
  let ext = if content_type.contains("jpeg") || content_type.contains("jpg") {
    ".jpg"
  } else if content_type.contains("png") {
    ".png"
  } else {
    ".jpg"
  };

  let body = response.bytes().await?;

  let temp_dir = storage.temp_dir();
  std::fs::create_dir_all(&temp_dir)?;

  let temp_name = format!("{TEMP_PREFIX}{}{ext}", reference_key(reference));
  let temp_path = temp_dir.join(&temp_name);
  std::fs::write(&temp_path, &body)?;

  let processed_path = temp_dir.join(format!("{PROCESSED_PREFIX}{temp_name}"));
  process_temp_image(&temp_path, &processed_path)?;
  Ok(processed_path)
}

/// Decode a downloaded image, flatten alpha/palette sources to RGB, bound
/// both dimensions to [`MAX_DIMENSION`], and write a quality-85 JPEG to
/// `processed_path`. The output is always JPEG regardless of the
/// extension carried over from the source name.
fn process_temp_image(temp_path: &Path, processed_path: &Path) -> Result<()> {
  let decoded = image::open(temp_path)?;

  let flattened = match decoded {
    DynamicImage::ImageRgb8(_) => decoded,
    other => DynamicImage::ImageRgb8(other.to_rgb8()),
  };

  let bounded =
    if flattened.width() > MAX_DIMENSION || flattened.height() > MAX_DIMENSION {
      flattened.thumbnail(MAX_DIMENSION, MAX_DIMENSION)
    } else {
      flattened
    };

  let file = File::create(processed_path)?;
  let encoder = JpegEncoder::new_with_quality(BufWriter::new(file), JPEG_QUALITY);
  bounded.write_with_encoder(encoder)?;
  Ok(())
}

/// Stable short key for a source reference. Collisions across distinct
/// references within one run window are tolerated; this is a cache key,
/// not a security property.
fn reference_key(reference: &str) -> String {
  let digest = Sha256::digest(reference.as_bytes());
  hex::encode(&digest[..8])
}

/// Best-effort sweep of the temp directory: delete every file carrying one
/// of the two normalization prefixes, ignoring per-file errors. Invoked by
/// the caller after a document render as housekeeping, not a guarantee; a
/// sweep may race an in-flight render and that is accepted.
pub(crate) fn cleanup_temp_images(storage: &StorageConfig) {
  let Ok(entries) = std::fs::read_dir(storage.temp_dir()) else {
    return;
  };
  for entry in entries.flatten() {
    let name = entry.file_name();
    let Some(name) = name.to_str() else { continue };
    if name.starts_with(TEMP_PREFIX) || name.starts_with(PROCESSED_PREFIX) {
      if let Err(e) = std::fs::remove_file(entry.path()) {
        tracing::debug!(file = name, error = %e, "temp image removal failed");
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use image::GenericImageView as _;

  use super::*;

  fn client() -> reqwest::Client {
    reqwest::Client::builder()
      .timeout(Duration::from_millis(500))
      .build()
      .unwrap()
  }

  #[tokio::test]
  async fn local_static_reference_passes_through_unchanged() {
    let root = tempfile::tempdir().unwrap();
    let storage = StorageConfig::for_root(root.path());
    storage.ensure_dirs().unwrap();

    let photo = storage.uploads_dir().join("portrait.jpg");
    std::fs::write(&photo, b"not really a jpeg, never decoded").unwrap();

    let result =
      normalize(&client(), &storage, "/static/uploads/portrait.jpg").await;
    assert_eq!(result, Some(photo));
  }

  #[tokio::test]
  async fn missing_local_reference_yields_none() {
    let root = tempfile::tempdir().unwrap();
    let storage = StorageConfig::for_root(root.path());
    let result = normalize(&client(), &storage, "/static/uploads/gone.jpg").await;
    assert_eq!(result, None);
  }

  #[tokio::test]
  async fn unreachable_url_yields_none() {
    let root = tempfile::tempdir().unwrap();
    let storage = StorageConfig::for_root(root.path());
    // Nothing listens on this port; the fetch fails fast and the caller
    // treats it as "no image".
    let result =
      normalize(&client(), &storage, "http://127.0.0.1:1/portrait.jpg").await;
    assert_eq!(result, None);
  }

  #[tokio::test]
  async fn unrecognised_reference_yields_none() {
    let root = tempfile::tempdir().unwrap();
    let storage = StorageConfig::for_root(root.path());
    let result = normalize(&client(), &storage, "ftp://example.com/x.jpg").await;
    assert_eq!(result, None);
  }

  #[test]
  fn processing_flattens_resizes_and_reencodes() {
    let dir = tempfile::tempdir().unwrap();

    // An oversized RGBA source; alpha must be dropped and the longer edge
    // bounded to 400.
    let src = dir.path().join("temp_image_src.png");
    image::RgbaImage::from_pixel(800, 600, image::Rgba([10, 20, 30, 128]))
      .save(&src)
      .unwrap();

    let out = dir.path().join("processed_temp_image_src.png");
    process_temp_image(&src, &out).unwrap();

    // The output is JPEG content whatever the name says.
    let reloaded = image::ImageReader::open(&out)
      .unwrap()
      .with_guessed_format()
      .unwrap();
    assert_eq!(reloaded.format(), Some(image::ImageFormat::Jpeg));

    let decoded = reloaded.decode().unwrap();
    let (w, h) = decoded.dimensions();
    assert!(w <= 400 && h <= 400);
    // Aspect ratio preserved: 800x600 → 400x300.
    assert_eq!((w, h), (400, 300));
  }

  #[test]
  fn small_images_are_not_upscaled() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("temp_image_small.png");
    image::RgbImage::from_pixel(50, 30, image::Rgb([1, 2, 3]))
      .save(&src)
      .unwrap();

    let out = dir.path().join("processed_temp_image_small.jpg");
    process_temp_image(&src, &out).unwrap();

    let decoded = image::open(&out).unwrap();
    assert_eq!(decoded.dimensions(), (50, 30));
  }

  #[test]
  fn cleanup_removes_only_prefixed_files() {
    let root = tempfile::tempdir().unwrap();
    let storage = StorageConfig::for_root(root.path());
    storage.ensure_dirs().unwrap();
    let temp = storage.temp_dir();

    std::fs::write(temp.join("temp_image_a.jpg"), b"x").unwrap();
    std::fs::write(temp.join("processed_temp_image_a.jpg"), b"x").unwrap();
    std::fs::write(temp.join("unrelated.txt"), b"keep me").unwrap();

    cleanup_temp_images(&storage);

    assert!(!temp.join("temp_image_a.jpg").exists());
    assert!(!temp.join("processed_temp_image_a.jpg").exists());
    assert!(temp.join("unrelated.txt").exists());
  }

  #[test]
  fn cleanup_tolerates_a_missing_temp_dir() {
    let root = tempfile::tempdir().unwrap();
    let storage = StorageConfig::for_root(root.path());
    // ensure_dirs never ran; the sweep must simply return.
    cleanup_temp_images(&storage);
  }

  #[test]
  fn reference_keys_are_stable_and_distinct() {
    let a = reference_key("http://example.com/a.jpg");
    assert_eq!(a, reference_key("http://example.com/a.jpg"));
    assert_ne!(a, reference_key("http://example.com/b.jpg"));
    assert_eq!(a.len(), 16);
  }
}
