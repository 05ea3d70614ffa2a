//! Block sequence → paginated A4 PDF via `printpdf`.
//!
//! printpdf is a low-level canvas, so pagination is a manual y-cursor walk:
//! each block reserves the vertical space it needs and a fresh page is
//! started when the cursor would cross the bottom margin. The builtin
//! Helvetica faces carry no glyph metrics, so line wrapping and centering
//! use an average-advance approximation.

use std::{fs::File, io::BufWriter, path::Path};

use printpdf::{
  BuiltinFont, ImageTransform, IndirectFontRef, Mm, PdfDocument,
  PdfDocumentReference, PdfLayerReference,
};

use crate::{compose::Block, error::{Error, Result}};

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const MARGIN: Mm = Mm(25.0);
const TOP_START: Mm = Mm(272.0);
const BOTTOM_MARGIN: Mm = Mm(18.0);
const USABLE_WIDTH: f32 = 160.0;

const TITLE_SIZE: f32 = 24.0;
const SUBTITLE_SIZE: f32 = 16.0;
const HEADING_SIZE: f32 = 18.0;
const BODY_SIZE: f32 = 12.0;

/// Photo target width on the page: two inches.
const PHOTO_WIDTH_MM: f32 = 50.8;

/// Approximate advance of one Helvetica glyph in millimetres.
/// 1 pt = 0.3528 mm; the average glyph is close to half an em.
fn char_advance_mm(size: f32) -> f32 { size * 0.3528 * 0.5 }

fn estimated_width_mm(text: &str, size: f32) -> f32 {
  text.chars().count() as f32 * char_advance_mm(size)
}

fn max_chars_for(size: f32) -> usize {
  (USABLE_WIDTH / char_advance_mm(size)) as usize
}

fn line_height_mm(size: f32) -> f32 { size * 0.3528 * 1.5 }

/// Greedy word wrap. A single word longer than the limit gets its own
/// (overlong) line rather than being split mid-word.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
  let mut lines = Vec::new();
  let mut current = String::new();
  for word in text.split_whitespace() {
    if !current.is_empty()
      && current.chars().count() + 1 + word.chars().count() > max_chars
    {
      lines.push(std::mem::take(&mut current));
    }
    if !current.is_empty() {
      current.push(' ');
    }
    current.push_str(word);
  }
  if !current.is_empty() {
    lines.push(current);
  }
  lines
}

// ─── Page cursor ─────────────────────────────────────────────────────────────

struct Cursor<'a> {
  doc:   &'a PdfDocumentReference,
  layer: PdfLayerReference,
  y:     Mm,
}

impl Cursor<'_> {
  /// Start a new page if fewer than `needed` millimetres remain.
  fn ensure(&mut self, needed: f32) {
    if self.y.0 - needed < BOTTOM_MARGIN.0 {
      let (page, layer) = self.doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
      self.layer = self.doc.get_page(page).get_layer(layer);
      self.y = TOP_START;
    }
  }

  fn advance(&mut self, by: f32) { self.y = Mm(self.y.0 - by); }

  /// Write wrapped lines at the left margin.
  fn text_lines(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
    let height = line_height_mm(size);
    for line in wrap(text, max_chars_for(size)) {
      self.ensure(height);
      self.advance(height);
      self.layer.use_text(line, size, MARGIN, self.y, font);
    }
  }

  /// Write wrapped lines, each centered on the page.
  fn centered_lines(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
    let height = line_height_mm(size);
    for line in wrap(text, max_chars_for(size)) {
      self.ensure(height);
      self.advance(height);
      let x = ((PAGE_WIDTH.0 - estimated_width_mm(&line, size)) / 2.0).max(MARGIN.0);
      self.layer.use_text(line, size, Mm(x), self.y, font);
    }
  }
}

// ─── Rendering ───────────────────────────────────────────────────────────────

/// Render `blocks` to a PDF at `path`. The parent directory must exist.
pub fn render_document(blocks: &[Block], path: &Path) -> Result<()> {
  let title = blocks
    .iter()
    .find_map(|b| match b {
      Block::Title(name) => Some(name.as_str()),
      _ => None,
    })
    .unwrap_or("Obituary");

  let (doc, page, layer) = PdfDocument::new(title, PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
  let regular = doc
    .add_builtin_font(BuiltinFont::Helvetica)
    .map_err(|e| Error::Pdf(e.to_string()))?;
  let bold = doc
    .add_builtin_font(BuiltinFont::HelveticaBold)
    .map_err(|e| Error::Pdf(e.to_string()))?;
  let oblique = doc
    .add_builtin_font(BuiltinFont::HelveticaOblique)
    .map_err(|e| Error::Pdf(e.to_string()))?;

  let mut cursor = Cursor {
    layer: doc.get_page(page).get_layer(layer),
    y: TOP_START,
    doc: &doc,
  };

  for block in blocks {
    match block {
      Block::Title(name) => {
        cursor.centered_lines(name, TITLE_SIZE, &bold);
        cursor.advance(8.0);
      }
      Block::Subtitle(dates) => {
        cursor.centered_lines(dates, SUBTITLE_SIZE, &regular);
        cursor.advance(6.0);
      }
      Block::Photo(image_path) => place_photo(&mut cursor, image_path),
      Block::Heading(heading) => {
        cursor.advance(4.0);
        cursor.text_lines(heading, HEADING_SIZE, &bold);
        cursor.advance(2.0);
      }
      Block::Paragraph(text) => {
        cursor.text_lines(text, BODY_SIZE, &regular);
        cursor.advance(3.0);
      }
      Block::Detail { label, value } => {
        let height = line_height_mm(BODY_SIZE);
        cursor.ensure(height);
        cursor.advance(height);
        cursor.layer.use_text(*label, BODY_SIZE, MARGIN, cursor.y, &bold);
        let x = MARGIN.0 + estimated_width_mm(label, BODY_SIZE) + 2.0;
        cursor.layer.use_text(value, BODY_SIZE, Mm(x), cursor.y, &regular);
        cursor.advance(2.0);
      }
      Block::Quote(message) => {
        cursor.text_lines(message, BODY_SIZE, &oblique);
      }
      Block::Attribution(author) => {
        cursor.centered_lines(author, BODY_SIZE, &regular);
        cursor.advance(4.0);
      }
      Block::Epitaph => {
        cursor.advance(10.0);
        cursor.centered_lines(crate::compose::EPITAPH, BODY_SIZE, &oblique);
      }
    }
  }

  let file = File::create(path)?;
  let mut writer = BufWriter::new(file);
  doc
    .save(&mut writer)
    .map_err(|e| Error::Pdf(e.to_string()))?;
  Ok(())
}

/// Embed the normalised photo, two inches wide, centered. A decode failure
/// here must never abort the document; the block is skipped with a warning.
fn place_photo(cursor: &mut Cursor<'_>, path: &Path) {
  // Decode with printpdf's bundled image crate so the `DynamicImage` type
  // matches `from_dynamic_image` below (the workspace `image` is a different
  // major version than the one printpdf re-exports).
  let decoded = match printpdf::image_crate::open(path) {
    Ok(img) => img,
    Err(e) => {
      tracing::warn!(path = %path.display(), error = %e, "skipping photo block");
      return;
    }
  };

  // Pick the dpi so the pixel width maps to exactly two inches on the page.
  let dpi = decoded.width() as f32 / 2.0;
  let height_mm = decoded.height() as f32 * 25.4 / dpi;

  cursor.ensure(height_mm + 8.0);
  let x = Mm((PAGE_WIDTH.0 - PHOTO_WIDTH_MM) / 2.0);
  let y = Mm(cursor.y.0 - height_mm);

  let pdf_image = printpdf::Image::from_dynamic_image(&decoded);
  pdf_image.add_to_layer(
    cursor.layer.clone(),
    ImageTransform {
      translate_x: Some(x),
      translate_y: Some(y),
      dpi: Some(dpi),
      ..Default::default()
    },
  );

  cursor.y = y;
  cursor.advance(8.0);
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use super::*;

  #[test]
  fn wrap_respects_word_boundaries() {
    let lines = wrap("the quick brown fox jumps over the lazy dog", 15);
    assert!(lines.iter().all(|l| l.chars().count() <= 15));
    assert_eq!(lines.join(" "), "the quick brown fox jumps over the lazy dog");
  }

  #[test]
  fn wrap_keeps_overlong_words_whole() {
    let lines = wrap("a pneumonoultramicroscopic word", 10);
    assert!(lines.contains(&"pneumonoultramicroscopic".to_string()));
  }

  #[test]
  fn renders_a_multi_page_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.pdf");

    let mut blocks = vec![
      Block::Title("Alice Liddell".to_string()),
      Block::Subtitle("1852 - 1934".to_string()),
      Block::Heading("Biography"),
    ];
    // Enough body text to force several page breaks.
    for i in 0..200 {
      blocks.push(Block::Paragraph(format!(
        "Paragraph {i} recalling a long and well-documented life in detail."
      )));
    }
    blocks.push(Block::Epitaph);

    render_document(&blocks, &path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
  }

  #[test]
  fn embeds_an_existing_photo() {
    let dir = tempfile::tempdir().unwrap();
    let photo_path = dir.path().join("portrait.png");
    image::RgbImage::from_pixel(60, 40, image::Rgb([120, 110, 100]))
      .save(&photo_path)
      .unwrap();

    let pdf_path = dir.path().join("out.pdf");
    let blocks = vec![
      Block::Title("Alice Liddell".to_string()),
      Block::Photo(photo_path),
      Block::Epitaph,
    ];

    render_document(&blocks, &pdf_path).unwrap();
    let bytes = std::fs::read(&pdf_path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
  }

  #[test]
  fn missing_photo_file_does_not_abort_rendering() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.pdf");

    let blocks = vec![
      Block::Title("Alice Liddell".to_string()),
      Block::Photo(PathBuf::from("/nonexistent/portrait.jpg")),
      Block::Epitaph,
    ];

    render_document(&blocks, &path).unwrap();
    assert!(path.exists());
  }
}
