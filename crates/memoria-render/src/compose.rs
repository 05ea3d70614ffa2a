//! Document composition — a program + obituary become an ordered block
//! sequence.
//!
//! [`compose`] is a pure transform; all filesystem work lives in the callers.
//! The block order is fixed: title, optional date line, optional photo, text
//! sections, service details, tributes, closing line.

use std::path::PathBuf;

use memoria_core::{obituary::Obituary, program::Program};

/// At most this many tributes render, in original list order. Later entries
/// are silently ignored.
pub const MAX_TRIBUTES: usize = 5;

/// The fixed closing line of every document.
pub const EPITAPH: &str =
  "\"In the hearts of those who loved you, you will always be there.\"";

/// One layout block of the composed document.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
  /// Centered document title — the deceased's name.
  Title(String),
  /// Centered "birth - death" line under the title.
  Subtitle(String),
  /// Lead photo, already normalised to a local file.
  Photo(PathBuf),
  /// Section heading.
  Heading(&'static str),
  /// One paragraph of body text.
  Paragraph(String),
  /// Bold-labelled service detail line.
  Detail { label: &'static str, value: String },
  /// Quoted tribute message.
  Quote(String),
  /// Centered attribution line under a quote.
  Attribution(String),
  /// The fixed closing line.
  Epitaph,
}

/// Build the document's block sequence.
///
/// `photo` is the already-normalised local image, if any; normalization
/// failures simply arrive here as `None` and the document renders without
/// an image block.
pub fn compose(program: &Program, obituary: &Obituary, photo: Option<PathBuf>) -> Vec<Block> {
  let mut blocks = vec![Block::Title(program.deceased_name.clone())];

  // The date line needs both endpoints; either alone is omitted. The
  // strings are displayed verbatim, never parsed.
  if let (Some(birth), Some(death)) =
    (&program.date_of_birth, &program.date_of_death)
    && !birth.is_empty()
    && !death.is_empty()
  {
    blocks.push(Block::Subtitle(format!("{birth} - {death}")));
  }

  if let Some(path) = photo {
    blocks.push(Block::Photo(path));
  }

  push_section(&mut blocks, "Biography", Some(&obituary.biography));
  push_section(&mut blocks, "Family", obituary.family_details.as_deref());
  push_section(
    &mut blocks,
    "Special Message",
    obituary.special_message.as_deref(),
  );

  blocks.push(Block::Heading("Funeral Service"));
  blocks.push(Block::Detail {
    label: "Date & Time:",
    value: program.funeral_date.clone(),
  });
  blocks.push(Block::Detail {
    label: "Location:",
    value: program.funeral_location.clone(),
  });

  if !obituary.tributes.is_empty() {
    blocks.push(Block::Heading("Tributes & Messages"));
    for tribute in obituary.tributes.iter().take(MAX_TRIBUTES) {
      if tribute.is_complete() {
        blocks.push(Block::Quote(format!("\"{}\"", tribute.message)));
        blocks.push(Block::Attribution(format!("- {}", tribute.author)));
      }
    }
  }

  blocks.push(Block::Epitaph);
  blocks
}

/// Emit a heading plus one paragraph per non-blank line of `text`.
/// Absent or empty text emits nothing, heading included.
fn push_section(blocks: &mut Vec<Block>, heading: &'static str, text: Option<&str>) {
  let Some(text) = text else { return };
  if text.is_empty() {
    return;
  }
  blocks.push(Block::Heading(heading));
  for line in text.lines() {
    let line = line.trim();
    if !line.is_empty() {
      blocks.push(Block::Paragraph(line.to_string()));
    }
  }
}

// ─── Output naming ───────────────────────────────────────────────────────────

/// Filesystem-safe transliteration of a display name: keep alphanumerics,
/// spaces, hyphens and underscores, drop everything else, trim trailing
/// whitespace, then map spaces to underscores.
pub fn safe_file_name(name: &str) -> String {
  let kept: String = name
    .chars()
    .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
    .collect();
  kept.trim_end().replace(' ', "_")
}

/// The document file name for a program: `{safe_name}_obituary_{id}.pdf`.
pub fn document_file_name(program: &Program) -> String {
  format!(
    "{}_obituary_{}.pdf",
    safe_file_name(&program.deceased_name),
    program.id
  )
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use memoria_core::obituary::Tribute;

  use super::*;

  fn program() -> Program {
    Program {
      id:               42,
      deceased_name:    "Alice Liddell".to_string(),
      date_of_birth:    Some("May 4, 1852".to_string()),
      date_of_death:    Some("November 16, 1934".to_string()),
      funeral_date:     "November 20, 1934, 2:00 PM".to_string(),
      funeral_location: "Lyndhurst Parish Church".to_string(),
      photo_url:        None,
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

  fn paragraphs_after(blocks: &[Block], heading: &str) -> Vec<String> {
    let start = blocks
      .iter()
      .position(|b| matches!(b, Block::Heading(h) if *h == heading))
      .expect("heading present");
    blocks[start + 1..]
      .iter()
      .map_while(|b| match b {
        Block::Paragraph(p) => Some(p.clone()),
        _ => None,
      })
      .collect()
  }

  // ── Sections ────────────────────────────────────────────────────────────────

  #[test]
  fn biography_emits_one_paragraph_per_nonblank_line() {
    let blocks = compose(
      &program(),
      &obituary("First line.\n\n  \nSecond line.\nThird line."),
      None,
    );
    assert_eq!(
      paragraphs_after(&blocks, "Biography"),
      ["First line.", "Second line.", "Third line."]
    );
  }

  #[test]
  fn optional_sections_are_omitted_when_absent() {
    let blocks = compose(&program(), &obituary("Bio."), None);
    assert!(!blocks.contains(&Block::Heading("Family")));
    assert!(!blocks.contains(&Block::Heading("Special Message")));
    // The service section is unconditional.
    assert!(blocks.contains(&Block::Heading("Funeral Service")));
  }

  #[test]
  fn service_details_are_copied_verbatim() {
    let blocks = compose(&program(), &obituary("Bio."), None);
    assert!(blocks.contains(&Block::Detail {
      label: "Date & Time:",
      value: "November 20, 1934, 2:00 PM".to_string(),
    }));
    assert!(blocks.contains(&Block::Detail {
      label: "Location:",
      value: "Lyndhurst Parish Church".to_string(),
    }));
  }

  // ── Dates ───────────────────────────────────────────────────────────────────

  #[test]
  fn subtitle_requires_both_dates() {
    let blocks = compose(&program(), &obituary("Bio."), None);
    assert!(blocks.contains(&Block::Subtitle(
      "May 4, 1852 - November 16, 1934".to_string()
    )));

    let mut missing_birth = program();
    missing_birth.date_of_birth = None;
    let blocks = compose(&missing_birth, &obituary("Bio."), None);
    assert!(!blocks.iter().any(|b| matches!(b, Block::Subtitle(_))));

    let mut empty_death = program();
    empty_death.date_of_death = Some(String::new());
    let blocks = compose(&empty_death, &obituary("Bio."), None);
    assert!(!blocks.iter().any(|b| matches!(b, Block::Subtitle(_))));
  }

  // ── Photo ───────────────────────────────────────────────────────────────────

  #[test]
  fn no_photo_means_no_image_block() {
    // A program whose photo reference failed normalization composes with
    // `None` and must still succeed, image-free.
    let mut p = program();
    p.photo_url = Some("http://nowhere.invalid/portrait.jpg".to_string());
    let blocks = compose(&p, &obituary("Bio."), None);
    assert!(!blocks.iter().any(|b| matches!(b, Block::Photo(_))));
    assert_eq!(blocks.first(), Some(&Block::Title("Alice Liddell".to_string())));
  }

  #[test]
  fn photo_block_sits_between_dates_and_biography() {
    let photo = PathBuf::from("/tmp/portrait.jpg");
    let blocks = compose(&program(), &obituary("Bio."), Some(photo.clone()));
    let photo_pos = blocks
      .iter()
      .position(|b| *b == Block::Photo(photo.clone()))
      .unwrap();
    let subtitle_pos = blocks
      .iter()
      .position(|b| matches!(b, Block::Subtitle(_)))
      .unwrap();
    let bio_pos = blocks
      .iter()
      .position(|b| matches!(b, Block::Heading("Biography")))
      .unwrap();
    assert!(subtitle_pos < photo_pos && photo_pos < bio_pos);
  }

  // ── Tributes ────────────────────────────────────────────────────────────────

  fn tribute_authors(blocks: &[Block]) -> Vec<String> {
    blocks
      .iter()
      .filter_map(|b| match b {
        Block::Attribution(a) => Some(a.clone()),
        _ => None,
      })
      .collect()
  }

  #[test]
  fn only_the_first_five_tributes_render() {
    let mut o = obituary("Bio.");
    o.tributes = (1..=8)
      .map(|i| Tribute::new(format!("Author {i}"), format!("Message {i}")))
      .collect();
    let blocks = compose(&program(), &o, None);
    assert_eq!(
      tribute_authors(&blocks),
      ["- Author 1", "- Author 2", "- Author 3", "- Author 4", "- Author 5"]
    );
  }

  #[test]
  fn incomplete_tributes_are_skipped_in_place() {
    let mut o = obituary("Bio.");
    o.tributes = vec![
      Tribute::new("Sam", "Rest well"),
      Tribute { author: String::new(), message: "incomplete".to_string() },
      Tribute::new("Lee", "We miss you"),
    ];
    let blocks = compose(&program(), &o, None);
    assert_eq!(tribute_authors(&blocks), ["- Sam", "- Lee"]);
    assert!(blocks.contains(&Block::Quote("\"Rest well\"".to_string())));
    assert!(blocks.contains(&Block::Quote("\"We miss you\"".to_string())));
    assert!(!blocks.iter().any(
      |b| matches!(b, Block::Quote(q) if q.contains("incomplete"))
    ));
  }

  #[test]
  fn no_tributes_means_no_tribute_heading() {
    let blocks = compose(&program(), &obituary("Bio."), None);
    assert!(!blocks.contains(&Block::Heading("Tributes & Messages")));
  }

  #[test]
  fn every_document_ends_with_the_epitaph() {
    let blocks = compose(&program(), &obituary("Bio."), None);
    assert_eq!(blocks.last(), Some(&Block::Epitaph));
  }

  // ── Naming ──────────────────────────────────────────────────────────────────

  #[test]
  fn safe_file_name_strips_punctuation_and_maps_spaces() {
    assert_eq!(safe_file_name("Jane A. O'Brien"), "Jane_A_OBrien");
    assert_eq!(safe_file_name("Mary-Anne Smith_Jones"), "Mary-Anne_Smith_Jones");
    assert_eq!(safe_file_name("Dr. John (Jack) Doe, Jr."), "Dr_John_Jack_Doe_Jr");
  }

  #[test]
  fn safe_file_name_trims_trailing_whitespace_before_mapping() {
    // The trailing space left by stripping "Sr." must not become "_".
    assert_eq!(safe_file_name("John Doe ."), "John_Doe");
  }

  #[test]
  fn document_file_name_combines_name_and_id() {
    let mut p = program();
    p.deceased_name = "Jane A. O'Brien".to_string();
    assert_eq!(document_file_name(&p), "Jane_A_OBrien_obituary_42.pdf");
  }
}
