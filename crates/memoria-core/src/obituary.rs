//! Obituary — long-form biographical content attached to a program.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tribute submitted in memory of the deceased.
///
/// Both fields default to the empty string on deserialization so that rows
/// written before the boundary validation existed (arbitrary key/value maps)
/// still decode. Renderers must check [`Tribute::is_complete`] before
/// displaying an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tribute {
  #[serde(default)]
  pub author:  String,
  #[serde(default)]
  pub message: String,
}

impl Tribute {
  pub fn new(author: impl Into<String>, message: impl Into<String>) -> Self {
    Self { author: author.into(), message: message.into() }
  }

  /// Both author and message are present and non-blank.
  pub fn is_complete(&self) -> bool {
    !self.author.trim().is_empty() && !self.message.trim().is_empty()
  }
}

/// Long-form obituary content. Exactly zero-or-one per program; cannot
/// outlive its program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obituary {
  pub id:              i64,
  pub program_id:      i64,
  pub biography:       String,
  pub family_details:  Option<String>,
  pub special_message: Option<String>,
  /// Photo URL strings, in display order.
  pub photos:          Vec<String>,
  /// Tributes, in submission order.
  pub tributes:        Vec<Tribute>,
  /// Relative URL of the rendered PDF, set after the first render. The PDF
  /// is a snapshot: later edits to the program do not clear this.
  pub pdf_url:         Option<String>,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      Option<DateTime<Utc>>,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Fields required to create an [`Obituary`] alongside its program.
#[derive(Debug, Clone, Deserialize)]
pub struct NewObituary {
  pub biography:       String,
  pub family_details:  Option<String>,
  pub special_message: Option<String>,
  #[serde(default)]
  pub photos:          Vec<String>,
  #[serde(default)]
  pub tributes:        Vec<Tribute>,
}

/// Partial update for an [`Obituary`]. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObituaryPatch {
  pub biography:       Option<String>,
  pub family_details:  Option<String>,
  pub special_message: Option<String>,
  pub photos:          Option<Vec<String>>,
  pub tributes:        Option<Vec<Tribute>>,
  pub pdf_url:         Option<String>,
}
