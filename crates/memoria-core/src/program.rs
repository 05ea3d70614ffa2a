//! Program — the funeral-event record and its schedule entries.
//!
//! A program owns zero-or-more [`ProgramEvent`]s and at most one
//! [`Obituary`](crate::obituary::Obituary); deleting it cascades to both.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::obituary::Obituary;

/// A funeral-event record.
///
/// `access_id` is the opaque token embedded in the program's public
/// QR-resolvable URL. It is minted by the store at creation and never
/// changes afterwards. Date fields are free text and are displayed verbatim;
/// nothing in the system parses them as calendar dates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
  pub id:               i64,
  pub deceased_name:    String,
  pub date_of_birth:    Option<String>,
  pub date_of_death:    Option<String>,
  pub funeral_date:     String,
  pub funeral_location: String,
  pub photo_url:        Option<String>,
  pub access_id:        String,
  pub is_active:        bool,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       Option<DateTime<Utc>>,
}

/// A single entry in a program's order of service.
///
/// `order_index` drives display ordering only. Duplicates are tolerated;
/// no contiguity is enforced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramEvent {
  pub id:          i64,
  pub program_id:  i64,
  /// Free-text time label, e.g. "10:00 AM".
  pub time:        String,
  pub title:       String,
  pub description: Option<String>,
  pub speaker:     Option<String>,
  pub order_index: i64,
}

/// The read aggregate for a program: the record itself, its events sorted by
/// `order_index`, and its obituary if one exists.
#[derive(Debug, Clone, Serialize)]
pub struct ProgramView {
  pub program:  Program,
  pub events:   Vec<ProgramEvent>,
  pub obituary: Option<Obituary>,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Fields required to create a [`Program`]. The store assigns id, access
/// id, and timestamps.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProgram {
  pub deceased_name:    String,
  pub date_of_birth:    Option<String>,
  pub date_of_death:    Option<String>,
  pub funeral_date:     String,
  pub funeral_location: String,
  pub photo_url:        Option<String>,
}

/// Fields required to append a [`ProgramEvent`]. The store assigns the
/// `order_index`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
  pub time:        String,
  pub title:       String,
  pub description: Option<String>,
  pub speaker:     Option<String>,
}

/// Partial update for a [`Program`]. `None` fields are left untouched;
/// `access_id` is immutable and deliberately absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgramPatch {
  pub deceased_name:    Option<String>,
  pub date_of_birth:    Option<String>,
  pub date_of_death:    Option<String>,
  pub funeral_date:     Option<String>,
  pub funeral_location: Option<String>,
  pub photo_url:        Option<String>,
  pub is_active:        Option<bool>,
}
