//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. The photo and tribute
//! lists are stored as compact JSON. Booleans are SQLite integers.

use chrono::{DateTime, Utc};
use memoria_core::{
  admin::AdminUser,
  obituary::{Obituary, Tribute},
  program::{Program, ProgramEvent},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_photos(photos: &[String]) -> Result<String> {
  Ok(serde_json::to_string(photos)?)
}

pub fn decode_photos(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

pub fn encode_tributes(tributes: &[Tribute]) -> Result<String> {
  Ok(serde_json::to_string(tributes)?)
}

/// Tribute rows are decoded leniently: entries missing `author` or
/// `message` come back with blank fields rather than failing the read.
pub fn decode_tributes(s: &str) -> Result<Vec<Tribute>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `programs` row.
pub struct RawProgram {
  pub program_id:       i64,
  pub deceased_name:    String,
  pub date_of_birth:    Option<String>,
  pub date_of_death:    Option<String>,
  pub funeral_date:     String,
  pub funeral_location: String,
  pub photo_url:        Option<String>,
  pub access_id:        String,
  pub is_active:        bool,
  pub created_at:       String,
  pub updated_at:       Option<String>,
}

impl RawProgram {
  pub fn into_program(self) -> Result<Program> {
    Ok(Program {
      id:               self.program_id,
      deceased_name:    self.deceased_name,
      date_of_birth:    self.date_of_birth,
      date_of_death:    self.date_of_death,
      funeral_date:     self.funeral_date,
      funeral_location: self.funeral_location,
      photo_url:        self.photo_url,
      access_id:        self.access_id,
      is_active:        self.is_active,
      created_at:       decode_dt(&self.created_at)?,
      updated_at:       self.updated_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw values read directly from a `program_events` row.
pub struct RawEvent {
  pub event_id:    i64,
  pub program_id:  i64,
  pub time:        String,
  pub title:       String,
  pub description: Option<String>,
  pub speaker:     Option<String>,
  pub order_index: i64,
}

impl RawEvent {
  pub fn into_event(self) -> ProgramEvent {
    ProgramEvent {
      id:          self.event_id,
      program_id:  self.program_id,
      time:        self.time,
      title:       self.title,
      description: self.description,
      speaker:     self.speaker,
      order_index: self.order_index,
    }
  }
}

/// Raw strings read directly from an `obituaries` row.
pub struct RawObituary {
  pub obituary_id:     i64,
  pub program_id:      i64,
  pub biography:       String,
  pub family_details:  Option<String>,
  pub special_message: Option<String>,
  pub photos:          String,
  pub tributes:        String,
  pub pdf_url:         Option<String>,
  pub created_at:      String,
  pub updated_at:      Option<String>,
}

impl RawObituary {
  pub fn into_obituary(self) -> Result<Obituary> {
    Ok(Obituary {
      id:              self.obituary_id,
      program_id:      self.program_id,
      biography:       self.biography,
      family_details:  self.family_details,
      special_message: self.special_message,
      photos:          decode_photos(&self.photos)?,
      tributes:        decode_tributes(&self.tributes)?,
      pdf_url:         self.pdf_url,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      self.updated_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw strings read directly from an `admin_users` row.
pub struct RawAdmin {
  pub admin_id:      i64,
  pub username:      String,
  pub email:         String,
  pub password_hash: String,
  pub is_active:     bool,
  pub is_superuser:  bool,
  pub created_at:    String,
}

impl RawAdmin {
  pub fn into_admin(self) -> Result<AdminUser> {
    Ok(AdminUser {
      id:            self.admin_id,
      username:      self.username,
      email:         self.email,
      password_hash: self.password_hash,
      is_active:     self.is_active,
      is_superuser:  self.is_superuser,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}
