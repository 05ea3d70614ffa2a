//! Error type for `memoria-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("program not found: {0}")]
  ProgramNotFound(i64),

  #[error("program {0} has no obituary")]
  ObituaryMissing(i64),

  #[error("username already exists: {0}")]
  UsernameTaken(String),

  #[error("email already exists: {0}")]
  EmailTaken(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
