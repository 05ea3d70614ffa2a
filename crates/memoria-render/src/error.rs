//! Error type for `memoria-render`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("deceased name must not be empty")]
  MissingDeceasedName,

  #[error("obituary biography must not be empty")]
  MissingBiography,

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("image error: {0}")]
  Image(#[from] image::ImageError),

  #[error("http client error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("pdf error: {0}")]
  Pdf(String),

  #[error("qr error: {0}")]
  Qr(String),
}

impl Error {
  /// True for caller-input errors (missing required text), which map to a
  /// request rejection rather than a server failure.
  pub fn is_input(&self) -> bool {
    matches!(self, Error::MissingDeceasedName | Error::MissingBiography)
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
