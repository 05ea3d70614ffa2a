//! Administrator accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An administrator account. The password is stored only as an argon2 PHC
/// string, and the hash is never serialized into API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
  pub id:            i64,
  pub username:      String,
  pub email:         String,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub is_active:     bool,
  pub is_superuser:  bool,
  pub created_at:    DateTime<Utc>,
}

/// Fields required to create an [`AdminUser`]. The caller hashes the
/// password; the store never sees plaintext.
#[derive(Debug, Clone)]
pub struct NewAdminUser {
  pub username:      String,
  pub email:         String,
  pub password_hash: String,
}
