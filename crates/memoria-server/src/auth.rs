//! Password hashing, JWT session tokens, and the admin-session extractor.
//!
//! Admin routes accept the token either as `Authorization: Bearer <jwt>` or
//! as the `session_token` cookie the login handler sets. Tokens are HS256
//! with `sub` = username and a fixed expiry window.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use memoria_core::{admin::AdminUser, store::ProgramStore};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};

use crate::{AppState, error::{ApiError, store_err}};

/// Name of the session cookie set by login and cleared by logout.
pub const SESSION_COOKIE: &str = "session_token";

/// Token settings shared by issue and verify.
#[derive(Clone)]
pub struct AuthConfig {
  /// HS256 signing secret.
  pub jwt_secret:      String,
  /// Session lifetime; also the cookie Max-Age.
  pub session_minutes: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
  sub: String,
  exp: i64,
}

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash a password into an argon2 PHC string, e.g. `$argon2id$v=19$…`.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
}

/// Verify a password against a stored PHC string. Malformed hashes count
/// as a failed verification, not an error.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(password_hash) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

/// Issue a session token for `username`.
pub fn issue_token(username: &str, auth: &AuthConfig) -> Result<String, ApiError> {
  let expires = Utc::now() + chrono::Duration::minutes(auth.session_minutes);
  let claims = Claims { sub: username.to_string(), exp: expires.timestamp() };
  jsonwebtoken::encode(
    &Header::default(),
    &claims,
    &EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
  )
  .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))
}

/// Verify a session token and return its subject username. Expired,
/// malformed, or wrongly-signed tokens all return `None`.
pub fn verify_token(token: &str, auth: &AuthConfig) -> Option<String> {
  let data = jsonwebtoken::decode::<Claims>(
    token,
    &DecodingKey::from_secret(auth.jwt_secret.as_bytes()),
    &Validation::default(),
  )
  .ok()?;
  Some(data.claims.sub)
}

/// The `Set-Cookie` value carrying a session token.
pub fn session_cookie(token: &str, max_age_secs: i64) -> String {
  format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; Max-Age={max_age_secs}")
}

/// The `Set-Cookie` value that clears the session cookie.
pub fn clear_session_cookie() -> String {
  format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0")
}

/// Pull a session token out of request headers: `Bearer` first, then the
/// session cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
  if let Some(value) = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    && let Some(token) = value.strip_prefix("Bearer ")
  {
    return Some(token.to_string());
  }

  let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
  cookies.split(';').find_map(|pair| {
    let (name, value) = pair.trim().split_once('=')?;
    (name == SESSION_COOKIE).then(|| value.to_string())
  })
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// Present in a handler's signature means the request carried a valid
/// session token for an active administrator account.
pub struct CurrentAdmin(pub AdminUser);

impl<S> FromRequestParts<AppState<S>> for CurrentAdmin
where
  S: ProgramStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token =
      token_from_headers(&parts.headers).ok_or(ApiError::Unauthorized)?;
    let username =
      verify_token(&token, &state.auth).ok_or(ApiError::Unauthorized)?;

    let user = state
      .store
      .find_admin(&username)
      .await
      .map_err(store_err)?
      .ok_or(ApiError::Unauthorized)?;

    if !user.is_active {
      return Err(ApiError::Unauthorized);
    }
    Ok(CurrentAdmin(user))
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn auth() -> AuthConfig {
    AuthConfig {
      jwt_secret:      "test-secret".to_string(),
      session_minutes: 30,
    }
  }

  #[test]
  fn password_hash_round_trip() {
    let hash = hash_password("secret").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password("secret", &hash));
    assert!(!verify_password("wrong", &hash));
  }

  #[test]
  fn malformed_hash_fails_closed() {
    assert!(!verify_password("secret", "not-a-phc-string"));
  }

  #[test]
  fn token_round_trip() {
    let cfg = auth();
    let token = issue_token("alice", &cfg).unwrap();
    assert_eq!(verify_token(&token, &cfg).as_deref(), Some("alice"));
  }

  #[test]
  fn token_signed_with_other_secret_is_rejected() {
    let token = issue_token("alice", &auth()).unwrap();
    let other = AuthConfig {
      jwt_secret:      "different".to_string(),
      session_minutes: 30,
    };
    assert_eq!(verify_token(&token, &other), None);
  }

  #[test]
  fn expired_token_is_rejected() {
    let cfg = AuthConfig {
      jwt_secret:      "test-secret".to_string(),
      session_minutes: -10,
    };
    let token = issue_token("alice", &cfg).unwrap();
    assert_eq!(verify_token(&token, &cfg), None);
  }

  #[test]
  fn token_extraction_prefers_bearer_then_cookie() {
    let mut headers = HeaderMap::new();
    assert_eq!(token_from_headers(&headers), None);

    headers.insert(
      header::COOKIE,
      HeaderValue::from_static("other=1; session_token=from-cookie"),
    );
    assert_eq!(token_from_headers(&headers).as_deref(), Some("from-cookie"));

    headers.insert(
      header::AUTHORIZATION,
      HeaderValue::from_static("Bearer from-header"),
    );
    assert_eq!(token_from_headers(&headers).as_deref(), Some("from-header"));
  }
}
