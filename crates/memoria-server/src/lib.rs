//! HTTP layer for Memoria.
//!
//! Exposes an axum [`Router`] over any [`ProgramStore`]: public QR-resolved
//! read-only routes, JWT-cookie-gated admin CRUD, QR image routes, and
//! `/static` file serving.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod html;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post, put},
};
use memoria_core::store::ProgramStore;
use memoria_render::{ObituaryRenderer, StorageConfig};
use serde::Deserialize;
use tower_http::{services::ServeDir, trace::TraceLayer};

use auth::AuthConfig;
use handlers::{admin, public, qr};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` plus
/// `MEMORIA_*` environment overrides.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:            String,
  pub port:            u16,
  pub store_path:      PathBuf,
  /// HS256 signing secret for session tokens.
  pub jwt_secret:      String,
  #[serde(default = "default_session_minutes")]
  pub session_minutes: i64,
  pub storage:         StorageConfig,
}

fn default_session_minutes() -> i64 { 30 }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: ProgramStore> {
  pub store:    Arc<S>,
  pub auth:     Arc<AuthConfig>,
  pub renderer: Arc<ObituaryRenderer>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ProgramStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let static_root = state.renderer.storage().static_root.clone();

  Router::new()
    // Public program access (QR-resolved)
    .route("/api/funeral/programs", get(public::list_programs::<S>))
    .route("/api/funeral/program/{access_id}", get(public::get_program::<S>))
    .route("/api/funeral/program/{access_id}/view", get(public::view_program::<S>))
    .route("/api/funeral/program/{access_id}/obituary", get(public::get_obituary::<S>))
    .route("/api/funeral/program/{access_id}/obituary/view", get(public::view_obituary::<S>))
    .route("/api/funeral/program/{access_id}/obituary/pdf", get(public::view_obituary_pdf::<S>))
    // Admin accounts
    .route("/api/admin/register", post(admin::register::<S>))
    .route("/api/admin/login", post(admin::login::<S>))
    .route("/api/admin/logout", post(admin::logout))
    // Admin program CRUD
    .route(
      "/api/admin/programs",
      get(admin::list_programs::<S>).post(admin::create_program::<S>),
    )
    .route(
      "/api/admin/program/{id}",
      get(admin::get_program::<S>)
        .put(admin::update_program::<S>)
        .delete(admin::delete_program::<S>),
    )
    .route("/api/admin/program/{id}/events", post(admin::add_event::<S>))
    .route("/api/admin/program/{id}/obituary", put(admin::update_obituary::<S>))
    .route("/api/admin/program/{id}/photo", post(admin::upload_photo::<S>))
    .route("/api/admin/program/{id}/obituary/pdf", get(admin::render_obituary_pdf::<S>))
    // QR codes
    .route("/api/qr/generate/{program_id}", get(qr::generate::<S>))
    .route("/api/qr/download/{access_id}", get(qr::download::<S>))
    // Uploaded photos, QR images, rendered PDFs
    .nest_service("/static", ServeDir::new(static_root))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
