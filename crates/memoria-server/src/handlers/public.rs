//! Public, unauthenticated routes — what a QR code scan reaches.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET` | `/api/funeral/programs` | Active programs, `?offset`/`?limit` |
//! | `GET` | `/api/funeral/program/{access_id}` | Aggregate JSON |
//! | `GET` | `/api/funeral/program/{access_id}/view` | HTML page |
//! | `GET` | `/api/funeral/program/{access_id}/obituary` | Obituary JSON |
//! | `GET` | `/api/funeral/program/{access_id}/obituary/view` | HTML page |
//! | `GET` | `/api/funeral/program/{access_id}/obituary/pdf` | Cached PDF |
//!
//! Everything here sees only active programs; deactivated records 404.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::header,
  response::{Html, IntoResponse},
};
use memoria_core::{
  obituary::Obituary,
  program::{Program, ProgramView},
  store::{ListQuery, ProgramStore},
};
use memoria_render::compose::safe_file_name;
use serde::Deserialize;

use crate::{AppState, error::{ApiError, store_err}, html};

// ─── Listing ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub offset: usize,
  pub limit:  Option<usize>,
}

/// `GET /api/funeral/programs[?offset=..&limit=..]`
pub async fn list_programs<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Program>>, ApiError>
where
  S: ProgramStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let programs = state
    .store
    .list_programs(ListQuery {
      include_inactive: false,
      offset:           params.offset,
      limit:            params.limit.unwrap_or(100),
    })
    .await
    .map_err(store_err)?;
  Ok(Json(programs))
}

// ─── Lookup helpers ───────────────────────────────────────────────────────────

pub(crate) async fn active_view<S>(
  state: &AppState<S>,
  access_id: &str,
) -> Result<ProgramView, ApiError>
where
  S: ProgramStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  state
    .store
    .find_by_access_id(access_id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::NotFound("Funeral program not found".to_string()))
}

fn obituary_of(view: &ProgramView) -> Result<&Obituary, ApiError> {
  view
    .obituary
    .as_ref()
    .ok_or_else(|| ApiError::NotFound("Obituary not found for this program".to_string()))
}

// ─── Program ──────────────────────────────────────────────────────────────────

/// `GET /api/funeral/program/{access_id}`
pub async fn get_program<S>(
  State(state): State<AppState<S>>,
  Path(access_id): Path<String>,
) -> Result<Json<ProgramView>, ApiError>
where
  S: ProgramStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Ok(Json(active_view(&state, &access_id).await?))
}

/// `GET /api/funeral/program/{access_id}/view`
pub async fn view_program<S>(
  State(state): State<AppState<S>>,
  Path(access_id): Path<String>,
) -> Result<Html<String>, ApiError>
where
  S: ProgramStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let view = active_view(&state, &access_id).await?;
  Ok(Html(html::program_page(&view)))
}

// ─── Obituary ─────────────────────────────────────────────────────────────────

/// `GET /api/funeral/program/{access_id}/obituary`
pub async fn get_obituary<S>(
  State(state): State<AppState<S>>,
  Path(access_id): Path<String>,
) -> Result<Json<Obituary>, ApiError>
where
  S: ProgramStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let view = active_view(&state, &access_id).await?;
  let obituary = obituary_of(&view)?;
  Ok(Json(obituary.clone()))
}

/// `GET /api/funeral/program/{access_id}/obituary/view`
pub async fn view_obituary<S>(
  State(state): State<AppState<S>>,
  Path(access_id): Path<String>,
) -> Result<Html<String>, ApiError>
where
  S: ProgramStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let view = active_view(&state, &access_id).await?;
  let obituary = obituary_of(&view)?;
  Ok(Html(html::obituary_page(&view.program, obituary)))
}

/// `GET /api/funeral/program/{access_id}/obituary/pdf` — serve the cached
/// rendered document inline. 404 until an administrator has rendered it.
pub async fn view_obituary_pdf<S>(
  State(state): State<AppState<S>>,
  Path(access_id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ProgramStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let view = active_view(&state, &access_id).await?;
  let obituary = obituary_of(&view)?;
  let pdf_url = obituary
    .pdf_url
    .as_deref()
    .ok_or_else(|| ApiError::NotFound("No PDF available for this obituary".to_string()))?;

  let path = state
    .renderer
    .storage()
    .resolve_static(pdf_url)
    .ok_or_else(|| ApiError::NotFound("PDF file not found".to_string()))?;
  let bytes = tokio::fs::read(&path)
    .await
    .map_err(|_| ApiError::NotFound("PDF file not found".to_string()))?;

  let filename =
    format!("{}_obituary.pdf", safe_file_name(&view.program.deceased_name));
  Ok((
    [
      (header::CONTENT_TYPE, "application/pdf".to_string()),
      (
        header::CONTENT_DISPOSITION,
        format!("inline; filename=\"{filename}\""),
      ),
    ],
    bytes,
  ))
}
