//! QR code routes.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET` | `/api/qr/generate/{program_id}` | (Re)write the PNG, return paths |
//! | `GET` | `/api/qr/download/{access_id}?format=png\|svg` | File download |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::header,
  response::IntoResponse,
};
use memoria_core::store::ProgramStore;
use memoria_render::qr;
use serde::{Deserialize, Serialize};

use crate::{
  AppState,
  error::{ApiError, store_err},
  handlers::public::active_view,
};

#[derive(Debug, Serialize)]
pub struct QrCodeResponse {
  pub access_id:   String,
  pub qr_code_url: String,
  pub access_url:  String,
}

/// `GET /api/qr/generate/{program_id}` — regenerates the PNG in place and
/// returns where to find it plus the URL it encodes.
pub async fn generate<S>(
  State(state): State<AppState<S>>,
  Path(program_id): Path<i64>,
) -> Result<Json<QrCodeResponse>, ApiError>
where
  S: ProgramStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let view = state
    .store
    .get_program(program_id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::NotFound("Funeral program not found".to_string()))?;

  let access_id = view.program.access_id;
  let qr_code_url = qr::write_qr_png(state.renderer.storage(), &access_id)
    .map_err(ApiError::Render)?;

  Ok(Json(QrCodeResponse {
    qr_code_url,
    access_url: format!("/api/funeral/program/{access_id}/view"),
    access_id,
  }))
}

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
  pub format: Option<String>,
}

/// `GET /api/qr/download/{access_id}[?format=svg]` — renders on demand and
/// returns the file as an attachment named after the deceased.
pub async fn download<S>(
  State(state): State<AppState<S>>,
  Path(access_id): Path<String>,
  Query(params): Query<DownloadParams>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ProgramStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let view = active_view(&state, &access_id).await?;
  let storage = state.renderer.storage();

  let format = params.format.unwrap_or_default().to_lowercase();
  let (url_path, media_type, ext) = if format == "svg" {
    (
      qr::write_qr_svg(storage, &access_id).map_err(ApiError::Render)?,
      "image/svg+xml",
      "svg",
    )
  } else {
    (
      qr::write_qr_png(storage, &access_id).map_err(ApiError::Render)?,
      "image/png",
      "png",
    )
  };

  let path = storage
    .resolve_static(&url_path)
    .ok_or_else(|| ApiError::Internal("QR code file not found".to_string()))?;
  let bytes = tokio::fs::read(&path)
    .await
    .map_err(|_| ApiError::NotFound("QR code file not found".to_string()))?;

  let filename = format!(
    "{}_qr_code.{ext}",
    view.program.deceased_name.replace(' ', "_")
  );
  Ok((
    [
      (header::CONTENT_TYPE, media_type.to_string()),
      (
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{filename}\""),
      ),
    ],
    bytes,
  ))
}
