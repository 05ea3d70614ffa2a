//! Administrator routes — account management and program CRUD.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/admin/register` | New admin account |
//! | `POST` | `/api/admin/login` | Issues token + session cookie |
//! | `POST` | `/api/admin/logout` | Clears the cookie |
//! | `GET`  | `/api/admin/programs` | All programs, inactive included |
//! | `POST` | `/api/admin/programs` | Create program + obituary |
//! | `GET`  | `/api/admin/program/{id}` | Aggregate |
//! | `PUT`  | `/api/admin/program/{id}` | Partial update |
//! | `DELETE` | `/api/admin/program/{id}` | Cascade delete + file cleanup |
//! | `POST` | `/api/admin/program/{id}/events` | Append schedule entry |
//! | `PUT`  | `/api/admin/program/{id}/obituary` | Partial update |
//! | `POST` | `/api/admin/program/{id}/photo` | Multipart photo upload |
//! | `GET`  | `/api/admin/program/{id}/obituary/pdf` | Render + download |
//!
//! Everything below login/register requires a [`CurrentAdmin`] session.

use axum::{
  Json,
  extract::{Multipart, Path, Query, State},
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use memoria_core::{
  admin::NewAdminUser,
  obituary::{NewObituary, Obituary, ObituaryPatch, Tribute},
  program::{NewEvent, NewProgram, Program, ProgramEvent, ProgramPatch, ProgramView},
  store::{ListQuery, ProgramStore},
};
use memoria_render::{compose::safe_file_name, qr};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
  AppState,
  auth::{self, CurrentAdmin},
  error::{ApiError, store_err},
};

// ─── Accounts ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub username:         String,
  pub email:            String,
  pub password:         String,
  pub confirm_password: String,
}

/// `POST /api/admin/register`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ProgramStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  if body.password != body.confirm_password {
    return Err(ApiError::BadRequest("Passwords do not match".to_string()));
  }
  if body.password.chars().count() < 6 {
    return Err(ApiError::BadRequest(
      "Password must be at least 6 characters long".to_string(),
    ));
  }
  if body.username.trim().is_empty() || body.email.trim().is_empty() {
    return Err(ApiError::BadRequest(
      "Username and email must not be empty".to_string(),
    ));
  }

  if state
    .store
    .find_admin(&body.username)
    .await
    .map_err(store_err)?
    .is_some()
  {
    return Err(ApiError::Conflict("Username already exists".to_string()));
  }
  if state
    .store
    .find_admin_by_email(&body.email)
    .await
    .map_err(store_err)?
    .is_some()
  {
    return Err(ApiError::Conflict("Email already exists".to_string()));
  }

  let password_hash = auth::hash_password(&body.password)?;
  let user = state
    .store
    .create_admin(NewAdminUser {
      username: body.username,
      email: body.email,
      password_hash,
    })
    .await
    .map_err(store_err)?;

  tracing::info!(username = %user.username, "admin account created");
  Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub username: String,
  pub password: String,
}

/// `POST /api/admin/login` — verifies credentials, issues a session token,
/// and sets it as an `HttpOnly` cookie. The token also comes back in the
/// body for `Bearer` clients.
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Response, ApiError>
where
  S: ProgramStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let user = state
    .store
    .find_admin(&body.username)
    .await
    .map_err(store_err)?
    .ok_or(ApiError::Unauthorized)?;

  if !auth::verify_password(&body.password, &user.password_hash) {
    return Err(ApiError::Unauthorized);
  }
  if !user.is_active {
    return Err(ApiError::Unauthorized);
  }

  let token = auth::issue_token(&user.username, &state.auth)?;
  let cookie = auth::session_cookie(&token, state.auth.session_minutes * 60);

  Ok(
    (
      [(header::SET_COOKIE, cookie)],
      Json(json!({ "access_token": token, "token_type": "bearer" })),
    )
      .into_response(),
  )
}

/// `POST /api/admin/logout`
pub async fn logout() -> impl IntoResponse {
  (
    [(header::SET_COOKIE, auth::clear_session_cookie())],
    Json(json!({ "logged_out": true })),
  )
}

// ─── Shared lookups ───────────────────────────────────────────────────────────

async fn view_by_id<S>(state: &AppState<S>, id: i64) -> Result<ProgramView, ApiError>
where
  S: ProgramStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  state
    .store
    .get_program(id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::NotFound("Program not found".to_string()))
}

fn blank_to_none(value: Option<String>) -> Option<String> {
  value.filter(|s| !s.trim().is_empty())
}

fn reject_incomplete_tributes(tributes: &[Tribute]) -> Result<(), ApiError> {
  if tributes.iter().any(|t| !t.is_complete()) {
    return Err(ApiError::BadRequest(
      "Every tribute needs a non-empty author and message".to_string(),
    ));
  }
  Ok(())
}

// ─── Program listing ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub offset: usize,
  pub limit:  Option<usize>,
}

/// `GET /api/admin/programs` — the dashboard listing: every program,
/// deactivated ones included, newest first.
pub async fn list_programs<S>(
  State(state): State<AppState<S>>,
  _admin: CurrentAdmin,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Program>>, ApiError>
where
  S: ProgramStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let programs = state
    .store
    .list_programs(ListQuery {
      include_inactive: true,
      offset:           params.offset,
      limit:            params.limit.unwrap_or(100),
    })
    .await
    .map_err(store_err)?;
  Ok(Json(programs))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateProgramBody {
  pub deceased_name:    String,
  pub date_of_birth:    Option<String>,
  pub date_of_death:    Option<String>,
  pub funeral_date:     String,
  pub funeral_location: String,
  pub biography:        String,
  pub family_details:   Option<String>,
  pub special_message:  Option<String>,
  /// Seed schedule, appended in order.
  #[serde(default)]
  pub events:           Vec<NewEvent>,
  #[serde(default)]
  pub tributes:         Vec<Tribute>,
}

/// `POST /api/admin/programs` — create the program and its obituary in one
/// transaction, then write the QR image (best effort).
pub async fn create_program<S>(
  State(state): State<AppState<S>>,
  _admin: CurrentAdmin,
  Json(body): Json<CreateProgramBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ProgramStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  for (field, value) in [
    ("deceased_name", &body.deceased_name),
    ("funeral_date", &body.funeral_date),
    ("funeral_location", &body.funeral_location),
    ("biography", &body.biography),
  ] {
    if value.trim().is_empty() {
      return Err(ApiError::BadRequest(format!("{field} must not be empty")));
    }
  }
  reject_incomplete_tributes(&body.tributes)?;

  let view = state
    .store
    .create_program(
      NewProgram {
        deceased_name:    body.deceased_name,
        date_of_birth:    blank_to_none(body.date_of_birth),
        date_of_death:    blank_to_none(body.date_of_death),
        funeral_date:     body.funeral_date,
        funeral_location: body.funeral_location,
        photo_url:        None,
      },
      NewObituary {
        biography:       body.biography,
        family_details:  blank_to_none(body.family_details),
        special_message: blank_to_none(body.special_message),
        photos:          vec![],
        tributes:        body.tributes,
      },
    )
    .await
    .map_err(store_err)?;

  let program_id = view.program.id;
  for event in body.events {
    state
      .store
      .add_event(program_id, event)
      .await
      .map_err(store_err)?;
  }

  // The QR image is regenerable on demand; a write failure must not fail
  // the creation.
  if let Err(e) = qr::write_qr_png(state.renderer.storage(), &view.program.access_id)
  {
    tracing::warn!(program_id, error = %e, "QR code generation failed");
  }

  let view = view_by_id(&state, program_id).await?;
  tracing::info!(program_id, access_id = %view.program.access_id, "program created");
  Ok((StatusCode::CREATED, Json(view)))
}

// ─── Read / update / delete ───────────────────────────────────────────────────

/// `GET /api/admin/program/{id}`
pub async fn get_program<S>(
  State(state): State<AppState<S>>,
  _admin: CurrentAdmin,
  Path(id): Path<i64>,
) -> Result<Json<ProgramView>, ApiError>
where
  S: ProgramStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Ok(Json(view_by_id(&state, id).await?))
}

/// `PUT /api/admin/program/{id}` — partial update; absent fields are left
/// alone. Deactivation happens here via `is_active`.
pub async fn update_program<S>(
  State(state): State<AppState<S>>,
  _admin: CurrentAdmin,
  Path(id): Path<i64>,
  Json(patch): Json<ProgramPatch>,
) -> Result<Json<Program>, ApiError>
where
  S: ProgramStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  view_by_id(&state, id).await?;
  let program = state
    .store
    .update_program(id, patch)
    .await
    .map_err(store_err)?;
  Ok(Json(program))
}

/// `DELETE /api/admin/program/{id}` — removes the row (events and obituary
/// cascade) and best-effort unlinks the photo and QR files. Orphaned
/// processed images and PDFs are accepted debt.
pub async fn delete_program<S>(
  State(state): State<AppState<S>>,
  _admin: CurrentAdmin,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
  S: ProgramStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let view = view_by_id(&state, id).await?;
  let storage = state.renderer.storage();

  if let Some(photo_url) = &view.program.photo_url
    && let Some(path) = storage.resolve_static(photo_url)
    && let Err(e) = std::fs::remove_file(&path)
  {
    tracing::debug!(program_id = id, error = %e, "photo file removal failed");
  }

  let qr_path = storage.qr_dir().join(format!("{}.png", view.program.access_id));
  if let Err(e) = std::fs::remove_file(&qr_path) {
    tracing::debug!(program_id = id, error = %e, "QR file removal failed");
  }

  state.store.delete_program(id).await.map_err(store_err)?;
  tracing::info!(program_id = id, "program deleted");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Events ───────────────────────────────────────────────────────────────────

/// `POST /api/admin/program/{id}/events`
pub async fn add_event<S>(
  State(state): State<AppState<S>>,
  _admin: CurrentAdmin,
  Path(id): Path<i64>,
  Json(event): Json<NewEvent>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ProgramStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  if event.time.trim().is_empty() || event.title.trim().is_empty() {
    return Err(ApiError::BadRequest(
      "Event time and title must not be empty".to_string(),
    ));
  }
  view_by_id(&state, id).await?;
  let event: ProgramEvent =
    state.store.add_event(id, event).await.map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(event)))
}

// ─── Obituary ─────────────────────────────────────────────────────────────────

/// `PUT /api/admin/program/{id}/obituary` — partial update. Tributes are
/// validated here at the boundary; incomplete entries are rejected rather
/// than stored.
pub async fn update_obituary<S>(
  State(state): State<AppState<S>>,
  _admin: CurrentAdmin,
  Path(id): Path<i64>,
  Json(patch): Json<ObituaryPatch>,
) -> Result<Json<Obituary>, ApiError>
where
  S: ProgramStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  if let Some(biography) = &patch.biography
    && biography.trim().is_empty()
  {
    return Err(ApiError::BadRequest("biography must not be empty".to_string()));
  }
  if let Some(tributes) = &patch.tributes {
    reject_incomplete_tributes(tributes)?;
  }

  let view = view_by_id(&state, id).await?;
  if view.obituary.is_none() {
    return Err(ApiError::NotFound(
      "No obituary found for this program".to_string(),
    ));
  }

  let obituary = state
    .store
    .update_obituary(id, patch)
    .await
    .map_err(store_err)?;
  Ok(Json(obituary))
}

// ─── Photo upload ─────────────────────────────────────────────────────────────

/// `POST /api/admin/program/{id}/photo` — multipart upload with a single
/// `photo` field. The file lands under `uploads/` named after the deceased
/// plus a short random salt, becomes the program's lead photo, and is
/// prepended to the obituary's photo list.
pub async fn upload_photo<S>(
  State(state): State<AppState<S>>,
  _admin: CurrentAdmin,
  Path(id): Path<i64>,
  mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: ProgramStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let view = view_by_id(&state, id).await?;

  let mut photo_url: Option<String> = None;
  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
  {
    if field.name() != Some("photo") {
      continue;
    }
    let file_name = field.file_name().unwrap_or_default().to_string();
    let data = field
      .bytes()
      .await
      .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?;
    if file_name.is_empty() || data.is_empty() {
      continue;
    }

    let ext: String = file_name
      .rsplit('.')
      .next()
      .unwrap_or("jpg")
      .chars()
      .filter(|c| c.is_ascii_alphanumeric())
      .collect();
    let ext = if ext.is_empty() { "jpg".to_string() } else { ext };
    let salt = Uuid::new_v4().to_string();
    let stored_name = format!(
      "{}_{}.{ext}",
      safe_file_name(&view.program.deceased_name),
      &salt[..8]
    );

    let dir = state.renderer.storage().uploads_dir();
    tokio::fs::create_dir_all(&dir)
      .await
      .map_err(|e| ApiError::Internal(format!("upload directory: {e}")))?;
    tokio::fs::write(dir.join(&stored_name), &data)
      .await
      .map_err(|e| ApiError::Internal(format!("photo write failed: {e}")))?;

    photo_url = Some(format!("/static/uploads/{stored_name}"));
  }

  let url =
    photo_url.ok_or_else(|| ApiError::BadRequest("no photo field in upload".to_string()))?;

  state
    .store
    .update_program(
      id,
      ProgramPatch { photo_url: Some(url.clone()), ..Default::default() },
    )
    .await
    .map_err(store_err)?;

  if let Some(obituary) = &view.obituary {
    let mut photos = obituary.photos.clone();
    photos.insert(0, url.clone());
    state
      .store
      .update_obituary(
        id,
        ObituaryPatch { photos: Some(photos), ..Default::default() },
      )
      .await
      .map_err(store_err)?;
  }

  Ok(Json(json!({ "photo_url": url })))
}

// ─── PDF generation ───────────────────────────────────────────────────────────

/// `GET /api/admin/program/{id}/obituary/pdf` — render the obituary
/// document, cache its path on the obituary row, sweep normalization temp
/// files, and return the PDF as a download.
///
/// Rendering failures are fatal for the request and leave no partial path
/// on the record; the cached PDF is a snapshot that later edits do not
/// invalidate.
pub async fn render_obituary_pdf<S>(
  State(state): State<AppState<S>>,
  _admin: CurrentAdmin,
  Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ProgramStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let view = view_by_id(&state, id).await?;
  let obituary = view.obituary.as_ref().ok_or_else(|| {
    ApiError::NotFound("No obituary found for this program".to_string())
  })?;

  let pdf_url = state.renderer.render(&view.program, obituary).await?;

  state
    .store
    .update_obituary(
      id,
      ObituaryPatch { pdf_url: Some(pdf_url.clone()), ..Default::default() },
    )
    .await
    .map_err(store_err)?;

  state.renderer.cleanup_temp_images();

  let path = state
    .renderer
    .storage()
    .resolve_static(&pdf_url)
    .ok_or_else(|| ApiError::Internal("PDF generation failed".to_string()))?;
  let bytes = tokio::fs::read(&path)
    .await
    .map_err(|_| ApiError::Internal("PDF generation failed".to_string()))?;

  let filename =
    format!("{}_obituary.pdf", safe_file_name(&view.program.deceased_name));
  Ok((
    [
      (header::CONTENT_TYPE, "application/pdf".to_string()),
      (
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{filename}\""),
      ),
    ],
    bytes,
  ))
}
