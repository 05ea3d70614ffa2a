//! [`SqliteStore`] — the SQLite implementation of [`ProgramStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use memoria_core::{
  admin::{AdminUser, NewAdminUser},
  obituary::{NewObituary, Obituary, ObituaryPatch},
  program::{
    NewEvent, NewProgram, Program, ProgramEvent, ProgramPatch, ProgramView,
  },
  store::{ListQuery, ProgramStore},
};

use crate::{
  encode::{
    encode_dt, encode_photos, encode_tributes, RawAdmin, RawEvent, RawObituary,
    RawProgram,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Row-mapping helpers ─────────────────────────────────────────────────────

fn program_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawProgram> {
  Ok(RawProgram {
    program_id:       row.get(0)?,
    deceased_name:    row.get(1)?,
    date_of_birth:    row.get(2)?,
    date_of_death:    row.get(3)?,
    funeral_date:     row.get(4)?,
    funeral_location: row.get(5)?,
    photo_url:        row.get(6)?,
    access_id:        row.get(7)?,
    is_active:        row.get(8)?,
    created_at:       row.get(9)?,
    updated_at:       row.get(10)?,
  })
}

const PROGRAM_COLS: &str = "program_id, deceased_name, date_of_birth, \
   date_of_death, funeral_date, funeral_location, photo_url, access_id, \
   is_active, created_at, updated_at";

fn event_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEvent> {
  Ok(RawEvent {
    event_id:    row.get(0)?,
    program_id:  row.get(1)?,
    time:        row.get(2)?,
    title:       row.get(3)?,
    description: row.get(4)?,
    speaker:     row.get(5)?,
    order_index: row.get(6)?,
  })
}

const EVENT_COLS: &str =
  "event_id, program_id, time, title, description, speaker, order_index";

fn obituary_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawObituary> {
  Ok(RawObituary {
    obituary_id:     row.get(0)?,
    program_id:      row.get(1)?,
    biography:       row.get(2)?,
    family_details:  row.get(3)?,
    special_message: row.get(4)?,
    photos:          row.get(5)?,
    tributes:        row.get(6)?,
    pdf_url:         row.get(7)?,
    created_at:      row.get(8)?,
    updated_at:      row.get(9)?,
  })
}

const OBITUARY_COLS: &str = "obituary_id, program_id, biography, \
   family_details, special_message, photos, tributes, pdf_url, created_at, \
   updated_at";

fn admin_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawAdmin> {
  Ok(RawAdmin {
    admin_id:      row.get(0)?,
    username:      row.get(1)?,
    email:         row.get(2)?,
    password_hash: row.get(3)?,
    is_active:     row.get(4)?,
    is_superuser:  row.get(5)?,
    created_at:    row.get(6)?,
  })
}

const ADMIN_COLS: &str = "admin_id, username, email, password_hash, \
   is_active, is_superuser, created_at";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Memoria program store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fetch a program aggregate by an arbitrary WHERE clause over the
  /// `programs` table. `param` binds `?1`.
  async fn fetch_view(
    &self,
    where_clause: &'static str,
    param: rusqlite::types::Value,
  ) -> Result<Option<ProgramView>> {
    let (raw_program, raw_events, raw_obituary): (
      Option<RawProgram>,
      Vec<RawEvent>,
      Option<RawObituary>,
    ) = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {PROGRAM_COLS} FROM programs WHERE {where_clause}");
        let program = conn
          .query_row(&sql, rusqlite::params![param], program_row)
          .optional()?;

        let Some(program) = program else {
          return Ok((None, Vec::new(), None));
        };
        let program_id = program.program_id;

        let sql = format!(
          "SELECT {EVENT_COLS} FROM program_events
           WHERE program_id = ?1
           ORDER BY order_index, event_id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let events = stmt
          .query_map(rusqlite::params![program_id], event_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let sql =
          format!("SELECT {OBITUARY_COLS} FROM obituaries WHERE program_id = ?1");
        let obituary = conn
          .query_row(&sql, rusqlite::params![program_id], obituary_row)
          .optional()?;

        Ok((Some(program), events, obituary))
      })
      .await?;

    let Some(raw_program) = raw_program else {
      return Ok(None);
    };

    Ok(Some(ProgramView {
      program:  raw_program.into_program()?,
      events:   raw_events.into_iter().map(RawEvent::into_event).collect(),
      obituary: raw_obituary.map(RawObituary::into_obituary).transpose()?,
    }))
  }

  /// Check that a program row exists.
  async fn program_exists(&self, id: i64) -> Result<bool> {
    let exists: bool = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM programs WHERE program_id = ?1",
              rusqlite::params![id],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(exists)
  }
}

// ─── ProgramStore impl ───────────────────────────────────────────────────────

impl ProgramStore for SqliteStore {
  type Error = Error;

  // ── Programs ──────────────────────────────────────────────────────────────

  async fn create_program(
    &self,
    program: NewProgram,
    obituary: NewObituary,
  ) -> Result<ProgramView> {
    let access_id = Uuid::new_v4().to_string();
    let now_str = encode_dt(Utc::now());
    let photos_str = encode_photos(&obituary.photos)?;
    let tributes_str = encode_tributes(&obituary.tributes)?;

    let program_id: i64 = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO programs (
             deceased_name, date_of_birth, date_of_death, funeral_date,
             funeral_location, photo_url, access_id, is_active, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8)",
          rusqlite::params![
            program.deceased_name,
            program.date_of_birth,
            program.date_of_death,
            program.funeral_date,
            program.funeral_location,
            program.photo_url,
            access_id,
            now_str,
          ],
        )?;
        let program_id = tx.last_insert_rowid();

        tx.execute(
          "INSERT INTO obituaries (
             program_id, biography, family_details, special_message,
             photos, tributes, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            program_id,
            obituary.biography,
            obituary.family_details,
            obituary.special_message,
            photos_str,
            tributes_str,
            now_str,
          ],
        )?;
        tx.commit()?;
        Ok(program_id)
      })
      .await?;

    self
      .get_program(program_id)
      .await?
      .ok_or(Error::ProgramNotFound(program_id))
  }

  async fn get_program(&self, id: i64) -> Result<Option<ProgramView>> {
    self
      .fetch_view("program_id = ?1", rusqlite::types::Value::Integer(id))
      .await
  }

  async fn find_by_access_id(&self, access_id: &str) -> Result<Option<ProgramView>> {
    self
      .fetch_view(
        "access_id = ?1 AND is_active = 1",
        rusqlite::types::Value::Text(access_id.to_string()),
      )
      .await
  }

  async fn list_programs(&self, query: ListQuery) -> Result<Vec<Program>> {
    let limit = query.limit as i64;
    let offset = query.offset as i64;
    let include_inactive = query.include_inactive;

    let raws: Vec<RawProgram> = self
      .conn
      .call(move |conn| {
        let where_clause =
          if include_inactive { "" } else { "WHERE is_active = 1" };
        let sql = format!(
          "SELECT {PROGRAM_COLS} FROM programs
           {where_clause}
           ORDER BY created_at DESC, program_id DESC
           LIMIT ?1 OFFSET ?2"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![limit, offset], program_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProgram::into_program).collect()
  }

  async fn update_program(&self, id: i64, patch: ProgramPatch) -> Result<Program> {
    let mut merged = self
      .get_program(id)
      .await?
      .ok_or(Error::ProgramNotFound(id))?
      .program;

    if let Some(v) = patch.deceased_name {
      merged.deceased_name = v;
    }
    if patch.date_of_birth.is_some() {
      merged.date_of_birth = patch.date_of_birth;
    }
    if patch.date_of_death.is_some() {
      merged.date_of_death = patch.date_of_death;
    }
    if let Some(v) = patch.funeral_date {
      merged.funeral_date = v;
    }
    if let Some(v) = patch.funeral_location {
      merged.funeral_location = v;
    }
    if patch.photo_url.is_some() {
      merged.photo_url = patch.photo_url;
    }
    if let Some(v) = patch.is_active {
      merged.is_active = v;
    }
    merged.updated_at = Some(Utc::now());

    let row = merged.clone();
    let updated_str = merged.updated_at.map(encode_dt);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE programs SET
             deceased_name = ?1, date_of_birth = ?2, date_of_death = ?3,
             funeral_date = ?4, funeral_location = ?5, photo_url = ?6,
             is_active = ?7, updated_at = ?8
           WHERE program_id = ?9",
          rusqlite::params![
            row.deceased_name,
            row.date_of_birth,
            row.date_of_death,
            row.funeral_date,
            row.funeral_location,
            row.photo_url,
            row.is_active,
            updated_str,
            row.id,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(merged)
  }

  async fn delete_program(&self, id: i64) -> Result<()> {
    let deleted: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM programs WHERE program_id = ?1",
          rusqlite::params![id],
        )?)
      })
      .await?;

    if deleted == 0 {
      return Err(Error::ProgramNotFound(id));
    }
    Ok(())
  }

  // ── Events ────────────────────────────────────────────────────────────────

  async fn add_event(&self, program_id: i64, event: NewEvent) -> Result<ProgramEvent> {
    if !self.program_exists(program_id).await? {
      return Err(Error::ProgramNotFound(program_id));
    }

    let raw: RawEvent = self
      .conn
      .call(move |conn| {
        // Count-then-insert; concurrent appends may assign the same index.
        let count: i64 = conn.query_row(
          "SELECT COUNT(*) FROM program_events WHERE program_id = ?1",
          rusqlite::params![program_id],
          |row| row.get(0),
        )?;
        let order_index = count + 1;

        conn.execute(
          "INSERT INTO program_events (
             program_id, time, title, description, speaker, order_index
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            program_id,
            event.time,
            event.title,
            event.description,
            event.speaker,
            order_index,
          ],
        )?;

        Ok(RawEvent {
          event_id: conn.last_insert_rowid(),
          program_id,
          time: event.time,
          title: event.title,
          description: event.description,
          speaker: event.speaker,
          order_index,
        })
      })
      .await?;

    Ok(raw.into_event())
  }

  // ── Obituaries ────────────────────────────────────────────────────────────

  async fn update_obituary(
    &self,
    program_id: i64,
    patch: ObituaryPatch,
  ) -> Result<Obituary> {
    let view = self
      .get_program(program_id)
      .await?
      .ok_or(Error::ProgramNotFound(program_id))?;
    let mut merged = view.obituary.ok_or(Error::ObituaryMissing(program_id))?;

    if let Some(v) = patch.biography {
      merged.biography = v;
    }
    if patch.family_details.is_some() {
      merged.family_details = patch.family_details;
    }
    if patch.special_message.is_some() {
      merged.special_message = patch.special_message;
    }
    if let Some(v) = patch.photos {
      merged.photos = v;
    }
    if let Some(v) = patch.tributes {
      merged.tributes = v;
    }
    if patch.pdf_url.is_some() {
      merged.pdf_url = patch.pdf_url;
    }
    merged.updated_at = Some(Utc::now());

    let photos_str = encode_photos(&merged.photos)?;
    let tributes_str = encode_tributes(&merged.tributes)?;
    let updated_str = merged.updated_at.map(encode_dt);
    let row = merged.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE obituaries SET
             biography = ?1, family_details = ?2, special_message = ?3,
             photos = ?4, tributes = ?5, pdf_url = ?6, updated_at = ?7
           WHERE obituary_id = ?8",
          rusqlite::params![
            row.biography,
            row.family_details,
            row.special_message,
            photos_str,
            tributes_str,
            row.pdf_url,
            updated_str,
            row.id,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(merged)
  }

  // ── Admin accounts ────────────────────────────────────────────────────────

  async fn create_admin(&self, input: NewAdminUser) -> Result<AdminUser> {
    let username = input.username.clone();
    let email = input.email.clone();
    let (username_taken, email_taken): (bool, bool) = self
      .conn
      .call(move |conn| {
        let by_username: bool = conn
          .query_row(
            "SELECT 1 FROM admin_users WHERE username = ?1",
            rusqlite::params![username],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        let by_email: bool = conn
          .query_row(
            "SELECT 1 FROM admin_users WHERE email = ?1",
            rusqlite::params![email],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        Ok((by_username, by_email))
      })
      .await?;

    if username_taken {
      return Err(Error::UsernameTaken(input.username));
    }
    if email_taken {
      return Err(Error::EmailTaken(input.email));
    }

    let created_at = Utc::now();
    let created_str = encode_dt(created_at);
    let row = input.clone();
    let admin_id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO admin_users (
             username, email, password_hash, is_active, is_superuser, created_at
           ) VALUES (?1, ?2, ?3, 1, 0, ?4)",
          rusqlite::params![row.username, row.email, row.password_hash, created_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(AdminUser {
      id: admin_id,
      username: input.username,
      email: input.email,
      password_hash: input.password_hash,
      is_active: true,
      is_superuser: false,
      created_at,
    })
  }

  async fn find_admin(&self, username: &str) -> Result<Option<AdminUser>> {
    self.find_admin_by("username", username).await
  }

  async fn find_admin_by_email(&self, email: &str) -> Result<Option<AdminUser>> {
    self.find_admin_by("email", email).await
  }
}

impl SqliteStore {
  async fn find_admin_by(
    &self,
    column: &'static str,
    value: &str,
  ) -> Result<Option<AdminUser>> {
    let value = value.to_string();
    let raw: Option<RawAdmin> = self
      .conn
      .call(move |conn| {
        let sql =
          format!("SELECT {ADMIN_COLS} FROM admin_users WHERE {column} = ?1");
        Ok(
          conn
            .query_row(&sql, rusqlite::params![value], admin_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAdmin::into_admin).transpose()
  }
}
