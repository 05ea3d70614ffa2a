//! The `ProgramStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `memoria-store-sqlite`). Higher layers (`memoria-server`) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  admin::{AdminUser, NewAdminUser},
  obituary::{NewObituary, Obituary, ObituaryPatch},
  program::{NewEvent, NewProgram, Program, ProgramEvent, ProgramPatch, ProgramView},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`ProgramStore::list_programs`].
#[derive(Debug, Clone)]
pub struct ListQuery {
  /// Include deactivated programs. Admin listings set this; public listings
  /// never do.
  pub include_inactive: bool,
  pub offset:           usize,
  pub limit:            usize,
}

impl Default for ListQuery {
  fn default() -> Self {
    Self { include_inactive: false, offset: 0, limit: 100 }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Memoria storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ProgramStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Programs ──────────────────────────────────────────────────────────

  /// Create a program and its obituary in a single transaction.
  ///
  /// The store mints the program's unique `access_id` (a random UUID) and
  /// both rows' timestamps. Returns the full aggregate.
  fn create_program(
    &self,
    program: NewProgram,
    obituary: NewObituary,
  ) -> impl Future<Output = Result<ProgramView, Self::Error>> + Send + '_;

  /// Retrieve a program aggregate by numeric id, active or not.
  /// Returns `None` if not found.
  fn get_program(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<ProgramView>, Self::Error>> + Send + '_;

  /// Retrieve an **active** program aggregate by its public access id.
  ///
  /// Used by the QR-resolved public routes; deactivated programs are
  /// invisible here.
  fn find_by_access_id<'a>(
    &'a self,
    access_id: &'a str,
  ) -> impl Future<Output = Result<Option<ProgramView>, Self::Error>> + Send + 'a;

  /// List programs, newest first.
  fn list_programs(
    &self,
    query: ListQuery,
  ) -> impl Future<Output = Result<Vec<Program>, Self::Error>> + Send + '_;

  /// Apply a partial update and stamp `updated_at`. Errors if the program
  /// does not exist.
  fn update_program(
    &self,
    id: i64,
    patch: ProgramPatch,
  ) -> impl Future<Output = Result<Program, Self::Error>> + Send + '_;

  /// Delete a program. Its events and obituary go with it; files on disk
  /// (photo, QR, PDF) are the caller's concern.
  fn delete_program(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Events ────────────────────────────────────────────────────────────

  /// Append an event to a program's schedule, assigning
  /// `order_index = current event count + 1`.
  ///
  /// Two concurrent appends to the same program may observe the same count
  /// and produce duplicate indices; that is tolerated display-order
  /// ambiguity, not a stronger invariant.
  fn add_event(
    &self,
    program_id: i64,
    event: NewEvent,
  ) -> impl Future<Output = Result<ProgramEvent, Self::Error>> + Send + '_;

  // ── Obituaries ────────────────────────────────────────────────────────

  /// Apply a partial update to a program's obituary and stamp `updated_at`.
  /// Errors if the program or its obituary does not exist.
  fn update_obituary(
    &self,
    program_id: i64,
    patch: ObituaryPatch,
  ) -> impl Future<Output = Result<Obituary, Self::Error>> + Send + '_;

  // ── Admin accounts ────────────────────────────────────────────────────

  /// Create an administrator account. Errors if the username or email is
  /// already taken.
  fn create_admin(
    &self,
    input: NewAdminUser,
  ) -> impl Future<Output = Result<AdminUser, Self::Error>> + Send + '_;

  /// Look up an administrator by username. Returns `None` if not found.
  fn find_admin<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<AdminUser>, Self::Error>> + Send + 'a;

  /// Look up an administrator by email. Used by registration to report
  /// which of the two unique fields collided.
  fn find_admin_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<AdminUser>, Self::Error>> + Send + 'a;
}
