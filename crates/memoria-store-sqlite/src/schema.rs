//! SQL schema for the Memoria SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! the `PRAGMA user_version` number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS programs (
    program_id        INTEGER PRIMARY KEY AUTOINCREMENT,
    deceased_name     TEXT NOT NULL,
    date_of_birth     TEXT,            -- free text, displayed verbatim
    date_of_death     TEXT,
    funeral_date      TEXT NOT NULL,
    funeral_location  TEXT NOT NULL,
    photo_url         TEXT,
    access_id         TEXT NOT NULL UNIQUE,  -- random UUID; immutable
    is_active         INTEGER NOT NULL DEFAULT 1,
    created_at        TEXT NOT NULL,   -- ISO 8601 UTC; store-assigned
    updated_at        TEXT
);

CREATE TABLE IF NOT EXISTS program_events (
    event_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    program_id   INTEGER NOT NULL REFERENCES programs(program_id) ON DELETE CASCADE,
    time         TEXT NOT NULL,        -- free-text label, e.g. '10:00 AM'
    title        TEXT NOT NULL,
    description  TEXT,
    speaker      TEXT,
    order_index  INTEGER NOT NULL      -- display order; duplicates tolerated
);

-- Exactly zero-or-one obituary per program.
CREATE TABLE IF NOT EXISTS obituaries (
    obituary_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    program_id      INTEGER NOT NULL UNIQUE REFERENCES programs(program_id) ON DELETE CASCADE,
    biography       TEXT NOT NULL,
    family_details  TEXT,
    special_message TEXT,
    photos          TEXT NOT NULL DEFAULT '[]',  -- JSON array of URL strings
    tributes        TEXT NOT NULL DEFAULT '[]',  -- JSON array of tribute objects
    pdf_url         TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT
);

CREATE TABLE IF NOT EXISTS admin_users (
    admin_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,       -- argon2 PHC string
    is_active     INTEGER NOT NULL DEFAULT 1,
    is_superuser  INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS programs_access_idx ON programs(access_id);
CREATE INDEX IF NOT EXISTS programs_created_idx ON programs(created_at);
CREATE INDEX IF NOT EXISTS events_program_idx  ON program_events(program_id);

PRAGMA user_version = 1;
";
