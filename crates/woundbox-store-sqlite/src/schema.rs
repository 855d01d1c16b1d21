//! SQL schema for the Woundbox SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version` — an
//! explicit, versioned migration step that never runs inside request
//! handling. Future migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,    -- argon2 PHC string
    full_name     TEXT NOT NULL,
    email         TEXT,
    role          TEXT NOT NULL,    -- 'admin' | 'annotator'
    is_active     INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL,
    last_login    TEXT
);

-- Read-only here: rows are created by the upstream ingestion process.
CREATE TABLE IF NOT EXISTS wound_assessments (
    assessment_id INTEGER PRIMARY KEY,
    wound_type    TEXT,
    body_location TEXT,
    patient_id    TEXT,
    storage_path  TEXT NOT NULL,
    image         BLOB
);

-- The full set for an assessment is replaced atomically on every save.
-- category/location may be empty only in legacy imported rows; saves
-- validate them as non-empty.
CREATE TABLE IF NOT EXISTS annotations (
    annotation_id    TEXT PRIMARY KEY,
    assessment_id    INTEGER NOT NULL,
    category         TEXT,
    location_label   TEXT,
    body_map_id      TEXT NOT NULL DEFAULT '',
    x                INTEGER NOT NULL,
    y                INTEGER NOT NULL,
    width            INTEGER NOT NULL,
    height           INTEGER NOT NULL,
    created_by       TEXT NOT NULL,
    created_at       TEXT NOT NULL,   -- ISO 8601 UTC
    last_modified_by TEXT NOT NULL,
    last_modified_at TEXT NOT NULL,
    doctor_notes     TEXT NOT NULL DEFAULT '',
    severity         TEXT NOT NULL DEFAULT ''
);

-- One row per (assessment, queue); insertion is idempotent.
CREATE TABLE IF NOT EXISTS triage_entries (
    assessment_id INTEGER NOT NULL,
    queue         TEXT NOT NULL,      -- 'review' | 'omit'
    requested_by  TEXT NOT NULL,
    requested_at  TEXT NOT NULL,
    PRIMARY KEY (assessment_id, queue)
);

CREATE INDEX IF NOT EXISTS annotations_assessment_idx ON annotations(assessment_id);
CREATE INDEX IF NOT EXISTS annotations_category_idx   ON annotations(category);
CREATE INDEX IF NOT EXISTS triage_queue_idx           ON triage_entries(queue, requested_at);

PRAGMA user_version = 1;
";
