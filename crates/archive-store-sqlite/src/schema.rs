//! SQL schema for the archive SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS works (
    work_id        TEXT PRIMARY KEY,
    title          TEXT NOT NULL,
    author         TEXT NOT NULL,
    summary        TEXT NOT NULL DEFAULT '',
    rating         TEXT NOT NULL,          -- display label, e.g. 'Not Rated'
    fandoms        TEXT NOT NULL DEFAULT '[]',
    relationships  TEXT NOT NULL DEFAULT '[]',
    characters     TEXT NOT NULL DEFAULT '[]',
    freeforms      TEXT NOT NULL DEFAULT '[]',
    token_hash     TEXT NOT NULL,          -- hex SHA-256 of the ownership token
    word_count     INTEGER NOT NULL DEFAULT 0,
    chapter_count  INTEGER NOT NULL DEFAULT 0,
    kudos_count    INTEGER NOT NULL DEFAULT 0,
    hit_count      INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL,          -- RFC 3339 UTC, fixed width
    updated_at     TEXT NOT NULL
);

-- Positions are assigned once and never reused.
CREATE TABLE IF NOT EXISTS chapters (
    chapter_id  TEXT PRIMARY KEY,
    work_id     TEXT NOT NULL REFERENCES works(work_id) ON DELETE CASCADE,
    title       TEXT,
    body        TEXT NOT NULL,             -- raw submission, never sanitized
    format      TEXT NOT NULL,             -- 'rich_text' | 'html'
    position    INTEGER NOT NULL,
    word_count  INTEGER NOT NULL,
    created_at  TEXT NOT NULL,
    UNIQUE (work_id, position),
    CHECK  (position >= 1)
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id     TEXT PRIMARY KEY,
    work_id        TEXT NOT NULL REFERENCES works(work_id) ON DELETE CASCADE,
    name           TEXT NOT NULL,
    authenticated  INTEGER NOT NULL DEFAULT 0,
    body           TEXT NOT NULL,
    created_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS chapters_work_idx ON chapters(work_id);
CREATE INDEX IF NOT EXISTS comments_work_idx ON comments(work_id);
CREATE INDEX IF NOT EXISTS works_created_idx ON works(created_at);

PRAGMA user_version = 1;
";
