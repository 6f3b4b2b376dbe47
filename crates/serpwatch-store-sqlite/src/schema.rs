//! SQL schema for the serpwatch SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS keywords (
    keyword     TEXT PRIMARY KEY,  -- normalised phrase
    genre       TEXT,
    url         TEXT,
    priority    TEXT,
    notes       TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

-- Exactly one row per keyword, overwritten in place by every commit.
-- Keywords checked from a file need not be catalogued, so there is no
-- foreign key to `keywords`.
CREATE TABLE IF NOT EXISTS rankings (
    keyword          TEXT PRIMARY KEY,
    last_rank        INTEGER,         -- NULL: outside the observed depth
    last_url         TEXT,
    last_checked_at  TEXT NOT NULL,
    CHECK ((last_rank IS NULL) = (last_url IS NULL))
);

-- Append-only competitor history; a retried commit collapses onto the same key.
CREATE TABLE IF NOT EXISTS competitors (
    keyword     TEXT NOT NULL,
    url         TEXT NOT NULL,
    rank        INTEGER NOT NULL,
    checked_at  TEXT NOT NULL,
    PRIMARY KEY (keyword, url, checked_at)
);

CREATE INDEX IF NOT EXISTS competitors_keyword_checked_idx
    ON competitors(keyword, checked_at);
CREATE INDEX IF NOT EXISTS keywords_genre_idx ON keywords(genre);

PRAGMA user_version = 1;
";
