//! SQL schema for the Weft SQLite store.
//!
//! Executed once at connection startup; idempotent thanks to
//! `CREATE TABLE IF NOT EXISTS`. Future migrations will be gated on
//! `PRAGMA user_version`.
//!
//! Layout: two catalog stores (`table_definitions`, `column_definitions`),
//! one row anchor (`row_metadata`), and one value partition per storage
//! class. Partition entries are append-only — superseding a value flips the
//! old entry's `is_current` flag and inserts the next version; nothing is
//! updated in place. The partial unique index per partition is the backstop
//! for the exactly-one-current invariant.

pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS table_definitions (
    id          INTEGER PRIMARY KEY,
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL,      -- RFC 3339 UTC
    deleted_at  TEXT                -- set on soft delete
);

CREATE TABLE IF NOT EXISTS column_definitions (
    id          INTEGER PRIMARY KEY,
    table_id    INTEGER NOT NULL REFERENCES table_definitions(id),
    name        TEXT NOT NULL,
    data_type   TEXT NOT NULL,      -- 'text' | 'integer' | 'real' | 'boolean' | 'json' | 'timestamp'
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    deleted_at  TEXT
);

-- One anchor per logical row: earliest write, latest write, soft-delete
-- state. The row itself is the join key threading the partitions.
CREATE TABLE IF NOT EXISTS row_metadata (
    row_id      TEXT NOT NULL,
    table_id    INTEGER NOT NULL REFERENCES table_definitions(id),
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    deleted_at  TEXT,
    PRIMARY KEY (row_id, table_id)
);

CREATE TABLE IF NOT EXISTS text_values (
    row_id      TEXT NOT NULL,
    table_id    INTEGER NOT NULL,
    column_id   INTEGER NOT NULL,
    version     INTEGER NOT NULL,
    value       TEXT,
    is_current  INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL,
    updated_at  TEXT,               -- set when a later version supersedes
    PRIMARY KEY (row_id, table_id, column_id, version)
);

CREATE TABLE IF NOT EXISTS integer_values (
    row_id      TEXT NOT NULL,
    table_id    INTEGER NOT NULL,
    column_id   INTEGER NOT NULL,
    version     INTEGER NOT NULL,
    value       INTEGER,
    is_current  INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL,
    updated_at  TEXT,
    PRIMARY KEY (row_id, table_id, column_id, version)
);

CREATE TABLE IF NOT EXISTS real_values (
    row_id      TEXT NOT NULL,
    table_id    INTEGER NOT NULL,
    column_id   INTEGER NOT NULL,
    version     INTEGER NOT NULL,
    value       REAL,
    is_current  INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL,
    updated_at  TEXT,
    PRIMARY KEY (row_id, table_id, column_id, version)
);

CREATE TABLE IF NOT EXISTS timestamp_values (
    row_id      TEXT NOT NULL,
    table_id    INTEGER NOT NULL,
    column_id   INTEGER NOT NULL,
    version     INTEGER NOT NULL,
    value       TEXT,               -- RFC 3339 UTC
    is_current  INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL,
    updated_at  TEXT,
    PRIMARY KEY (row_id, table_id, column_id, version)
);

-- Exactly one current entry per cell, enforced per partition.
CREATE UNIQUE INDEX IF NOT EXISTS idx_text_current
    ON text_values (row_id, table_id, column_id) WHERE is_current = 1;
CREATE INDEX IF NOT EXISTS idx_text_active
    ON text_values (table_id, column_id, row_id) WHERE is_current = 1;

CREATE UNIQUE INDEX IF NOT EXISTS idx_integer_current
    ON integer_values (row_id, table_id, column_id) WHERE is_current = 1;
CREATE INDEX IF NOT EXISTS idx_integer_active
    ON integer_values (table_id, column_id, row_id) WHERE is_current = 1;

CREATE UNIQUE INDEX IF NOT EXISTS idx_real_current
    ON real_values (row_id, table_id, column_id) WHERE is_current = 1;
CREATE INDEX IF NOT EXISTS idx_real_active
    ON real_values (table_id, column_id, row_id) WHERE is_current = 1;

CREATE UNIQUE INDEX IF NOT EXISTS idx_timestamp_current
    ON timestamp_values (row_id, table_id, column_id) WHERE is_current = 1;
CREATE INDEX IF NOT EXISTS idx_timestamp_active
    ON timestamp_values (table_id, column_id, row_id) WHERE is_current = 1;

CREATE INDEX IF NOT EXISTS idx_table_definitions_name
    ON table_definitions (name);
CREATE INDEX IF NOT EXISTS idx_column_definitions_lookup
    ON column_definitions (table_id, name);
CREATE INDEX IF NOT EXISTS idx_row_metadata_active
    ON row_metadata (table_id) WHERE deleted_at IS NULL;

PRAGMA user_version = 1;
";
