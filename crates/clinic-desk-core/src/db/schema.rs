//! SQLite schema definition.

/// Complete database schema for the record store.
///
/// Every collection is one JSON document keyed by its collection name, which
/// keeps the on-disk layout identical to the key/value store the UI shell
/// used before the core moved to SQLite.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Collections (one JSON array or value per key)
-- ============================================================================

CREATE TABLE IF NOT EXISTS collections (
    name TEXT PRIMARY KEY,
    value TEXT NOT NULL,                         -- UTF-8 JSON text
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Sequences (monotonic ID counters, one per collection)
-- ============================================================================

CREATE TABLE IF NOT EXISTS sequences (
    name TEXT PRIMARY KEY,
    value INTEGER NOT NULL DEFAULT 0 CHECK (value >= 0),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;
