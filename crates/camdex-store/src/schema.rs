//! Database schema definitions.

/// Schema SQL for the camera index. Every statement is idempotent.
pub const SCHEMA: &str = r#"
-- Build provenance and schema version
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Denormalized camera rows plus the original API object
CREATE TABLE IF NOT EXISTS cameras (
    camera_id TEXT PRIMARY KEY,
    name TEXT,
    site TEXT,
    model TEXT,
    serial TEXT,
    status TEXT,
    timezone TEXT,
    updated_at INTEGER,
    raw_json TEXT
);

-- Local labels; no foreign key so labels can exist for unindexed cameras
CREATE TABLE IF NOT EXISTS labels (
    camera_id TEXT PRIMARY KEY,
    label TEXT,
    updated_at INTEGER
);

-- FTS5 shadow table, maintained by hand on build and label patch
CREATE VIRTUAL TABLE IF NOT EXISTS cameras_fts USING fts5(
    camera_id UNINDEXED,
    name,
    site,
    label,
    model,
    serial,
    status,
    timezone,
    tokenize = 'unicode61'
);
"#;

/// Schema version for migrations.
pub const SCHEMA_VERSION: u32 = 1;

/// Metadata keys written on every build.
pub mod meta_keys {
    pub const SCHEMA_VERSION: &str = "schema_version";
    pub const BUILT_AT: &str = "built_at";
    pub const BASE_URL: &str = "base_url";
    pub const ORG_ID: &str = "org_id";
    pub const PROFILE: &str = "profile";
}
