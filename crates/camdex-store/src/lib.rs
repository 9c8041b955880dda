//! camdex-store - SQLite/FTS5 storage for the camera index
//!
//! One SQLite file per tenant holds denormalized camera rows, local labels,
//! build metadata and an FTS5 table over the searchable fields.

mod schema;
mod sqlite;

pub use schema::{meta_keys, SCHEMA, SCHEMA_VERSION};
pub use sqlite::{build_index, patch_label, read_status, BuildSummary, CameraIndex};
