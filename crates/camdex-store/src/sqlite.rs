//! SQLite-based camera index.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Transaction};
use tracing::{debug, info};

use camdex_core::{
    unix_now, CameraRecord, IndexError, IndexStatus, LabelMap, Provenance, RawCamera, Result,
    SearchHit,
};

use crate::schema::{meta_keys, SCHEMA, SCHEMA_VERSION};

/// Outcome of a full rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Camera rows written.
    pub indexed: usize,

    /// Input records dropped for lack of a camera ID.
    pub skipped: usize,

    /// Label rows written.
    pub labeled: usize,

    /// Timestamp recorded as `built_at`.
    pub built_at: i64,
}

/// A camera index backed by one SQLite file.
///
/// The schema is ensured on every open, so any handle is ready for builds,
/// queries and label patches.
pub struct CameraIndex {
    conn: Connection,
    path: PathBuf,
}

impl CameraIndex {
    /// Open or create the index at `path`, creating parent directories.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| IndexError::database(format!("Failed to open index: {}", e)))?;

        Self::init(conn, path)
    }

    /// Open an index that must already exist.
    ///
    /// Fails with [`IndexError::IndexNotFound`] when the file is absent.
    pub fn open_existing(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(IndexError::not_found(path));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| IndexError::database(format!("Failed to open index: {}", e)))?;

        Self::init(conn, path)
    }

    /// Open an in-memory index (for testing).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| IndexError::database(format!("Failed to open in-memory index: {}", e)))?;

        Self::init(conn, Path::new(":memory:"))
    }

    fn init(conn: Connection, path: &Path) -> Result<Self> {
        Self::ensure_schema(&conn)?;
        debug!("Camera index opened at {:?}", path);

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Create all tables if absent and apply performance pragmas.
    ///
    /// Safe to call on every open. Pragmas are best-effort: a backend that
    /// rejects them still gets a usable schema.
    pub fn ensure_schema(conn: &Connection) -> Result<()> {
        Self::configure_connection(conn);

        conn.execute_batch(SCHEMA)
            .map_err(|e| IndexError::database(format!("Failed to initialize schema: {}", e)))?;

        Ok(())
    }

    fn configure_connection(conn: &Connection) {
        if let Err(e) =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
        {
            debug!("journal_mode=WAL not applied: {}", e);
        }
        if let Err(e) = conn.pragma_update(None, "synchronous", "NORMAL") {
            debug!("synchronous=NORMAL not applied: {}", e);
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the whole index with `records` in one transaction.
    pub fn rebuild(
        &mut self,
        records: &[RawCamera],
        labels: &LabelMap,
        provenance: &Provenance,
    ) -> Result<BuildSummary> {
        self.rebuild_at(records, labels, provenance, unix_now())
    }

    /// Like [`rebuild`](Self::rebuild) with an explicit build timestamp.
    pub fn rebuild_at(
        &mut self,
        records: &[RawCamera],
        labels: &LabelMap,
        provenance: &Provenance,
        now: i64,
    ) -> Result<BuildSummary> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| IndexError::database(format!("Failed to begin rebuild: {}", e)))?;

        for table in ["cameras", "labels", "cameras_fts"] {
            tx.execute(&format!("DELETE FROM {}", table), [])
                .map_err(|e| IndexError::database(format!("Failed to clear {}: {}", table, e)))?;
        }

        Self::write_meta(&tx, meta_keys::SCHEMA_VERSION, &SCHEMA_VERSION.to_string())?;
        Self::write_meta(&tx, meta_keys::BUILT_AT, &now.to_string())?;
        Self::write_meta(&tx, meta_keys::BASE_URL, &provenance.base_url)?;
        Self::write_meta(&tx, meta_keys::ORG_ID, &provenance.org_id)?;
        Self::write_meta(&tx, meta_keys::PROFILE, &provenance.profile)?;

        let mut summary = BuildSummary {
            built_at: now,
            ..BuildSummary::default()
        };

        {
            let mut camera_stmt = tx
                .prepare(
                    r#"
                    INSERT INTO cameras (camera_id, name, site, model, serial, status,
                                         timezone, updated_at, raw_json)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    "#,
                )
                .map_err(|e| IndexError::database(e.to_string()))?;

            let mut label_stmt = tx
                .prepare("INSERT INTO labels (camera_id, label, updated_at) VALUES (?1, ?2, ?3)")
                .map_err(|e| IndexError::database(e.to_string()))?;

            let mut fts_stmt = tx
                .prepare(
                    r#"
                    INSERT INTO cameras_fts (camera_id, name, site, label, model, serial,
                                             status, timezone)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    "#,
                )
                .map_err(|e| IndexError::database(e.to_string()))?;

            for raw in records {
                let Some(camera) = CameraRecord::from_raw(raw.clone()) else {
                    summary.skipped += 1;
                    continue;
                };

                let raw_json = serde_json::to_string(&camera.raw)?;

                camera_stmt
                    .execute(params![
                        camera.camera_id,
                        camera.name,
                        camera.site,
                        camera.model,
                        camera.serial,
                        camera.status,
                        camera.timezone,
                        now,
                        raw_json,
                    ])
                    .map_err(|e| {
                        IndexError::database(format!(
                            "Failed to insert camera {}: {}",
                            camera.camera_id, e
                        ))
                    })?;

                let label = labels
                    .get(&camera.camera_id)
                    .map(|l| l.trim())
                    .unwrap_or_default();

                if !label.is_empty() {
                    label_stmt
                        .execute(params![camera.camera_id, label, now])
                        .map_err(|e| {
                            IndexError::database(format!(
                                "Failed to insert label for {}: {}",
                                camera.camera_id, e
                            ))
                        })?;
                    summary.labeled += 1;
                }

                fts_stmt
                    .execute(params![
                        camera.camera_id,
                        camera.name,
                        camera.site,
                        label,
                        camera.model,
                        camera.serial,
                        camera.status,
                        camera.timezone,
                    ])
                    .map_err(|e| {
                        IndexError::database(format!(
                            "Failed to index camera {}: {}",
                            camera.camera_id, e
                        ))
                    })?;

                summary.indexed += 1;
            }
        }

        tx.commit()
            .map_err(|e| IndexError::database(format!("Failed to commit rebuild: {}", e)))?;

        info!(
            "Rebuilt camera index at {:?}: {} cameras, {} labels, {} skipped",
            self.path, summary.indexed, summary.labeled, summary.skipped
        );
        Ok(summary)
    }

    fn write_meta(tx: &Transaction<'_>, key: &str, value: &str) -> Result<()> {
        tx.execute(
            r#"
            INSERT INTO meta (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
            params![key, value],
        )
        .map_err(|e| IndexError::database(format!("Failed to write meta {}: {}", key, e)))?;
        Ok(())
    }

    /// Read one metadata value.
    pub fn meta(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM meta WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| IndexError::database(e.to_string()))
    }

    /// Recorded schema version, 0 when the index was never built.
    pub fn schema_version(&self) -> Result<u32> {
        Ok(self
            .meta(meta_keys::SCHEMA_VERSION)?
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0))
    }

    /// Reject indexes written by a newer, incompatible layout.
    pub fn check_schema_version(&self) -> Result<()> {
        let version = self.schema_version()?;
        if version > SCHEMA_VERSION {
            return Err(IndexError::database(format!(
                "index schema version {} is newer than supported version {} (rebuild the index)",
                version, SCHEMA_VERSION
            )));
        }
        Ok(())
    }

    /// Metadata and row counts.
    pub fn status(&self) -> Result<IndexStatus> {
        let text = |key: &str| -> Result<String> { Ok(self.meta(key)?.unwrap_or_default()) };

        let count = |table: &str| -> Result<u64> {
            let n: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
                .map_err(|e| IndexError::database(format!("Failed to count {}: {}", table, e)))?;
            Ok(n.max(0) as u64)
        };

        Ok(IndexStatus {
            exists: true,
            path: self.path.clone(),
            schema_version: self.schema_version()?,
            built_at: text(meta_keys::BUILT_AT)?.trim().parse().unwrap_or(0),
            camera_count: count("cameras")?,
            label_count: count("labels")?,
            base_url: text(meta_keys::BASE_URL)?,
            org_id: text(meta_keys::ORG_ID)?,
            profile: text(meta_keys::PROFILE)?,
        })
    }

    /// Run an FTS5 match expression, best match first.
    ///
    /// Rows whose stored record no longer decodes are skipped.
    pub fn search_match(&self, match_expr: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let mut stmt = self
            .conn
            .prepare(
                r#"
                SELECT c.raw_json, cameras_fts.camera_id, bm25(cameras_fts) AS rank
                FROM cameras_fts
                JOIN cameras c ON c.camera_id = cameras_fts.camera_id
                WHERE cameras_fts MATCH ?1
                ORDER BY rank ASC
                LIMIT ?2
                "#,
            )
            .map_err(|e| IndexError::database(e.to_string()))?;

        let rows = stmt
            .query_map(params![match_expr, limit as i64], |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                ))
            })
            .map_err(|e| IndexError::database(format!("Search failed: {}", e)))?;

        let mut hits = Vec::new();
        for row in rows {
            let (raw_json, camera_id, rank) =
                row.map_err(|e| IndexError::database(format!("Search failed: {}", e)))?;

            let camera = match raw_json
                .as_deref()
                .map(serde_json::from_str::<RawCamera>)
            {
                Some(Ok(camera)) => camera,
                Some(Err(e)) => {
                    debug!("Skipping camera {} with undecodable record: {}", camera_id, e);
                    continue;
                }
                None => {
                    debug!("Skipping camera {} with no stored record", camera_id);
                    continue;
                }
            };

            hits.push(SearchHit {
                camera_id,
                rank,
                camera,
            });
        }

        debug!("Match {:?} returned {} hits", match_expr, hits.len());
        Ok(hits)
    }

    /// Set or clear one label and regenerate that camera's FTS row.
    ///
    /// Returns whether the camera is indexed (and so searchable by the label).
    /// All changes happen in one transaction.
    pub fn apply_label(&mut self, camera_id: &str, label: Option<&str>) -> Result<bool> {
        let camera_id = camera_id.trim();
        if camera_id.is_empty() {
            return Ok(false);
        }
        let label = label.map(str::trim).filter(|l| !l.is_empty());

        let tx = self
            .conn
            .transaction()
            .map_err(|e| IndexError::database(e.to_string()))?;

        match label {
            Some(label) => {
                tx.execute(
                    r#"
                    INSERT INTO labels (camera_id, label, updated_at) VALUES (?1, ?2, ?3)
                    ON CONFLICT(camera_id) DO UPDATE SET
                        label = excluded.label,
                        updated_at = excluded.updated_at
                    "#,
                    params![camera_id, label, unix_now()],
                )
                .map_err(|e| IndexError::database(format!("Failed to upsert label: {}", e)))?;
            }
            None => {
                tx.execute("DELETE FROM labels WHERE camera_id = ?1", params![camera_id])
                    .map_err(|e| IndexError::database(format!("Failed to delete label: {}", e)))?;
            }
        }

        tx.execute("DELETE FROM cameras_fts WHERE camera_id = ?1", params![camera_id])
            .map_err(|e| IndexError::database(format!("Failed to clear FTS row: {}", e)))?;

        let inserted = tx
            .execute(
                r#"
                INSERT INTO cameras_fts (camera_id, name, site, label, model, serial,
                                         status, timezone)
                SELECT c.camera_id, c.name, c.site, COALESCE(l.label, ''), c.model,
                       c.serial, c.status, c.timezone
                FROM cameras c
                LEFT JOIN labels l ON l.camera_id = c.camera_id
                WHERE c.camera_id = ?1
                "#,
                params![camera_id],
            )
            .map_err(|e| IndexError::database(format!("Failed to rebuild FTS row: {}", e)))?;

        tx.commit()
            .map_err(|e| IndexError::database(e.to_string()))?;

        debug!("Patched label for {} (indexed: {})", camera_id, inserted > 0);
        Ok(inserted > 0)
    }
}

/// Rebuild the index at `path` from a freshly fetched record set.
pub fn build_index(
    path: &Path,
    records: &[RawCamera],
    labels: &LabelMap,
    provenance: &Provenance,
) -> Result<BuildSummary> {
    let mut index = CameraIndex::create(path)?;
    index.rebuild(records, labels, provenance)
}

/// Read status for the index at `path`.
///
/// Fails with [`IndexError::IndexNotFound`] when no index was built there.
pub fn read_status(path: &Path) -> Result<IndexStatus> {
    CameraIndex::open_existing(path)?.status()
}

/// Best-effort label update for the index at `path`.
///
/// Never reports failure. When the patch cannot be applied the index is left
/// untouched and the cause is logged.
pub fn patch_label(path: &Path, camera_id: &str, label: Option<&str>) {
    if camera_id.trim().is_empty() || !path.is_file() {
        return;
    }

    let outcome = CameraIndex::open_existing(path).and_then(|mut index| {
        index.check_schema_version()?;
        index.apply_label(camera_id, label)
    });

    match outcome {
        Ok(true) => debug!("Refreshed search row for {}", camera_id),
        Ok(false) => debug!("Camera {} is not indexed; label stored only", camera_id),
        Err(e) => debug!("Ignoring index label patch failure for {}: {}", camera_id, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    fn raw(value: Value) -> RawCamera {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn sample_records() -> Vec<RawCamera> {
        vec![
            raw(json!({
                "camera_id": "cam-1",
                "name": "North Door",
                "site": "Cathedral",
                "model": "D40",
            })),
            raw(json!({"camera_id": "cam-2", "name": "Lobby", "site": "HQ"})),
        ]
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Log output emitted at WARN or above while `f` runs.
    fn warnings_during(f: impl FnOnce()) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);

        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    fn provenance() -> Provenance {
        Provenance::new("https://api.verkada.com", "ORG", "default")
    }

    fn fts_ids(index: &CameraIndex) -> Vec<String> {
        let mut stmt = index
            .conn
            .prepare("SELECT camera_id FROM cameras_fts ORDER BY camera_id")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<String>, _>>()
            .unwrap()
    }

    fn fts_label(index: &CameraIndex, camera_id: &str) -> Option<String> {
        index
            .conn
            .query_row(
                "SELECT label FROM cameras_fts WHERE camera_id = ?1",
                params![camera_id],
                |row| row.get(0),
            )
            .optional()
            .unwrap()
    }

    #[test]
    fn test_open_memory() {
        let index = CameraIndex::open_memory().unwrap();
        let status = index.status().unwrap();
        assert_eq!(status.camera_count, 0);
        assert_eq!(status.schema_version, 0);
    }

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let index = CameraIndex::open_memory().unwrap();
        CameraIndex::ensure_schema(&index.conn).unwrap();
        CameraIndex::ensure_schema(&index.conn).unwrap();
    }

    #[test]
    fn test_rebuild_writes_all_tables() {
        let mut index = CameraIndex::open_memory().unwrap();
        let labels = LabelMap::from([("cam-2".to_string(), "Front desk".to_string())]);

        let summary = index
            .rebuild_at(&sample_records(), &labels, &provenance(), 1_700_000_000)
            .unwrap();
        assert_eq!(summary.indexed, 2);
        assert_eq!(summary.labeled, 1);
        assert_eq!(summary.skipped, 0);

        let status = index.status().unwrap();
        assert_eq!(status.camera_count, 2);
        assert_eq!(status.label_count, 1);
        assert_eq!(status.schema_version, SCHEMA_VERSION);
        assert_eq!(status.built_at, 1_700_000_000);
        assert_eq!(status.org_id, "ORG");
        assert_eq!(status.profile, "default");

        assert_eq!(fts_ids(&index), vec!["cam-1", "cam-2"]);
        assert_eq!(fts_label(&index, "cam-2").as_deref(), Some("Front desk"));
        assert_eq!(fts_label(&index, "cam-1").as_deref(), Some(""));
    }

    #[test]
    fn test_rebuild_skips_records_without_id() {
        let mut index = CameraIndex::open_memory().unwrap();
        let mut records = sample_records();
        records.push(raw(json!({"name": "Ghost"})));
        records.push(raw(json!({"camera_id": "  ", "name": "Blank"})));

        let summary = index
            .rebuild(&records, &LabelMap::new(), &provenance())
            .unwrap();
        assert_eq!(summary.indexed, 2);
        assert_eq!(summary.skipped, 2);
    }

    #[test]
    fn test_blank_labels_are_not_stored() {
        let mut index = CameraIndex::open_memory().unwrap();
        let labels = LabelMap::from([("cam-1".to_string(), "   ".to_string())]);
        let summary = index
            .rebuild(&sample_records(), &labels, &provenance())
            .unwrap();
        assert_eq!(summary.labeled, 0);
        assert_eq!(index.status().unwrap().label_count, 0);
    }

    #[test]
    fn test_failed_rebuild_keeps_previous_state() {
        let mut index = CameraIndex::open_memory().unwrap();
        index
            .rebuild_at(&sample_records(), &LabelMap::new(), &provenance(), 100)
            .unwrap();

        // Duplicate IDs violate the primary key and abort the transaction.
        let dupes = vec![
            raw(json!({"camera_id": "cam-9"})),
            raw(json!({"camera_id": "cam-9"})),
        ];
        let err = index
            .rebuild_at(&dupes, &LabelMap::new(), &provenance(), 200)
            .unwrap_err();
        assert_eq!(err.error_code(), "DATABASE_ERROR");

        let status = index.status().unwrap();
        assert_eq!(status.camera_count, 2);
        assert_eq!(status.built_at, 100);
        assert_eq!(fts_ids(&index), vec!["cam-1", "cam-2"]);
    }

    #[test]
    fn test_rebuild_with_empty_set_clears_rows() {
        let mut index = CameraIndex::open_memory().unwrap();
        let labels = LabelMap::from([("cam-2".to_string(), "Front desk".to_string())]);
        index
            .rebuild_at(&sample_records(), &labels, &provenance(), 100)
            .unwrap();
        index
            .rebuild_at(&[], &LabelMap::new(), &provenance(), 200)
            .unwrap();

        let status = index.status().unwrap();
        assert_eq!(status.camera_count, 0);
        assert_eq!(status.label_count, 0);
        assert_eq!(status.built_at, 200);
        assert!(fts_ids(&index).is_empty());
    }

    #[test]
    fn test_search_match_returns_raw_records() {
        let mut index = CameraIndex::open_memory().unwrap();
        index
            .rebuild(&sample_records(), &LabelMap::new(), &provenance())
            .unwrap();

        let hits = index.search_match("cathedral*", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].camera_id, "cam-1");
        assert_eq!(hits[0].camera["model"], json!("D40"));
    }

    #[test]
    fn test_search_skips_undecodable_rows() {
        let mut index = CameraIndex::open_memory().unwrap();
        index
            .rebuild(&sample_records(), &LabelMap::new(), &provenance())
            .unwrap();
        index
            .conn
            .execute(
                "UPDATE cameras SET raw_json = 'not json' WHERE camera_id = 'cam-1'",
                [],
            )
            .unwrap();

        let mut hits = Vec::new();
        let logged = warnings_during(|| hits = index.search_match("d*", 10).unwrap());
        assert!(hits.iter().all(|h| h.camera_id != "cam-1"));
        assert!(logged.is_empty(), "unexpected output: {}", logged);
    }

    #[test]
    fn test_patch_label_on_corrupt_file_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cameras.sqlite");
        let garbage = vec![b'x'; 8192];
        std::fs::write(&path, &garbage).unwrap();

        let logged = warnings_during(|| patch_label(&path, "cam-1", Some("Dock")));
        assert!(logged.is_empty(), "unexpected output: {}", logged);
        assert_eq!(std::fs::read(&path).unwrap(), garbage);
    }

    #[test]
    fn test_apply_label_keeps_fts_in_sync() {
        let mut index = CameraIndex::open_memory().unwrap();
        index
            .rebuild(&sample_records(), &LabelMap::new(), &provenance())
            .unwrap();

        assert!(index.apply_label("cam-2", Some(" Reception ")).unwrap());
        assert_eq!(fts_label(&index, "cam-2").as_deref(), Some("Reception"));
        assert_eq!(index.status().unwrap().label_count, 1);

        assert!(index.apply_label("cam-2", None).unwrap());
        assert_eq!(fts_label(&index, "cam-2").as_deref(), Some(""));
        assert_eq!(index.status().unwrap().label_count, 0);

        assert_eq!(fts_ids(&index), vec!["cam-1", "cam-2"]);
    }

    #[test]
    fn test_apply_label_on_unindexed_camera() {
        let mut index = CameraIndex::open_memory().unwrap();
        index
            .rebuild_at(&sample_records(), &LabelMap::new(), &provenance(), 100)
            .unwrap();

        assert!(!index.apply_label("cam-404", Some("Nowhere")).unwrap());
        assert_eq!(fts_ids(&index), vec!["cam-1", "cam-2"]);

        let status = index.status().unwrap();
        assert_eq!(status.camera_count, 2);
        assert_eq!(status.built_at, 100);
    }

    #[test]
    fn test_read_status_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_status(&dir.path().join("missing.sqlite")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_patch_label_without_index_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.sqlite");
        patch_label(&path, "cam-1", Some("Dock"));
        assert!(!path.exists());
    }

    #[test]
    fn test_build_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("cameras.sqlite");

        build_index(&path, &sample_records(), &LabelMap::new(), &provenance()).unwrap();
        let status = read_status(&path).unwrap();
        assert!(status.exists);
        assert_eq!(status.camera_count, 2);
        assert_eq!(status.path, path);
    }

    #[test]
    fn test_newer_schema_version_is_rejected() {
        let mut index = CameraIndex::open_memory().unwrap();
        index
            .rebuild(&sample_records(), &LabelMap::new(), &provenance())
            .unwrap();
        index.check_schema_version().unwrap();

        index
            .conn
            .execute(
                "UPDATE meta SET value = ?1 WHERE key = 'schema_version'",
                params![(SCHEMA_VERSION + 1).to_string()],
            )
            .unwrap();
        assert!(index.check_schema_version().is_err());
    }
}
