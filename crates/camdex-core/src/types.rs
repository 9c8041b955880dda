//! Core domain types for the camera index.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A camera object exactly as the remote API returned it.
pub type RawCamera = Map<String, Value>;

/// Local labels keyed by camera ID.
pub type LabelMap = BTreeMap<String, String>;

/// Candidate keys for each denormalized field, tried in order.
pub mod keys {
    pub const CAMERA_ID: &[&str] = &["camera_id", "cameraId", "cameraID", "id"];
    pub const NAME: &[&str] = &["name", "device_name", "deviceName"];
    pub const SITE: &[&str] = &["site", "site_name", "siteName"];
    pub const MODEL: &[&str] = &["model", "device_model", "deviceModel"];
    pub const SERIAL: &[&str] = &["serial", "serial_number", "serialNumber"];
    pub const STATUS: &[&str] = &["status", "camera_status", "cameraStatus"];
    pub const TIMEZONE: &[&str] = &["timezone", "time_zone", "timeZone"];
}

/// Return the first non-blank value among `candidates`, rendered as text.
///
/// Strings are returned verbatim, numbers without a trailing `.0` when they
/// are integral, and booleans as `true`/`false`. Nested values and nulls are
/// skipped.
pub fn pick_string(raw: &RawCamera, candidates: &[&str]) -> String {
    for key in candidates {
        let rendered = match raw.get(*key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => render_number(n),
            Some(Value::Bool(b)) => b.to_string(),
            _ => continue,
        };
        if !rendered.trim().is_empty() {
            return rendered;
        }
    }
    String::new()
}

fn render_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => (f as i64).to_string(),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Resolve the camera ID of a raw record (empty when absent).
pub fn camera_id_of(raw: &RawCamera) -> String {
    pick_string(raw, keys::CAMERA_ID)
}

/// Denormalized view of one camera, as stored in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraRecord {
    pub camera_id: String,
    pub name: String,
    pub site: String,
    pub model: String,
    pub serial: String,
    pub status: String,
    pub timezone: String,

    /// Full original record, kept for consumers needing other fields.
    pub raw: RawCamera,
}

impl CameraRecord {
    /// Extract the display fields from a raw record.
    ///
    /// Returns `None` when the record has no usable camera ID.
    pub fn from_raw(raw: RawCamera) -> Option<Self> {
        let camera_id = camera_id_of(&raw);
        if camera_id.trim().is_empty() {
            return None;
        }

        Some(Self {
            name: pick_string(&raw, keys::NAME),
            site: pick_string(&raw, keys::SITE),
            model: pick_string(&raw, keys::MODEL),
            serial: pick_string(&raw, keys::SERIAL),
            status: pick_string(&raw, keys::STATUS),
            timezone: pick_string(&raw, keys::TIMEZONE),
            camera_id,
            raw,
        })
    }
}

/// Where the indexed data came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub base_url: String,
    pub org_id: String,
    pub profile: String,
}

impl Provenance {
    pub fn new(
        base_url: impl Into<String>,
        org_id: impl Into<String>,
        profile: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            org_id: org_id.into(),
            profile: profile.into(),
        }
    }
}

/// Snapshot of an index file's metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStatus {
    pub exists: bool,
    pub path: PathBuf,
    pub schema_version: u32,
    /// Unix seconds of the last full rebuild (0 if unknown).
    pub built_at: i64,
    pub camera_count: u64,
    pub label_count: u64,
    pub base_url: String,
    pub org_id: String,
    pub profile: String,
}

/// One ranked search match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub camera_id: String,

    /// BM25 score; lower is better.
    pub rank: f64,

    /// Full original camera record.
    pub camera: RawCamera,
}

/// One page of the remote camera inventory.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub records: Vec<RawCamera>,

    /// Continuation token; empty on the last page.
    pub next_page_token: String,

    /// HTTP status the page was served with.
    pub status: u16,
}

/// Current unix time in seconds.
pub fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
