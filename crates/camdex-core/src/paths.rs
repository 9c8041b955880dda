//! On-disk locations for the camera index.
//!
//! Every (host, org, profile) triple gets its own index file so data from
//! different tenants never shares a database:
//!
//! ```text
//! <cache_root>/camdex/index/<host>/<org>/<profile>/cameras.sqlite
//! ```

use std::path::{Path, PathBuf};

use url::Url;

use crate::error::{IndexError, Result};

/// Application directory name under the cache and config roots.
pub const APP_DIR: &str = "camdex";

/// File name of the index database.
pub const INDEX_FILE: &str = "cameras.sqlite";

const UNKNOWN: &str = "unknown";

/// Reduce `s` to a legal, lowercase path segment.
///
/// Keeps `[a-z0-9._-]`, replaces everything else with `_`, trims leading and
/// trailing `_`, and falls back to `"unknown"` when nothing is left or the
/// result is only dots (which would name `.`/`..` instead of a directory).
pub fn sanitize_path_component(s: &str) -> String {
    let s = s.trim().to_lowercase();
    let mapped: String = s
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect();

    let trimmed = mapped.trim_matches('_');
    if trimmed.chars().all(|c| c == '.') {
        UNKNOWN.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Host (with port, if any) of a base URL, or `"unknown"`.
pub fn base_url_host(base_url: &str) -> String {
    let base_url = base_url.trim();
    if base_url.is_empty() {
        return UNKNOWN.to_string();
    }

    match Url::parse(base_url) {
        Ok(url) => match (url.host_str(), url.port()) {
            (Some(host), Some(port)) if !host.is_empty() => format!("{}:{}", host, port),
            (Some(host), None) if !host.is_empty() => host.to_string(),
            _ => UNKNOWN.to_string(),
        },
        Err(_) => UNKNOWN.to_string(),
    }
}

/// Index path under an explicit cache root.
pub fn index_path_in(cache_root: &Path, base_url: &str, org_id: &str, profile: &str) -> PathBuf {
    let org = if org_id.trim().is_empty() { "no-org" } else { org_id };
    let profile = if profile.trim().is_empty() {
        "default"
    } else {
        profile
    };

    cache_root
        .join(APP_DIR)
        .join("index")
        .join(sanitize_path_component(&base_url_host(base_url)))
        .join(sanitize_path_component(org))
        .join(sanitize_path_component(profile))
        .join(INDEX_FILE)
}

/// Index path under the user's cache directory.
pub fn index_path(base_url: &str, org_id: &str, profile: &str) -> Result<PathBuf> {
    let cache_root = dirs::cache_dir()
        .ok_or_else(|| IndexError::config("Could not determine the user cache directory"))?;
    Ok(index_path_in(&cache_root, base_url, org_id, profile))
}
