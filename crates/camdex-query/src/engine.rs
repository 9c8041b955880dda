//! Search engine over a built camera index.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info};

use camdex_core::{IndexError, Result, SearchHit};
use camdex_store::CameraIndex;

use crate::tokenize::{build_match_expression, clamp_limit};

/// Ranked results for one query.
#[derive(Debug, Clone)]
pub struct SearchResults {
    /// Hits ordered best match first.
    pub hits: Vec<SearchHit>,

    /// FTS5 expression that was executed.
    pub match_expression: String,

    /// Limit actually applied after clamping.
    pub limit: usize,

    /// Time taken in milliseconds.
    pub took_ms: u64,
}

/// Query engine bound to one index file.
pub struct QueryEngine {
    path: PathBuf,
}

impl QueryEngine {
    /// Create an engine for the index at `path`. The file is not opened yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the index this engine queries.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Search for cameras matching every token of `query`.
    ///
    /// A missing index is reported before the query is examined, so callers
    /// can suggest a rebuild even for unusable queries.
    pub fn search(&self, query: &str, limit: i64) -> Result<SearchResults> {
        let start = Instant::now();

        if !self.path.is_file() {
            return Err(IndexError::not_found(&self.path));
        }

        let limit = clamp_limit(limit);
        let match_expression = build_match_expression(query)?;

        info!("Searching for: {:?}", query);
        debug!("Match expression: {}", match_expression);

        let index = CameraIndex::open_existing(&self.path)?;
        index.check_schema_version()?;

        let hits = index.search_match(&match_expression, limit)?;
        let took_ms = start.elapsed().as_millis() as u64;

        info!("Search completed in {}ms, found {} results", took_ms, hits.len());

        Ok(SearchResults {
            hits,
            match_expression,
            limit,
            took_ms,
        })
    }
}

/// One-shot search against the index at `path`.
pub fn search(path: &Path, query: &str, limit: i64) -> Result<Vec<SearchHit>> {
    Ok(QueryEngine::new(path).search(query, limit)?.hits)
}
