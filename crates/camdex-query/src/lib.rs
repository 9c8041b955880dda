//! camdex-query - Full-text search over the camera index
//!
//! Queries are split into lowercase ASCII tokens, stripped of stopwords and
//! turned into an all-terms-required FTS5 prefix expression ranked by BM25.
//!
//! # Example
//!
//! ```rust,ignore
//! use camdex_query::QueryEngine;
//!
//! let engine = QueryEngine::new(index_path);
//! let results = engine.search("north door", 20)?;
//! for hit in results.hits {
//!     println!("{} {:.3}", hit.camera_id, hit.rank);
//! }
//! ```

mod engine;
mod tokenize;

pub use engine::{search, QueryEngine, SearchResults};
pub use tokenize::{build_match_expression, clamp_limit, split_tokens, tokenize, STOPWORDS};

pub use camdex_core::SearchHit;
