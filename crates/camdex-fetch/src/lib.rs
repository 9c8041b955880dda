//! camdex-fetch - Camera inventory fetcher
//!
//! Pages through the remote devices endpoint and aggregates every page into
//! one deterministically ordered record set for the index builder.

mod http;
mod page;

pub use http::HttpPageFetcher;
pub use page::{decode_page, fetch_all_cameras, looks_like_html, parse_page};
