//! Interfaces between the index and its collaborators.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Page;

/// Source of camera inventory pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch one page starting at `page_token` (empty for the first page).
    async fn fetch_page(&self, page_token: &str, page_size: u32) -> Result<Page>;
}
