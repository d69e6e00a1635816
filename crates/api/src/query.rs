//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Gallery paging (`?page=N`, 1-based). Missing or zero means the first page.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<usize>,
}

impl PageParams {
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }
}
