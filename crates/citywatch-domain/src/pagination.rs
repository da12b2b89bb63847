//! Pagination parameters for list endpoints.

use serde::{Deserialize, Serialize};

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Zero-based pagination shared across all list endpoints.
///
/// - `page_size`: 1–50, default 50
/// - `page`: ≥ 0, default 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: default_page_size(),
        }
    }
}

impl PageRequest {
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(0),
            page_size: page_size.unwrap_or_else(default_page_size),
        }
        .clamped()
    }

    /// Clamp `page_size` to the valid range 1–50.
    pub fn clamped(self) -> Self {
        Self {
            page: self.page,
            page_size: self.page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Row offset of the first item on this page.
    pub fn offset(&self) -> u64 {
        self.page as u64 * self.page_size as u64
    }

    pub fn limit(&self) -> u64 {
        self.page_size as u64
    }
}
