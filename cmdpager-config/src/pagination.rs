use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

/// Pagination limits and the inline/paginated cut-over.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PaginationConfig {
    /// Maximum number of lines on a single page.
    #[serde(default = "PaginationConfig::default_page_size_lines")]
    pub page_size_lines: usize,
    /// Character budget for the line content of a single page. A lone line
    /// longer than this is still returned whole.
    #[serde(default = "PaginationConfig::default_max_chars_per_page")]
    pub max_chars_per_page: usize,
    /// Estimated token count above which command output is paginated instead
    /// of being returned inline.
    #[serde(default = "PaginationConfig::default_token_threshold")]
    pub token_threshold: usize,
    /// Characters per estimated token.
    #[serde(default = "PaginationConfig::default_chars_per_token")]
    pub chars_per_token: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size_lines: Self::default_page_size_lines(),
            max_chars_per_page: Self::default_max_chars_per_page(),
            token_threshold: Self::default_token_threshold(),
            chars_per_token: Self::default_chars_per_token(),
        }
    }
}

impl PaginationConfig {
    pub const DEFAULT_PAGE_SIZE_LINES: usize = 700;
    pub const DEFAULT_MAX_CHARS_PER_PAGE: usize = 30_000;
    pub const DEFAULT_TOKEN_THRESHOLD: usize = 10_000;
    pub const DEFAULT_CHARS_PER_TOKEN: usize = 4;

    const fn default_page_size_lines() -> usize {
        Self::DEFAULT_PAGE_SIZE_LINES
    }

    const fn default_max_chars_per_page() -> usize {
        Self::DEFAULT_MAX_CHARS_PER_PAGE
    }

    const fn default_token_threshold() -> usize {
        Self::DEFAULT_TOKEN_THRESHOLD
    }

    const fn default_chars_per_token() -> usize {
        Self::DEFAULT_CHARS_PER_TOKEN
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.page_size_lines > 0,
            "pagination.page_size_lines must be at least 1"
        );
        ensure!(
            self.max_chars_per_page > 0,
            "pagination.max_chars_per_page must be at least 1"
        );
        ensure!(
            self.chars_per_token > 0,
            "pagination.chars_per_token must be at least 1"
        );
        Ok(())
    }
}
