//! # cmdpager
//!
//! An MCP server that runs shell commands for an agent and keeps large output
//! out of its context window. Output under the token threshold comes back
//! inline; anything larger is stored in memory and served page by page
//! through `read_output_page`, then released once every page has been read.
//!
//! ```bash
//! # Serve the tools on stdio
//! cmdpager
//!
//! # Inspect how a log file would be paged
//! cmdpager page build.log --page 2
//! ```
//!
//! Limits and thresholds live in `cmdpager.toml`:
//!
//! ```toml
//! [pagination]
//! page_size_lines = 700
//! max_chars_per_page = 30000
//! token_threshold = 10000
//! ```
//!
//! - `cmdpager-core/` holds the paginator, output store, and session.
//! - `cmdpager-bash-runner/` spawns commands and enforces timeouts.
//! - `cmdpager-config/` loads and validates configuration.

use std::path::Path;

use anyhow::Result;
use cmdpager_config::ConfigManager;

pub mod cli;
pub mod server;

/// Load configuration from `path`, or from the default locations.
pub fn load_config(path: Option<&Path>) -> Result<ConfigManager> {
    match path {
        Some(path) => ConfigManager::load_from_file(path),
        None => ConfigManager::load(),
    }
}
