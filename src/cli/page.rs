use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use cmdpager_config::CmdpagerConfig;
use cmdpager_core::{PageLayout, PageLimits, PageLookup, PaginationResult};

/// Paginate `file` with the configured limits and print the page as JSON.
///
/// A page outside the file's range is printed with the `current_page: 0`
/// sentinel and reported as an error.
pub fn handle_page_command(config: &CmdpagerConfig, file: &Path, page: i64) -> Result<()> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let layout = PageLayout::new(&text, PageLimits::from(&config.pagination));
    let lookup = layout.lookup(&text, page);
    let out_of_range = matches!(lookup, PageLookup::OutOfRange { .. });
    let result = PaginationResult::from(lookup);

    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("Failed to encode page")?
    );

    if out_of_range {
        anyhow::bail!(
            "page {page} is out of range; {} has {} page(s)",
            file.display(),
            result.total_pages
        );
    }
    Ok(())
}
