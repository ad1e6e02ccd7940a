//! Line and character bounded pagination of captured command output.
//!
//! Text is split on `'\n'` and laid out into pages front to back. A page holds
//! at most [`PageLimits::page_size_lines`] lines and stops early once adding
//! the next line would push the page's line content past
//! [`PageLimits::max_chars_per_page`]. A page always holds at least one line,
//! so a single line longer than the character cap is returned whole on a page
//! of its own. When the cap ends a page early the next page resumes at the
//! first excluded line, which keeps every line reachable.
//!
//! Character counts are Unicode scalar values and do not include the newline
//! separators between lines.

use std::ops::Range;

use cmdpager_config::PaginationConfig;
use serde::{Deserialize, Serialize};

/// Size bounds applied to every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub page_size_lines: usize,
    pub max_chars_per_page: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            page_size_lines: PaginationConfig::DEFAULT_PAGE_SIZE_LINES,
            max_chars_per_page: PaginationConfig::DEFAULT_MAX_CHARS_PER_PAGE,
        }
    }
}

impl From<&PaginationConfig> for PageLimits {
    fn from(config: &PaginationConfig) -> Self {
        Self {
            page_size_lines: config.page_size_lines,
            max_chars_per_page: config.max_chars_per_page,
        }
    }
}

/// One page of output plus where it sits in the whole.
///
/// `current_page == 0` marks a request outside `1..=total_pages`; the content
/// is empty in that case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationResult {
    pub content: String,
    pub current_page: usize,
    pub total_pages: usize,
}

impl PaginationResult {
    pub fn is_out_of_range(&self) -> bool {
        self.current_page == 0
    }
}

/// Tagged form of a page lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLookup {
    Page(PaginationResult),
    OutOfRange { requested: i64, total_pages: usize },
}

impl From<PageLookup> for PaginationResult {
    fn from(lookup: PageLookup) -> Self {
        match lookup {
            PageLookup::Page(result) => result,
            PageLookup::OutOfRange { total_pages, .. } => PaginationResult {
                content: String::new(),
                current_page: 0,
                total_pages,
            },
        }
    }
}

/// Byte ranges of every page of a text, computed once and reused for each
/// page request against the same text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLayout {
    pages: Vec<Range<usize>>,
    total_lines: usize,
}

impl PageLayout {
    pub fn new(text: &str, limits: PageLimits) -> Self {
        let page_size = limits.page_size_lines.max(1);

        let mut lines: Vec<(Range<usize>, usize)> = Vec::new();
        let mut offset = 0;
        for line in text.split('\n') {
            let end = offset + line.len();
            lines.push((offset..end, line.chars().count()));
            offset = end + 1;
        }

        let mut pages = Vec::new();
        let mut start = 0;
        while start < lines.len() {
            let mut end = start;
            let mut chars = 0usize;
            while end < lines.len() && end - start < page_size {
                let line_chars = lines[end].1;
                if end > start && chars + line_chars > limits.max_chars_per_page {
                    break;
                }
                chars += line_chars;
                end += 1;
            }
            pages.push(lines[start].0.start..lines[end - 1].0.end);
            start = end;
        }

        Self {
            pages,
            total_lines: lines.len(),
        }
    }

    pub fn total_lines(&self) -> usize {
        self.total_lines
    }

    /// Number of pages. Never less than `ceil(total_lines / page_size_lines)`,
    /// and larger when the character cap shortened some pages.
    pub fn total_pages(&self) -> usize {
        self.pages.len()
    }

    /// Slice page `page` (1-indexed) out of `text`, the same text the layout
    /// was built from.
    pub fn page<'a>(&self, text: &'a str, page: i64) -> Option<&'a str> {
        self.slice(text, page).map(|(_, content)| content)
    }

    pub fn lookup(&self, text: &str, page: i64) -> PageLookup {
        match self.slice(text, page) {
            Some((current_page, content)) => PageLookup::Page(PaginationResult {
                content: content.to_string(),
                current_page,
                total_pages: self.total_pages(),
            }),
            None => PageLookup::OutOfRange {
                requested: page,
                total_pages: self.total_pages(),
            },
        }
    }

    fn slice<'a>(&self, text: &'a str, page: i64) -> Option<(usize, &'a str)> {
        let page = usize::try_from(page).ok()?;
        let range = self.pages.get(page.checked_sub(1)?)?;
        Some((page, &text[range.clone()]))
    }
}

/// Return page `page` (1-indexed) of `text`.
///
/// Out-of-range pages, including `page <= 0`, yield empty content with
/// `current_page` set to `0`.
pub fn paginate(text: &str, page: i64, limits: PageLimits) -> PaginationResult {
    PageLayout::new(text, limits).lookup(text, page).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn numbered_lines(count: usize) -> String {
        (1..=count)
            .map(|n| format!("Line {n}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn limits(page_size_lines: usize, max_chars_per_page: usize) -> PageLimits {
        PageLimits {
            page_size_lines,
            max_chars_per_page,
        }
    }

    #[test]
    fn empty_text_is_a_single_empty_page() {
        assert_eq!(
            paginate("", 1, PageLimits::default()),
            PaginationResult {
                content: String::new(),
                current_page: 1,
                total_pages: 1,
            }
        );
    }

    #[test]
    fn text_without_newline_is_one_line() {
        let layout = PageLayout::new("hello", PageLimits::default());
        assert_eq!(layout.total_lines(), 1);
        assert_eq!(layout.total_pages(), 1);
    }

    #[test]
    fn trailing_newline_counts_as_an_empty_line() {
        let layout = PageLayout::new("a\nb\n", PageLimits::default());
        assert_eq!(layout.total_lines(), 3);
    }

    #[test]
    fn twenty_one_hundred_lines_make_three_pages() {
        let text = numbered_lines(2100);
        let page = paginate(&text, 2, PageLimits::default());
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 2);
        assert!(page.content.starts_with("Line 701\n"));
        assert!(page.content.ends_with("\nLine 1400"));
        assert_eq!(page.content.lines().count(), 700);
    }

    #[test]
    fn character_cap_excludes_the_line_that_would_overflow() {
        let line = "Y".repeat(5000);
        let text = vec![line.as_str(); 10].join("\n");

        let first = paginate(&text, 1, PageLimits::default());
        assert_eq!(first.content.split('\n').count(), 6);
        assert_eq!(first.content.chars().filter(|c| *c == 'Y').count(), 30_000);
        assert_eq!(first.total_pages, 2);

        let second = paginate(&text, 2, PageLimits::default());
        assert_eq!(second.content.split('\n').count(), 4);
        assert!(paginate(&text, 3, PageLimits::default()).is_out_of_range());
    }

    #[test]
    fn oversize_line_is_returned_whole() {
        let long = "z".repeat(50);
        let text = format!("{long}\nshort\ntail");
        let limits = limits(700, 10);

        let first = paginate(&text, 1, limits);
        assert_eq!(first.content, long);
        assert_eq!(first.total_pages, 2);
        assert_eq!(paginate(&text, 2, limits).content, "short\ntail");
    }

    #[test]
    fn out_of_range_pages_use_the_zero_sentinel() {
        let text = numbered_lines(10);
        for page in [-3, 0, 2, 99] {
            let result = paginate(&text, page, PageLimits::default());
            assert_eq!(result.current_page, 0, "page {page}");
            assert_eq!(result.content, "");
            assert_eq!(result.total_pages, 1);
        }
    }

    #[test]
    fn lookup_reports_the_requested_page_when_out_of_range() {
        let layout = PageLayout::new("a\nb", limits(1, 100));
        assert_eq!(
            layout.lookup("a\nb", 5),
            PageLookup::OutOfRange {
                requested: 5,
                total_pages: 2,
            }
        );
    }

    #[test]
    fn multibyte_text_slices_on_char_boundaries() {
        let text = "ééé\nüüü\nöö";
        let limits = limits(700, 6);
        assert_eq!(paginate(text, 1, limits).content, "ééé\nüüü");
        assert_eq!(paginate(text, 2, limits).content, "öö");
    }

    proptest! {
        #[test]
        fn short_text_fits_on_one_page(lines in prop::collection::vec("[a-z ]{0,20}", 1..50)) {
            let text = lines.join("\n");
            let result = paginate(&text, 1, limits(50, 30_000));
            prop_assert_eq!(result.content, text);
            prop_assert_eq!(result.current_page, 1);
            prop_assert_eq!(result.total_pages, 1);
        }

        #[test]
        fn full_pages_start_on_page_boundaries(page_size in 1usize..20, pages in 1usize..6) {
            let text = numbered_lines(page_size * pages);
            let limits = limits(page_size, 30_000);
            for page in 1..=pages {
                let result = paginate(&text, page as i64, limits);
                prop_assert_eq!(result.total_pages, pages);
                let expected = format!("Line {}", (page - 1) * page_size + 1);
                prop_assert_eq!(result.content.split('\n').next(), Some(expected.as_str()));
            }
        }

        #[test]
        fn pages_respect_the_character_cap(
            lines in prop::collection::vec("[a-z]{0,40}", 1..80),
            cap in 1usize..120,
        ) {
            let text = lines.join("\n");
            let limits = limits(10, cap);
            let layout = PageLayout::new(&text, limits);
            prop_assert!(layout.total_pages() >= lines.len().div_ceil(10));

            let mut rebuilt = Vec::new();
            for page in 1..=layout.total_pages() {
                let content = layout.page(&text, page as i64).unwrap_or_default();
                let page_lines: Vec<&str> = content.split('\n').collect();
                let chars: usize = page_lines.iter().map(|line| line.chars().count()).sum();
                prop_assert!(page_lines.len() <= 10);
                prop_assert!(chars <= cap || page_lines.len() == 1);
                rebuilt.push(content.to_string());
            }
            prop_assert_eq!(rebuilt.join("\n"), text);
        }
    }
}
