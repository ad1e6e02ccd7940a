//! In-memory store of paginated command output with per-output read tracking.
//!
//! A record lives until every one of its pages has been delivered, at which
//! point it is evicted. There is no time-based expiry and nothing is persisted.

use std::borrow::Borrow;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::PagerError;
use crate::pagination::{PageLayout, PageLimits, PageLookup, PaginationResult};
use crate::tokens::{CharacterRatioTokenEstimator, SharedTokenEstimator};

/// Opaque identifier of a stored output. Freshly minted identifiers are
/// random v4 UUIDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputId(String);

impl OutputId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for OutputId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for OutputId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for OutputId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Borrow<str> for OutputId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Full output of one command run. Immutable once stored.
#[derive(Debug)]
pub struct StoredOutput {
    pub command: String,
    pub full_text: String,
    pub exit_status: i32,
    pub estimated_tokens: usize,
    pub total_lines: usize,
    pub total_pages: usize,
    layout: PageLayout,
}

impl StoredOutput {
    pub fn page(&self, page: i64) -> PageLookup {
        self.layout.lookup(&self.full_text, page)
    }
}

#[derive(Debug)]
struct OutputRecord {
    output: Arc<StoredOutput>,
    read: BTreeSet<usize>,
}

impl OutputRecord {
    fn is_complete(&self) -> bool {
        self.read.len() == self.output.total_pages
    }

    fn pages_read(&self) -> Vec<usize> {
        self.read.iter().copied().collect()
    }
}

/// Result of [`OutputStore::deliver_page`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDelivery {
    pub command: String,
    pub page: PaginationResult,
    pub pages_read: Vec<usize>,
    /// Set when this delivery read the last unread page and the record was
    /// removed from the store.
    pub evicted: bool,
}

/// Process-local table of stored outputs.
pub struct OutputStore {
    records: Mutex<HashMap<OutputId, OutputRecord>>,
    limits: PageLimits,
    estimator: SharedTokenEstimator,
}

impl fmt::Debug for OutputStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputStore")
            .field("records", &self.records.lock().len())
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl Default for OutputStore {
    fn default() -> Self {
        Self::new(
            PageLimits::default(),
            Arc::new(CharacterRatioTokenEstimator::default()),
        )
    }
}

impl OutputStore {
    pub fn new(limits: PageLimits, estimator: SharedTokenEstimator) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            limits,
            estimator,
        }
    }

    pub fn limits(&self) -> PageLimits {
        self.limits
    }

    /// Store `full_text` under `id` with an empty read-set.
    pub fn put(
        &self,
        id: OutputId,
        command: impl Into<String>,
        full_text: impl Into<String>,
        exit_status: i32,
    ) -> Result<Arc<StoredOutput>, PagerError> {
        let full_text = full_text.into();
        let layout = PageLayout::new(&full_text, self.limits);
        let output = Arc::new(StoredOutput {
            command: command.into(),
            estimated_tokens: self.estimator.estimate_tokens(&full_text),
            total_lines: layout.total_lines(),
            total_pages: layout.total_pages(),
            exit_status,
            full_text,
            layout,
        });

        let mut records = self.records.lock();
        if records.contains_key(&id) {
            return Err(PagerError::AlreadyExists { id: id.to_string() });
        }
        debug!(
            output_id = %id,
            total_pages = output.total_pages,
            total_lines = output.total_lines,
            estimated_tokens = output.estimated_tokens,
            "stored paginated output"
        );
        records.insert(
            id,
            OutputRecord {
                output: Arc::clone(&output),
                read: BTreeSet::new(),
            },
        );
        Ok(output)
    }

    pub fn get(&self, id: &str) -> Result<Arc<StoredOutput>, PagerError> {
        self.records
            .lock()
            .get(id)
            .map(|record| Arc::clone(&record.output))
            .ok_or_else(|| PagerError::not_found(id))
    }

    /// Record `page` as delivered. Marking a page twice has no further effect.
    pub fn mark_read(&self, id: &str, page: usize) -> Result<(), PagerError> {
        let mut records = self.records.lock();
        let record = records.get_mut(id).ok_or_else(|| PagerError::not_found(id))?;
        let total_pages = record.output.total_pages;
        if page == 0 || page > total_pages {
            return Err(PagerError::OutOfRange {
                page: i64::try_from(page).unwrap_or(i64::MAX),
                total_pages,
            });
        }
        record.read.insert(page);
        Ok(())
    }

    pub fn is_complete(&self, id: &str) -> Result<bool, PagerError> {
        self.records
            .lock()
            .get(id)
            .map(OutputRecord::is_complete)
            .ok_or_else(|| PagerError::not_found(id))
    }

    /// Remove the record for `id`, returning it if it was present.
    pub fn evict(&self, id: &str) -> Option<Arc<StoredOutput>> {
        let removed = self.records.lock().remove(id).map(|record| record.output);
        if removed.is_some() {
            info!(output_id = id, "evicted output");
        }
        removed
    }

    /// Delivered page numbers in ascending order.
    pub fn read_pages(&self, id: &str) -> Result<Vec<usize>, PagerError> {
        self.records
            .lock()
            .get(id)
            .map(OutputRecord::pages_read)
            .ok_or_else(|| PagerError::not_found(id))
    }

    /// Look up `page` of `id`, mark it read, and evict the record once every
    /// page has been read. The whole sequence runs under the store lock, so
    /// exactly one caller observes completion for a given record.
    pub fn deliver_page(&self, id: &str, page: i64) -> Result<PageDelivery, PagerError> {
        let mut records = self.records.lock();
        let record = records.get_mut(id).ok_or_else(|| PagerError::not_found(id))?;

        let result = match record.output.page(page) {
            PageLookup::Page(result) => result,
            PageLookup::OutOfRange {
                requested,
                total_pages,
            } => {
                return Err(PagerError::OutOfRange {
                    page: requested,
                    total_pages,
                });
            }
        };

        record.read.insert(result.current_page);
        let pages_read = record.pages_read();
        let command = record.output.command.clone();
        let evicted = record.is_complete();
        if evicted {
            records.remove(id);
        }
        drop(records);

        debug!(
            output_id = id,
            page = result.current_page,
            total_pages = result.total_pages,
            "delivered page"
        );
        if evicted {
            info!(output_id = id, "all pages read; evicted output");
        }

        Ok(PageDelivery {
            command,
            page: result,
            pages_read,
            evicted,
        })
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn ids(&self) -> Vec<OutputId> {
        let mut ids: Vec<OutputId> = self.records.lock().keys().cloned().collect();
        ids.sort();
        ids
    }
}
