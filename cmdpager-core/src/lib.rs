//! Pagination engine for large command output.
//!
//! Output from a command run is measured with a [`TokenEstimator`]. Small
//! output goes straight back to the caller; large output is kept in an
//! [`OutputStore`] and handed out one bounded page at a time by
//! [`paginate`]-style lookups until every page has been read, after which the
//! record is dropped.
//!
//! [`OutputSession`] ties these together with a
//! [`CommandExecutor`](cmdpager_bash_runner::CommandExecutor).

pub mod error;
pub mod format;
pub mod pagination;
pub mod session;
pub mod store;
pub mod tokens;

pub use error::{ErrorKind, PagerError};
pub use format::format_command_output;
pub use pagination::{PageLayout, PageLimits, PageLookup, PaginationResult, paginate};
pub use session::{
    OutputSession, ReadPageRequest, ReadPageResponse, RunRequest, RunResponse, SessionSettings,
};
pub use store::{OutputId, OutputStore, PageDelivery, StoredOutput};
pub use tokens::{CharacterRatioTokenEstimator, SharedTokenEstimator, TokenEstimator};
