//! Configuration for cmdpager.
//!
//! Every threshold the pagination engine depends on lives here as a named
//! value with a documented default, so the server, the CLI, and the tool
//! descriptions all read from one source of truth.

pub mod debug;
pub mod exec;
pub mod loader;
pub mod pagination;

pub use debug::{DebugConfig, TraceLevel};
pub use exec::ExecConfig;
pub use loader::{CmdpagerConfig, ConfigManager, merge_toml_values};
pub use pagination::PaginationConfig;
