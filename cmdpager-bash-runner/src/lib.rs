//! Cross-platform command runner for cmdpager.
//!
//! The crate exposes a trait-based executor so the session layer can swap
//! the underlying process strategy (the system shell in production, canned
//! output in tests) while keeping one contract for captured output,
//! non-zero exits, and timeouts.

pub mod error;
pub mod executor;
pub mod process_group;

pub use error::RunnerError;
pub use executor::{
    CommandExecutor, CommandInvocation, CommandOutput, CommandStatus, DEFAULT_COMMAND_TIMEOUT,
    ProcessCommandExecutor, ShellKind,
};
pub use process_group::KillSignal;
