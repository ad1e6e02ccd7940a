//! Command-line arguments and subcommand handlers.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod config;
mod page;

pub use config::handle_config_command;
pub use page::handle_page_command;

#[derive(Debug, Parser)]
#[command(
    name = "cmdpager",
    version,
    about = "Run shell commands over MCP and page through large output"
)]
pub struct Cli {
    /// Configuration file to load instead of ./cmdpager.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Serve the run_command and read_output_page tools over stdio (default)
    Serve,

    /// Print one page of a file using the configured page limits
    Page {
        /// File to paginate
        file: PathBuf,

        /// Page number, starting at 1
        #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
        page: i64,
    },

    /// Print the effective configuration as TOML
    Config,
}
