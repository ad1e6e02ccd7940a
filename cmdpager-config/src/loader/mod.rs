pub mod layers;

mod config;
mod manager;
mod merge;


pub use config::CmdpagerConfig;
pub use manager::{CONFIG_FILE_NAME, CONFIG_PATH_ENV, ConfigManager, env_overrides};
pub use merge::merge_toml_values;
