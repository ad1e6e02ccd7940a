use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::debug::DebugConfig;
use crate::exec::ExecConfig;
use crate::pagination::PaginationConfig;

/// Main configuration structure for cmdpager
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
pub struct CmdpagerConfig {
    /// Page limits and the pagination threshold
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Command execution settings
    #[serde(default)]
    pub exec: ExecConfig,

    /// Logging settings
    #[serde(default)]
    pub debug: DebugConfig,
}

impl CmdpagerConfig {
    pub fn validate(&self) -> Result<()> {
        self.pagination
            .validate()
            .context("Invalid pagination configuration")?;

        self.exec.validate().context("Invalid exec configuration")?;

        Ok(())
    }

    /// Render the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}
