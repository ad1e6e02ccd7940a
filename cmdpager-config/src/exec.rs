use std::time::Duration;

use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

/// Command execution settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExecConfig {
    /// Timeout applied when a caller does not pass one.
    #[serde(default = "ExecConfig::default_timeout_seconds")]
    pub default_timeout_seconds: u64,
    /// Upper bound for caller-provided timeouts.
    #[serde(default = "ExecConfig::default_max_timeout_seconds")]
    pub max_timeout_seconds: u64,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            default_timeout_seconds: Self::default_timeout_seconds(),
            max_timeout_seconds: Self::default_max_timeout_seconds(),
        }
    }
}

impl ExecConfig {
    const fn default_timeout_seconds() -> u64 {
        30
    }

    const fn default_max_timeout_seconds() -> u64 {
        600
    }

    /// Resolve a caller timeout against the configured default and ceiling.
    pub fn resolve_timeout(&self, requested_seconds: Option<u64>) -> Duration {
        let seconds = requested_seconds
            .unwrap_or(self.default_timeout_seconds)
            .min(self.max_timeout_seconds);
        Duration::from_secs(seconds)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.default_timeout_seconds > 0,
            "exec.default_timeout_seconds must be at least 1"
        );
        ensure!(
            self.default_timeout_seconds <= self.max_timeout_seconds,
            "exec.default_timeout_seconds ({}) exceeds exec.max_timeout_seconds ({})",
            self.default_timeout_seconds,
            self.max_timeout_seconds
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_timeout_uses_default_when_absent() {
        let cfg = ExecConfig::default();
        assert_eq!(cfg.resolve_timeout(None), Duration::from_secs(30));
    }

    #[test]
    fn resolve_timeout_clamps_to_ceiling() {
        let cfg = ExecConfig::default();
        assert_eq!(cfg.resolve_timeout(Some(5)), Duration::from_secs(5));
        assert_eq!(cfg.resolve_timeout(Some(86_400)), Duration::from_secs(600));
    }

    #[test]
    fn default_above_ceiling_is_invalid() {
        let cfg = ExecConfig {
            default_timeout_seconds: 900,
            max_timeout_seconds: 600,
        };
        assert!(cfg.validate().is_err());
    }
}
