//! Logging and tracing configuration

use serde::{Deserialize, Serialize};

/// Default tracing targets when none are configured.
pub const DEFAULT_TRACE_TARGETS: &[&str] = &["cmdpager", "cmdpager_core", "cmdpager_bash_runner"];

/// Trace level for structured logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TraceLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl TraceLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }
}

impl std::fmt::Display for TraceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TraceLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw).unwrap_or_default())
    }
}

/// Logging configuration. Logs are always written to stderr; stdout is
/// reserved for the MCP protocol stream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DebugConfig {
    /// Enable structured logging
    #[serde(default = "default_enable_tracing")]
    pub enable_tracing: bool,

    /// Trace level (error, warn, info, debug, trace)
    #[serde(default)]
    pub trace_level: TraceLevel,

    /// Tracing targets to enable, e.g. "cmdpager_core::store"
    #[serde(default)]
    pub trace_targets: Vec<String>,
}

fn default_enable_tracing() -> bool {
    true
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enable_tracing: default_enable_tracing(),
            trace_level: TraceLevel::Info,
            trace_targets: Vec::new(),
        }
    }
}

impl DebugConfig {
    /// `EnvFilter` directive built from the configured targets and level.
    pub fn filter_directive(&self) -> String {
        let level = self.trace_level.as_str();
        if self.trace_targets.is_empty() {
            DEFAULT_TRACE_TARGETS
                .iter()
                .map(|target| format!("{target}={level}"))
                .collect::<Vec<_>>()
                .join(",")
        } else {
            self.trace_targets
                .iter()
                .map(|target| format!("{target}={level}"))
                .collect::<Vec<_>>()
                .join(",")
        }
    }
}
