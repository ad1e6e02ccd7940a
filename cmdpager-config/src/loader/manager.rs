use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::loader::config::CmdpagerConfig;
use crate::loader::layers::{ConfigLayerEntry, ConfigLayerSource, ConfigLayerStack};

/// File name looked up in the user config directory and the workspace.
pub const CONFIG_FILE_NAME: &str = "cmdpager.toml";

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "CMDPAGER_CONFIG_PATH";

/// Environment variables that override single pagination values.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("CMDPAGER_PAGE_SIZE", "page_size_lines"),
    ("CMDPAGER_MAX_CHARS_PER_PAGE", "max_chars_per_page"),
    ("CMDPAGER_TOKEN_THRESHOLD", "token_threshold"),
];

/// Build the runtime override layer from environment-style lookups.
///
/// Returns `None` when no override is set.
pub fn env_overrides(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<toml::Value>> {
    let mut pagination = toml::Table::new();
    for (var, key) in ENV_OVERRIDES {
        let Some(raw) = lookup(var) else {
            continue;
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        let value: i64 = trimmed
            .parse()
            .with_context(|| format!("{var} must be a non-negative integer, got '{trimmed}'"))?;
        anyhow::ensure!(value >= 0, "{var} must be a non-negative integer, got '{trimmed}'");
        pagination.insert((*key).to_string(), toml::Value::Integer(value));
    }

    if pagination.is_empty() {
        return Ok(None);
    }

    let mut root = toml::Table::new();
    root.insert("pagination".to_string(), toml::Value::Table(pagination));
    Ok(Some(toml::Value::Table(root)))
}

/// Configuration manager for loading and validating configurations
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: CmdpagerConfig,
    config_path: Option<PathBuf>,
    layer_stack: ConfigLayerStack,
}

impl ConfigManager {
    /// Load configuration from the default locations and the process
    /// environment.
    pub fn load() -> Result<Self> {
        if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
            let trimmed = config_path.trim();
            if !trimmed.is_empty() {
                return Self::load_from_file(trimmed).with_context(|| {
                    format!("Failed to load configuration from {CONFIG_PATH_ENV}={trimmed}")
                });
            }
        }

        Self::load_from_workspace(std::env::current_dir()?)
    }

    /// Load the user config and `cmdpager.toml` from `workspace`.
    pub fn load_from_workspace(workspace: impl AsRef<Path>) -> Result<Self> {
        let mut layer_stack = ConfigLayerStack::default();
        Self::push_user_layer(&mut layer_stack);

        let workspace_config = workspace.as_ref().join(CONFIG_FILE_NAME);
        if workspace_config.is_file() {
            let toml = Self::load_toml_from_file(&workspace_config)?;
            layer_stack.push(ConfigLayerEntry::new(
                ConfigLayerSource::Workspace {
                    file: workspace_config,
                },
                toml,
            ));
        }

        Self::from_layers(layer_stack, |var| std::env::var(var).ok())
    }

    /// Load configuration from a specific file, on top of the user config.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut layer_stack = ConfigLayerStack::default();
        Self::push_user_layer(&mut layer_stack);

        let toml = Self::load_toml_from_file(path)?;
        layer_stack.push(ConfigLayerEntry::new(
            ConfigLayerSource::Workspace {
                file: path.to_path_buf(),
            },
            toml,
        ));

        Self::from_layers(layer_stack, |var| std::env::var(var).ok())
            .with_context(|| format!("Failed to load config file: {}", path.display()))
    }

    /// Build a manager from explicit layers and an environment lookup.
    pub fn from_layers(
        mut layer_stack: ConfigLayerStack,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        if let Some(overrides) = env_overrides(lookup)? {
            layer_stack.push(ConfigLayerEntry::new(ConfigLayerSource::Runtime, overrides));
        }

        let config: CmdpagerConfig = if layer_stack.layers().is_empty() {
            CmdpagerConfig::default()
        } else {
            layer_stack
                .effective_config()
                .try_into()
                .context("Failed to deserialize effective configuration")?
        };

        config.validate().context("Configuration failed validation")?;

        let config_path = layer_stack
            .layers()
            .iter()
            .rev()
            .find_map(|layer| layer.source.file().cloned());

        debug!(
            layers = layer_stack.layers().len(),
            config_path = ?config_path,
            "configuration loaded"
        );

        Ok(Self {
            config,
            config_path,
            layer_stack,
        })
    }

    fn push_user_layer(layer_stack: &mut ConfigLayerStack) {
        let Some(user_config) =
            dirs::config_dir().map(|dir| dir.join("cmdpager").join(CONFIG_FILE_NAME))
        else {
            return;
        };
        if !user_config.is_file() {
            return;
        }
        match Self::load_toml_from_file(&user_config) {
            Ok(toml) => layer_stack.push(ConfigLayerEntry::new(
                ConfigLayerSource::User { file: user_config },
                toml,
            )),
            Err(err) => tracing::warn!(error = %err, "ignoring unreadable user configuration"),
        }
    }

    fn load_toml_from_file(path: &Path) -> Result<toml::Value> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let value: toml::Value = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(value)
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &CmdpagerConfig {
        &self.config
    }

    pub fn into_config(self) -> CmdpagerConfig {
        self.config
    }

    /// Highest-precedence configuration file, if any was loaded
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn layer_stack(&self) -> &ConfigLayerStack {
        &self.layer_stack
    }
}
