use anyhow::Result;
use cmdpager_config::ConfigManager;

pub fn handle_config_command(manager: &ConfigManager) -> Result<()> {
    if let Some(path) = manager.config_path() {
        println!("# loaded from {}", path.display());
    }
    print!("{}", manager.config().to_toml_string()?);
    Ok(())
}
