//! Config path resolution
//!
//! Paths are resolved relative to the plugin binary's location.

use std::path::PathBuf;

use super::{ConfigError, ConfigResult};

/// Returns the cs2modes base directory by navigating up from the plugin .so location.
///
/// The plugin is loaded from:
/// `game/csgo/addons/cs2modes/bin/linuxsteamrt64/cs2modes.so`
pub fn cs2modes_base_dir() -> ConfigResult<PathBuf> {
    let exe = std::env::current_exe().map_err(ConfigError::IoError)?;

    // cs2modes.so -> linuxsteamrt64 -> bin -> cs2modes
    exe.parent()
        .and_then(|p| p.parent())
        .and_then(|p| p.parent())
        .map(PathBuf::from)
        .ok_or(ConfigError::NoConfigDirectory)
}

/// Returns the base configs directory.
///
/// Path: `game/csgo/addons/cs2modes/configs/`
pub fn configs_dir() -> ConfigResult<PathBuf> {
    Ok(cs2modes_base_dir()?.join("configs"))
}

/// Returns the path for a plugin's config file.
///
/// Path: `game/csgo/addons/cs2modes/configs/plugins/{plugin_name}/{plugin_name}.toml`
pub fn plugin_config_path(plugin_name: &str) -> ConfigResult<PathBuf> {
    Ok(plugin_path_in(configs_dir()?, plugin_name))
}

fn plugin_path_in(configs: PathBuf, plugin_name: &str) -> PathBuf {
    configs
        .join("plugins")
        .join(plugin_name)
        .join(format!("{}.toml", plugin_name))
}

/// Returns the core config path.
///
/// Path: `game/csgo/addons/cs2modes/configs/core.toml`
pub fn core_config_path() -> ConfigResult<PathBuf> {
    Ok(configs_dir()?.join("core.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_config_path_format() {
        let configs = PathBuf::from("/game/csgo/addons/cs2modes/configs");
        let path = plugin_path_in(configs, "extra_spawns");

        assert!(path.ends_with("plugins/extra_spawns/extra_spawns.toml"));
    }
}
