//! Configuration system
//!
//! Plugin configs are TOML files deserialized into serde structs. A missing
//! file is created from the struct's `Default`.
//!
//! # Example
//!
//! ```ignore
//! use serde::{Deserialize, Serialize};
//! use cs2modes_core::PluginConfig;
//!
//! #[derive(Default, Serialize, Deserialize)]
//! pub struct ZeusModeConfig {
//!     pub reminder_interval_secs: f32,
//! }
//!
//! impl PluginConfig for ZeusModeConfig {
//!     const PLUGIN_NAME: &'static str = "zeus_mode";
//! }
//!
//! let config = ZeusModeConfig::load().unwrap_or_default();
//! ```

mod loader;

use std::path::Path;
use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub use loader::{configs_dir, core_config_path, cs2modes_base_dir, plugin_config_path};

/// Configuration system errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write config file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML content
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config to TOML
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Could not determine config directory from plugin location
    #[error("Config directory not available - could not resolve plugin base path")]
    NoConfigDirectory,
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Read a TOML file, writing `T::default()` there first if it is missing
fn load_or_create<T>(path: &Path) -> ConfigResult<T>
where
    T: Default + Serialize + DeserializeOwned,
{
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    } else {
        let default = T::default();
        write_toml(&default, path)?;
        tracing::info!("Created default config at {:?}", path);
        Ok(default)
    }
}

/// Serialize to a TOML file, creating parent directories
fn write_toml<T: Serialize>(value: &T, path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(value)?;
    std::fs::write(path, content)?;
    tracing::debug!("Saved config to {:?}", path);
    Ok(())
}

/// Trait for plugin configuration types.
///
/// Files live at
/// `game/csgo/addons/cs2modes/configs/plugins/{PLUGIN_NAME}/{PLUGIN_NAME}.toml`.
pub trait PluginConfig: Default + Serialize + DeserializeOwned + Send + Sync {
    /// The plugin name used for config file path resolution.
    const PLUGIN_NAME: &'static str;

    /// Load config from the plugin's file, creating a default one if missing.
    fn load() -> ConfigResult<Self> {
        Self::load_from(&plugin_config_path(Self::PLUGIN_NAME)?)
    }

    /// Load config from an explicit path, creating a default one if missing.
    fn load_from(path: &Path) -> ConfigResult<Self> {
        load_or_create(path)
    }

    /// Save config to the plugin's file.
    fn save(&self) -> ConfigResult<()> {
        self.save_to(&plugin_config_path(Self::PLUGIN_NAME)?)
    }

    /// Save config to an explicit path.
    fn save_to(&self, path: &Path) -> ConfigResult<()> {
        write_toml(self, path)
    }

    /// Reload config from the plugin's file.
    fn reload(&mut self) -> ConfigResult<()> {
        let path = plugin_config_path(Self::PLUGIN_NAME)?;
        let content = std::fs::read_to_string(&path)?;
        *self = toml::from_str(&content)?;
        tracing::debug!("Reloaded config for {} from {:?}", Self::PLUGIN_NAME, path);
        Ok(())
    }
}

/// Core runtime configuration.
///
/// Loaded from `game/csgo/addons/cs2modes/configs/core.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Config version for future migration support
    pub version: u32,

    /// Enable debug logging
    pub debug: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            version: 1,
            debug: false,
        }
    }
}

impl CoreConfig {
    /// Load core config from file, creating default if missing.
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&core_config_path()?)
    }

    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        load_or_create(path)
    }

    /// Save core config to file.
    pub fn save(&self) -> ConfigResult<()> {
        write_toml(self, &core_config_path()?)
    }

    /// Default tracing filter directive for this config
    pub fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }
}

/// Convert a seconds field from a config file into a [`Duration`]
///
/// Values below `min` (and NaN) are raised to `min`. Values too large for a
/// `Duration` (including `inf`) fall back to `default_secs` with a warning.
pub fn duration_from_secs(field: &str, secs: f32, min: f32, default_secs: f32) -> Duration {
    match Duration::try_from_secs_f32(secs.max(min)) {
        Ok(duration) => duration,
        Err(e) => {
            tracing::warn!(
                "Config value {} = {} is out of range ({}), using {}s",
                field,
                secs,
                e,
                default_secs
            );
            Duration::from_secs_f32(default_secs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct TestConfig {
        pub value: i32,
        pub name: String,
    }

    impl Default for TestConfig {
        fn default() -> Self {
            Self {
                value: 5,
                name: "default".to_string(),
            }
        }
    }

    impl PluginConfig for TestConfig {
        const PLUGIN_NAME: &'static str = "test_config";
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("cs2modes-config-{}-{}", name, std::process::id()))
            .join("config.toml")
    }

    #[test]
    fn test_load_from_creates_default() {
        let path = temp_path("create");
        let _ = std::fs::remove_file(&path);

        let config = TestConfig::load_from(&path).unwrap();
        assert_eq!(config, TestConfig::default());
        assert!(path.exists());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_save_to_then_load_from() {
        let path = temp_path("save");
        let config = TestConfig {
            value: 42,
            name: "edited".to_string(),
        };
        config.save_to(&path).unwrap();

        assert_eq!(TestConfig::load_from(&path).unwrap(), config);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let path = temp_path("partial");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "value = 9\n").unwrap();

        let config = TestConfig::load_from(&path).unwrap();
        assert_eq!(config.value, 9);
        assert_eq!(config.name, "default");

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let path = temp_path("invalid");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "value = [not toml").unwrap();

        assert!(matches!(
            TestConfig::load_from(&path),
            Err(ConfigError::ParseError(_))
        ));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_core_config() {
        let config = CoreConfig::default();
        assert_eq!(config.version, 1);
        assert_eq!(config.log_level(), "info");

        let config = CoreConfig {
            version: 2,
            debug: true,
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("debug = true"));
        assert_eq!(config.log_level(), "debug");
    }

    #[test]
    fn test_duration_from_secs() {
        assert_eq!(duration_from_secs("a", 5.0, 0.1, 1.0), Duration::from_secs(5));
        assert_eq!(duration_from_secs("a", 0.0, 0.1, 1.0), Duration::from_secs_f32(0.1));
        assert_eq!(duration_from_secs("a", -3.0, 0.0, 1.0), Duration::ZERO);
        assert_eq!(duration_from_secs("a", f32::NAN, 0.1, 1.0), Duration::from_secs_f32(0.1));
        assert_eq!(duration_from_secs("a", f32::INFINITY, 0.1, 5.0), Duration::from_secs(5));
        assert_eq!(duration_from_secs("a", f32::MAX, 0.1, 5.0), Duration::from_secs(5));
    }
}
