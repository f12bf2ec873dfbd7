//! Zeus Mode configuration
//!
//! Location: `game/csgo/addons/cs2modes/configs/plugins/zeus_mode/zeus_mode.toml`

use std::time::Duration;

use serde::{Deserialize, Serialize};

use cs2modes_core::{duration_from_secs, PluginConfig};

use crate::weapons::{Whitelist, DEFAULT_ALLOWED};

const DEFAULT_REMINDER_INTERVAL_SECS: f32 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZeusModeConfig {
    /// Seconds between reminder broadcasts while the mode is on
    pub reminder_interval_secs: f32,

    /// Reminder broadcast to all players
    pub reminder_message: String,

    /// Items players may keep or buy (`weapon_`/`item_` prefixes optional)
    pub allowed_weapons: Vec<String>,
}

impl Default for ZeusModeConfig {
    fn default() -> Self {
        Self {
            reminder_interval_secs: DEFAULT_REMINDER_INTERVAL_SECS,
            reminder_message: "Zeus, Utility, and Knife only!".to_string(),
            allowed_weapons: DEFAULT_ALLOWED.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ZeusModeConfig {
    pub fn whitelist(&self) -> Whitelist {
        Whitelist::new(&self.allowed_weapons)
    }

    /// Reminder period, at least 0.1 s
    pub fn reminder_interval(&self) -> Duration {
        duration_from_secs(
            "reminder_interval_secs",
            self.reminder_interval_secs,
            0.1,
            DEFAULT_REMINDER_INTERVAL_SECS,
        )
    }
}

impl PluginConfig for ZeusModeConfig {
    const PLUGIN_NAME: &'static str = "zeus_mode";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ZeusModeConfig::default();
        assert_eq!(config.reminder_interval_secs, 5.0);
        assert_eq!(config.whitelist().len(), DEFAULT_ALLOWED.len());
    }

    #[test]
    fn test_partial_toml() {
        let config: ZeusModeConfig = toml::from_str(r#"allowed_weapons = ["taser"]"#).unwrap();
        assert_eq!(config.reminder_message, "Zeus, Utility, and Knife only!");
        assert!(config.whitelist().allows("weapon_taser"));
        assert!(!config.whitelist().allows("weapon_knife"));
    }

    #[test]
    fn test_infinite_reminder_interval_falls_back() {
        let config: ZeusModeConfig = toml::from_str("reminder_interval_secs = inf").unwrap();
        assert_eq!(config.reminder_interval(), Duration::from_secs(5));

        let config: ZeusModeConfig = toml::from_str("reminder_interval_secs = 0.01").unwrap();
        assert_eq!(config.reminder_interval(), Duration::from_secs_f32(0.1));
    }
}
