//! Extra Spawns configuration
//!
//! Location: `game/csgo/addons/cs2modes/configs/plugins/extra_spawns/extra_spawns.toml`

use std::time::Duration;

use serde::{Deserialize, Serialize};

use cs2modes_core::host::Vector;
use cs2modes_core::{duration_from_secs, PluginConfig};

/// Spawn point classes that get padded
pub const TERRORIST_SPAWN: &str = "info_player_terrorist";
pub const COUNTER_TERRORIST_SPAWN: &str = "info_player_counterterrorist";

const DEFAULT_CHECK_INTERVAL_SECS: f32 = 5.0;
const DEFAULT_SOLID_RESTORE_SECS: f32 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtraSpawnsConfig {
    /// Spawn points each team ends up with
    pub max_spawns_per_team: usize,

    /// Seconds between spawn checks after a map starts
    pub check_interval_secs: f32,

    /// Seconds after round start before teammate collisions come back
    pub solid_teammates_restore_secs: f32,

    /// Offsets from each existing spawn, tried in order
    pub offsets: Vec<[f32; 3]>,

    /// Spawn point classes to pad
    pub spawn_classes: Vec<String>,
}

impl Default for ExtraSpawnsConfig {
    fn default() -> Self {
        Self {
            max_spawns_per_team: 32,
            check_interval_secs: DEFAULT_CHECK_INTERVAL_SECS,
            solid_teammates_restore_secs: DEFAULT_SOLID_RESTORE_SECS,
            offsets: vec![[2.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 1.0, 0.0]],
            spawn_classes: vec![
                TERRORIST_SPAWN.to_string(),
                COUNTER_TERRORIST_SPAWN.to_string(),
            ],
        }
    }
}

impl ExtraSpawnsConfig {
    pub fn offset_vectors(&self) -> Vec<Vector> {
        self.offsets.iter().copied().map(Vector::from).collect()
    }

    /// Spawn check period, at least 0.1 s
    pub fn check_interval(&self) -> Duration {
        duration_from_secs(
            "check_interval_secs",
            self.check_interval_secs,
            0.1,
            DEFAULT_CHECK_INTERVAL_SECS,
        )
    }

    pub fn solid_teammates_restore_delay(&self) -> Duration {
        duration_from_secs(
            "solid_teammates_restore_secs",
            self.solid_teammates_restore_secs,
            0.0,
            DEFAULT_SOLID_RESTORE_SECS,
        )
    }
}

impl PluginConfig for ExtraSpawnsConfig {
    const PLUGIN_NAME: &'static str = "extra_spawns";
}
