//! # Extra Spawns
//!
//! Pads each team's spawn points up to a fixed count by cloning the map's
//! existing spawns at small offsets, so large servers don't run out of spawns.
//!
//! Also turns off teammate collisions for the first seconds of every round
//! so players stacked on cloned spawns can move apart.

mod config;

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, LazyLock, Weak};

use parking_lot::{Mutex, RwLock};

use cs2modes_core::commands::{CommandInfo, CommandResult};
use cs2modes_core::events::{register_typed_event, remove_event_handler, EventHandlerKey};
use cs2modes_core::events::EventRoundStart;
use cs2modes_core::host::{self, GameHost, PlayerInfo, Vector};
use cs2modes_core::listeners::{on_map_start, remove_listener, ListenerKey};
use cs2modes_core::timers::{add_repeating_timer, add_timer_with_flags, remove_timer};
use cs2modes_core::timers::{TimerFlags, TimerKey};
use cs2modes_core::{console_command, HookResult, HostError, PluginConfig};

pub use config::{ExtraSpawnsConfig, COUNTER_TERRORIST_SPAWN, TERRORIST_SPAWN};

pub const PLUGIN_NAME: &str = "Extra Spawns";
pub const PLUGIN_VERSION: &str = "1.2.1";

const SOLID_TEAMMATES: &str = "mp_solid_teammates";

/// Engine default for `mp_solid_teammates`
const DEFAULT_SOLID_TEAMMATES: i32 = 2;

/// Clone spawn points of `class` until there are `max_per_team` of them
///
/// Each existing spawn with a known origin and rotation is cloned at every
/// offset in turn. Returns how many spawns were created.
pub fn add_extra_spawns(
    host: &dyn GameHost,
    class: &str,
    max_per_team: usize,
    offsets: &[Vector],
) -> usize {
    let spawns = host.find_entities_by_designer_name(class);
    if spawns.is_empty() {
        return 0;
    }

    let needed = max_per_team.saturating_sub(spawns.len());
    if needed == 0 {
        return 0;
    }

    let mut created = 0;
    'spawns: for spawn in spawns {
        if created >= needed {
            break;
        }

        let (Some(origin), Some(rotation)) =
            (host.entity_abs_origin(spawn), host.entity_abs_rotation(spawn))
        else {
            tracing::trace!("Spawn {} has no scene node, skipping", spawn);
            continue;
        };

        for offset in offsets {
            if created >= needed {
                break 'spawns;
            }

            let Some(new_spawn) = host.create_entity_by_name(class) else {
                tracing::warn!("Failed to create {}", class);
                continue;
            };
            host.teleport(new_spawn, Some(origin + *offset), Some(rotation), None);
            host.dispatch_spawn(new_spawn);
            created += 1;
        }
    }

    if created > 0 {
        host.print_to_server_console(&format!(
            "[ExtraSpawns] Added {} spawns for {}.",
            created, class
        ));
    }
    created
}

/// Extra Spawns state
pub struct ExtraSpawns {
    host: Arc<dyn GameHost>,
    config: ExtraSpawnsConfig,
    offsets: Vec<Vector>,
    spawns_created: AtomicBool,
    check_timer: Mutex<Option<TimerKey>>,
    solid_timer: Mutex<Option<TimerKey>>,
    /// `mp_solid_teammates` before the round start override
    previous_solid: AtomicI32,
    this: Weak<ExtraSpawns>,
}

impl ExtraSpawns {
    pub fn new(host: Arc<dyn GameHost>, config: ExtraSpawnsConfig) -> Arc<Self> {
        let offsets = config.offset_vectors();
        Arc::new_cyclic(|this| Self {
            host,
            config,
            offsets,
            spawns_created: AtomicBool::new(false),
            check_timer: Mutex::new(None),
            solid_timer: Mutex::new(None),
            previous_solid: AtomicI32::new(DEFAULT_SOLID_TEAMMATES),
            this: this.clone(),
        })
    }

    pub fn spawns_created(&self) -> bool {
        self.spawns_created.load(Ordering::Relaxed)
    }

    pub fn check_timer(&self) -> Option<TimerKey> {
        *self.check_timer.lock()
    }

    pub fn solid_timer(&self) -> Option<TimerKey> {
        *self.solid_timer.lock()
    }

    /// Pad one spawn class
    pub fn add_spawns(&self, class: &str) -> usize {
        add_extra_spawns(
            self.host.as_ref(),
            class,
            self.config.max_spawns_per_team,
            &self.offsets,
        )
    }

    /// Pad every configured spawn class, returning how many spawns each got
    pub fn add_spawns_for_all(&self) -> Vec<usize> {
        self.config
            .spawn_classes
            .iter()
            .map(|class| self.add_spawns(class))
            .collect()
    }

    /// Start polling for spawn points on a fresh map
    pub fn on_map_start(&self, map: &str) {
        tracing::debug!("Map {} started, checking spawns", map);
        self.spawns_created.store(false, Ordering::Relaxed);
        self.kill_check_timer();

        let this = self.this.clone();
        let key = add_repeating_timer(self.config.check_interval(), move || {
            if let Some(this) = this.upgrade() {
                this.check_spawns();
            }
        });
        *self.check_timer.lock() = Some(key);
    }

    /// One poll: pad spawns, and stop polling once any were created
    pub fn check_spawns(&self) {
        if self.spawns_created() {
            self.kill_check_timer();
            return;
        }

        let created: usize = self.add_spawns_for_all().into_iter().sum();
        if created > 0 {
            self.spawns_created.store(true, Ordering::Relaxed);
            self.host
                .print_to_server_console("[ExtraSpawns] Spawns created, stopping checks.");
            self.kill_check_timer();
        }
    }

    /// Disable teammate collisions and schedule their restore
    pub fn on_round_start(&self) -> HookResult {
        self.kill_solid_timer();

        let previous = self
            .host
            .find_convar(SOLID_TEAMMATES)
            .and_then(|value| value.as_int())
            .unwrap_or(DEFAULT_SOLID_TEAMMATES);
        self.previous_solid.store(previous, Ordering::Relaxed);

        self.host
            .execute_server_command(&format!("{} 0", SOLID_TEAMMATES));
        self.host
            .print_to_server_console("[ExtraSpawns] mp_solid_teammates set to 0 at round start.");

        let this = self.this.clone();
        let delay = self.config.solid_teammates_restore_delay();
        let key = add_timer_with_flags(delay, TimerFlags::STOP_ON_MAPCHANGE, move || {
            if let Some(this) = this.upgrade() {
                this.restore_solid_teammates();
            }
        });
        *self.solid_timer.lock() = Some(key);

        HookResult::Continue
    }

    /// Put `mp_solid_teammates` back to its pre-round value
    pub fn restore_solid_teammates(&self) {
        let previous = self.previous_solid.load(Ordering::Relaxed);
        self.host
            .execute_server_command(&format!("{} {}", SOLID_TEAMMATES, previous));
        self.host.print_to_server_console(&format!(
            "[ExtraSpawns] mp_solid_teammates restored to {}.",
            previous
        ));
        self.kill_solid_timer();
    }

    /// `css_spawns`
    pub fn generate(&self, _player: Option<&PlayerInfo>, info: &CommandInfo) -> CommandResult {
        self.add_spawns_for_all();
        self.reply(info, "[ExtraSpawns] Extra spawns generated.");
        CommandResult::Handled
    }

    fn reply(&self, info: &CommandInfo, message: &str) {
        match info.player() {
            Some(player) if info.context().is_chat() => self.host.print_to_chat(player.slot, message),
            Some(player) => self.host.print_to_console(player.slot, message),
            None => self.host.print_to_server_console(message),
        }
    }

    fn kill_check_timer(&self) {
        if let Some(key) = self.check_timer.lock().take() {
            remove_timer(key);
        }
    }

    fn kill_solid_timer(&self) {
        if let Some(key) = self.solid_timer.lock().take() {
            remove_timer(key);
        }
    }

    /// Stop both timers
    pub fn unload(&self) {
        self.kill_check_timer();
        self.kill_solid_timer();
    }
}

// =============================================================================
// Registration
// =============================================================================

struct Loaded {
    plugin: Arc<ExtraSpawns>,
    round_start: EventHandlerKey,
    map_start: ListenerKey,
}

static LOADED: LazyLock<RwLock<Option<Loaded>>> = LazyLock::new(|| RwLock::new(None));

fn instance() -> Option<Arc<ExtraSpawns>> {
    LOADED.read().as_ref().map(|loaded| Arc::clone(&loaded.plugin))
}

#[console_command("css_spawns", "Generate extra spawns for T and CT")]
fn cmd_spawns(player: Option<&PlayerInfo>, info: &CommandInfo) -> CommandResult {
    match instance() {
        Some(plugin) => plugin.generate(player, info),
        None => CommandResult::Continue,
    }
}

/// Load config and hook the plugin into the runtime
///
/// Requires an installed host.
pub fn init() -> Result<(), HostError> {
    let config = ExtraSpawnsConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Failed to load extra_spawns config, using defaults: {}", e);
        ExtraSpawnsConfig::default()
    });
    init_with(config)
}

/// Hook the plugin into the runtime with an already loaded config
pub fn init_with(config: ExtraSpawnsConfig) -> Result<(), HostError> {
    let host = host::require_host()?;
    let plugin = ExtraSpawns::new(host, config);

    let map_start = on_map_start(|map| {
        if let Some(plugin) = instance() {
            plugin.on_map_start(map);
        }
    });

    let round_start = register_typed_event::<EventRoundStart, _>(true, |_event, _info| {
        instance().map_or(HookResult::Continue, |p| p.on_round_start())
    });

    cmd_spawns_register();

    *LOADED.write() = Some(Loaded {
        plugin,
        round_start,
        map_start,
    });

    tracing::info!("{} v{} loaded", PLUGIN_NAME, PLUGIN_VERSION);
    Ok(())
}

/// Unhook the plugin and stop its timers
pub fn unload() {
    let Some(loaded) = LOADED.write().take() else {
        return;
    };

    loaded.plugin.unload();
    remove_event_handler(loaded.round_start);
    remove_listener(loaded.map_start);
    cmd_spawns_unregister();

    tracing::info!("{} unloaded", PLUGIN_NAME);
}

#[cfg(test)]
mod tests {
    use super::*;
    use cs2modes_core::commands::CommandContext;
    use cs2modes_core::host::{ConVarValue, QAngle, Team};
    use cs2modes_core::testing::FakeHost;
    use cs2modes_core::timers::is_timer_active;

    fn setup() -> (Arc<FakeHost>, Arc<ExtraSpawns>) {
        let host = Arc::new(FakeHost::new());
        let plugin = ExtraSpawns::new(host.clone(), ExtraSpawnsConfig::default());
        (host, plugin)
    }

    fn offsets() -> Vec<Vector> {
        ExtraSpawnsConfig::default().offset_vectors()
    }

    fn add_spawn(host: &FakeHost, class: &str, x: f32) {
        host.add_entity(
            class,
            Some(Vector::new(x, 100.0, 0.0)),
            Some(QAngle::new(0.0, 90.0, 0.0)),
        );
    }

    #[test]
    fn test_no_spawns_creates_nothing() {
        let host = FakeHost::new();
        assert_eq!(add_extra_spawns(&host, TERRORIST_SPAWN, 32, &offsets()), 0);
        assert!(host.server_console().is_empty());
    }

    #[test]
    fn test_full_team_creates_nothing() {
        let host = FakeHost::new();
        for i in 0..4 {
            add_spawn(&host, TERRORIST_SPAWN, i as f32);
        }
        assert_eq!(add_extra_spawns(&host, TERRORIST_SPAWN, 4, &offsets()), 0);
        assert_eq!(add_extra_spawns(&host, TERRORIST_SPAWN, 3, &offsets()), 0);
        assert_eq!(host.entities_named(TERRORIST_SPAWN).len(), 4);
    }

    #[test]
    fn test_pads_to_max() {
        let host = FakeHost::new();
        for i in 0..10 {
            add_spawn(&host, COUNTER_TERRORIST_SPAWN, i as f32 * 50.0);
        }

        assert_eq!(add_extra_spawns(&host, COUNTER_TERRORIST_SPAWN, 32, &offsets()), 22);

        let spawns = host.entities_named(COUNTER_TERRORIST_SPAWN);
        assert_eq!(spawns.len(), 32);
        assert!(spawns.iter().all(|s| s.spawned));
        assert!(spawns
            .iter()
            .all(|s| s.rotation == Some(QAngle::new(0.0, 90.0, 0.0))));
        assert_eq!(
            host.server_console(),
            vec!["[ExtraSpawns] Added 22 spawns for info_player_counterterrorist.".to_string()]
        );
    }

    #[test]
    fn test_offsets_applied_in_order() {
        let host = FakeHost::new();
        add_spawn(&host, TERRORIST_SPAWN, 0.0);

        assert_eq!(add_extra_spawns(&host, TERRORIST_SPAWN, 4, &offsets()), 3);

        let origins: Vec<_> = host
            .entities_named(TERRORIST_SPAWN)
            .into_iter()
            .filter_map(|s| s.origin)
            .collect();
        assert_eq!(
            origins,
            vec![
                Vector::new(0.0, 100.0, 0.0),
                Vector::new(2.0, 100.0, 0.0),
                Vector::new(1.0, 100.0, 0.0),
                Vector::new(0.0, 102.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_skips_spawns_without_scene_node() {
        let host = FakeHost::new();
        host.add_entity(TERRORIST_SPAWN, None, Some(QAngle::default()));
        host.add_entity(TERRORIST_SPAWN, Some(Vector::default()), None);

        assert_eq!(add_extra_spawns(&host, TERRORIST_SPAWN, 32, &offsets()), 0);

        add_spawn(&host, TERRORIST_SPAWN, 0.0);
        assert_eq!(add_extra_spawns(&host, TERRORIST_SPAWN, 32, &offsets()), 4);
    }

    #[test]
    fn test_failed_creation_not_counted() {
        let host = FakeHost::new();
        add_spawn(&host, TERRORIST_SPAWN, 0.0);
        host.refuse_entity_creation(true);

        assert_eq!(add_extra_spawns(&host, TERRORIST_SPAWN, 32, &offsets()), 0);
        assert!(host.server_console().is_empty());
    }

    #[test]
    fn test_check_spawns_stops_once_created() {
        let (host, plugin) = setup();

        plugin.on_map_start("de_dust2");
        let key = plugin.check_timer().unwrap();
        assert!(is_timer_active(key));

        // Map entities not loaded yet: keep polling
        plugin.check_spawns();
        assert!(!plugin.spawns_created());
        assert!(is_timer_active(key));

        add_spawn(&host, TERRORIST_SPAWN, 0.0);
        add_spawn(&host, COUNTER_TERRORIST_SPAWN, 500.0);
        plugin.check_spawns();

        assert!(plugin.spawns_created());
        assert!(!is_timer_active(key));
        assert_eq!(plugin.check_timer(), None);
        assert_eq!(host.entities_named(TERRORIST_SPAWN).len(), 5);
        assert_eq!(
            host.server_console().last().map(String::as_str),
            Some("[ExtraSpawns] Spawns created, stopping checks.")
        );
    }

    #[test]
    fn test_map_start_resets_flag() {
        let (host, plugin) = setup();
        add_spawn(&host, TERRORIST_SPAWN, 0.0);
        plugin.on_map_start("de_inferno");
        plugin.check_spawns();
        assert!(plugin.spawns_created());

        plugin.on_map_start("de_mirage");
        assert!(!plugin.spawns_created());
        let key = plugin.check_timer().unwrap();
        assert!(is_timer_active(key));

        plugin.unload();
        assert!(!is_timer_active(key));
    }

    #[test]
    fn test_round_start_disables_collisions() {
        let (host, plugin) = setup();
        host.set_convar(SOLID_TEAMMATES, ConVarValue::Int(1));

        assert_eq!(plugin.on_round_start(), HookResult::Continue);
        assert_eq!(host.convar(SOLID_TEAMMATES), Some(ConVarValue::Int(0)));
        assert_eq!(
            host.server_console(),
            vec!["[ExtraSpawns] mp_solid_teammates set to 0 at round start.".to_string()]
        );
        let key = plugin.solid_timer().unwrap();
        assert!(is_timer_active(key));

        plugin.restore_solid_teammates();
        assert_eq!(host.convar(SOLID_TEAMMATES), Some(ConVarValue::Int(1)));
        assert_eq!(
            host.server_console().last().map(String::as_str),
            Some("[ExtraSpawns] mp_solid_teammates restored to 1.")
        );
        assert_eq!(plugin.solid_timer(), None);
        assert!(!is_timer_active(key));
    }

    #[test]
    fn test_round_start_replaces_pending_restore() {
        let (host, plugin) = setup();

        plugin.on_round_start();
        let first = plugin.solid_timer().unwrap();
        plugin.on_round_start();
        let second = plugin.solid_timer().unwrap();

        assert!(!is_timer_active(first));
        assert!(is_timer_active(second));

        // Restoring early cancels the pending timer
        plugin.restore_solid_teammates();
        assert!(!is_timer_active(second));
        assert_eq!(plugin.solid_timer(), None);

        // Missing convar falls back to the engine default
        assert_eq!(
            host.server_commands(),
            vec![
                "mp_solid_teammates 0".to_string(),
                "mp_solid_teammates 0".to_string(),
                "mp_solid_teammates 2".to_string(),
            ]
        );

        plugin.unload();
        assert_eq!(host.server_commands().len(), 3);
    }

    #[test]
    fn test_generate_command() {
        let (host, plugin) = setup();
        add_spawn(&host, TERRORIST_SPAWN, 0.0);
        let player = host.add_player(0, 76561198000000001, Team::Terrorist);

        let info = CommandInfo::from_line("css_spawns", Some(player.clone()), CommandContext::ClientConsole);
        assert_eq!(plugin.generate(Some(&player), &info), CommandResult::Handled);
        assert_eq!(host.entities_named(TERRORIST_SPAWN).len(), 5);
        assert_eq!(host.console(0), vec!["[ExtraSpawns] Extra spawns generated.".to_string()]);

        let info = CommandInfo::from_line("spawns", Some(player.clone()), CommandContext::ChatPublic);
        plugin.generate(Some(&player), &info);
        assert_eq!(host.chat(0), vec!["[ExtraSpawns] Extra spawns generated.".to_string()]);

        let info = CommandInfo::from_line("css_spawns", None, CommandContext::ServerConsole);
        plugin.generate(None, &info);
        assert_eq!(
            host.server_console().last().map(String::as_str),
            Some("[ExtraSpawns] Extra spawns generated.")
        );
    }

    #[test]
    fn test_infinite_intervals_use_defaults() {
        let host = Arc::new(FakeHost::new());
        let config: ExtraSpawnsConfig =
            toml::from_str("check_interval_secs = inf\nsolid_teammates_restore_secs = inf").unwrap();
        let plugin = ExtraSpawns::new(host, config);

        plugin.on_map_start("de_nuke");
        plugin.on_round_start();
        let check = plugin.check_timer().unwrap();
        let solid = plugin.solid_timer().unwrap();
        assert!(is_timer_active(check));
        assert!(is_timer_active(solid));

        plugin.unload();
        assert!(!is_timer_active(check));
        assert!(!is_timer_active(solid));
    }

    // Only test in this crate touching the global host and registries.
    #[test]
    fn test_init_wires_handlers_until_unload() {
        use cs2modes_core::commands::{dispatch_chat, dispatch_command};
        use cs2modes_core::events::{fire_event_post, GameEventData};
        use cs2modes_core::host::{install_host, uninstall_host};
        use cs2modes_core::listeners::fire_map_start;

        let host = Arc::new(FakeHost::new());
        let _ = uninstall_host();
        install_host(host.clone()).unwrap();
        init_with(ExtraSpawnsConfig::default()).unwrap();
        let plugin = instance().unwrap();

        fire_map_start("de_dust2");
        let check = plugin.check_timer().unwrap();
        assert!(is_timer_active(check));

        host.set_convar(SOLID_TEAMMATES, ConVarValue::Int(1));
        fire_event_post(&GameEventData::new("round_start"), false);
        assert_eq!(host.convar(SOLID_TEAMMATES), Some(ConVarValue::Int(0)));
        let solid = plugin.solid_timer().unwrap();
        assert!(is_timer_active(solid));

        add_spawn(&host, TERRORIST_SPAWN, 0.0);
        assert_eq!(dispatch_command(None, "css_spawns"), CommandResult::Handled);
        assert_eq!(host.entities_named(TERRORIST_SPAWN).len(), 5);
        assert_eq!(
            host.server_console().last().map(String::as_str),
            Some("[ExtraSpawns] Extra spawns generated.")
        );

        let player = host.add_player(1, 76561198000000001, Team::CounterTerrorist);
        assert_eq!(dispatch_chat(player.clone(), "!spawns"), CommandResult::Handled);
        assert_eq!(host.chat(1), vec!["[ExtraSpawns] Extra spawns generated.".to_string()]);
        assert_eq!(dispatch_chat(player.clone(), "/spawns"), CommandResult::Block);

        unload();
        assert!(instance().is_none());
        assert!(!is_timer_active(check));
        assert!(!is_timer_active(solid));
        assert_eq!(dispatch_command(None, "css_spawns"), CommandResult::Continue);
        assert_eq!(dispatch_chat(player, "!spawns"), CommandResult::Continue);

        let commands = host.server_commands().len();
        fire_event_post(&GameEventData::new("round_start"), false);
        fire_map_start("de_mirage");
        assert_eq!(host.server_commands().len(), commands);
        assert_eq!(plugin.check_timer(), None);

        uninstall_host();
    }
}
