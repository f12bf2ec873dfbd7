//! # Zeus Only Mode
//!
//! Toggleable game mode that limits every player to the Zeus x27, the knife
//! and utility grenades.
//!
//! ## Behaviour
//! - `css_zeus_mode <0/1>` snapshots every living player's loadout, strips
//!   illegal weapons and hands out a taser; turning it off gives the snapshot back
//! - Round start, late joins and pickups are re-checked while the mode is on
//! - `buy` is intercepted before the engine handles it
//! - A repeating chat reminder runs while the mode is on
//! - The mode switches itself off when the match ends

mod config;
pub mod weapons;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, Weak};

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};

use cs2modes_core::commands::{
    add_command_listener, remove_command_listener, CommandInfo, CommandListenerKey, CommandResult,
};
use cs2modes_core::events::{register_typed_event, remove_event_handler, EventHandlerKey};
use cs2modes_core::events::{EventGameEnd, EventItemPickup, EventRoundStart};
use cs2modes_core::host::{self, slot_from_userid, GameHost, PlayerInfo};
use cs2modes_core::listeners::{on_client_put_in_server, remove_listener, ListenerKey};
use cs2modes_core::timers::{add_repeating_timer, remove_timer, TimerKey};
use cs2modes_core::{console_command, HookResult, HostError, PluginConfig};

pub use config::ZeusModeConfig;
use weapons::{Whitelist, SELECT_TASER, TASER};

pub const PLUGIN_NAME: &str = "Zeus Only Mode";
pub const PLUGIN_VERSION: &str = "3.0";

/// Zeus Only Mode state
pub struct ZeusMode {
    host: Arc<dyn GameHost>,
    config: ZeusModeConfig,
    whitelist: Whitelist,
    enabled: AtomicBool,
    /// Loadout snapshots by SteamID64, as designer names
    saved: DashMap<u64, Vec<String>>,
    reminder: Mutex<Option<TimerKey>>,
    /// Weak self for timer callbacks
    this: Weak<ZeusMode>,
}

impl ZeusMode {
    pub fn new(host: Arc<dyn GameHost>, config: ZeusModeConfig) -> Arc<Self> {
        let whitelist = config.whitelist();
        Arc::new_cyclic(|this| Self {
            host,
            config,
            whitelist,
            enabled: AtomicBool::new(false),
            saved: DashMap::new(),
            reminder: Mutex::new(None),
            this: this.clone(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Saved loadout for a SteamID, if any
    pub fn saved_loadout(&self, steam_id: u64) -> Option<Vec<String>> {
        self.saved.get(&steam_id).map(|entry| entry.clone())
    }

    /// Key of the running reminder timer
    pub fn reminder_timer(&self) -> Option<TimerKey> {
        *self.reminder.lock()
    }

    // =========================================================================
    // Loadouts
    // =========================================================================

    /// Snapshot the designer names of every weapon the player holds
    ///
    /// Replaces any earlier snapshot. Dead or invalid players are skipped.
    pub fn save_loadout(&self, player: &PlayerInfo) {
        if !player.is_valid || !player.pawn_alive {
            return;
        }

        let loadout: Vec<String> = self
            .host
            .player_weapons(player.slot)
            .unwrap_or_default()
            .into_iter()
            .filter(|weapon| self.host.entity_is_valid(*weapon))
            .filter_map(|weapon| self.host.entity_designer_name(weapon))
            .collect();

        tracing::debug!("Saved loadout for {}: {:?}", player.steam_id, loadout);
        self.saved.insert(player.steam_id, loadout);
    }

    /// Give back every item in the player's snapshot
    pub fn restore_loadout(&self, player: &PlayerInfo) {
        if !player.is_valid || !player.pawn_alive {
            return;
        }

        let Some(loadout) = self.saved_loadout(player.steam_id) else {
            return;
        };

        for item in &loadout {
            self.host.give_named_item(player.slot, item);
        }
        tracing::debug!("Restored {} items for {}", loadout.len(), player.steam_id);
    }

    /// Remove every weapon the whitelist does not allow
    pub fn strip_illegal_weapons(&self, player: &PlayerInfo) {
        for weapon in self.host.player_weapons(player.slot).unwrap_or_default() {
            if !self.host.entity_is_valid(weapon) {
                continue;
            }
            let Some(name) = self.host.entity_designer_name(weapon) else {
                continue;
            };
            if !self.whitelist.allows(&name) {
                tracing::trace!("Stripping {} from slot {}", name, player.slot);
                self.host.remove_entity(weapon);
            }
        }
    }

    fn has_taser(&self, player: &PlayerInfo) -> bool {
        self.host
            .player_weapons(player.slot)
            .unwrap_or_default()
            .into_iter()
            .filter(|weapon| self.host.entity_is_valid(*weapon))
            .filter_map(|weapon| self.host.entity_designer_name(weapon))
            .any(|name| name.eq_ignore_ascii_case(TASER))
    }

    fn arm_with_taser(&self, player: &PlayerInfo) {
        self.host.give_named_item(player.slot, TASER);
        self.host.execute_client_command(player.slot, SELECT_TASER);
    }

    // =========================================================================
    // Toggle
    // =========================================================================

    /// `css_zeus_mode <0/1>`
    pub fn toggle(&self, player: Option<&PlayerInfo>, info: &CommandInfo) -> CommandResult {
        if info.arg_count() < 2 {
            self.reply(player, "Usage: css_zeus_mode <0/1>");
            self.reply(
                player,
                &format!("Zeus Mode Is Currently {}.", state_word(self.is_enabled())),
            );
            return CommandResult::Handled;
        }

        let new_state = info.arg(1) == "1";
        if new_state == self.is_enabled() {
            self.reply(
                player,
                &format!("Zeus Mode Is Already {}.", state_word(new_state)),
            );
            return CommandResult::Handled;
        }

        if new_state {
            self.enable();
        } else {
            self.disable();
        }
        CommandResult::Handled
    }

    fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
        self.host
            .print_to_chat_all("Zeus Mode Enabled — Loadouts Have Been Snapshot.");

        for player in self.host.players() {
            if !player.is_alive_in_game() {
                continue;
            }
            self.save_loadout(&player);
            self.strip_illegal_weapons(&player);
            self.arm_with_taser(&player);
        }

        self.start_reminder();
        tracing::info!("Zeus mode enabled");
    }

    fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
        self.host
            .print_to_chat_all("Zeus Mode Disabled — Loadouts Have Been Restored.");

        for player in self.host.players() {
            if player.is_in_game() {
                self.restore_loadout(&player);
            }
        }

        self.stop_reminder();
        tracing::info!("Zeus mode disabled");
    }

    fn reply(&self, player: Option<&PlayerInfo>, message: &str) {
        match player {
            Some(player) => self.host.print_to_chat(player.slot, message),
            None => self.host.print_to_server_console(message),
        }
    }

    // =========================================================================
    // Reminder
    // =========================================================================

    fn start_reminder(&self) {
        self.stop_reminder();

        let this = self.this.clone();
        let key = add_repeating_timer(self.config.reminder_interval(), move || {
            if let Some(this) = this.upgrade() {
                this.remind();
            }
        });
        *self.reminder.lock() = Some(key);
    }

    fn stop_reminder(&self) {
        if let Some(key) = self.reminder.lock().take() {
            remove_timer(key);
        }
    }

    /// Broadcast the reminder while the mode is on
    pub fn remind(&self) {
        if self.is_enabled() {
            self.host.print_to_chat_all(&self.config.reminder_message);
        }
    }

    // =========================================================================
    // Game events
    // =========================================================================

    /// Drop last round's snapshots, then re-apply the mode to every player
    pub fn on_round_start(&self) -> HookResult {
        self.saved.clear();

        if !self.is_enabled() {
            return HookResult::Continue;
        }

        for player in self.host.players() {
            if !player.is_in_game() {
                continue;
            }
            self.save_loadout(&player);
            self.strip_illegal_weapons(&player);

            if !self.has_taser(&player) {
                self.host.give_named_item(player.slot, TASER);
            }
            self.host.execute_client_command(player.slot, SELECT_TASER);
        }

        HookResult::Continue
    }

    /// Kill an illegal weapon right after it was picked up
    pub fn on_item_pickup(&self, event: &EventItemPickup) -> HookResult {
        if !self.is_enabled() || self.whitelist.allows(&event.item) {
            return HookResult::Continue;
        }

        let Some(player) = slot_from_userid(event.userid).and_then(|slot| self.host.player(slot))
        else {
            return HookResult::Continue;
        };
        if !player.is_valid {
            return HookResult::Continue;
        }

        let item = weapons::normalize(&event.item);
        let picked_up = self
            .host
            .player_weapons(player.slot)
            .unwrap_or_default()
            .into_iter()
            .filter(|weapon| self.host.entity_is_valid(*weapon))
            .find(|weapon| {
                self.host
                    .entity_designer_name(*weapon)
                    .is_some_and(|name| weapons::normalize(&name) == item)
            });

        if let Some(weapon) = picked_up {
            tracing::debug!("Killing picked up {} ({}) from slot {}", item, weapon, player.slot);
            self.host.accept_input(weapon, "Kill");
        }

        HookResult::Continue
    }

    /// Apply the mode to a player who just joined
    pub fn on_player_join(&self, slot: i32) {
        let Some(player) = self.host.player(slot) else {
            return;
        };
        if !player.is_valid || player.steam_id == 0 {
            return;
        }

        if self.is_enabled() {
            self.save_loadout(&player);
            self.strip_illegal_weapons(&player);
            self.arm_with_taser(&player);
        }
    }

    /// Switch the mode off when the match is over
    pub fn on_game_end(&self) -> HookResult {
        if !self.is_enabled() {
            return HookResult::Continue;
        }

        self.enabled.store(false, Ordering::Relaxed);
        self.host
            .print_to_chat_all("Zeus Mode Was Disabled — Thanks For Playing!");

        for player in self.host.players() {
            if player.is_alive_in_game() {
                self.restore_loadout(&player);
            }
        }

        self.stop_reminder();
        HookResult::Continue
    }

    /// Block `buy <item>` for anything outside the whitelist
    pub fn on_buy_command(&self, player: Option<&PlayerInfo>, info: &CommandInfo) -> HookResult {
        let Some(player) = player else {
            return HookResult::Continue;
        };
        if !self.is_enabled() || !player.is_in_game() || info.arg_count() < 2 {
            return HookResult::Continue;
        }

        let item = weapons::normalize(info.arg(1));

        // Loadout slots the client has not filled yet, caught on pickup instead
        if item == "unused" {
            return HookResult::Continue;
        }

        if !self.whitelist.allows(&item) {
            self.host
                .print_to_chat(player.slot, "Only Zeus and Utility Are Allowed.");
            return HookResult::Stop;
        }

        HookResult::Continue
    }

    /// Stop the reminder
    pub fn unload(&self) {
        self.stop_reminder();
    }
}

fn state_word(enabled: bool) -> &'static str {
    if enabled {
        "Enabled"
    } else {
        "Disabled"
    }
}

// =============================================================================
// Registration
// =============================================================================

struct Loaded {
    plugin: Arc<ZeusMode>,
    events: Vec<EventHandlerKey>,
    join_listener: ListenerKey,
    buy_listener: CommandListenerKey,
}

static LOADED: LazyLock<RwLock<Option<Loaded>>> = LazyLock::new(|| RwLock::new(None));

fn instance() -> Option<Arc<ZeusMode>> {
    LOADED.read().as_ref().map(|loaded| Arc::clone(&loaded.plugin))
}

#[console_command("css_zeus_mode", "Enable or disable Zeus-only mode")]
fn cmd_zeus_mode(player: Option<&PlayerInfo>, info: &CommandInfo) -> CommandResult {
    match instance() {
        Some(plugin) => plugin.toggle(player, info),
        None => CommandResult::Continue,
    }
}

/// Load config and hook the mode into the runtime
///
/// Requires an installed host.
pub fn init() -> Result<(), HostError> {
    let config = ZeusModeConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Failed to load zeus_mode config, using defaults: {}", e);
        ZeusModeConfig::default()
    });
    init_with(config)
}

/// Hook the mode into the runtime with an already loaded config
pub fn init_with(config: ZeusModeConfig) -> Result<(), HostError> {
    let host = host::require_host()?;
    let plugin = ZeusMode::new(host, config);

    let events = vec![
        register_typed_event::<EventRoundStart, _>(true, |_event, _info| {
            instance().map_or(HookResult::Continue, |p| p.on_round_start())
        }),
        register_typed_event::<EventItemPickup, _>(true, |event, _info| {
            instance().map_or(HookResult::Continue, |p| p.on_item_pickup(&event))
        }),
        register_typed_event::<EventGameEnd, _>(true, |_event, _info| {
            instance().map_or(HookResult::Continue, |p| p.on_game_end())
        }),
    ];

    let join_listener = on_client_put_in_server(|slot| {
        if let Some(plugin) = instance() {
            plugin.on_player_join(slot);
        }
    });

    let buy_listener = add_command_listener("buy", |player, info| {
        instance().map_or(HookResult::Continue, |p| p.on_buy_command(player, info))
    });

    cmd_zeus_mode_register();

    *LOADED.write() = Some(Loaded {
        plugin,
        events,
        join_listener,
        buy_listener,
    });

    tracing::info!("{} v{} loaded", PLUGIN_NAME, PLUGIN_VERSION);
    Ok(())
}

/// Unhook the mode and stop its timer
pub fn unload() {
    let Some(loaded) = LOADED.write().take() else {
        return;
    };

    loaded.plugin.unload();
    for key in loaded.events {
        remove_event_handler(key);
    }
    remove_listener(loaded.join_listener);
    remove_command_listener(loaded.buy_listener);
    cmd_zeus_mode_unregister();

    tracing::info!("{} unloaded", PLUGIN_NAME);
}
