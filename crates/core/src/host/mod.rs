//! The host seam
//!
//! Every entity, player, weapon and console variable is owned by the game
//! server. Plugins reach them only through the [`GameHost`] trait: the FFI
//! layer installs a native implementation on load, and tests install
//! [`FakeHost`](crate::testing::FakeHost).
//!
//! # Example
//!
//! ```ignore
//! use cs2modes_core::host;
//!
//! if let Some(host) = host::host() {
//!     for player in host.players() {
//!         host.print_to_chat(player.slot, "Hello!");
//!     }
//! }
//! ```

mod types;

use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;

pub use types::{
    slot_from_userid, ConVarValue, EntityIndex, PlayerInfo, QAngle, Team, Vector,
    FIRST_PLAYABLE_TEAM, MAX_PLAYERS,
};

use crate::error::HostError;

/// Operations the game server exposes to plugins
///
/// Implementations are called from the game thread only. Every read may come
/// back empty when the underlying entity is not (or no longer) valid; callers
/// treat that as a silent no-op.
pub trait GameHost: Send + Sync {
    // === Entities ===

    /// All entities whose designer name equals `designer_name` (e.g. `info_player_terrorist`)
    fn find_entities_by_designer_name(&self, designer_name: &str) -> Vec<EntityIndex>;

    /// Create a new, not yet spawned, entity of the given class
    fn create_entity_by_name(&self, class_name: &str) -> Option<EntityIndex>;

    /// Whether the entity still exists
    fn entity_is_valid(&self, entity: EntityIndex) -> bool;

    /// Designer name of the entity (e.g. `weapon_ak47`)
    fn entity_designer_name(&self, entity: EntityIndex) -> Option<String>;

    /// Absolute origin of the entity's scene node
    fn entity_abs_origin(&self, entity: EntityIndex) -> Option<Vector>;

    /// Absolute rotation of the entity's scene node
    fn entity_abs_rotation(&self, entity: EntityIndex) -> Option<QAngle>;

    /// Move the entity. `None` leaves the corresponding component untouched.
    fn teleport(
        &self,
        entity: EntityIndex,
        position: Option<Vector>,
        angles: Option<QAngle>,
        velocity: Option<Vector>,
    );

    /// Spawn a previously created entity into the world
    fn dispatch_spawn(&self, entity: EntityIndex);

    /// Remove the entity (weapons are detached from their owner first)
    fn remove_entity(&self, entity: EntityIndex);

    /// Fire an entity I/O input such as `Kill`
    fn accept_input(&self, entity: EntityIndex, input: &str);

    // === Players ===

    /// All player controllers occupying a slot
    fn players(&self) -> Vec<PlayerInfo>;

    /// Player controller in the given slot
    fn player(&self, slot: i32) -> Option<PlayerInfo>;

    /// Weapons held by the player's pawn
    ///
    /// `None` when the player has no pawn or the pawn has no weapon services.
    fn player_weapons(&self, slot: i32) -> Option<Vec<EntityIndex>>;

    /// Give the player an item by class name (e.g. `weapon_taser`)
    fn give_named_item(&self, slot: i32, item: &str);

    /// Run a command in the player's client console (e.g. `slot11`)
    fn execute_client_command(&self, slot: i32, command: &str);

    // === Output ===

    /// Print to one player's chat
    fn print_to_chat(&self, slot: i32, message: &str);

    /// Print to one player's console
    fn print_to_console(&self, slot: i32, message: &str);

    /// Print to every player's chat
    fn print_to_chat_all(&self, message: &str);

    /// Print to the server console
    fn print_to_server_console(&self, message: &str);

    // === Console ===

    /// Look up a console variable's current value
    fn find_convar(&self, name: &str) -> Option<ConVarValue>;

    /// Run a command on the server console (e.g. `mp_solid_teammates 0`)
    fn execute_server_command(&self, command: &str);
}

static HOST: LazyLock<RwLock<Option<Arc<dyn GameHost>>>> = LazyLock::new(|| RwLock::new(None));

/// Install the process-wide host
///
/// Called once during plugin load. Returns an error if a host is already installed.
pub fn install_host(host: Arc<dyn GameHost>) -> Result<(), HostError> {
    let mut slot = HOST.write();
    if slot.is_some() {
        return Err(HostError::AlreadyInstalled);
    }
    *slot = Some(host);
    tracing::debug!("Game host installed");
    Ok(())
}

/// Remove the installed host, returning it if there was one
pub fn uninstall_host() -> Option<Arc<dyn GameHost>> {
    let removed = HOST.write().take();
    if removed.is_some() {
        tracing::debug!("Game host uninstalled");
    }
    removed
}

/// Get the installed host
pub fn host() -> Option<Arc<dyn GameHost>> {
    HOST.read().clone()
}

/// Get the installed host or fail with [`HostError::NotInstalled`]
pub fn require_host() -> Result<Arc<dyn GameHost>, HostError> {
    host().ok_or(HostError::NotInstalled)
}

/// Check if a host is installed
pub fn is_host_installed() -> bool {
    HOST.read().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHost;

    // The host slot is process-wide, so the whole lifecycle is one test.
    #[test]
    fn test_install_lifecycle() {
        let _ = uninstall_host();
        assert!(!is_host_installed());
        assert!(matches!(require_host(), Err(HostError::NotInstalled)));

        install_host(Arc::new(FakeHost::new())).unwrap();
        assert!(is_host_installed());
        assert!(host().is_some());

        let second = install_host(Arc::new(FakeHost::new()));
        assert!(matches!(second, Err(HostError::AlreadyInstalled)));

        assert!(uninstall_host().is_some());
        assert!(uninstall_host().is_none());
    }
}
