//! In-memory game host for tests
//!
//! [`FakeHost`] keeps a tiny entity list, a set of player controllers and a
//! convar table, and records every mutation a plugin performs so tests can
//! assert on them.
//!
//! ```ignore
//! use cs2modes_core::testing::FakeHost;
//! use cs2modes_core::host::Team;
//!
//! let host = FakeHost::new();
//! host.add_player(0, 76561198000000001, Team::Terrorist);
//! host.give_weapon(0, "weapon_ak47");
//! assert_eq!(host.weapon_names(0), vec!["weapon_ak47"]);
//! ```

use std::collections::{BTreeMap, HashMap};

use parking_lot::Mutex;

use crate::host::{ConVarValue, EntityIndex, GameHost, PlayerInfo, QAngle, Team, Vector};

/// An entity in the fake entity list
#[derive(Debug, Clone, PartialEq)]
pub struct FakeEntity {
    pub designer_name: String,
    pub origin: Option<Vector>,
    pub rotation: Option<QAngle>,
    pub spawned: bool,
    /// Slot of the player holding this entity, for weapons
    pub owner: Option<i32>,
}

#[derive(Debug, Clone)]
struct FakePlayer {
    info: PlayerInfo,
    /// `None` models a controller without pawn or weapon services
    weapons: Option<Vec<EntityIndex>>,
}

#[derive(Debug, Default)]
struct FakeState {
    next_index: u32,
    entities: BTreeMap<u32, FakeEntity>,
    players: BTreeMap<i32, FakePlayer>,
    convars: HashMap<String, ConVarValue>,
    refuse_create: bool,

    given: Vec<(i32, String)>,
    inputs: Vec<(EntityIndex, String)>,
    removed: Vec<EntityIndex>,
    client_commands: Vec<(i32, String)>,
    server_commands: Vec<String>,
    chat: Vec<(i32, String)>,
    console: Vec<(i32, String)>,
    chat_all: Vec<String>,
    server_console: Vec<String>,
}

impl FakeState {
    fn spawn_entity(&mut self, entity: FakeEntity) -> EntityIndex {
        // Indices 1-64 belong to player controllers in the real engine
        self.next_index = self.next_index.max(64) + 1;
        self.entities.insert(self.next_index, entity);
        EntityIndex(self.next_index)
    }

    fn destroy_entity(&mut self, entity: EntityIndex) {
        if self.entities.remove(&entity.0).is_some() {
            self.removed.push(entity);
            for player in self.players.values_mut() {
                if let Some(weapons) = player.weapons.as_mut() {
                    weapons.retain(|w| *w != entity);
                }
            }
        }
    }
}

/// In-memory [`GameHost`] implementation
#[derive(Debug, Default)]
pub struct FakeHost {
    state: Mutex<FakeState>,
}

impl FakeHost {
    /// Create an empty host: no entities, no players, no convars
    pub fn new() -> Self {
        Self::default()
    }

    // === Setup ===

    /// Add a valid, alive player with an empty inventory
    pub fn add_player(&self, slot: i32, steam_id: u64, team: Team) -> PlayerInfo {
        let info = PlayerInfo {
            slot,
            steam_id,
            name: format!("player{}", slot),
            team,
            is_valid: true,
            pawn_alive: true,
        };
        self.add_player_info(info.clone());
        info
    }

    /// Add a player with full control over its controller state
    pub fn add_player_info(&self, info: PlayerInfo) {
        self.state.lock().players.insert(
            info.slot,
            FakePlayer {
                info,
                weapons: Some(Vec::new()),
            },
        );
    }

    /// Mark a player's pawn alive or dead
    pub fn set_pawn_alive(&self, slot: i32, alive: bool) {
        if let Some(player) = self.state.lock().players.get_mut(&slot) {
            player.info.pawn_alive = alive;
        }
    }

    /// Remove the player's pawn (and with it the weapon services)
    pub fn remove_pawn(&self, slot: i32) {
        if let Some(player) = self.state.lock().players.get_mut(&slot) {
            player.weapons = None;
        }
    }

    /// Put a weapon entity into a player's inventory
    pub fn give_weapon(&self, slot: i32, designer_name: &str) -> EntityIndex {
        let mut state = self.state.lock();
        let index = state.spawn_entity(FakeEntity {
            designer_name: designer_name.to_string(),
            origin: None,
            rotation: None,
            spawned: true,
            owner: Some(slot),
        });
        if let Some(weapons) = state
            .players
            .get_mut(&slot)
            .and_then(|p| p.weapons.as_mut())
        {
            weapons.push(index);
        }
        index
    }

    /// Place a spawned entity in the world
    pub fn add_entity(
        &self,
        designer_name: &str,
        origin: Option<Vector>,
        rotation: Option<QAngle>,
    ) -> EntityIndex {
        self.state.lock().spawn_entity(FakeEntity {
            designer_name: designer_name.to_string(),
            origin,
            rotation,
            spawned: true,
            owner: None,
        })
    }

    /// Set a convar value
    pub fn set_convar(&self, name: &str, value: ConVarValue) {
        self.state.lock().convars.insert(name.to_string(), value);
    }

    /// Make `create_entity_by_name` fail, like an exhausted entity list
    pub fn refuse_entity_creation(&self, refuse: bool) {
        self.state.lock().refuse_create = refuse;
    }

    // === Inspection ===

    /// Designer names of the weapons a player holds, in inventory order
    pub fn weapon_names(&self, slot: i32) -> Vec<String> {
        let state = self.state.lock();
        state
            .players
            .get(&slot)
            .and_then(|p| p.weapons.as_ref())
            .map(|weapons| {
                weapons
                    .iter()
                    .filter_map(|w| state.entities.get(&w.0))
                    .map(|e| e.designer_name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Entities with the given designer name
    pub fn entities_named(&self, designer_name: &str) -> Vec<FakeEntity> {
        self.state
            .lock()
            .entities
            .values()
            .filter(|e| e.designer_name == designer_name)
            .cloned()
            .collect()
    }

    /// Current convar value
    pub fn convar(&self, name: &str) -> Option<ConVarValue> {
        self.state.lock().convars.get(name).cloned()
    }

    /// Items handed out through `give_named_item`
    pub fn given_items(&self) -> Vec<(i32, String)> {
        self.state.lock().given.clone()
    }

    /// Inputs fired through `accept_input`
    pub fn inputs(&self) -> Vec<(EntityIndex, String)> {
        self.state.lock().inputs.clone()
    }

    /// Entities destroyed through `remove_entity` or a `Kill` input
    pub fn removed_entities(&self) -> Vec<EntityIndex> {
        self.state.lock().removed.clone()
    }

    /// Client console commands run for a player
    pub fn client_commands(&self, slot: i32) -> Vec<String> {
        self.state
            .lock()
            .client_commands
            .iter()
            .filter(|(s, _)| *s == slot)
            .map(|(_, c)| c.clone())
            .collect()
    }

    /// Server console commands executed
    pub fn server_commands(&self) -> Vec<String> {
        self.state.lock().server_commands.clone()
    }

    /// Chat lines sent to one player
    pub fn chat(&self, slot: i32) -> Vec<String> {
        self.state
            .lock()
            .chat
            .iter()
            .filter(|(s, _)| *s == slot)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Console lines sent to one player
    pub fn console(&self, slot: i32) -> Vec<String> {
        self.state
            .lock()
            .console
            .iter()
            .filter(|(s, _)| *s == slot)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Chat lines broadcast to everyone
    pub fn chat_all(&self) -> Vec<String> {
        self.state.lock().chat_all.clone()
    }

    /// Lines printed to the server console
    pub fn server_console(&self) -> Vec<String> {
        self.state.lock().server_console.clone()
    }
}

impl GameHost for FakeHost {
    fn find_entities_by_designer_name(&self, designer_name: &str) -> Vec<EntityIndex> {
        self.state
            .lock()
            .entities
            .iter()
            .filter(|(_, e)| e.designer_name == designer_name)
            .map(|(index, _)| EntityIndex(*index))
            .collect()
    }

    fn create_entity_by_name(&self, class_name: &str) -> Option<EntityIndex> {
        let mut state = self.state.lock();
        if state.refuse_create {
            return None;
        }
        Some(state.spawn_entity(FakeEntity {
            designer_name: class_name.to_string(),
            origin: None,
            rotation: None,
            spawned: false,
            owner: None,
        }))
    }

    fn entity_is_valid(&self, entity: EntityIndex) -> bool {
        self.state.lock().entities.contains_key(&entity.0)
    }

    fn entity_designer_name(&self, entity: EntityIndex) -> Option<String> {
        self.state
            .lock()
            .entities
            .get(&entity.0)
            .map(|e| e.designer_name.clone())
    }

    fn entity_abs_origin(&self, entity: EntityIndex) -> Option<Vector> {
        self.state.lock().entities.get(&entity.0)?.origin
    }

    fn entity_abs_rotation(&self, entity: EntityIndex) -> Option<QAngle> {
        self.state.lock().entities.get(&entity.0)?.rotation
    }

    fn teleport(
        &self,
        entity: EntityIndex,
        position: Option<Vector>,
        angles: Option<QAngle>,
        _velocity: Option<Vector>,
    ) {
        if let Some(e) = self.state.lock().entities.get_mut(&entity.0) {
            if position.is_some() {
                e.origin = position;
            }
            if angles.is_some() {
                e.rotation = angles;
            }
        }
    }

    fn dispatch_spawn(&self, entity: EntityIndex) {
        if let Some(e) = self.state.lock().entities.get_mut(&entity.0) {
            e.spawned = true;
        }
    }

    fn remove_entity(&self, entity: EntityIndex) {
        self.state.lock().destroy_entity(entity);
    }

    fn accept_input(&self, entity: EntityIndex, input: &str) {
        let mut state = self.state.lock();
        state.inputs.push((entity, input.to_string()));
        if input.eq_ignore_ascii_case("Kill") {
            state.destroy_entity(entity);
        }
    }

    fn players(&self) -> Vec<PlayerInfo> {
        self.state
            .lock()
            .players
            .values()
            .map(|p| p.info.clone())
            .collect()
    }

    fn player(&self, slot: i32) -> Option<PlayerInfo> {
        self.state.lock().players.get(&slot).map(|p| p.info.clone())
    }

    fn player_weapons(&self, slot: i32) -> Option<Vec<EntityIndex>> {
        self.state.lock().players.get(&slot)?.weapons.clone()
    }

    fn give_named_item(&self, slot: i32, item: &str) {
        self.state.lock().given.push((slot, item.to_string()));
        self.give_weapon(slot, item);
    }

    fn execute_client_command(&self, slot: i32, command: &str) {
        self.state
            .lock()
            .client_commands
            .push((slot, command.to_string()));
    }

    fn print_to_chat(&self, slot: i32, message: &str) {
        self.state.lock().chat.push((slot, message.to_string()));
    }

    fn print_to_console(&self, slot: i32, message: &str) {
        self.state.lock().console.push((slot, message.to_string()));
    }

    fn print_to_chat_all(&self, message: &str) {
        self.state.lock().chat_all.push(message.to_string());
    }

    fn print_to_server_console(&self, message: &str) {
        self.state.lock().server_console.push(message.to_string());
    }

    fn find_convar(&self, name: &str) -> Option<ConVarValue> {
        self.convar(name)
    }

    fn execute_server_command(&self, command: &str) {
        let mut state = self.state.lock();
        state.server_commands.push(command.to_string());

        // `name value` updates an existing convar, like the engine's console does
        let mut parts = command.splitn(2, char::is_whitespace);
        if let (Some(name), Some(value)) = (parts.next(), parts.next()) {
            if let Some(current) = state.convars.get_mut(name) {
                let value = value.trim();
                *current = match &*current {
                    ConVarValue::Int(_) => value
                        .parse()
                        .map(ConVarValue::Int)
                        .unwrap_or_else(|_| ConVarValue::String(value.to_string())),
                    ConVarValue::Float(_) => value
                        .parse()
                        .map(ConVarValue::Float)
                        .unwrap_or_else(|_| ConVarValue::String(value.to_string())),
                    ConVarValue::Bool(_) => ConVarValue::Bool(value != "0"),
                    ConVarValue::String(_) => ConVarValue::String(value.to_string()),
                };
            }
        }
    }
}
