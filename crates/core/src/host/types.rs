//! Plain value types exchanged with the host

use std::fmt;
use std::ops::Add;

/// Team number of the first playable team. Anything below is unassigned or spectating.
pub const FIRST_PLAYABLE_TEAM: i32 = 2;

/// Maximum number of player slots (CS2 default)
pub const MAX_PLAYERS: usize = 64;

/// World-space position
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl From<[f32; 3]> for Vector {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

/// Euler angles in degrees
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QAngle {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl QAngle {
    pub const fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }
}

/// Index of an entity in the host's entity list
///
/// Only meaningful until the host destroys the entity; always re-check with
/// [`GameHost::entity_is_valid`](super::GameHost::entity_is_valid) before use
/// across callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityIndex(pub u32);

impl fmt::Display for EntityIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Team a player controller belongs to
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Team {
    /// Not yet assigned
    None = 0,
    /// Spectating
    Spectator = 1,
    /// Terrorists
    Terrorist = 2,
    /// Counter-Terrorists
    CounterTerrorist = 3,
}

impl From<i32> for Team {
    fn from(value: i32) -> Self {
        match value {
            1 => Self::Spectator,
            2 => Self::Terrorist,
            3 => Self::CounterTerrorist,
            _ => Self::None,
        }
    }
}

/// Snapshot of a player controller taken from the host
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerInfo {
    /// Player slot (0 to 63)
    pub slot: i32,
    /// SteamID64, 0 for bots that have not been assigned one
    pub steam_id: u64,
    /// Display name
    pub name: String,
    /// Current team
    pub team: Team,
    /// Whether the controller entity is valid
    pub is_valid: bool,
    /// Whether the controller's pawn is alive
    pub pawn_alive: bool,
}

impl PlayerInfo {
    /// Valid controller on T or CT
    pub fn is_in_game(&self) -> bool {
        self.is_valid && self.team as i32 >= FIRST_PLAYABLE_TEAM
    }

    /// Valid controller on T or CT with a living pawn
    pub fn is_alive_in_game(&self) -> bool {
        self.is_in_game() && self.pawn_alive
    }
}

/// Value of a console variable
#[derive(Debug, Clone, PartialEq)]
pub enum ConVarValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    String(String),
}

impl ConVarValue {
    /// Read the value as an integer, the way the engine coerces primitive convars
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Bool(b) => Some(*b as i32),
            Self::Int(i) => Some(*i),
            Self::Float(f) => Some(*f as i32),
            Self::String(s) => s.trim().parse().ok(),
        }
    }

    /// Read the value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::String(s) => match s.trim() {
                "true" => Some(true),
                "false" => Some(false),
                _ => self.as_int().map(|i| i != 0),
            },
            _ => self.as_int().map(|i| i != 0),
        }
    }
}

impl fmt::Display for ConVarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", *b as i32),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
            Self::String(s) => f.write_str(s),
        }
    }
}

/// Convert a game event `userid` into a player slot
///
/// The userid encodes the slot in its lower byte.
pub fn slot_from_userid(userid: i32) -> Option<i32> {
    if userid < 0 {
        return None;
    }
    let slot = userid & 0xFF;
    if slot < MAX_PLAYERS as i32 {
        Some(slot)
    } else {
        None
    }
}
