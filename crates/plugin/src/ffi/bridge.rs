//! Function tables supplied by the C++ bridge
//!
//! [`HostBridge`] is filled in once by the bridge and wrapped in a
//! [`NativeHost`], the [`GameHost`] the plugins run against. [`EventBridge`]
//! wraps a single `IGameEvent` for the duration of one fire callback.

use std::ffi::{c_char, c_int, c_void, CStr, CString};

use cs2modes_core::events::EventSource;
use cs2modes_core::host::{
    ConVarValue, EntityIndex, GameHost, PlayerInfo, QAngle, Team, Vector, MAX_PLAYERS,
};

use crate::BridgeError;

/// Size of string buffers handed to the bridge
const STRING_BUF_LEN: usize = 256;

/// Initial capacity of entity index buffers
const ENTITY_BUF_LEN: usize = 64;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FfiVector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FfiQAngle {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl From<FfiVector> for Vector {
    fn from(v: FfiVector) -> Self {
        Vector::new(v.x, v.y, v.z)
    }
}

impl From<Vector> for FfiVector {
    fn from(v: Vector) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<FfiQAngle> for QAngle {
    fn from(a: FfiQAngle) -> Self {
        QAngle::new(a.pitch, a.yaw, a.roll)
    }
}

impl From<QAngle> for FfiQAngle {
    fn from(a: QAngle) -> Self {
        Self {
            pitch: a.pitch,
            yaw: a.yaw,
            roll: a.roll,
        }
    }
}

/// Player controller snapshot filled in by the bridge
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FfiPlayerInfo {
    pub steam_id: u64,
    pub team: c_int,
    pub is_valid: bool,
    pub pawn_alive: bool,
    /// Null-terminated UTF-8 name
    pub name: [c_char; 128],
}

impl Default for FfiPlayerInfo {
    fn default() -> Self {
        Self {
            steam_id: 0,
            team: 0,
            is_valid: false,
            pawn_alive: false,
            name: [0; 128],
        }
    }
}

impl FfiPlayerInfo {
    fn into_player(self, slot: i32) -> PlayerInfo {
        // SAFETY: the buffer is zero-initialized and the bridge writes at most
        // len - 1 bytes, so it always holds a terminator
        let name = unsafe { CStr::from_ptr(self.name.as_ptr()) }
            .to_string_lossy()
            .into_owned();
        PlayerInfo {
            slot,
            steam_id: self.steam_id,
            name,
            team: Team::from(self.team),
            is_valid: self.is_valid,
            pawn_alive: self.pawn_alive,
        }
    }
}

/// ConVar type tags used by `find_convar`
pub const CONVAR_BOOL: c_int = 0;
pub const CONVAR_INT: c_int = 1;
pub const CONVAR_FLOAT: c_int = 2;
pub const CONVAR_STRING: c_int = 3;

type Ctx = *mut c_void;

/// Engine operations implemented by the C++ bridge
///
/// Every function receives `ctx` as its first argument. Buffers passed in are
/// owned by Rust; list functions return the total count, which may exceed
/// the buffer size.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct HostBridge {
    pub ctx: Ctx,

    pub find_entities_by_designer_name:
        Option<unsafe extern "C" fn(Ctx, *const c_char, *mut u32, usize) -> usize>,
    pub create_entity_by_name: Option<unsafe extern "C" fn(Ctx, *const c_char, *mut u32) -> bool>,
    pub entity_is_valid: Option<unsafe extern "C" fn(Ctx, u32) -> bool>,
    pub entity_designer_name: Option<unsafe extern "C" fn(Ctx, u32, *mut c_char, usize) -> bool>,
    pub entity_abs_origin: Option<unsafe extern "C" fn(Ctx, u32, *mut FfiVector) -> bool>,
    pub entity_abs_rotation: Option<unsafe extern "C" fn(Ctx, u32, *mut FfiQAngle) -> bool>,
    /// Null pointers leave the component untouched
    pub teleport: Option<
        unsafe extern "C" fn(Ctx, u32, *const FfiVector, *const FfiQAngle, *const FfiVector),
    >,
    pub dispatch_spawn: Option<unsafe extern "C" fn(Ctx, u32)>,
    pub remove_entity: Option<unsafe extern "C" fn(Ctx, u32)>,
    pub accept_input: Option<unsafe extern "C" fn(Ctx, u32, *const c_char)>,

    pub player_info: Option<unsafe extern "C" fn(Ctx, c_int, *mut FfiPlayerInfo) -> bool>,
    /// Returns -1 when the player has no pawn or weapon services
    pub player_weapons: Option<unsafe extern "C" fn(Ctx, c_int, *mut u32, usize) -> c_int>,
    pub give_named_item: Option<unsafe extern "C" fn(Ctx, c_int, *const c_char)>,
    pub execute_client_command: Option<unsafe extern "C" fn(Ctx, c_int, *const c_char)>,

    pub print_to_chat: Option<unsafe extern "C" fn(Ctx, c_int, *const c_char)>,
    pub print_to_console: Option<unsafe extern "C" fn(Ctx, c_int, *const c_char)>,
    pub print_to_chat_all: Option<unsafe extern "C" fn(Ctx, *const c_char)>,
    pub print_to_server_console: Option<unsafe extern "C" fn(Ctx, *const c_char)>,

    /// Writes the value as text and its type tag; false when not found
    pub find_convar:
        Option<unsafe extern "C" fn(Ctx, *const c_char, *mut c_int, *mut c_char, usize) -> bool>,
    pub execute_server_command: Option<unsafe extern "C" fn(Ctx, *const c_char)>,
}

impl Default for HostBridge {
    fn default() -> Self {
        Self {
            ctx: std::ptr::null_mut(),
            find_entities_by_designer_name: None,
            create_entity_by_name: None,
            entity_is_valid: None,
            entity_designer_name: None,
            entity_abs_origin: None,
            entity_abs_rotation: None,
            teleport: None,
            dispatch_spawn: None,
            remove_entity: None,
            accept_input: None,
            player_info: None,
            player_weapons: None,
            give_named_item: None,
            execute_client_command: None,
            print_to_chat: None,
            print_to_console: None,
            print_to_chat_all: None,
            print_to_server_console: None,
            find_convar: None,
            execute_server_command: None,
        }
    }
}

impl HostBridge {
    /// Name of the first function pointer that was not filled in
    fn first_missing(&self) -> Option<&'static str> {
        let present = [
            ("find_entities_by_designer_name", self.find_entities_by_designer_name.is_some()),
            ("create_entity_by_name", self.create_entity_by_name.is_some()),
            ("entity_is_valid", self.entity_is_valid.is_some()),
            ("entity_designer_name", self.entity_designer_name.is_some()),
            ("entity_abs_origin", self.entity_abs_origin.is_some()),
            ("entity_abs_rotation", self.entity_abs_rotation.is_some()),
            ("teleport", self.teleport.is_some()),
            ("dispatch_spawn", self.dispatch_spawn.is_some()),
            ("remove_entity", self.remove_entity.is_some()),
            ("accept_input", self.accept_input.is_some()),
            ("player_info", self.player_info.is_some()),
            ("player_weapons", self.player_weapons.is_some()),
            ("give_named_item", self.give_named_item.is_some()),
            ("execute_client_command", self.execute_client_command.is_some()),
            ("print_to_chat", self.print_to_chat.is_some()),
            ("print_to_console", self.print_to_console.is_some()),
            ("print_to_chat_all", self.print_to_chat_all.is_some()),
            ("print_to_server_console", self.print_to_server_console.is_some()),
            ("find_convar", self.find_convar.is_some()),
            ("execute_server_command", self.execute_server_command.is_some()),
        ];
        present
            .into_iter()
            .find(|(_, is_set)| !is_set)
            .map(|(name, _)| name)
    }
}

/// [`GameHost`] backed by the bridge's function table
pub struct NativeHost {
    table: HostBridge,
}

// SAFETY: the table is only called from the game thread; the bridge
// guarantees the function pointers and ctx stay valid until unload.
unsafe impl Send for NativeHost {}
unsafe impl Sync for NativeHost {}

/// Call a table function with `ctx` prepended, yielding `None` if it is unset
macro_rules! call {
    ($self:ident . $func:ident ( $($arg:expr),* $(,)? )) => {
        // SAFETY: pointers in the table were validated in `NativeHost::new`
        $self.table.$func.map(|f| unsafe { f($self.table.ctx, $($arg),*) })
    };
}

impl NativeHost {
    /// Validate and wrap a function table
    ///
    /// # Safety
    /// `table` must be null or point to a valid [`HostBridge`].
    pub unsafe fn from_raw(table: *const HostBridge) -> Result<Self, BridgeError> {
        if table.is_null() {
            return Err(BridgeError::NullTable);
        }
        Self::new(*table)
    }

    pub fn new(table: HostBridge) -> Result<Self, BridgeError> {
        if let Some(missing) = table.first_missing() {
            return Err(BridgeError::MissingFunction(missing));
        }
        Ok(Self { table })
    }

    fn read_string(&self, fill: impl FnOnce(*mut c_char, usize) -> Option<bool>) -> Option<String> {
        let mut buf = [0 as c_char; STRING_BUF_LEN];
        if !fill(buf.as_mut_ptr(), buf.len()).unwrap_or(false) {
            return None;
        }
        buf[STRING_BUF_LEN - 1] = 0;
        // SAFETY: terminated above
        let value = unsafe { CStr::from_ptr(buf.as_ptr()) };
        Some(value.to_string_lossy().into_owned())
    }

    /// Read an index list, growing the buffer when the bridge reports more
    fn read_indices(&self, mut fill: impl FnMut(*mut u32, usize) -> Option<i64>) -> Option<Vec<EntityIndex>> {
        let mut buf = vec![0u32; ENTITY_BUF_LEN];
        loop {
            let total = fill(buf.as_mut_ptr(), buf.len())?;
            if total < 0 {
                return None;
            }
            let total = total as usize;
            if total <= buf.len() {
                buf.truncate(total);
                return Some(buf.into_iter().map(EntityIndex).collect());
            }
            buf.resize(total, 0);
        }
    }
}

/// Convert to a C string, dropping interior nul bytes
fn to_cstring(value: &str) -> CString {
    CString::new(value.replace('\0', "")).unwrap_or_default()
}

fn parse_convar(kind: c_int, value: &str) -> Option<ConVarValue> {
    let value = value.trim();
    match kind {
        CONVAR_BOOL => Some(ConVarValue::Bool(value != "0" && !value.eq_ignore_ascii_case("false"))),
        CONVAR_INT => value.parse().ok().map(ConVarValue::Int),
        CONVAR_FLOAT => value.parse().ok().map(ConVarValue::Float),
        CONVAR_STRING => Some(ConVarValue::String(value.to_string())),
        _ => None,
    }
}

impl GameHost for NativeHost {
    fn find_entities_by_designer_name(&self, designer_name: &str) -> Vec<EntityIndex> {
        let name = to_cstring(designer_name);
        self.read_indices(|buf, len| {
            call!(self.find_entities_by_designer_name(name.as_ptr(), buf, len)).map(|n| n as i64)
        })
        .unwrap_or_default()
    }

    fn create_entity_by_name(&self, class_name: &str) -> Option<EntityIndex> {
        let name = to_cstring(class_name);
        let mut index = 0u32;
        let created = call!(self.create_entity_by_name(name.as_ptr(), &mut index)).unwrap_or(false);
        created.then_some(EntityIndex(index))
    }

    fn entity_is_valid(&self, entity: EntityIndex) -> bool {
        call!(self.entity_is_valid(entity.0)).unwrap_or(false)
    }

    fn entity_designer_name(&self, entity: EntityIndex) -> Option<String> {
        self.read_string(|buf, len| call!(self.entity_designer_name(entity.0, buf, len)))
    }

    fn entity_abs_origin(&self, entity: EntityIndex) -> Option<Vector> {
        let mut out = FfiVector::default();
        call!(self.entity_abs_origin(entity.0, &mut out))
            .unwrap_or(false)
            .then(|| out.into())
    }

    fn entity_abs_rotation(&self, entity: EntityIndex) -> Option<QAngle> {
        let mut out = FfiQAngle::default();
        call!(self.entity_abs_rotation(entity.0, &mut out))
            .unwrap_or(false)
            .then(|| out.into())
    }

    fn teleport(
        &self,
        entity: EntityIndex,
        position: Option<Vector>,
        angles: Option<QAngle>,
        velocity: Option<Vector>,
    ) {
        let position = position.map(FfiVector::from);
        let angles = angles.map(FfiQAngle::from);
        let velocity = velocity.map(FfiVector::from);
        call!(self.teleport(
            entity.0,
            position.as_ref().map_or(std::ptr::null(), |p| p as *const _),
            angles.as_ref().map_or(std::ptr::null(), |a| a as *const _),
            velocity.as_ref().map_or(std::ptr::null(), |v| v as *const _),
        ));
    }

    fn dispatch_spawn(&self, entity: EntityIndex) {
        call!(self.dispatch_spawn(entity.0));
    }

    fn remove_entity(&self, entity: EntityIndex) {
        call!(self.remove_entity(entity.0));
    }

    fn accept_input(&self, entity: EntityIndex, input: &str) {
        let input = to_cstring(input);
        call!(self.accept_input(entity.0, input.as_ptr()));
    }

    fn players(&self) -> Vec<PlayerInfo> {
        (0..MAX_PLAYERS as i32)
            .filter_map(|slot| self.player(slot))
            .collect()
    }

    fn player(&self, slot: i32) -> Option<PlayerInfo> {
        let mut out = FfiPlayerInfo::default();
        call!(self.player_info(slot, &mut out))
            .unwrap_or(false)
            .then(|| out.into_player(slot))
    }

    fn player_weapons(&self, slot: i32) -> Option<Vec<EntityIndex>> {
        self.read_indices(|buf, len| call!(self.player_weapons(slot, buf, len)).map(i64::from))
    }

    fn give_named_item(&self, slot: i32, item: &str) {
        let item = to_cstring(item);
        call!(self.give_named_item(slot, item.as_ptr()));
    }

    fn execute_client_command(&self, slot: i32, command: &str) {
        let command = to_cstring(command);
        call!(self.execute_client_command(slot, command.as_ptr()));
    }

    fn print_to_chat(&self, slot: i32, message: &str) {
        let message = to_cstring(message);
        call!(self.print_to_chat(slot, message.as_ptr()));
    }

    fn print_to_console(&self, slot: i32, message: &str) {
        let message = to_cstring(message);
        call!(self.print_to_console(slot, message.as_ptr()));
    }

    fn print_to_chat_all(&self, message: &str) {
        let message = to_cstring(message);
        call!(self.print_to_chat_all(message.as_ptr()));
    }

    fn print_to_server_console(&self, message: &str) {
        // The engine console does not add a newline
        let message = to_cstring(&format!("{}\n", message));
        call!(self.print_to_server_console(message.as_ptr()));
    }

    fn find_convar(&self, name: &str) -> Option<ConVarValue> {
        let name = to_cstring(name);
        let mut kind: c_int = -1;
        let value = self.read_string(|buf, len| {
            call!(self.find_convar(name.as_ptr(), &mut kind, buf, len))
        })?;
        parse_convar(kind, &value)
    }

    fn execute_server_command(&self, command: &str) {
        let command = to_cstring(command);
        call!(self.execute_server_command(command.as_ptr()));
    }
}

/// Accessors for one `IGameEvent`, valid only during the fire callback
#[repr(C)]
pub struct EventBridge {
    pub event: *mut c_void,
    pub get_name: Option<unsafe extern "C" fn(*mut c_void) -> *const c_char>,
    pub get_bool: Option<unsafe extern "C" fn(*mut c_void, *const c_char, bool) -> bool>,
    pub get_int: Option<unsafe extern "C" fn(*mut c_void, *const c_char, c_int) -> c_int>,
    pub get_uint64: Option<unsafe extern "C" fn(*mut c_void, *const c_char, u64) -> u64>,
    pub get_float: Option<unsafe extern "C" fn(*mut c_void, *const c_char, f32) -> f32>,
    /// Returned pointer is owned by the event
    pub get_string:
        Option<unsafe extern "C" fn(*mut c_void, *const c_char, *const c_char) -> *const c_char>,
}

/// Borrowed [`EventBridge`] exposed as an [`EventSource`]
pub struct BridgedEvent<'a> {
    bridge: &'a EventBridge,
    name: String,
}

impl<'a> BridgedEvent<'a> {
    /// # Safety
    /// `bridge.event` and the accessors must stay valid for `'a`.
    pub unsafe fn new(bridge: &'a EventBridge) -> Option<Self> {
        let get_name = bridge.get_name?;
        let raw = get_name(bridge.event);
        if raw.is_null() {
            return None;
        }
        let name = CStr::from_ptr(raw).to_string_lossy().into_owned();
        Some(Self { bridge, name })
    }
}

impl EventSource for BridgedEvent<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        let key = to_cstring(key);
        match self.bridge.get_bool {
            // SAFETY: valid for the lifetime of this wrapper
            Some(f) => unsafe { f(self.bridge.event, key.as_ptr(), default) },
            None => default,
        }
    }

    fn get_int(&self, key: &str, default: i32) -> i32 {
        let key = to_cstring(key);
        match self.bridge.get_int {
            Some(f) => unsafe { f(self.bridge.event, key.as_ptr(), default) },
            None => default,
        }
    }

    fn get_uint64(&self, key: &str, default: u64) -> u64 {
        let key = to_cstring(key);
        match self.bridge.get_uint64 {
            Some(f) => unsafe { f(self.bridge.event, key.as_ptr(), default) },
            None => default,
        }
    }

    fn get_float(&self, key: &str, default: f32) -> f32 {
        let key = to_cstring(key);
        match self.bridge.get_float {
            Some(f) => unsafe { f(self.bridge.event, key.as_ptr(), default) },
            None => default,
        }
    }

    fn get_string(&self, key: &str, default: &str) -> String {
        let key = to_cstring(key);
        let default_c = to_cstring(default);
        let Some(f) = self.bridge.get_string else {
            return default.to_string();
        };
        // SAFETY: the returned string is owned by the event and copied out here
        unsafe {
            let raw = f(self.bridge.event, key.as_ptr(), default_c.as_ptr());
            if raw.is_null() {
                default.to_string()
            } else {
                CStr::from_ptr(raw).to_string_lossy().into_owned()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe extern "C" fn name_item_pickup(_: *mut c_void) -> *const c_char {
        c"item_pickup".as_ptr()
    }

    unsafe extern "C" fn int_userid(_: *mut c_void, key: *const c_char, default: c_int) -> c_int {
        if CStr::from_ptr(key).to_bytes() == b"userid" {
            3
        } else {
            default
        }
    }

    unsafe extern "C" fn string_item(
        _: *mut c_void,
        key: *const c_char,
        default: *const c_char,
    ) -> *const c_char {
        if CStr::from_ptr(key).to_bytes() == b"item" {
            c"awp".as_ptr()
        } else {
            default
        }
    }

    #[test]
    fn test_missing_function_rejected() {
        let result = NativeHost::new(HostBridge::default());
        assert!(matches!(
            result,
            Err(BridgeError::MissingFunction("find_entities_by_designer_name"))
        ));
        assert!(matches!(
            unsafe { NativeHost::from_raw(std::ptr::null()) },
            Err(BridgeError::NullTable)
        ));
    }

    #[test]
    fn test_parse_convar() {
        assert_eq!(parse_convar(CONVAR_INT, "2"), Some(ConVarValue::Int(2)));
        assert_eq!(parse_convar(CONVAR_INT, "abc"), None);
        assert_eq!(parse_convar(CONVAR_BOOL, "0"), Some(ConVarValue::Bool(false)));
        assert_eq!(parse_convar(CONVAR_BOOL, "true"), Some(ConVarValue::Bool(true)));
        assert_eq!(parse_convar(CONVAR_FLOAT, "0.5"), Some(ConVarValue::Float(0.5)));
        assert_eq!(
            parse_convar(CONVAR_STRING, "de_dust2"),
            Some(ConVarValue::String("de_dust2".to_string()))
        );
        assert_eq!(parse_convar(9, "1"), None);
    }

    #[test]
    fn test_to_cstring_strips_nul() {
        assert_eq!(to_cstring("a\0b").to_bytes(), b"ab");
    }

    #[test]
    fn test_bridged_event() {
        let bridge = EventBridge {
            event: std::ptr::null_mut(),
            get_name: Some(name_item_pickup),
            get_bool: None,
            get_int: Some(int_userid),
            get_uint64: None,
            get_float: None,
            get_string: Some(string_item),
        };

        let event = unsafe { BridgedEvent::new(&bridge) }.unwrap();
        assert_eq!(event.name(), "item_pickup");
        assert_eq!(event.get_int("userid", -1), 3);
        assert_eq!(event.get_int("defindex", 7), 7);
        assert_eq!(event.get_string("item", ""), "awp");
        assert_eq!(event.get_string("other", "fallback"), "fallback");
        assert!(event.get_bool("silent", true));
    }
}
