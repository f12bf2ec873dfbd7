//! Weapon names and the Zeus-mode whitelist

use std::collections::HashSet;

/// Item given to every player while the mode is on
pub const TASER: &str = "weapon_taser";

/// Client command that switches to the taser slot
pub const SELECT_TASER: &str = "slot11";

/// Items players may keep, in normalized form
pub const DEFAULT_ALLOWED: &[&str] = &[
    "taser",
    "knife",
    "flashbang",
    "hegrenade",
    "grenade",
    "smokegrenade",
    "smoke",
    "molotov",
    "incgrenade",
    "firebomb",
    "decoy",
    "decoygrenade",
    "c4",
];

/// Lowercase, drop `weapon_` / `item_` and surrounding whitespace
///
/// `weapon_AK47` and `ak47` both become `ak47`.
pub fn normalize(name: &str) -> String {
    name.to_lowercase()
        .replace("weapon_", "")
        .replace("item_", "")
        .trim()
        .to_string()
}

/// Set of normalized item names players may hold
#[derive(Debug, Clone)]
pub struct Whitelist {
    allowed: HashSet<String>,
}

impl Whitelist {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed: names
                .into_iter()
                .map(|name| normalize(name.as_ref()))
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }

    /// Check a raw or normalized name
    pub fn allows(&self, name: &str) -> bool {
        self.allowed.contains(&normalize(name))
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

impl Default for Whitelist {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("weapon_AK47"), "ak47");
        assert_eq!(normalize("item_assaultsuit"), "assaultsuit");
        assert_eq!(normalize("  Taser "), "taser");
        assert_eq!(normalize("weapon_taser"), "taser");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_default_whitelist() {
        let whitelist = Whitelist::default();

        assert!(whitelist.allows("weapon_taser"));
        assert!(whitelist.allows("weapon_knife"));
        assert!(whitelist.allows("weapon_hegrenade"));
        assert!(whitelist.allows("weapon_c4"));
        assert!(whitelist.allows("SMOKEGRENADE"));
        assert!(!whitelist.allows("weapon_ak47"));
        assert!(!whitelist.allows("weapon_awp"));
        assert!(!whitelist.allows("item_kevlar"));
        assert!(!whitelist.allows("weapon_knife_t"));
    }

    #[test]
    fn test_custom_whitelist_normalizes_entries() {
        let whitelist = Whitelist::new(["weapon_Deagle", "", "  "]);
        assert_eq!(whitelist.len(), 1);
        assert!(whitelist.allows("deagle"));
    }
}
