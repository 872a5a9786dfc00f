//! Typed action vocabulary
//!
//! `Action` is the closed set of grantable actions. `ActionSet` is a bitmask
//! over them; a raw integer only becomes an `ActionSet` through
//! [`ActionSet::from_mask`], which rejects unknown bits.

use std::fmt;

use bitflags::bitflags;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::constants;
use crate::error::{PrivmaskError, Result};

/// A single grantable action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    /// All actions in bit order
    pub const ALL: [Action; 4] = [Action::Create, Action::Read, Action::Update, Action::Delete];

    #[inline]
    pub const fn bit(self) -> u8 {
        match self {
            Action::Create => constants::CREATE,
            Action::Read => constants::READ,
            Action::Update => constants::UPDATE,
            Action::Delete => constants::DELETE,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }

    /// Look up the action for a single bit
    pub fn from_bit(bit: u8) -> Option<Action> {
        Action::ALL.into_iter().find(|a| a.bit() == bit)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// A set of granted (or grantable) actions
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ActionSet: u8 {
        const CREATE = constants::CREATE;
        const READ = constants::READ;
        const UPDATE = constants::UPDATE;
        const DELETE = constants::DELETE;
    }
}

impl ActionSet {
    /// Parse a stored or submitted actions total
    pub fn from_mask(mask: u64) -> Result<ActionSet> {
        if !constants::is_valid_mask(mask) {
            return Err(PrivmaskError::InvalidMask(mask));
        }
        Ok(ActionSet::from_bits_truncate(mask as u8))
    }

    /// Integer form used in submission payloads and storage
    #[inline]
    pub fn to_mask(self) -> u64 {
        self.bits() as u64
    }

    #[inline]
    pub fn has(self, action: Action) -> bool {
        self.contains(ActionSet::from(action))
    }

    #[inline]
    pub fn is_subset_of(self, other: ActionSet) -> bool {
        other.contains(self)
    }

    /// Contained actions, in bit order
    pub fn actions(self) -> impl Iterator<Item = Action> {
        Action::ALL.into_iter().filter(move |a| self.has(*a))
    }

    pub fn names(self) -> Vec<&'static str> {
        constants::actions_to_names(self.bits())
    }
}

impl From<Action> for ActionSet {
    fn from(action: Action) -> Self {
        ActionSet::from_bits_truncate(action.bit())
    }
}

impl FromIterator<Action> for ActionSet {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        iter.into_iter().fold(ActionSet::empty(), |set, a| set | ActionSet::from(a))
    }
}

impl fmt::Display for ActionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&self.names().join("+"))
        }
    }
}

impl Serialize for ActionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for ActionSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let mask = u64::deserialize(deserializer)?;
        ActionSet::from_mask(mask).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_bits_are_distinct_powers_of_two() {
        let mut seen = 0u8;
        for a in Action::ALL {
            assert!(a.bit().is_power_of_two());
            assert_eq!(seen & a.bit(), 0);
            seen |= a.bit();
        }
        assert_eq!(seen, constants::ALL_ACTIONS);
    }

    #[test]
    fn from_bit_only_accepts_single_known_bits() {
        assert_eq!(Action::from_bit(4), Some(Action::Update));
        assert_eq!(Action::from_bit(3), None);
        assert_eq!(Action::from_bit(16), None);
    }

    #[test]
    fn from_mask_rejects_unknown_bits() {
        assert_eq!(ActionSet::from_mask(5).unwrap().actions().collect::<Vec<_>>(), vec![Action::Create, Action::Update]);
        assert_eq!(ActionSet::from_mask(0).unwrap(), ActionSet::empty());
        assert_eq!(ActionSet::from_mask(17), Err(PrivmaskError::InvalidMask(17)));
        assert_eq!(ActionSet::from_mask(256), Err(PrivmaskError::InvalidMask(256)));
    }

    #[test]
    fn display_joins_names() {
        let set: ActionSet = [Action::Read, Action::Delete].into_iter().collect();
        assert_eq!(set.to_string(), "read+delete");
        assert_eq!(ActionSet::empty().to_string(), "none");
    }

    #[test]
    fn serde_uses_integer_form() {
        let set = ActionSet::CREATE | ActionSet::UPDATE;
        assert_eq!(serde_json::to_string(&set).unwrap(), "5");
        let back: ActionSet = serde_json::from_str("5").unwrap();
        assert_eq!(back, set);
        assert!(serde_json::from_str::<ActionSet>("32").is_err());
    }

    #[test]
    fn subset_check() {
        let avail = ActionSet::CREATE | ActionSet::READ | ActionSet::UPDATE;
        assert!((ActionSet::READ | ActionSet::CREATE).is_subset_of(avail));
        assert!(!ActionSet::DELETE.is_subset_of(avail));
        assert!(ActionSet::empty().is_subset_of(avail));
    }
}
