//! Action bit constants and name table

// Action bit constants
pub const CREATE: u8 = 1;
pub const READ: u8 = 1 << 1;
pub const UPDATE: u8 = 1 << 2;
pub const DELETE: u8 = 1 << 3;

/// Every action bit OR'd together
pub const ALL_ACTIONS: u8 = CREATE | READ | UPDATE | DELETE;

// Action name mappings, in bit order
const ACTIONS: &[(&str, u8)] = &[
    ("create", CREATE),
    ("read", READ),
    ("update", UPDATE),
    ("delete", DELETE),
];

/// Convert an action mask to a list of action names
pub fn actions_to_names(mask: u8) -> Vec<&'static str> {
    ACTIONS
        .iter()
        .filter(|(_, b)| mask & b == *b)
        .map(|(n, _)| *n)
        .collect()
}

/// True if `mask` only uses known action bits
#[inline]
pub fn is_valid_mask(mask: u64) -> bool {
    mask & !(ALL_ACTIONS as u64) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_bit_order() {
        assert_eq!(actions_to_names(CREATE | UPDATE), vec!["create", "update"]);
        assert_eq!(actions_to_names(ALL_ACTIONS), vec!["create", "read", "update", "delete"]);
        assert!(actions_to_names(0).is_empty());
    }

    #[test]
    fn mask_validity() {
        assert!(is_valid_mask(0));
        assert!(is_valid_mask(15));
        assert!(!is_valid_mask(16));
        assert!(!is_valid_mask(1 << 40 | 1));
    }
}
