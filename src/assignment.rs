//! Privilege assignments and assignment state

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::action::{Action, ActionSet};
use crate::catalog::PrivilegeId;
use crate::error::Result;

/// Wire pairing of a privilege with the sum of its granted action bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivilegeAssignment {
    pub privilege_id: PrivilegeId,
    pub actions: u64,
}

impl PrivilegeAssignment {
    pub fn new(privilege_id: PrivilegeId, actions: ActionSet) -> Self {
        PrivilegeAssignment { privilege_id, actions: actions.to_mask() }
    }

    /// Parse the actions total back into a set
    pub fn action_set(&self) -> Result<ActionSet> {
        ActionSet::from_mask(self.actions)
    }
}

/// Privilege id -> granted actions. A privilege with no granted actions has
/// no entry; an empty set is never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentState {
    grants: BTreeMap<PrivilegeId, ActionSet>,
}

impl AssignmentState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a state from fetched assignments. Zero totals are dropped and
    /// repeated privilege ids are OR'd together.
    pub fn from_assignments(assignments: &[PrivilegeAssignment]) -> Result<Self> {
        let mut state = AssignmentState::new();
        for a in assignments {
            let set = a.action_set()?;
            let merged = state.get(a.privilege_id) | set;
            state.set(a.privilege_id, merged);
        }
        Ok(state)
    }

    /// Builder form of [`AssignmentState::set`]
    pub fn with(mut self, id: PrivilegeId, actions: impl Into<ActionSet>) -> Self {
        self.set(id, actions.into());
        self
    }

    /// Granted actions for `id` (empty if absent)
    #[inline]
    pub fn get(&self, id: PrivilegeId) -> ActionSet {
        self.grants.get(&id).copied().unwrap_or(ActionSet::empty())
    }

    #[inline]
    pub fn contains(&self, id: PrivilegeId) -> bool {
        self.grants.contains_key(&id)
    }

    /// Replace the granted set for `id`; an empty set removes the entry
    pub fn set(&mut self, id: PrivilegeId, actions: ActionSet) {
        if actions.is_empty() {
            self.grants.remove(&id);
        } else {
            self.grants.insert(id, actions);
        }
    }

    pub fn remove(&mut self, id: PrivilegeId) -> bool {
        self.grants.remove(&id).is_some()
    }

    pub fn has(&self, id: PrivilegeId, action: Action) -> bool {
        self.get(id).has(action)
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    /// Entries in privilege id order
    pub fn iter(&self) -> impl Iterator<Item = (PrivilegeId, ActionSet)> + '_ {
        self.grants.iter().map(|(id, set)| (*id, *set))
    }

    pub fn ids(&self) -> impl Iterator<Item = PrivilegeId> + '_ {
        self.grants.keys().copied()
    }

    /// One assignment per present privilege, in id order
    pub fn to_assignments(&self) -> Vec<PrivilegeAssignment> {
        self.iter().map(|(id, set)| PrivilegeAssignment::new(id, set)).collect()
    }
}

impl FromIterator<(PrivilegeId, ActionSet)> for AssignmentState {
    fn from_iter<I: IntoIterator<Item = (PrivilegeId, ActionSet)>>(iter: I) -> Self {
        let mut state = AssignmentState::new();
        for (id, set) in iter {
            state.set(id, set);
        }
        state
    }
}
