//! Privilege catalog
//!
//! Read-only reference data: which privileges exist and which actions are
//! legal to grant for each of them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::action::ActionSet;
use crate::error::{PrivmaskError, Result};

pub type PrivilegeId = u64;

/// A named permission unit with a legality mask
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Privilege {
    pub id: PrivilegeId,
    pub name: String,
    pub category: String,
    pub key: String,
    /// Actions that may ever be granted for this privilege
    pub available_actions: ActionSet,
}

/// Privileges indexed by id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrivilegeCatalog {
    by_id: BTreeMap<PrivilegeId, Privilege>,
}

impl PrivilegeCatalog {
    /// Build a catalog, rejecting duplicate ids
    pub fn new(privileges: impl IntoIterator<Item = Privilege>) -> Result<Self> {
        let mut by_id = BTreeMap::new();
        for p in privileges {
            let id = p.id;
            if by_id.insert(id, p).is_some() {
                return Err(PrivmaskError::DuplicatePrivilege(id));
            }
        }
        Ok(PrivilegeCatalog { by_id })
    }

    pub fn get(&self, id: PrivilegeId) -> Option<&Privilege> {
        self.by_id.get(&id)
    }

    pub fn contains(&self, id: PrivilegeId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Legal actions for a privilege; unknown privileges allow nothing
    #[inline]
    pub fn available(&self, id: PrivilegeId) -> ActionSet {
        self.by_id.get(&id).map(|p| p.available_actions).unwrap_or(ActionSet::empty())
    }

    /// Check that `actions` may be granted for privilege `id`
    pub fn check(&self, id: PrivilegeId, actions: ActionSet) -> Result<()> {
        let p = self.get(id).ok_or(PrivmaskError::UnknownPrivilege(id))?;
        if !actions.is_subset_of(p.available_actions) {
            return Err(PrivmaskError::NotPermitted { privilege_id: id, actions: actions.to_mask() });
        }
        Ok(())
    }

    /// Privileges in id order
    pub fn iter(&self) -> impl Iterator<Item = &Privilege> {
        self.by_id.values()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Privileges grouped by category label, both in sorted order
    pub fn by_category(&self) -> BTreeMap<&str, Vec<&Privilege>> {
        let mut groups: BTreeMap<&str, Vec<&Privilege>> = BTreeMap::new();
        for p in self.by_id.values() {
            groups.entry(p.category.as_str()).or_default().push(p);
        }
        groups
    }
}
