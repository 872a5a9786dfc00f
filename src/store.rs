//! Role storage boundary
//!
//! The engine itself never does I/O. Callers load the catalog and a role's
//! assignments through a `RoleStore`, and submit the serialized working
//! state back through it as a full replacement.

use serde::{Deserialize, Serialize};

use crate::assignment::PrivilegeAssignment;
use crate::catalog::{Privilege, PrivilegeCatalog};
use crate::error::Result;

pub type RoleId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    /// System roles cannot have their assignments edited
    #[serde(default)]
    pub is_system: bool,
}

pub trait RoleStore {
    /// Every known privilege
    fn privileges(&self) -> Result<Vec<Privilege>>;

    fn role(&self, role_id: RoleId) -> Result<Role>;

    /// The role's current assignments
    fn role_permissions(&self, role_id: RoleId) -> Result<Vec<PrivilegeAssignment>>;

    /// Replace the role's assignments with `assignments`
    fn set_role_permissions(&self, role_id: RoleId, assignments: &[PrivilegeAssignment]) -> Result<()>;

    /// Privileges as a validated catalog
    fn catalog(&self) -> Result<PrivilegeCatalog> {
        PrivilegeCatalog::new(self.privileges()?)
    }
}

impl<S: RoleStore + ?Sized> RoleStore for &S {
    fn privileges(&self) -> Result<Vec<Privilege>> {
        (**self).privileges()
    }

    fn role(&self, role_id: RoleId) -> Result<Role> {
        (**self).role(role_id)
    }

    fn role_permissions(&self, role_id: RoleId) -> Result<Vec<PrivilegeAssignment>> {
        (**self).role_permissions(role_id)
    }

    fn set_role_permissions(&self, role_id: RoleId, assignments: &[PrivilegeAssignment]) -> Result<()> {
        (**self).set_role_permissions(role_id, assignments)
    }
}
