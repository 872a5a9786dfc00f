//! LMDB-backed role store
//!
//! Layout:
//! - `privileges`: id (8 bytes BE) -> Privilege as JSON
//! - `roles`: id (8 bytes BE) -> Role as JSON
//! - `perms` / `perms_rev`: `key(role, privilege)` / `key(privilege, role)`
//!   -> granted action mask, kept in sync

use std::path::Path;

use heed::types::{Bytes, Str, U64};
use heed::{Database, Env, EnvOpenOptions, RoTxn, RwTxn};
use tracing::{debug, info};

use crate::action::ActionSet;
use crate::assignment::{AssignmentState, PrivilegeAssignment};
use crate::catalog::{Privilege, PrivilegeCatalog, PrivilegeId};
use crate::config::Seed;
use crate::diff::{diff, DiffReport};
use crate::error::{err, PrivmaskError, Result};
use crate::store::{Role, RoleId, RoleStore};

// Database type aliases
pub type Db64 = Database<Bytes, U64<byteorder::BigEndian>>;
pub type DbJson = Database<Bytes, Str>;

/// Create a 16-byte key from two u64 values
#[inline]
pub fn key(a: u64, b: u64) -> [u8; 16] {
    let mut k = [0u8; 16];
    k[..8].copy_from_slice(&a.to_be_bytes());
    k[8..].copy_from_slice(&b.to_be_bytes());
    k
}

#[inline]
fn tail(k: &[u8]) -> Option<u64> {
    let b: [u8; 8] = k.get(8..16)?.try_into().ok()?;
    Some(u64::from_be_bytes(b))
}

/// Bidirectional index: fwd[a,b] and rev[b,a] stay in sync
pub struct BiPair {
    pub fwd: Db64,
    pub rev: Db64,
}

impl BiPair {
    #[inline]
    pub fn put(&self, tx: &mut RwTxn, a: u64, b: u64, v: u64) -> Result<()> {
        self.fwd.put(tx, &key(a, b), &v).map_err(err)?;
        self.rev.put(tx, &key(b, a), &v).map_err(err)
    }

    #[inline]
    pub fn del(&self, tx: &mut RwTxn, a: u64, b: u64) -> Result<bool> {
        let r = self.fwd.delete(tx, &key(a, b)).map_err(err)?;
        self.rev.delete(tx, &key(b, a)).map_err(err)?;
        Ok(r)
    }

    /// Delete every fwd[a, *] entry and its mirror
    pub fn del_fwd(&self, tx: &mut RwTxn, a: u64) -> Result<usize> {
        let existing = self.list_fwd(tx, a)?;
        for &(b, _) in &existing {
            self.del(tx, a, b)?;
        }
        Ok(existing.len())
    }

    /// Delete every rev[b, *] entry and its mirror
    pub fn del_rev(&self, tx: &mut RwTxn, b: u64) -> Result<usize> {
        let existing = self.list_rev(tx, b)?;
        for &(a, _) in &existing {
            self.del(tx, a, b)?;
        }
        Ok(existing.len())
    }

    pub fn list_fwd(&self, tx: &RoTxn, a: u64) -> Result<Vec<(u64, u64)>> {
        Self::list_pfx(tx, &self.fwd, a)
    }

    pub fn list_rev(&self, tx: &RoTxn, b: u64) -> Result<Vec<(u64, u64)>> {
        Self::list_pfx(tx, &self.rev, b)
    }

    fn list_pfx(tx: &RoTxn, db: &Db64, pfx: u64) -> Result<Vec<(u64, u64)>> {
        let mut r = Vec::new();
        for item in db.prefix_iter(tx, &pfx.to_be_bytes()).map_err(err)? {
            let (k, v) = item.map_err(err)?;
            if let Some(b) = tail(k) {
                r.push((b, v));
            }
        }
        Ok(r)
    }

    fn clear(&self, tx: &mut RwTxn) -> Result<()> {
        self.fwd.clear(tx).map_err(err)?;
        self.rev.clear(tx).map_err(err)
    }
}

/// All database handles
pub struct Dbs {
    pub perms: BiPair,
    pub privileges: DbJson,
    pub roles: DbJson,
}

impl Dbs {
    fn role(&self, tx: &RoTxn, id: RoleId) -> Result<Option<Role>> {
        match self.roles.get(tx, &id.to_be_bytes()).map_err(err)? {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn put_json<T: serde::Serialize>(db: &DbJson, tx: &mut RwTxn, id: u64, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        db.put(tx, &id.to_be_bytes(), &json).map_err(err)
    }

    fn list_json<T: serde::de::DeserializeOwned>(db: &DbJson, tx: &RoTxn) -> Result<Vec<T>> {
        let mut r = Vec::new();
        for item in db.iter(tx).map_err(err)? {
            let (_, json) = item.map_err(err)?;
            r.push(serde_json::from_str(json)?);
        }
        Ok(r)
    }

    /// Every granted set must name a stored privilege and stay within its
    /// available actions
    fn check_grants(&self, tx: &RoTxn, state: &AssignmentState) -> Result<()> {
        let catalog = PrivilegeCatalog::new(Self::list_json::<Privilege>(&self.privileges, tx)?)?;
        state.iter().try_for_each(|(id, actions)| catalog.check(id, actions))
    }

    fn stored_state(&self, tx: &RoTxn, role: RoleId) -> Result<AssignmentState> {
        self.perms
            .list_fwd(tx, role)?
            .into_iter()
            .map(|(privilege_id, mask)| ActionSet::from_mask(mask).map(|set| (privilege_id, set)))
            .collect()
    }

    /// Replace a role's permissions without lock or catalog checks
    fn replace_perms(&self, tx: &mut RwTxn, role: RoleId, state: &AssignmentState) -> Result<()> {
        self.perms.del_fwd(tx, role)?;
        for (privilege_id, actions) in state.iter() {
            self.perms.put(tx, role, privilege_id, actions.to_mask())?;
        }
        Ok(())
    }
}

/// Role store over an LMDB environment
pub struct Db {
    env: Env,
    dbs: Dbs,
}

impl Db {
    /// Open (or create) the store at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path).map_err(err)?;
        // SAFETY: LMDB requires no other processes access this path concurrently during open.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(1 << 30)
                .max_dbs(4)
                .open(path)
                .map_err(err)?
        };
        let mut tx = env.write_txn().map_err(err)?;
        let dbs = Dbs {
            perms: BiPair {
                fwd: env.create_database(&mut tx, Some("perms")).map_err(err)?,
                rev: env.create_database(&mut tx, Some("perms_rev")).map_err(err)?,
            },
            privileges: env.create_database(&mut tx, Some("privileges")).map_err(err)?,
            roles: env.create_database(&mut tx, Some("roles")).map_err(err)?,
        };
        tx.commit().map_err(err)?;
        debug!(path = %path.display(), "role store opened");
        Ok(Db { env, dbs })
    }

    /// Execute a read-only operation
    #[inline]
    fn read<T, F: FnOnce(&Dbs, &RoTxn) -> Result<T>>(&self, f: F) -> Result<T> {
        f(&self.dbs, &self.env.read_txn().map_err(err)?)
    }

    /// Execute a write operation in one transaction; nothing is committed on error
    fn write<T, F: FnOnce(&Dbs, &mut RwTxn) -> Result<T>>(&self, f: F) -> Result<T> {
        let mut tx = self.env.write_txn().map_err(err)?;
        let r = f(&self.dbs, &mut tx)?;
        tx.commit().map_err(err)?;
        Ok(r)
    }

    /// Insert or replace a privilege definition
    pub fn put_privilege(&self, privilege: &Privilege) -> Result<()> {
        self.write(|d, tx| Dbs::put_json(&d.privileges, tx, privilege.id, privilege))
    }

    /// Insert or replace a role
    pub fn put_role(&self, role: &Role) -> Result<()> {
        self.write(|d, tx| Dbs::put_json(&d.roles, tx, role.id, role))
    }

    /// Delete a role and all of its permissions
    pub fn delete_role(&self, role_id: RoleId) -> Result<bool> {
        self.write(|d, tx| {
            d.perms.del_fwd(tx, role_id)?;
            d.roles.delete(tx, &role_id.to_be_bytes()).map_err(err)
        })
    }

    /// Delete a privilege and strip it from every role
    pub fn delete_privilege(&self, privilege_id: PrivilegeId) -> Result<bool> {
        self.write(|d, tx| {
            d.perms.del_rev(tx, privilege_id)?;
            d.privileges.delete(tx, &privilege_id.to_be_bytes()).map_err(err)
        })
    }

    /// All roles in id order
    pub fn list_roles(&self) -> Result<Vec<Role>> {
        self.read(|d, tx| Dbs::list_json(&d.roles, tx))
    }

    /// Roles holding any action on a privilege, with their granted actions
    pub fn roles_with_privilege(&self, privilege_id: PrivilegeId) -> Result<Vec<(RoleId, ActionSet)>> {
        self.read(|d, tx| {
            d.perms
                .list_rev(tx, privilege_id)?
                .into_iter()
                .map(|(role, mask)| ActionSet::from_mask(mask).map(|set| (role, set)))
                .collect()
        })
    }

    /// Load a seed in one transaction: privileges, roles, then each role's
    /// permissions as a full replacement
    pub fn apply_seed(&self, seed: &Seed) -> Result<()> {
        self.write(|d, tx| {
            for p in &seed.privileges {
                Dbs::put_json(&d.privileges, tx, p.id, p)?;
            }
            for r in &seed.roles {
                Dbs::put_json(&d.roles, tx, r.role.id, &r.role)?;
                let state = AssignmentState::from_assignments(&r.permissions)?;
                d.check_grants(tx, &state)?;
                d.replace_perms(tx, r.role.id, &state)?;
            }
            Ok(())
        })?;
        info!(privileges = seed.privileges.len(), roles = seed.roles.len(), "seed applied");
        Ok(())
    }

    /// Full replacement of a role's assignments, returning what changed.
    /// Rejects system roles, unknown privileges and actions outside a
    /// privilege's available actions; on any rejection the stored
    /// assignments are left as they were. The diff is taken inside the same
    /// write transaction as the replacement.
    pub fn replace_role_permissions(&self, role_id: RoleId, assignments: &[PrivilegeAssignment]) -> Result<DiffReport> {
        let state = AssignmentState::from_assignments(assignments)?;
        let report = self.write(|d, tx| {
            let role = d.role(tx, role_id)?.ok_or(PrivmaskError::UnknownRole(role_id))?;
            if role.is_system {
                return Err(PrivmaskError::Locked(role_id));
            }
            d.check_grants(tx, &state)?;
            let before = d.stored_state(tx, role_id)?;
            d.replace_perms(tx, role_id, &state)?;
            Ok(diff(&before, &state))
        })?;
        debug!(role_id, privileges = state.len(), changed = report.changed_ids().len(), "role permissions replaced");
        Ok(report)
    }

    /// Clear all databases
    pub fn clear_all(&self) -> Result<()> {
        self.write(|d, tx| {
            d.perms.clear(tx)?;
            d.privileges.clear(tx).map_err(err)?;
            d.roles.clear(tx).map_err(err)
        })
    }
}

impl RoleStore for Db {
    fn privileges(&self) -> Result<Vec<Privilege>> {
        self.read(|d, tx| Dbs::list_json(&d.privileges, tx))
    }

    fn role(&self, role_id: RoleId) -> Result<Role> {
        self.read(|d, tx| d.role(tx, role_id)?.ok_or(PrivmaskError::UnknownRole(role_id)))
    }

    fn role_permissions(&self, role_id: RoleId) -> Result<Vec<PrivilegeAssignment>> {
        self.read(|d, tx| {
            d.role(tx, role_id)?.ok_or(PrivmaskError::UnknownRole(role_id))?;
            Ok(d.perms
                .list_fwd(tx, role_id)?
                .into_iter()
                .map(|(privilege_id, actions)| PrivilegeAssignment { privilege_id, actions })
                .collect())
        })
    }

    fn set_role_permissions(&self, role_id: RoleId, assignments: &[PrivilegeAssignment]) -> Result<()> {
        self.replace_role_permissions(role_id, assignments).map(|_| ())
    }
}
