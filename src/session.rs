//! Edit session: one role, one engine, one store

use tracing::{info, warn};

use crate::assignment::AssignmentState;
use crate::diff::DiffReport;
use crate::engine::PermissionEngine;
use crate::error::{PrivmaskError, Result};
use crate::store::{Role, RoleId, RoleStore};

/// Loads a role into a [`PermissionEngine`] and writes it back on save.
/// System roles open locked.
pub struct EditSession<S: RoleStore> {
    store: S,
    role: Role,
    engine: PermissionEngine,
}

impl<S: RoleStore> EditSession<S> {
    pub fn open(store: S, role_id: RoleId) -> Result<Self> {
        let catalog = store.catalog()?;
        let role = store.role(role_id)?;
        let baseline = AssignmentState::from_assignments(&store.role_permissions(role_id)?)?;
        let engine = PermissionEngine::new(catalog, baseline, role.is_system);
        info!(role_id, locked = role.is_system, privileges = engine.baseline().len(), "edit session opened");
        Ok(EditSession { store, role, engine })
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn engine(&self) -> &PermissionEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut PermissionEngine {
        &mut self.engine
    }

    pub fn diff(&self) -> DiffReport {
        self.engine.diff()
    }

    pub fn has_changes(&self) -> bool {
        self.engine.has_changes()
    }

    /// Submit the working state as a full replacement. On success the saved
    /// state becomes the new baseline; on failure the working state is kept
    /// so the save can be retried. Locked sessions never reach the store.
    pub fn save(&mut self) -> Result<DiffReport> {
        if self.engine.is_locked() {
            return Err(PrivmaskError::Locked(self.role.id));
        }
        let report = self.engine.diff();
        let payload = self.engine.serialize();
        if let Err(e) = self.store.set_role_permissions(self.role.id, &payload) {
            warn!(role_id = self.role.id, error = %e, "save failed");
            return Err(e);
        }
        self.engine.rebase();
        info!(
            role_id = self.role.id,
            added = report.added.len(),
            removed = report.removed.len(),
            modified = report.modified.len(),
            "role permissions saved"
        );
        Ok(report)
    }

    /// Throw away unsaved edits
    pub fn discard(&mut self) {
        self.engine.reset_to_baseline();
    }

    pub fn into_engine(self) -> PermissionEngine {
        self.engine
    }
}
