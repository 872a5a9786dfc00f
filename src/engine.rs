//! Permission assignment engine
//!
//! Holds a baseline and a working assignment state for one role. The
//! baseline is never touched by edits; the working state only ever moves
//! through legal toggles (action within the privilege's available actions)
//! and every mutation is refused while the engine is locked. Refusals are
//! silent: mutators report `false` and leave state as it was.

use tracing::debug;

use crate::action::{Action, ActionSet};
use crate::assignment::{AssignmentState, PrivilegeAssignment};
use crate::catalog::{PrivilegeCatalog, PrivilegeId};
use crate::diff::{diff, DiffReport};

#[derive(Debug, Clone)]
pub struct PermissionEngine {
    catalog: PrivilegeCatalog,
    baseline: AssignmentState,
    working: AssignmentState,
    locked: bool,
}

impl PermissionEngine {
    /// Create an engine seeded with `baseline`
    pub fn new(catalog: PrivilegeCatalog, baseline: AssignmentState, locked: bool) -> Self {
        let working = baseline.clone();
        PermissionEngine { catalog, baseline, working, locked }
    }

    /// Replace both baseline and working state with `baseline`
    pub fn initialize(&mut self, baseline: AssignmentState) {
        self.working = baseline.clone();
        self.baseline = baseline;
    }

    /// Flip one action for a privilege. Removing the last action drops the
    /// privilege entry. Adding requires the action to be available.
    pub fn toggle_action(&mut self, id: PrivilegeId, action: Action) -> bool {
        if self.refuse_locked(id, "toggle") {
            return false;
        }
        let current = self.working.get(id);
        if current.has(action) {
            self.working.set(id, current - ActionSet::from(action));
            return true;
        }
        if !self.catalog.available(id).has(action) {
            debug!(privilege_id = id, %action, "toggle refused: action not available");
            return false;
        }
        self.working.set(id, current | ActionSet::from(action));
        true
    }

    /// Grant exactly the privilege's available actions
    pub fn select_all(&mut self, id: PrivilegeId) -> bool {
        if self.refuse_locked(id, "select all") {
            return false;
        }
        let available = self.catalog.available(id);
        if self.working.get(id) == available {
            return false;
        }
        self.working.set(id, available);
        true
    }

    /// Drop every action for a privilege
    pub fn clear_all(&mut self, id: PrivilegeId) -> bool {
        if self.refuse_locked(id, "clear all") {
            return false;
        }
        self.working.remove(id)
    }

    /// Discard edits. Allowed while locked; it can only remove changes.
    pub fn reset_to_baseline(&mut self) {
        self.working = self.baseline.clone();
    }

    /// Make the working state the new baseline (after a successful save)
    pub fn rebase(&mut self) {
        self.baseline = self.working.clone();
    }

    /// Submission payload: one entry per privilege with granted actions,
    /// in privilege id order
    pub fn serialize(&self) -> Vec<PrivilegeAssignment> {
        self.working.to_assignments()
    }

    pub fn diff(&self) -> DiffReport {
        diff(&self.baseline, &self.working)
    }

    pub fn has_changes(&self) -> bool {
        self.baseline != self.working
    }

    #[inline]
    pub fn granted(&self, id: PrivilegeId) -> ActionSet {
        self.working.get(id)
    }

    pub fn working(&self) -> &AssignmentState {
        &self.working
    }

    pub fn baseline(&self) -> &AssignmentState {
        &self.baseline
    }

    pub fn catalog(&self) -> &PrivilegeCatalog {
        &self.catalog
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    fn refuse_locked(&self, id: PrivilegeId, op: &str) -> bool {
        if self.locked {
            debug!(privilege_id = id, op, "mutation refused: engine locked");
        }
        self.locked
    }
}
