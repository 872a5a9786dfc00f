//! Change detection between two assignment snapshots

use serde::Serialize;

use crate::action::ActionSet;
use crate::assignment::AssignmentState;
use crate::catalog::PrivilegeId;

/// Per-privilege action delta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivilegeChange {
    pub privilege_id: PrivilegeId,
    /// Actions present in working but not in baseline
    pub granted: ActionSet,
    /// Actions present in baseline but not in working
    pub revoked: ActionSet,
}

/// Classification of every privilege touched between two snapshots.
/// All id lists are sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffReport {
    pub added: Vec<PrivilegeId>,
    pub removed: Vec<PrivilegeId>,
    pub modified: Vec<PrivilegeId>,
    pub has_changes: bool,
    pub changes: Vec<PrivilegeChange>,
}

impl DiffReport {
    /// Union of added, removed and modified, sorted
    pub fn changed_ids(&self) -> Vec<PrivilegeId> {
        let mut ids: Vec<_> = self.added.iter().chain(&self.removed).chain(&self.modified).copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// Structurally compare `working` against `baseline`
pub fn diff(baseline: &AssignmentState, working: &AssignmentState) -> DiffReport {
    let mut report = DiffReport::default();

    for (id, now) in working.iter() {
        let before = baseline.get(id);
        if !baseline.contains(id) {
            report.added.push(id);
        } else if before != now {
            report.modified.push(id);
        } else {
            continue;
        }
        report.changes.push(change(id, before, now));
    }
    for (id, before) in baseline.iter() {
        if !working.contains(id) {
            report.removed.push(id);
            report.changes.push(change(id, before, ActionSet::empty()));
        }
    }
    report.changes.sort_unstable_by_key(|c| c.privilege_id);

    report.has_changes = !report.added.is_empty()
        || !report.removed.is_empty()
        || !report.modified.is_empty()
        || baseline.len() != working.len();
    report
}

#[inline]
fn change(privilege_id: PrivilegeId, before: ActionSet, now: ActionSet) -> PrivilegeChange {
    PrivilegeChange { privilege_id, granted: now - before, revoked: before - now }
}
