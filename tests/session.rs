//! Edit sessions against real and failing stores

use std::cell::Cell;

use privmask::{
    Action, ActionSet, Db, EditSession, Privilege, PrivilegeAssignment, PrivmaskError, Result, Role, RoleId,
    RoleStore, Seed, SeedRole,
};
use tempfile::TempDir;

fn pa(privilege_id: u64, actions: u64) -> PrivilegeAssignment {
    PrivilegeAssignment { privilege_id, actions }
}

fn setup() -> (TempDir, Db) {
    let dir = TempDir::new().unwrap();
    let db = Db::open(dir.path()).unwrap();
    db.apply_seed(&Seed {
        privileges: vec![
            Privilege {
                id: 3,
                name: "Customers".into(),
                category: "CRM".into(),
                key: "customers".into(),
                available_actions: ActionSet::CREATE | ActionSet::READ | ActionSet::UPDATE,
            },
            Privilege {
                id: 5,
                name: "Maintenance schedule".into(),
                category: "Assets".into(),
                key: "maintenance".into(),
                available_actions: ActionSet::all(),
            },
        ],
        roles: vec![
            SeedRole { role: Role { id: 1, name: "Super admin".into(), is_system: true }, permissions: vec![pa(5, 15)] },
            SeedRole { role: Role { id: 2, name: "Field crew".into(), is_system: false }, permissions: vec![pa(3, 2)] },
        ],
    })
    .unwrap();
    (dir, db)
}

/// Wraps a store and rejects saves while `fail` is set
struct Flaky<'a> {
    inner: &'a Db,
    fail: Cell<bool>,
}

impl RoleStore for Flaky<'_> {
    fn privileges(&self) -> Result<Vec<Privilege>> {
        self.inner.privileges()
    }

    fn role(&self, role_id: RoleId) -> Result<Role> {
        self.inner.role(role_id)
    }

    fn role_permissions(&self, role_id: RoleId) -> Result<Vec<PrivilegeAssignment>> {
        self.inner.role_permissions(role_id)
    }

    fn set_role_permissions(&self, role_id: RoleId, assignments: &[PrivilegeAssignment]) -> Result<()> {
        if self.fail.get() {
            return Err(PrivmaskError::Storage("connection reset".into()));
        }
        self.inner.set_role_permissions(role_id, assignments)
    }
}

#[test]
fn open_loads_baseline() {
    let (_dir, db) = setup();
    let s = EditSession::open(&db, 2).unwrap();
    assert_eq!(s.role().name, "Field crew");
    assert!(!s.engine().is_locked());
    assert_eq!(s.engine().baseline().get(3), ActionSet::READ);
    assert!(!s.has_changes());
}

#[test]
fn system_role_opens_locked() {
    let (_dir, db) = setup();
    let mut s = EditSession::open(&db, 1).unwrap();
    assert!(s.engine().is_locked());
    assert!(!s.engine_mut().clear_all(5));
    assert!(!s.has_changes());
    assert_eq!(s.save().unwrap_err(), PrivmaskError::Locked(1));
}

#[test]
fn save_writes_and_rebases() {
    let (_dir, db) = setup();
    let mut s = EditSession::open(&db, 2).unwrap();
    s.engine_mut().toggle_action(3, Action::Create);
    s.engine_mut().select_all(5);
    assert!(s.has_changes());

    let report = s.save().unwrap();
    assert_eq!(report.added, vec![5]);
    assert_eq!(report.modified, vec![3]);
    assert!(!s.has_changes());
    assert_eq!(db.role_permissions(2).unwrap(), vec![pa(3, 3), pa(5, 15)]);
}

#[test]
fn failed_save_keeps_working_state() {
    let (_dir, db) = setup();
    let store = Flaky { inner: &db, fail: Cell::new(true) };
    let mut s = EditSession::open(&store, 2).unwrap();
    s.engine_mut().toggle_action(3, Action::Read);
    s.engine_mut().toggle_action(5, Action::Delete);
    let edited = s.engine().working().clone();

    assert_eq!(s.save().unwrap_err(), PrivmaskError::Storage("connection reset".into()));
    assert_eq!(s.engine().working(), &edited);
    assert!(s.has_changes());
    assert_eq!(db.role_permissions(2).unwrap(), vec![pa(3, 2)]);

    store.fail.set(false);
    s.save().unwrap();
    assert_eq!(db.role_permissions(2).unwrap(), vec![pa(5, 8)]);
}

#[test]
fn discard_returns_to_baseline() {
    let (_dir, db) = setup();
    let mut s = EditSession::open(&db, 2).unwrap();
    s.engine_mut().clear_all(3);
    assert_eq!(s.diff().removed, vec![3]);
    s.discard();
    assert!(!s.has_changes());
    assert_eq!(s.into_engine().granted(3), ActionSet::READ);
}

#[test]
fn unknown_role_fails_to_open() {
    let (_dir, db) = setup();
    assert!(matches!(EditSession::open(&db, 77), Err(PrivmaskError::UnknownRole(77))));
}
