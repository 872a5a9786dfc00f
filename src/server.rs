//! HTTP API over the role store
//!
//! Endpoints:
//!   GET  /status                   - Catalog and role counts
//!   GET  /privileges               - Privilege catalog
//!   GET  /roles                    - Roles
//!   GET  /roles/:id/permissions    - Role with its assignments
//!   PUT  /roles/:id/permissions    - Replace a role's assignments
//!   POST /roles/:id/diff           - Diff proposed assignments against stored ones

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::assignment::{AssignmentState, PrivilegeAssignment};
use crate::catalog::Privilege;
use crate::db::Db;
use crate::diff::{diff, DiffReport};
use crate::error::{PrivmaskError, Result};
use crate::store::{Role, RoleId, RoleStore};

type AppState = Arc<Db>;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SetPermissionsReq {
    pub permissions: Vec<PrivilegeAssignment>,
}

#[derive(Debug, Serialize)]
pub struct StatusRes {
    pub privileges: usize,
    pub roles: usize,
}

#[derive(Debug, Serialize)]
pub struct AssignmentInfo {
    #[serde(rename = "privilegeId")]
    pub privilege_id: u64,
    pub actions: u64,
    pub names: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct RolePermissionsRes {
    pub role: Role,
    pub permissions: Vec<AssignmentInfo>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    fn err(msg: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(msg.into()) }
    }
}

type Reply<T> = (StatusCode, Json<ApiResponse<T>>);

// ============================================================================
// Helpers
// ============================================================================

/// HTTP status for a failed operation
pub fn status_for(e: &PrivmaskError) -> StatusCode {
    match e {
        PrivmaskError::UnknownRole(_) => StatusCode::NOT_FOUND,
        PrivmaskError::Locked(_) => StatusCode::FORBIDDEN,
        PrivmaskError::InvalidMask(_)
        | PrivmaskError::DuplicatePrivilege(_)
        | PrivmaskError::UnknownPrivilege(_)
        | PrivmaskError::NotPermitted { .. }
        | PrivmaskError::Serde(_) => StatusCode::BAD_REQUEST,
        PrivmaskError::Storage(_) | PrivmaskError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reply<T>(r: Result<T>) -> Reply<T> {
    match r {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data))),
        Err(e) => (status_for(&e), Json(ApiResponse::err(e.to_string()))),
    }
}

fn describe(assignments: Vec<PrivilegeAssignment>) -> Result<Vec<AssignmentInfo>> {
    assignments
        .into_iter()
        .map(|a| {
            a.action_set().map(|set| AssignmentInfo {
                privilege_id: a.privilege_id,
                actions: a.actions,
                names: set.names(),
            })
        })
        .collect()
}

fn stored_state(db: &Db, id: RoleId) -> Result<AssignmentState> {
    AssignmentState::from_assignments(&db.role_permissions(id)?)
}

fn status(db: &Db) -> Result<StatusRes> {
    Ok(StatusRes { privileges: db.privileges()?.len(), roles: db.list_roles()?.len() })
}

fn role_permissions(db: &Db, id: RoleId) -> Result<RolePermissionsRes> {
    Ok(RolePermissionsRes { role: db.role(id)?, permissions: describe(db.role_permissions(id)?)? })
}

fn replace(db: &Db, id: RoleId, permissions: &[PrivilegeAssignment]) -> Result<DiffReport> {
    let report = db.replace_role_permissions(id, permissions)?;
    info!(role_id = id, changed = report.changed_ids().len(), "role permissions replaced over http");
    Ok(report)
}

fn preview(db: &Db, id: RoleId, permissions: &[PrivilegeAssignment]) -> Result<DiffReport> {
    let proposed = AssignmentState::from_assignments(permissions)?;
    Ok(diff(&stored_state(db, id)?, &proposed))
}

// ============================================================================
// Handlers
// ============================================================================

async fn get_status(State(db): State<AppState>) -> Reply<StatusRes> {
    reply(status(&db))
}

async fn get_privileges(State(db): State<AppState>) -> Reply<Vec<Privilege>> {
    reply(db.catalog().map(|c| c.iter().cloned().collect()))
}

async fn get_roles(State(db): State<AppState>) -> Reply<Vec<Role>> {
    reply(db.list_roles())
}

async fn get_role_permissions(
    State(db): State<AppState>,
    Path(id): Path<RoleId>,
) -> Reply<RolePermissionsRes> {
    reply(role_permissions(&db, id))
}

async fn put_role_permissions(
    State(db): State<AppState>,
    Path(id): Path<RoleId>,
    Json(req): Json<SetPermissionsReq>,
) -> Reply<DiffReport> {
    reply(replace(&db, id, &req.permissions))
}

async fn post_role_diff(
    State(db): State<AppState>,
    Path(id): Path<RoleId>,
    Json(req): Json<SetPermissionsReq>,
) -> Reply<DiffReport> {
    reply(preview(&db, id, &req.permissions))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(db: Arc<Db>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/status", get(get_status))
        .route("/privileges", get(get_privileges))
        .route("/roles", get(get_roles))
        .route("/roles/:id/permissions", get(get_role_permissions).put(put_role_permissions))
        .route("/roles/:id/diff", post(post_role_diff))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionSet;
    use crate::config::{Seed, SeedRole};
    use tempfile::TempDir;

    fn seeded() -> (TempDir, AppState) {
        let dir = TempDir::new().unwrap();
        let db = Db::open(dir.path()).unwrap();
        db.apply_seed(&Seed {
            privileges: vec![Privilege {
                id: 3,
                name: "Customers".into(),
                category: "CRM".into(),
                key: "customers".into(),
                available_actions: ActionSet::CREATE | ActionSet::READ | ActionSet::UPDATE,
            }],
            roles: vec![
                SeedRole { role: Role { id: 1, name: "Admin".into(), is_system: true }, permissions: vec![] },
                SeedRole {
                    role: Role { id: 2, name: "Clerk".into(), is_system: false },
                    permissions: vec![PrivilegeAssignment { privilege_id: 3, actions: 2 }],
                },
            ],
        })
        .unwrap();
        (dir, Arc::new(db))
    }

    fn req(pairs: &[(u64, u64)]) -> Json<SetPermissionsReq> {
        Json(SetPermissionsReq {
            permissions: pairs.iter().map(|&(privilege_id, actions)| PrivilegeAssignment { privilege_id, actions }).collect(),
        })
    }

    #[test]
    fn error_statuses() {
        assert_eq!(status_for(&PrivmaskError::UnknownRole(9)), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&PrivmaskError::Locked(1)), StatusCode::FORBIDDEN);
        assert_eq!(status_for(&PrivmaskError::InvalidMask(16)), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&PrivmaskError::Storage("x".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn role_permissions_include_action_names() {
        let (_dir, db) = seeded();
        let (status, Json(res)) = get_role_permissions(State(db), Path(2)).await;
        assert_eq!(status, StatusCode::OK);
        let data = res.data.unwrap();
        assert_eq!(data.role.name, "Clerk");
        assert_eq!(data.permissions[0].names, vec!["read"]);
    }

    #[tokio::test]
    async fn put_replaces_and_reports_diff() {
        let (_dir, db) = seeded();
        let (status, Json(res)) = put_role_permissions(State(db.clone()), Path(2), req(&[(3, 3)])).await;
        assert_eq!(status, StatusCode::OK);
        let report = res.data.unwrap();
        assert_eq!(report.modified, vec![3]);
        assert!(report.has_changes);
        assert_eq!(db.role_permissions(2).unwrap(), vec![PrivilegeAssignment { privilege_id: 3, actions: 3 }]);
    }

    #[tokio::test]
    async fn put_on_system_role_is_forbidden() {
        let (_dir, db) = seeded();
        let (status, Json(res)) = put_role_permissions(State(db), Path(1), req(&[(3, 2)])).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(!res.success);
    }

    #[tokio::test]
    async fn put_with_unavailable_action_is_bad_request() {
        let (_dir, db) = seeded();
        let (status, _) = put_role_permissions(State(db.clone()), Path(2), req(&[(3, 8)])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(db.role_permissions(2).unwrap(), vec![PrivilegeAssignment { privilege_id: 3, actions: 2 }]);
    }

    #[tokio::test]
    async fn diff_does_not_write() {
        let (_dir, db) = seeded();
        let (status, Json(res)) = post_role_diff(State(db.clone()), Path(2), req(&[])).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(res.data.unwrap().removed, vec![3]);
        assert_eq!(db.role_permissions(2).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_role_is_not_found() {
        let (_dir, db) = seeded();
        let (status, _) = get_role_permissions(State(db), Path(42)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
