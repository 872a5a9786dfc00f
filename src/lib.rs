//! privmask - role privilege assignment with action bitmasks
//!
//! A role grants each privilege a subset of four actions (create, read,
//! update, delete) stored as a bitmask. [`PermissionEngine`] edits one role's
//! assignments against a baseline, [`diff`] reports what changed, and a
//! [`RoleStore`] (LMDB-backed [`Db`]) loads and saves them.

pub mod action;
pub mod assignment;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod db;
pub mod diff;
pub mod engine;
pub mod error;
#[cfg(feature = "server")]
pub mod server;
pub mod session;
pub mod store;

pub use action::{Action, ActionSet};
pub use assignment::{AssignmentState, PrivilegeAssignment};
pub use catalog::{Privilege, PrivilegeCatalog, PrivilegeId};
pub use config::{Config, Seed, SeedRole};
pub use constants::*;
pub use db::Db;
pub use diff::{diff, DiffReport, PrivilegeChange};
pub use engine::PermissionEngine;
pub use error::{PrivmaskError, Result};
#[cfg(feature = "server")]
pub use server::router;
pub use session::EditSession;
pub use store::{Role, RoleId, RoleStore};
