//! Error types for privmask

use thiserror::Error;

/// The main error type for privmask operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrivmaskError {
    /// An actions value used bits outside the action vocabulary
    #[error("invalid action mask {0:#x}")]
    InvalidMask(u64),

    /// The catalog listed the same privilege id twice
    #[error("duplicate privilege {0}")]
    DuplicatePrivilege(u64),

    #[error("unknown privilege {0}")]
    UnknownPrivilege(u64),

    #[error("unknown role {0}")]
    UnknownRole(u64),

    /// Granted actions are not a subset of the privilege's available actions
    #[error("privilege {privilege_id} does not permit actions {actions:#x}")]
    NotPermitted { privilege_id: u64, actions: u64 },

    /// The role is a system role and cannot be edited
    #[error("role {0} is locked")]
    Locked(u64),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error("config error: {0}")]
    Config(String),
}

/// Result type alias for privmask operations
pub type Result<T> = std::result::Result<T, PrivmaskError>;

/// Convert a storage-layer error to PrivmaskError
pub fn err<E: std::error::Error>(e: E) -> PrivmaskError {
    PrivmaskError::Storage(e.to_string())
}

impl From<serde_json::Error> for PrivmaskError {
    fn from(e: serde_json::Error) -> Self {
        PrivmaskError::Serde(e.to_string())
    }
}
