//! Server configuration and seed data
//!
//! Config is read from environment variables, falling back to defaults:
//! - `PRIVMASK_DB`: LMDB directory (default `./data/privmask`)
//! - `PRIVMASK_HOST`: bind host (default `0.0.0.0`)
//! - `PORT`: bind port (default `3000`)
//! - `PRIVMASK_SEED`: optional JSON seed file applied at startup

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::assignment::PrivilegeAssignment;
use crate::catalog::Privilege;
use crate::error::{PrivmaskError, Result};
use crate::store::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub seed: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            host: default_host(),
            port: default_port(),
            seed: None,
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/privmask")
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup; empty values count as unset
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();
        if let Some(path) = get("PRIVMASK_DB") {
            config.db_path = PathBuf::from(path);
        }
        if let Some(host) = get("PRIVMASK_HOST") {
            config.host = host;
        }
        if let Some(port) = get("PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| PrivmaskError::Config(format!("invalid PORT: {port}")))?;
        }
        config.seed = get("PRIVMASK_SEED").map(PathBuf::from);
        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A role with its initial permissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedRole {
    #[serde(flatten)]
    pub role: Role,
    #[serde(default)]
    pub permissions: Vec<PrivilegeAssignment>,
}

/// Initial catalog and roles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub privileges: Vec<Privilege>,
    #[serde(default)]
    pub roles: Vec<SeedRole>,
}

impl Seed {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| PrivmaskError::Config(format!("cannot read seed {}: {e}", path.display())))?;
        Self::from_json(&json)
    }
}
