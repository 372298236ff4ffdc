// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parsed server configuration.
//!
//! The protocol engine only ever sees these structs; `nutd` materialises
//! them from a TOML file. The users table mirrors the classic layout:
//! password, action tokens, an instant-command whitelist (or `ALL`), and
//! the monitor role, with the legacy `master`/`slave` spellings accepted
//! on read.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3493;

/// Seconds without driver traffic before a shadow counts as stale.
pub const DEFAULT_MAXAGE: u64 = 15;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsdConfig {
    /// Bind addresses, `host:port`. Defaults to every interface on 3493.
    #[serde(default = "default_listen")]
    pub listen: Vec<String>,

    /// Directory holding the driver state sockets.
    pub state_path: PathBuf,

    /// Staleness threshold in seconds.
    #[serde(default = "default_maxage")]
    pub maxage: u64,

    /// Disconnect clients idle longer than this many seconds; 0 disables.
    #[serde(default)]
    pub client_timeout: u64,

    #[serde(default)]
    pub ups: Vec<UpsEntry>,

    #[serde(default)]
    pub users: Vec<User>,
}

fn default_listen() -> Vec<String> {
    vec![format!("0.0.0.0:{DEFAULT_PORT}")]
}

fn default_maxage() -> u64 {
    DEFAULT_MAXAGE
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsEntry {
    pub name: String,
    /// Driver program name, e.g. `nut-dummy`.
    pub driver: String,
    /// The driver's device identifier, not a TCP port.
    pub port: String,
    pub desc: Option<String>,
}

impl UpsEntry {
    /// The driver's socket path: `<state_path>/<driver>-<port>`.
    pub fn socket_path(&self, state_path: &Path) -> PathBuf {
        state_path.join(format!("{}-{}", self.driver, self.port))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub name: String,
    pub password: String,

    /// Action classes this user may invoke (`SET`, `FSD`, …).
    #[serde(default)]
    pub actions: Vec<String>,

    /// Instant commands this user may run: a whitelist, or the literal
    /// `ALL`.
    #[serde(default)]
    pub instcmds: Vec<String>,

    #[serde(default)]
    pub upsmon: Option<UpsmonRole>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsmonRole {
    #[serde(alias = "master")]
    Primary,
    #[serde(alias = "slave")]
    Secondary,
}

impl UpsdConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        toml::from_str(&text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn maxage_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.maxage)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
