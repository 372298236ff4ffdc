// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! nut-server: the aggregating daemon (`nutd`).
//!
//! For every configured UPS the server keeps a shadow of the driver's
//! state tree, fed by a persistent connection to the driver's Unix socket,
//! and answers the line-oriented TCP protocol against the union of those
//! shadows. Commands from authorised clients flow back through the same
//! driver connections.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod clients;
pub mod commands;
pub mod config;
pub mod netserver;
pub mod sstate;
pub mod users;

pub use clients::ClientRegistry;
pub use config::{ConfigError, UpsEntry, UpsdConfig, UpsmonRole, User};
pub use sstate::{run_monitor, Shadow, Ups};

use indexmap::IndexMap;
use std::sync::Arc;

/// Shared context for monitors and client handlers.
pub struct ServerCtx {
    pub config: UpsdConfig,
    /// Configured devices, keyed by lowercased name, in config order.
    pub upses: IndexMap<String, Arc<Ups>>,
    pub clients: ClientRegistry,
}

impl ServerCtx {
    pub fn new(config: UpsdConfig) -> Self {
        let mut upses = IndexMap::new();
        for entry in &config.ups {
            let ups = Ups::new(entry, &config.state_path);
            upses.insert(entry.name.to_ascii_lowercase(), Arc::new(ups));
        }
        Self { config, upses, clients: ClientRegistry::default() }
    }

    /// Case-insensitive device lookup.
    pub fn ups(&self, name: &str) -> Option<&Arc<Ups>> {
        self.upses.get(&name.to_ascii_lowercase())
    }
}
