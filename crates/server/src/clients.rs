// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry of connected TCP clients and their device logins.
//!
//! Backs `LIST CLIENT` and `GET NUMLOGINS`, and enforces the one-login-
//! per-device rule for a single connection.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct ClientInfo {
    addr: String,
    /// Lowercased UPS names this client holds a LOGIN on.
    logins: HashSet<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ClientRegistry {
    inner: Arc<Mutex<HashMap<u64, ClientInfo>>>,
    next_id: Arc<AtomicU64>,
}

impl ClientRegistry {
    /// Track a new connection; the returned id keys all later calls.
    pub fn register(&self, addr: &str) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .lock()
            .insert(id, ClientInfo { addr: addr.to_string(), logins: HashSet::new() });
        id
    }

    pub fn unregister(&self, id: u64) {
        self.inner.lock().remove(&id);
    }

    /// Record a LOGIN. Returns `false` when this client already holds one
    /// on that device.
    pub fn login(&self, id: u64, ups: &str) -> bool {
        let mut inner = self.inner.lock();
        match inner.get_mut(&id) {
            Some(info) => info.logins.insert(ups.to_ascii_lowercase()),
            None => false,
        }
    }

    pub fn num_logins(&self, ups: &str) -> usize {
        let key = ups.to_ascii_lowercase();
        self.inner.lock().values().filter(|c| c.logins.contains(&key)).count()
    }

    /// Addresses of clients logged into `ups`, for `LIST CLIENT`.
    pub fn addrs_for(&self, ups: &str) -> Vec<String> {
        let key = ups.to_ascii_lowercase();
        let mut addrs: Vec<String> = self
            .inner
            .lock()
            .values()
            .filter(|c| c.logins.contains(&key))
            .map(|c| c.addr.clone())
            .collect();
        addrs.sort();
        addrs
    }
}

#[cfg(test)]
#[path = "clients_tests.rs"]
mod tests;
