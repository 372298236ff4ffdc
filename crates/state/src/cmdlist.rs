// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The instant-command list: an insertion-ordered set of command names,
//! independent of the variable tree. Duplicates are silently ignored,
//! compared case-insensitively; original casing is preserved.

use indexmap::IndexMap;

#[derive(Debug, Default, Clone)]
pub struct CommandList {
    cmds: IndexMap<String, String>,
}

impl CommandList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command name. Returns `true` if it was not already present.
    pub fn add(&mut self, name: &str) -> bool {
        let k = name.to_ascii_lowercase();
        if self.cmds.contains_key(&k) {
            return false;
        }
        self.cmds.insert(k, name.to_string());
        true
    }

    /// Remove a command name, preserving the order of the rest.
    pub fn del(&mut self, name: &str) -> bool {
        self.cmds.shift_remove(&name.to_ascii_lowercase()).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cmds.contains_key(&name.to_ascii_lowercase())
    }

    /// Command names in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.cmds.values().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.cmds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    pub fn clear(&mut self) {
        self.cmds.clear();
    }
}

#[cfg(test)]
#[path = "cmdlist_tests.rs"]
mod tests;
