// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authentication and per-user authorisation.
//!
//! A request is permitted when the user's tokens intersect what the
//! request needs: `actions = ["SET"]` for writes, `actions = ["FSD"]` (or
//! the primary monitor role) for forced shutdown, and an `instcmds` entry
//! (or `ALL`) matching the command name.

use crate::{UpsmonRole, User};

/// Look up a user by exact name and verify the password.
pub fn authenticate<'a>(users: &'a [User], name: &str, password: &str) -> Option<&'a User> {
    users.iter().find(|u| u.name == name && u.password == password)
}

impl User {
    pub fn may_set(&self) -> bool {
        self.actions.iter().any(|a| a.eq_ignore_ascii_case("SET"))
    }

    pub fn may_fsd(&self) -> bool {
        self.actions.iter().any(|a| a.eq_ignore_ascii_case("FSD"))
            || self.upsmon == Some(UpsmonRole::Primary)
    }

    pub fn may_instcmd(&self, cmd: &str) -> bool {
        self.instcmds
            .iter()
            .any(|c| c.eq_ignore_ascii_case("ALL") || c.eq_ignore_ascii_case(cmd))
    }
}

#[cfg(test)]
#[path = "users_tests.rs"]
mod tests;
