// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level scenario tests against the real binaries.

#[path = "specs/prelude.rs"]
mod prelude;

#[path = "specs/cli.rs"]
mod cli;
#[path = "specs/dump.rs"]
mod dump;
#[path = "specs/session.rs"]
mod session;
