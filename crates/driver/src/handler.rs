// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The seam between protocol plumbing and driver-specific code.

use crate::DriverState;
use tracing::warn;

/// Callbacks a hardware driver implements to receive `INSTCMD` and `SET`
/// requests forwarded by the server.
///
/// There is no wire-level acknowledgement; the outcome is observed through
/// subsequent state updates the handler makes on `state`.
pub trait UpsHandler {
    /// An instant command (`shutdown.return`, `test.battery.start.quick`, …).
    fn instcmd(&mut self, state: &mut DriverState, cmd: &str, arg: Option<&str>) {
        let _ = (state, arg);
        warn!(cmd, "got INSTCMD, but driver lacks a handler");
    }

    /// A request to write a `RW` variable.
    fn setvar(&mut self, state: &mut DriverState, var: &str, val: &str) {
        let _ = (state, val);
        warn!(var, "got SET, but driver lacks a handler");
    }
}

/// Handler that accepts nothing; useful for drivers without writable
/// variables or commands.
#[derive(Debug, Default)]
pub struct NullHandler;

impl UpsHandler for NullHandler {}
