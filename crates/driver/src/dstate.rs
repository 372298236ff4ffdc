// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driver-side state with broadcast bookkeeping.
//!
//! Every mutation that changes observable state appends the matching
//! [`DriverEvent`] to a pending queue; the socket layer drains the queue
//! and writes it to every live connection. The state itself never touches
//! a socket, so it stays trivially testable.

use nut_state::{CommandList, StateError, StateTree, VarFlags};
use nut_wire::DriverEvent;

#[derive(Debug, Default)]
pub struct DriverState {
    tree: StateTree,
    cmds: CommandList,
    stale: bool,
    alarm_active: bool,
    status_buf: String,
    alarm_buf: String,
    pending: Vec<DriverEvent>,
}

impl DriverState {
    /// Fresh state. Data starts out stale until the driver first reports
    /// a good reading.
    pub fn new() -> Self {
        Self { stale: true, ..Self::default() }
    }

    pub fn tree(&self) -> &StateTree {
        &self.tree
    }

    pub fn cmds(&self) -> &CommandList {
        &self.cmds
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Insert or update a variable, broadcasting on change.
    pub fn set_info(&mut self, var: &str, val: &str) -> bool {
        let changed = self.tree.set_info(var, val);
        if changed {
            self.pending.push(DriverEvent::SetInfo { var: var.to_string(), val: val.to_string() });
        }
        changed
    }

    pub fn del_info(&mut self, var: &str) -> bool {
        let deleted = self.tree.del_info(var);
        if deleted {
            self.pending.push(DriverEvent::DelInfo { var: var.to_string() });
        }
        deleted
    }

    pub fn get_info(&self, var: &str) -> Option<&str> {
        self.tree.get_info(var)
    }

    pub fn add_enum(&mut self, var: &str, val: &str) -> Result<(), StateError> {
        if self.tree.add_enum(var, val)? {
            self.pending.push(DriverEvent::AddEnum { var: var.to_string(), val: val.to_string() });
        }
        Ok(())
    }

    pub fn del_enum(&mut self, var: &str, val: &str) -> bool {
        let deleted = self.tree.del_enum(var, val);
        if deleted {
            self.pending.push(DriverEvent::DelEnum { var: var.to_string(), val: val.to_string() });
        }
        deleted
    }

    pub fn add_range(&mut self, var: &str, min: i64, max: i64) -> Result<(), StateError> {
        if self.tree.add_range(var, min, max)? {
            self.pending.push(DriverEvent::AddRange { var: var.to_string(), min, max });
        }
        Ok(())
    }

    pub fn del_range(&mut self, var: &str, min: i64, max: i64) -> bool {
        let deleted = self.tree.del_range(var, min, max);
        if deleted {
            self.pending.push(DriverEvent::DelRange { var: var.to_string(), min, max });
        }
        deleted
    }

    pub fn set_flags(&mut self, var: &str, flags: VarFlags) -> Result<(), StateError> {
        if self.tree.set_flags(var, flags)? {
            self.pending.push(DriverEvent::SetFlags {
                var: var.to_string(),
                flags: flags.tokens().iter().map(|t| t.to_string()).collect(),
            });
        }
        Ok(())
    }

    pub fn set_aux(&mut self, var: &str, aux: i64) -> Result<(), StateError> {
        if self.tree.set_aux(var, aux)? {
            self.pending.push(DriverEvent::SetAux { var: var.to_string(), aux });
        }
        Ok(())
    }

    pub fn add_cmd(&mut self, cmd: &str) {
        if self.cmds.add(cmd) {
            self.pending.push(DriverEvent::AddCmd { cmd: cmd.to_string() });
        }
    }

    pub fn del_cmd(&mut self, cmd: &str) -> bool {
        let deleted = self.cmds.del(cmd);
        if deleted {
            self.pending.push(DriverEvent::DelCmd { cmd: cmd.to_string() });
        }
        deleted
    }

    /// Mark data fresh. Broadcast only on the stale→fresh transition.
    pub fn data_ok(&mut self) {
        if self.stale {
            self.stale = false;
            self.pending.push(DriverEvent::DataOk);
        }
    }

    /// Mark data stale. Broadcast only on the fresh→stale transition.
    pub fn data_stale(&mut self) {
        if !self.stale {
            self.stale = true;
            self.pending.push(DriverEvent::DataStale);
        }
    }

    /// Take the queued broadcast events.
    pub fn take_pending(&mut self) -> Vec<DriverEvent> {
        std::mem::take(&mut self.pending)
    }

    /// One self-consistent snapshot, in `DUMPALL` reply order: staleness
    /// first (if stale), the tree with per-variable metadata, the command
    /// list, `DATAOK` (if fresh), `DUMPDONE` last.
    pub fn dump_events(&self) -> Vec<DriverEvent> {
        let mut out = Vec::new();

        if self.stale {
            out.push(DriverEvent::DataStale);
        }

        for var in self.tree.iter() {
            out.push(DriverEvent::SetInfo {
                var: var.name().to_string(),
                val: var.raw_value().to_string(),
            });
            for e in var.enums() {
                out.push(DriverEvent::AddEnum { var: var.name().to_string(), val: e.clone() });
            }
            for &(min, max) in var.ranges() {
                out.push(DriverEvent::AddRange { var: var.name().to_string(), min, max });
            }
            if var.aux() != 0 {
                out.push(DriverEvent::SetAux { var: var.name().to_string(), aux: var.aux() });
            }
            if !var.flags().is_empty() {
                out.push(DriverEvent::SetFlags {
                    var: var.name().to_string(),
                    flags: var.flags().tokens().iter().map(|t| t.to_string()).collect(),
                });
            }
        }

        for cmd in self.cmds.iter() {
            out.push(DriverEvent::AddCmd { cmd: cmd.to_string() });
        }

        if !self.stale {
            out.push(DriverEvent::DataOk);
        }

        out.push(DriverEvent::DumpDone);
        out
    }

    // ups.status assembly, token by token

    /// Clear the status scratch buffer for a new polling pass.
    pub fn status_init(&mut self) {
        self.status_buf.clear();
    }

    /// Append one status token (`OL`, `OB`, `LB`, …).
    pub fn status_set(&mut self, token: &str) {
        if !self.status_buf.is_empty() {
            self.status_buf.push(' ');
        }
        self.status_buf.push_str(token);
    }

    /// Publish the assembled status. An active alarm prefixes it with
    /// `ALARM`.
    pub fn status_commit(&mut self) {
        let value = if self.alarm_active {
            format!("ALARM {}", self.status_buf)
        } else {
            self.status_buf.clone()
        };
        self.set_info("ups.status", &value);
    }

    // ups.alarm assembly

    pub fn alarm_init(&mut self) {
        self.alarm_buf.clear();
    }

    pub fn alarm_set(&mut self, token: &str) {
        if !self.alarm_buf.is_empty() {
            self.alarm_buf.push(' ');
        }
        self.alarm_buf.push_str(token);
    }

    /// Publish or retract `ups.alarm`; an empty buffer removes the
    /// variable entirely.
    pub fn alarm_commit(&mut self) {
        if self.alarm_buf.is_empty() {
            self.del_info("ups.alarm");
            self.alarm_active = false;
        } else {
            let value = self.alarm_buf.clone();
            self.set_info("ups.alarm", &value);
            self.alarm_active = true;
        }
    }
}

#[cfg(test)]
#[path = "dstate_tests.rs"]
mod tests;
