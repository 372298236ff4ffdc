// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `HELP`, `VER`, `NETVER` constants.

use super::NETVER;

pub(super) fn help() -> String {
    "Commands: HELP VER NETVER GET LIST SET INSTCMD LOGIN LOGOUT USERNAME PASSWORD STARTTLS FSD\n"
        .to_string()
}

pub(super) fn ver() -> String {
    format!("Network UPS Tools nutd {}\n", env!("CARGO_PKG_VERSION"))
}

pub(super) fn netver() -> String {
    format!("{NETVER}\n")
}
