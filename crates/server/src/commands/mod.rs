// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Network protocol command dispatch.
//!
//! One call per inbound line; the result is the exact bytes to answer
//! with (possibly many lines for `LIST`), or an instruction to close the
//! connection. Handlers never touch the socket, which keeps responses
//! strictly ordered per connection and the whole layer testable without
//! I/O.

mod get;
mod instcmd;
mod list;
mod misc;
mod set;
mod user;

use std::time::Instant;

use nut_wire::{split_args, ErrCode};
use tracing::info;

use crate::{ServerCtx, Ups, User};

/// Network protocol version reported by `NETVER`.
pub const NETVER: &str = "1.3";

/// Per-connection protocol state.
pub struct Session {
    pub client_id: u64,
    pub addr: String,
    pub username: Option<String>,
    /// Present once `PASSWORD` authenticated successfully.
    pub user: Option<User>,
}

impl Session {
    pub fn new(client_id: u64, addr: String) -> Self {
        Self { client_id, addr, username: None, user: None }
    }
}

/// What the connection loop should do with the outcome.
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    Reply(String),
    /// Write the final reply, then drop the connection.
    Close(String),
}

/// Handle one request line.
pub fn dispatch(ctx: &ServerCtx, session: &mut Session, line: &str) -> Action {
    let args = match split_args(line) {
        Ok(args) => args,
        Err(_) => return Action::Reply(ErrCode::InvalidArgument.to_line()),
    };
    let Some(verb) = args.first() else {
        return Action::Reply(ErrCode::InvalidArgument.to_line());
    };
    let rest = args.get(1..).unwrap_or_default();

    match verb.to_ascii_uppercase().as_str() {
        "HELP" => Action::Reply(misc::help()),
        "VER" => Action::Reply(misc::ver()),
        "NETVER" => Action::Reply(misc::netver()),
        "GET" => Action::Reply(get::handle(ctx, rest)),
        "LIST" => Action::Reply(list::handle(ctx, rest)),
        "USERNAME" => Action::Reply(user::username(session, rest)),
        "PASSWORD" => Action::Reply(user::password(ctx, session, rest)),
        "LOGIN" => Action::Reply(user::login(ctx, session, rest)),
        "LOGOUT" => Action::Close("OK Goodbye\n".to_string()),
        "STARTTLS" => Action::Reply(ErrCode::FeatureNotConfigured.to_line()),
        "FSD" => Action::Reply(user::fsd(ctx, session, rest)),
        "SET" => Action::Reply(set::handle(ctx, session, rest)),
        "INSTCMD" => Action::Reply(instcmd::handle(ctx, session, rest)),
        _ => {
            info!(verb, "unknown network verb");
            Action::Reply(ErrCode::InvalidArgument.to_line())
        }
    }
}

/// Whether queries against this device may be answered right now.
fn available(ctx: &ServerCtx, ups: &Ups) -> Result<(), ErrCode> {
    if !ups.connected() {
        return Err(ErrCode::DriverNotConnected);
    }
    if ups.dead(ctx.config.maxage_duration(), Instant::now()) {
        return Err(ErrCode::DataStale);
    }
    Ok(())
}

/// `USERNAME` and `PASSWORD` must both have succeeded.
fn require_auth(session: &Session) -> Result<&User, ErrCode> {
    if session.username.is_none() {
        return Err(ErrCode::UsernameRequired);
    }
    session.user.as_ref().ok_or(ErrCode::PasswordRequired)
}

/// The wire value of one variable, with the forced-shutdown marker folded
/// into `ups.status` so secondaries see the transition unambiguously.
fn projected_value(ups: &Ups, name: &str, raw: &str) -> String {
    if ups.is_fsd() && name.eq_ignore_ascii_case("ups.status") {
        format!("FSD {raw}")
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
