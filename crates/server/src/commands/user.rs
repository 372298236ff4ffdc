// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session commands: `USERNAME`, `PASSWORD`, `LOGIN`, `FSD`.

use nut_wire::ErrCode;
use tracing::{info, warn};

use super::{require_auth, Session};
use crate::{users, ServerCtx};

pub(super) fn username(session: &mut Session, args: &[String]) -> String {
    let Some(name) = args.first() else {
        return ErrCode::InvalidArgument.to_line();
    };
    if session.username.is_some() {
        // re-issuing USERNAME mid-session is a protocol error
        return ErrCode::InvalidUsername.to_line();
    }
    session.username = Some(name.clone());
    "OK\n".to_string()
}

pub(super) fn password(ctx: &ServerCtx, session: &mut Session, args: &[String]) -> String {
    let Some(password) = args.first() else {
        return ErrCode::InvalidArgument.to_line();
    };
    let Some(name) = session.username.clone() else {
        return ErrCode::UsernameRequired.to_line();
    };
    if session.user.is_some() {
        return ErrCode::InvalidPassword.to_line();
    }

    match users::authenticate(&ctx.config.users, &name, password) {
        Some(user) => {
            session.user = Some(user.clone());
            info!(user = %name, addr = %session.addr, "authenticated");
            "OK\n".to_string()
        }
        None => {
            warn!(user = %name, addr = %session.addr, "authentication failed");
            ErrCode::AccessDenied.to_line()
        }
    }
}

pub(super) fn login(ctx: &ServerCtx, session: &Session, args: &[String]) -> String {
    let Some(upsname) = args.first() else {
        return ErrCode::InvalidArgument.to_line();
    };
    if let Err(code) = require_auth(session) {
        return code.to_line();
    }
    let Some(ups) = ctx.ups(upsname) else {
        return ErrCode::UnknownUps.to_line();
    };

    if !ctx.clients.login(session.client_id, &ups.name) {
        return ErrCode::AlreadyLoggedIn.to_line();
    }

    info!(addr = %session.addr, ups = %ups.name, "client logged in");
    "OK\n".to_string()
}

pub(super) fn fsd(ctx: &ServerCtx, session: &Session, args: &[String]) -> String {
    let Some(upsname) = args.first() else {
        return ErrCode::InvalidArgument.to_line();
    };
    let user = match require_auth(session) {
        Ok(user) => user,
        Err(code) => return code.to_line(),
    };
    if !user.may_fsd() {
        return ErrCode::AccessDenied.to_line();
    }
    let Some(ups) = ctx.ups(upsname) else {
        return ErrCode::UnknownUps.to_line();
    };

    warn!(user = %user.name, ups = %ups.name, "forced shutdown signalled");
    ups.set_fsd();
    "OK FSD-SET\n".to_string()
}
