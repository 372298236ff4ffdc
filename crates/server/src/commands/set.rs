// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `SET VAR`: validate against the shadow, then forward to the driver.
//!
//! The acknowledgement goes out right after a successful dispatch; the
//! driver reports the effect asynchronously through its event stream.

use nut_wire::{DriverRequest, ErrCode};
use tracing::info;

use super::{available, require_auth, Session};
use crate::ServerCtx;

pub(super) fn handle(ctx: &ServerCtx, session: &Session, args: &[String]) -> String {
    if args.first().map(|s| s.to_ascii_uppercase()) != Some("VAR".to_string()) {
        return ErrCode::InvalidArgument.to_line();
    }
    let (Some(upsname), Some(var), Some(value)) = (args.get(1), args.get(2), args.get(3)) else {
        return ErrCode::InvalidArgument.to_line();
    };

    let user = match require_auth(session) {
        Ok(user) => user,
        Err(code) => return code.to_line(),
    };
    if !user.may_set() {
        return ErrCode::AccessDenied.to_line();
    }

    let Some(ups) = ctx.ups(upsname) else {
        return ErrCode::UnknownUps.to_line();
    };
    if let Err(code) = available(ctx, ups) {
        return code.to_line();
    }

    {
        let shadow = ups.shadow();
        let Some(node) = shadow.tree.get(var) else {
            return ErrCode::VarNotSupported.to_line();
        };

        if !node.flags().rw {
            return ErrCode::Readonly.to_line();
        }
        if node.flags().string && node.aux() > 0 && value.len() as i64 > node.aux() {
            return ErrCode::TooLong.to_line();
        }
        if !node.enum_allows(value) {
            return ErrCode::InvalidArgument.to_line();
        }
        if !node.range_allows(value) {
            return ErrCode::InvalidArgument.to_line();
        }
    }

    let req = DriverRequest::Set { var: var.clone(), val: value.clone() };
    if !ups.sendline(&req.to_line()) {
        return ErrCode::SetFailed.to_line();
    }

    info!(user = %user.name, ups = %ups.name, var, value, "SET forwarded to driver");
    "OK\n".to_string()
}
