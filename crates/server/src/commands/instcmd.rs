// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `INSTCMD`: instant-command forwarding with per-user whitelists.

use nut_wire::{DriverRequest, ErrCode};
use tracing::info;

use super::{available, require_auth, Session};
use crate::ServerCtx;

pub(super) fn handle(ctx: &ServerCtx, session: &Session, args: &[String]) -> String {
    let (Some(upsname), Some(cmd)) = (args.first(), args.get(1)) else {
        return ErrCode::InvalidArgument.to_line();
    };
    let arg = args.get(2);

    let user = match require_auth(session) {
        Ok(user) => user,
        Err(code) => return code.to_line(),
    };
    if !user.may_instcmd(cmd) {
        return ErrCode::AccessDenied.to_line();
    }

    let Some(ups) = ctx.ups(upsname) else {
        return ErrCode::UnknownUps.to_line();
    };
    if let Err(code) = available(ctx, ups) {
        return code.to_line();
    }
    if !ups.shadow().cmds.contains(cmd) {
        return ErrCode::CmdNotSupported.to_line();
    }

    let req = DriverRequest::InstCmd { cmd: cmd.clone(), arg: arg.cloned() };
    if !ups.sendline(&req.to_line()) {
        return ErrCode::InstcmdFailed.to_line();
    }

    info!(user = %user.name, ups = %ups.name, cmd, "INSTCMD forwarded to driver");
    "OK\n".to_string()
}
