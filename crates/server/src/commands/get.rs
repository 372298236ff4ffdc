// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET` single-value queries.

use nut_wire::{escape, ErrCode};

use super::{available, projected_value};
use crate::ServerCtx;

const NO_DESC: &str = "Description unavailable";

pub(super) fn handle(ctx: &ServerCtx, args: &[String]) -> String {
    let Some(what) = args.first() else {
        return ErrCode::InvalidArgument.to_line();
    };

    match what.to_ascii_uppercase().as_str() {
        "VAR" => get_var(ctx, args.get(1), args.get(2)),
        "TYPE" => get_type(ctx, args.get(1), args.get(2)),
        "DESC" => get_desc(ctx, args.get(1), args.get(2)),
        "CMDDESC" => get_cmddesc(ctx, args.get(1), args.get(2)),
        "NUMLOGINS" => get_numlogins(ctx, args.get(1)),
        "UPSDESC" => get_upsdesc(ctx, args.get(1)),
        _ => ErrCode::InvalidArgument.to_line(),
    }
}

fn get_var(ctx: &ServerCtx, upsname: Option<&String>, var: Option<&String>) -> String {
    let (Some(upsname), Some(var)) = (upsname, var) else {
        return ErrCode::InvalidArgument.to_line();
    };
    let Some(ups) = ctx.ups(upsname) else {
        return ErrCode::UnknownUps.to_line();
    };
    if let Err(code) = available(ctx, ups) {
        return code.to_line();
    }

    let shadow = ups.shadow();
    let Some(node) = shadow.tree.get(var) else {
        return ErrCode::VarNotSupported.to_line();
    };

    let value = projected_value(ups, node.name(), node.raw_value());
    format!("VAR {upsname} {var} \"{}\"\n", escape(&value))
}

fn get_type(ctx: &ServerCtx, upsname: Option<&String>, var: Option<&String>) -> String {
    let (Some(upsname), Some(var)) = (upsname, var) else {
        return ErrCode::InvalidArgument.to_line();
    };
    let Some(ups) = ctx.ups(upsname) else {
        return ErrCode::UnknownUps.to_line();
    };
    if let Err(code) = available(ctx, ups) {
        return code.to_line();
    }

    let shadow = ups.shadow();
    let Some(node) = shadow.tree.get(var) else {
        return ErrCode::VarNotSupported.to_line();
    };

    let flags = node.flags();
    let mut tokens: Vec<String> = Vec::new();
    if flags.rw {
        tokens.push("RW".to_string());
    }
    if !node.enums().is_empty() {
        tokens.push("ENUM".to_string());
    }
    if !node.ranges().is_empty() {
        tokens.push("RANGE".to_string());
    }
    if flags.string {
        tokens.push(format!("STRING:{}", node.aux()));
    }
    if flags.number {
        tokens.push("NUMBER".to_string());
    }
    if tokens.is_empty() {
        tokens.push("UNKNOWN".to_string());
    }

    format!("TYPE {upsname} {var} {}\n", tokens.join(" "))
}

fn get_desc(ctx: &ServerCtx, upsname: Option<&String>, var: Option<&String>) -> String {
    let (Some(upsname), Some(var)) = (upsname, var) else {
        return ErrCode::InvalidArgument.to_line();
    };
    if ctx.ups(upsname).is_none() {
        return ErrCode::UnknownUps.to_line();
    }
    format!("DESC {upsname} {var} \"{NO_DESC}\"\n")
}

fn get_cmddesc(ctx: &ServerCtx, upsname: Option<&String>, cmd: Option<&String>) -> String {
    let (Some(upsname), Some(cmd)) = (upsname, cmd) else {
        return ErrCode::InvalidArgument.to_line();
    };
    let Some(ups) = ctx.ups(upsname) else {
        return ErrCode::UnknownUps.to_line();
    };
    if !ups.shadow().cmds.contains(cmd) {
        return ErrCode::CmdNotSupported.to_line();
    }
    format!("CMDDESC {upsname} {cmd} \"{NO_DESC}\"\n")
}

fn get_numlogins(ctx: &ServerCtx, upsname: Option<&String>) -> String {
    let Some(upsname) = upsname else {
        return ErrCode::InvalidArgument.to_line();
    };
    if ctx.ups(upsname).is_none() {
        return ErrCode::UnknownUps.to_line();
    }
    format!("NUMLOGINS {upsname} {}\n", ctx.clients.num_logins(upsname))
}

fn get_upsdesc(ctx: &ServerCtx, upsname: Option<&String>) -> String {
    let Some(upsname) = upsname else {
        return ErrCode::InvalidArgument.to_line();
    };
    let Some(ups) = ctx.ups(upsname) else {
        return ErrCode::UnknownUps.to_line();
    };
    let desc = ups.desc.as_deref().unwrap_or(NO_DESC);
    format!("UPSDESC {upsname} \"{}\"\n", escape(desc))
}
