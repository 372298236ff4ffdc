// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `LIST` enumerations, framed as `BEGIN LIST …` / `END LIST …` with the
//! argument echo repeated so clients can correlate replies.

use nut_wire::{escape, ErrCode};

use super::{available, projected_value};
use crate::ServerCtx;

pub(super) fn handle(ctx: &ServerCtx, args: &[String]) -> String {
    let Some(what) = args.first() else {
        return ErrCode::InvalidArgument.to_line();
    };

    match what.to_ascii_uppercase().as_str() {
        "UPS" => list_ups(ctx),
        "VAR" => list_var(ctx, args.get(1), false),
        "RW" => list_var(ctx, args.get(1), true),
        "CMD" => list_cmd(ctx, args.get(1)),
        "ENUM" => list_enum(ctx, args.get(1), args.get(2)),
        "RANGE" => list_range(ctx, args.get(1), args.get(2)),
        "CLIENT" => list_client(ctx, args.get(1)),
        _ => ErrCode::InvalidArgument.to_line(),
    }
}

fn list_ups(ctx: &ServerCtx) -> String {
    let mut out = String::from("BEGIN LIST UPS\n");
    for ups in ctx.upses.values() {
        let desc = ups.desc.as_deref().unwrap_or("Description unavailable");
        out.push_str(&format!("UPS {} \"{}\"\n", ups.name, escape(desc)));
    }
    out.push_str("END LIST UPS\n");
    out
}

fn list_var(ctx: &ServerCtx, upsname: Option<&String>, rw_only: bool) -> String {
    let Some(upsname) = upsname else {
        return ErrCode::InvalidArgument.to_line();
    };
    let Some(ups) = ctx.ups(upsname) else {
        return ErrCode::UnknownUps.to_line();
    };
    if let Err(code) = available(ctx, ups) {
        return code.to_line();
    }

    let what = if rw_only { "RW" } else { "VAR" };
    let mut out = format!("BEGIN LIST {what} {upsname}\n");

    let shadow = ups.shadow();
    for node in shadow.tree.iter() {
        if rw_only && !node.flags().rw {
            continue;
        }
        let value = projected_value(ups, node.name(), node.raw_value());
        out.push_str(&format!("{what} {upsname} {} \"{}\"\n", node.name(), escape(&value)));
    }
    drop(shadow);

    out.push_str(&format!("END LIST {what} {upsname}\n"));
    out
}

fn list_cmd(ctx: &ServerCtx, upsname: Option<&String>) -> String {
    let Some(upsname) = upsname else {
        return ErrCode::InvalidArgument.to_line();
    };
    let Some(ups) = ctx.ups(upsname) else {
        return ErrCode::UnknownUps.to_line();
    };
    if let Err(code) = available(ctx, ups) {
        return code.to_line();
    }

    let mut out = format!("BEGIN LIST CMD {upsname}\n");
    for cmd in ups.shadow().cmds.iter() {
        out.push_str(&format!("CMD {upsname} {cmd}\n"));
    }
    out.push_str(&format!("END LIST CMD {upsname}\n"));
    out
}

fn list_enum(ctx: &ServerCtx, upsname: Option<&String>, var: Option<&String>) -> String {
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

    let mut out = format!("BEGIN LIST ENUM {upsname} {var}\n");
    for val in node.enums() {
        out.push_str(&format!("ENUM {upsname} {var} \"{}\"\n", escape(val)));
    }
    out.push_str(&format!("END LIST ENUM {upsname} {var}\n"));
    out
}

fn list_range(ctx: &ServerCtx, upsname: Option<&String>, var: Option<&String>) -> String {
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

    let mut out = format!("BEGIN LIST RANGE {upsname} {var}\n");
    for &(min, max) in node.ranges() {
        out.push_str(&format!("RANGE {upsname} {var} \"{min}\" \"{max}\"\n"));
    }
    out.push_str(&format!("END LIST RANGE {upsname} {var}\n"));
    out
}

fn list_client(ctx: &ServerCtx, upsname: Option<&String>) -> String {
    let Some(upsname) = upsname else {
        return ErrCode::InvalidArgument.to_line();
    };
    if ctx.ups(upsname).is_none() {
        return ErrCode::UnknownUps.to_line();
    }

    let mut out = format!("BEGIN LIST CLIENT {upsname}\n");
    for addr in ctx.clients.addrs_for(upsname) {
        out.push_str(&format!("CLIENT {upsname} {addr}\n"));
    }
    out.push_str(&format!("END LIST CLIENT {upsname}\n"));
    out
}
