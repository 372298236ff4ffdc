// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TCP front end: accept loops and per-client connection tasks.
//!
//! Each connection gets its own task that reads one line, dispatches it,
//! and writes the reply before reading the next, so responses can never be
//! reordered within a connection. Concurrent clients are independent.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use nut_wire::MAX_LINE_LEN;

use crate::commands::{self, Action, Session};
use crate::ServerCtx;

/// Serve all listeners until cancelled.
pub async fn run(ctx: Arc<ServerCtx>, listeners: Vec<TcpListener>, cancel: CancellationToken) {
    let mut tasks = Vec::new();
    for listener in listeners {
        let ctx = Arc::clone(&ctx);
        let cancel = cancel.clone();
        tasks.push(tokio::spawn(accept_loop(ctx, listener, cancel)));
    }
    for task in tasks {
        let _ = task.await;
    }
}

async fn accept_loop(ctx: Arc<ServerCtx>, listener: TcpListener, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            res = listener.accept() => match res {
                Ok((stream, addr)) => {
                    debug!(%addr, "client connected");
                    let ctx = Arc::clone(&ctx);
                    let cancel = cancel.clone();
                    tokio::spawn(async move {
                        handle_client(ctx, stream, addr.ip().to_string(), cancel).await;
                    });
                }
                Err(e) => warn!(error = %e, "accept failed"),
            }
        }
    }
}

enum ReadEv {
    Line(std::io::Result<usize>),
    IdleTimeout,
}

async fn next_request(
    reader: &mut BufReader<OwnedReadHalf>,
    line: &mut String,
    idle_limit: u64,
) -> ReadEv {
    // cap the read so one client cannot grow a line without bound
    let read = async {
        let mut limited = tokio::io::AsyncReadExt::take(&mut *reader, (MAX_LINE_LEN + 1) as u64);
        limited.read_line(line).await
    };

    if idle_limit == 0 {
        return ReadEv::Line(read.await);
    }
    match tokio::time::timeout(Duration::from_secs(idle_limit), read).await {
        Ok(res) => ReadEv::Line(res),
        Err(_) => ReadEv::IdleTimeout,
    }
}

async fn handle_client(
    ctx: Arc<ServerCtx>,
    stream: TcpStream,
    addr: String,
    cancel: CancellationToken,
) {
    let client_id = ctx.clients.register(&addr);
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut session = Session::new(client_id, addr.clone());
    let idle_limit = ctx.config.client_timeout;

    let mut line = String::new();
    loop {
        line.clear();

        let ev = tokio::select! {
            _ = cancel.cancelled() => break,
            ev = next_request(&mut reader, &mut line, idle_limit) => ev,
        };

        let n = match ev {
            ReadEv::Line(Ok(0)) => break,
            ReadEv::Line(Ok(n)) => n,
            ReadEv::Line(Err(e)) => {
                debug!(%addr, error = %e, "client read failed");
                break;
            }
            ReadEv::IdleTimeout => {
                info!(%addr, "client idle too long, disconnecting");
                break;
            }
        };

        if n > MAX_LINE_LEN && !line.ends_with('\n') {
            warn!(%addr, "client request exceeds line limit, disconnecting");
            break;
        }

        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            continue;
        }

        match commands::dispatch(&ctx, &mut session, trimmed) {
            Action::Reply(reply) => {
                if write_half.write_all(reply.as_bytes()).await.is_err() {
                    debug!(%addr, "client write failed");
                    break;
                }
            }
            Action::Close(reply) => {
                let _ = write_half.write_all(reply.as_bytes()).await;
                break;
            }
        }
    }

    ctx.clients.unregister(client_id);
    debug!(%addr, "client disconnected");
}

/// Remediation text for the usual TCP bind failures, printed before the
/// server exits non-zero.
pub fn bind_rescue_hints(addr: &str, err: &std::io::Error) -> String {
    use std::io::ErrorKind;

    let mut text = format!("Fatal error: unable to listen on {addr}: {err}\n");
    match err.kind() {
        ErrorKind::PermissionDenied => {
            text.push_str(
                "\nThings to try:\n\
                 - ports below 1024 need extra privileges; run as root or pick a higher port\n",
            );
        }
        ErrorKind::AddrInUse => {
            text.push_str(
                "\nThings to try:\n\
                 - check whether another server instance is already running\n",
            );
        }
        ErrorKind::AddrNotAvailable | ErrorKind::NotFound => {
            text.push_str(
                "\nThings to try:\n\
                 - check the listen addresses in the configuration\n",
            );
        }
        _ => {}
    }
    text
}

#[cfg(test)]
#[path = "netserver_tests.rs"]
mod tests;
