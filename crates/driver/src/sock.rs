// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The driver's listening socket and connection set.
//!
//! Cooperative and single-tasked: the driver's main loop calls
//! [`StatePublisher::poll`], which wakes on a timeout, an inbound
//! connection, data from a connected server, or a caller-supplied extra
//! future (the hardware). All connection I/O is non-blocking; a peer that
//! cannot absorb a write within [`WRITE_TIMEOUT`] is torn down rather than
//! allowed to stall the driver.

use std::future::Future;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::future::select_all;
use nix::sys::stat::{umask, Mode};
use tokio::io::AsyncWriteExt;
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, info, warn};

use nut_wire::{split_args, DriverRequest, LineBuffer};

use crate::{DriverError, DriverState, UpsHandler};

/// Bound on how long one peer may block a broadcast.
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

const READ_BUF_LEN: usize = 512;

/// What woke the poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The timeout ran out; time for a fresh hardware pass.
    TimerExpired,
    /// Socket traffic was handled.
    Activity,
    /// The caller's extra future completed.
    ExtraReady,
}

#[derive(Debug)]
struct Conn {
    stream: UnixStream,
    lines: LineBuffer,
}

/// Serves one driver's state on a Unix-domain socket.
#[derive(Debug)]
pub struct StatePublisher {
    state: DriverState,
    listener: UnixListener,
    path: PathBuf,
    conns: Vec<Conn>,
}

impl StatePublisher {
    /// Create the listening socket at `<state_path>/<driver_name>-<port>`.
    ///
    /// A stale socket file is unlinked first. The socket is created under
    /// `umask(0007)` and chmodded to `0660` so only the configured group
    /// may connect.
    pub fn bind(state_path: &Path, driver_name: &str, port: &str) -> Result<Self, DriverError> {
        let path = state_path.join(format!("{driver_name}-{port}"));

        if path.exists() {
            std::fs::remove_file(&path)?;
        }

        let old_mask = umask(Mode::from_bits_truncate(0o007));
        let bound = UnixListener::bind(&path);
        umask(old_mask);

        let listener =
            bound.map_err(|source| DriverError::Bind { path: path.clone(), source })?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o660))?;

        info!(path = %path.display(), "state socket open");

        Ok(Self { state: DriverState::new(), listener, path, conns: Vec::new() })
    }

    pub fn state(&self) -> &DriverState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut DriverState {
        &mut self.state
    }

    pub fn socket_path(&self) -> &Path {
        &self.path
    }

    pub fn conn_count(&self) -> usize {
        self.conns.len()
    }

    /// Wait for socket activity or the timeout.
    pub async fn poll<H: UpsHandler>(&mut self, timeout: Duration, handler: &mut H) -> PollOutcome {
        self.poll_with(timeout, handler, std::future::pending::<()>()).await
    }

    /// Like [`Self::poll`], but also wakes when `extra` completes: the
    /// slot a driver uses for its hardware descriptor.
    pub async fn poll_with<H, F>(&mut self, timeout: Duration, handler: &mut H, extra: F) -> PollOutcome
    where
        H: UpsHandler,
        F: Future<Output = ()>,
    {
        // changes made by the driver since the last poll
        self.flush().await;

        enum Ev {
            Timeout,
            Extra,
            Accept(std::io::Result<UnixStream>),
            Ready(usize),
        }

        let ev = {
            let listener = &self.listener;
            let conns = &self.conns;
            tokio::select! {
                _ = tokio::time::sleep(timeout) => Ev::Timeout,
                _ = extra => Ev::Extra,
                res = listener.accept() => Ev::Accept(res.map(|(stream, _)| stream)),
                idx = readable_conn(conns) => Ev::Ready(idx),
            }
        };

        match ev {
            Ev::Timeout => PollOutcome::TimerExpired,
            Ev::Extra => PollOutcome::ExtraReady,
            Ev::Accept(Ok(stream)) => {
                debug!("new connection on state socket");
                self.conns.push(Conn { stream, lines: LineBuffer::new() });
                PollOutcome::Activity
            }
            Ev::Accept(Err(e)) => {
                warn!(error = %e, "accept on state socket failed");
                PollOutcome::Activity
            }
            Ev::Ready(idx) => {
                self.service_conn(idx, handler).await;
                self.flush().await;
                PollOutcome::Activity
            }
        }
    }

    /// Broadcast queued state events to every live connection.
    pub async fn flush(&mut self) {
        let events = self.state.take_pending();
        if events.is_empty() || self.conns.is_empty() {
            return;
        }

        let payload: String = events.iter().map(|e| e.to_line()).collect();

        let mut keep = Vec::with_capacity(self.conns.len());
        for mut conn in self.conns.drain(..) {
            if write_bounded(&mut conn.stream, payload.as_bytes()).await {
                keep.push(conn);
            } else {
                debug!("dropping state socket client after failed write");
            }
        }
        self.conns = keep;
    }

    async fn service_conn<H: UpsHandler>(&mut self, idx: usize, handler: &mut H) {
        let mut dead = false;
        let mut lines = Vec::new();

        {
            let Some(conn) = self.conns.get_mut(idx) else { return };
            let mut buf = [0u8; READ_BUF_LEN];
            match conn.stream.try_read(&mut buf) {
                Ok(0) => dead = true,
                Ok(n) => {
                    conn.lines.push_bytes(&buf[..n]);
                    while let Some(next) = conn.lines.next_line() {
                        match next {
                            Ok(line) => lines.push(line),
                            Err(e) => warn!(error = %e, "parse error on state socket"),
                        }
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                Err(e) => {
                    debug!(error = %e, "read on state socket failed");
                    dead = true;
                }
            }
        }

        if dead {
            self.drop_conn(idx);
            return;
        }

        for line in lines {
            if !self.dispatch_line(idx, &line, handler).await {
                break;
            }
        }
    }

    /// Handle one inbound line. Returns `false` when the connection died.
    async fn dispatch_line<H: UpsHandler>(
        &mut self,
        idx: usize,
        line: &str,
        handler: &mut H,
    ) -> bool {
        let args = match split_args(line) {
            Ok(args) => args,
            Err(e) => {
                info!(error = %e, line, "parse error on socket");
                return true;
            }
        };
        if args.is_empty() {
            return true;
        }

        let req = match DriverRequest::parse(&args) {
            Ok(req) => req,
            Err(_) => {
                info!(line, "unknown command on socket");
                return true;
            }
        };

        match req {
            DriverRequest::DumpAll => {
                let dump: String = self.state.dump_events().iter().map(|e| e.to_line()).collect();
                self.send_to_one(idx, dump.as_bytes()).await
            }
            DriverRequest::Ping => self.send_to_one(idx, b"PONG\n").await,
            DriverRequest::InstCmd { cmd, arg } => {
                handler.instcmd(&mut self.state, &cmd, arg.as_deref());
                true
            }
            DriverRequest::Set { var, val } => {
                handler.setvar(&mut self.state, &var, &val);
                true
            }
        }
    }

    async fn send_to_one(&mut self, idx: usize, bytes: &[u8]) -> bool {
        let Some(conn) = self.conns.get_mut(idx) else { return false };
        if write_bounded(&mut conn.stream, bytes).await {
            return true;
        }
        debug!("write to state socket client failed");
        self.drop_conn(idx);
        false
    }

    fn drop_conn(&mut self, idx: usize) {
        if idx < self.conns.len() {
            self.conns.remove(idx);
            debug!("state socket client disconnected");
        }
    }
}

impl Drop for StatePublisher {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Resolves to the index of a connection with readable data. Pends forever
/// when there are no connections.
async fn readable_conn(conns: &[Conn]) -> usize {
    if conns.is_empty() {
        std::future::pending::<()>().await;
    }
    let futs = conns.iter().enumerate().map(|(idx, conn)| {
        Box::pin(async move {
            let _ = conn.stream.readable().await;
            idx
        })
    });
    let (idx, _, _) = select_all(futs).await;
    idx
}

/// Write everything or give up within [`WRITE_TIMEOUT`].
async fn write_bounded(stream: &mut UnixStream, bytes: &[u8]) -> bool {
    matches!(
        tokio::time::timeout(WRITE_TIMEOUT, stream.write_all(bytes)).await,
        Ok(Ok(()))
    )
}

#[cfg(test)]
#[path = "sock_tests.rs"]
mod tests;
