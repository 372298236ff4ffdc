// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server-side shadow of one driver's state.
//!
//! One monitor task per configured UPS owns the outbound connection to
//! the driver socket: it runs the `DUMPALL` handshake, feeds the event
//! stream into the shadow tree, pings the driver when it goes quiet, and
//! reconnects (rate limited) when the connection drops. Client handlers
//! read the shadow behind a mutex and push `SET`/`INSTCMD` lines through
//! a bounded channel drained here.

use std::path::Path;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use nut_state::{Clock, CommandList, StateTree, VarFlags};
use nut_wire::{split_args, DriverEvent, DriverRequest, LineBuffer};
use parking_lot::{Mutex, MutexGuard};
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::UpsEntry;

/// Minimum spacing between reconnection attempts to one driver.
pub const CONNFAIL_INTERVAL: Duration = Duration::from_secs(15);

/// Bytes read from a driver socket per wake.
pub const MAX_READ: usize = 16;

/// Outstanding `SET`/`INSTCMD` lines per driver before senders see
/// failure.
const DRIVER_CMD_QUEUE: usize = 64;

const TICK: Duration = Duration::from_secs(1);
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// The replica of one driver's tree plus liveness bookkeeping.
#[derive(Debug)]
pub struct Shadow {
    pub tree: StateTree,
    pub cmds: CommandList,
    pub connected: bool,
    /// The initial snapshot has arrived in full at least once.
    pub dumpdone: bool,
    pub data_ok: bool,
    pub last_heard: Instant,
    pub last_ping: Instant,
}

impl Shadow {
    fn new(now: Instant) -> Self {
        Self {
            tree: StateTree::new(),
            cmds: CommandList::new(),
            connected: false,
            dumpdone: false,
            data_ok: true,
            last_heard: now,
            last_ping: now,
        }
    }

    /// Throw away the old replica and seed `ups.status = WAIT` until the
    /// fresh dump completes. Partial state from a previous connection
    /// never survives a reconnect.
    pub fn reset(&mut self, now: Instant) {
        self.tree.clear();
        self.cmds.clear();
        self.dumpdone = false;
        self.data_ok = true;
        self.tree.set_info("ups.status", "WAIT");
        self.last_heard = now;
        self.last_ping = now;
    }

    /// Fold one driver event into the replica.
    pub fn apply_event(&mut self, ev: &DriverEvent) {
        match ev {
            DriverEvent::SetInfo { var, val } => {
                self.tree.set_info(var, val);
            }
            DriverEvent::DelInfo { var } => {
                self.tree.del_info(var);
            }
            DriverEvent::AddEnum { var, val } => {
                if self.tree.add_enum(var, val).is_err() {
                    warn!(var, "enum for a variable that does not exist");
                }
            }
            DriverEvent::DelEnum { var, val } => {
                self.tree.del_enum(var, val);
            }
            DriverEvent::AddRange { var, min, max } => {
                if self.tree.add_range(var, *min, *max).is_err() {
                    warn!(var, "range for a variable that does not exist");
                }
            }
            DriverEvent::DelRange { var, min, max } => {
                self.tree.del_range(var, *min, *max);
            }
            DriverEvent::SetAux { var, aux } => {
                if self.tree.set_aux(var, *aux).is_err() {
                    warn!(var, "aux for a variable that does not exist");
                }
            }
            DriverEvent::SetFlags { var, flags } => {
                let (parsed, unknown) = VarFlags::from_tokens(flags);
                for tok in unknown {
                    debug!(var, flag = %tok, "ignoring unrecognized flag");
                }
                if self.tree.set_flags(var, parsed).is_err() {
                    warn!(var, "flags for a variable that does not exist");
                }
            }
            DriverEvent::AddCmd { cmd } => {
                self.cmds.add(cmd);
            }
            DriverEvent::DelCmd { cmd } => {
                self.cmds.del(cmd);
            }
            DriverEvent::DataOk => self.data_ok = true,
            DriverEvent::DataStale => self.data_ok = false,
            DriverEvent::DumpDone => self.dumpdone = true,
            DriverEvent::Pong => {}
        }
    }

    /// A dead shadow degrades client reads to `DATA-STALE`.
    ///
    /// `DATAOK`/`DATASTALE` only count once the dump is done; before that
    /// the driver may legitimately still be describing itself.
    pub fn dead(&self, maxage: Duration, now: Instant) -> bool {
        if !self.connected {
            return true;
        }
        if self.dumpdone && !self.data_ok {
            return true;
        }
        now.duration_since(self.last_heard) > maxage
    }
}

/// One configured device: its shadow plus the command path back to the
/// driver.
pub struct Ups {
    pub name: String,
    pub desc: Option<String>,
    pub sock_path: PathBuf,
    fsd: AtomicBool,
    shadow: Mutex<Shadow>,
    cmd_tx: Mutex<Option<mpsc::Sender<String>>>,
}

impl Ups {
    pub fn new(entry: &UpsEntry, state_path: &Path) -> Self {
        Self {
            name: entry.name.clone(),
            desc: entry.desc.clone(),
            sock_path: entry.socket_path(state_path),
            fsd: AtomicBool::new(false),
            shadow: Mutex::new(Shadow::new(Instant::now())),
            cmd_tx: Mutex::new(None),
        }
    }

    pub fn shadow(&self) -> MutexGuard<'_, Shadow> {
        self.shadow.lock()
    }

    /// Whether forced shutdown has been signalled on this device.
    pub fn is_fsd(&self) -> bool {
        self.fsd.load(Ordering::Relaxed)
    }

    pub fn set_fsd(&self) {
        self.fsd.store(true, Ordering::Relaxed);
    }

    /// Install (or clear) the channel the monitor drains into the driver
    /// socket.
    pub(crate) fn set_cmd_tx(&self, tx: Option<mpsc::Sender<String>>) {
        *self.cmd_tx.lock() = tx;
    }

    /// Queue one line for the driver. Fails when disconnected or when the
    /// driver has stopped draining its queue.
    pub fn sendline(&self, line: &str) -> bool {
        match self.cmd_tx.lock().as_ref() {
            Some(tx) => tx.try_send(line.to_string()).is_ok(),
            None => false,
        }
    }

    pub fn connected(&self) -> bool {
        self.shadow.lock().connected
    }

    pub fn dead(&self, maxage: Duration, now: Instant) -> bool {
        self.shadow.lock().dead(maxage, now)
    }
}

/// Run the connection loop for one UPS until cancelled.
pub async fn run_monitor<C: Clock>(
    ups: Arc<Ups>,
    maxage: Duration,
    clock: C,
    cancel: CancellationToken,
) {
    let mut last_connfail: Option<Instant> = None;

    while !cancel.is_cancelled() {
        match try_connect(&ups, &clock, &mut last_connfail).await {
            Some(stream) => {
                serve_connection(&ups, stream, maxage, &clock, &cancel).await;
            }
            None => {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(TICK) => {}
                }
            }
        }
    }
}

/// One rate-limited connection attempt, including the `DUMPALL` kick-off.
async fn try_connect<C: Clock>(
    ups: &Arc<Ups>,
    clock: &C,
    last_connfail: &mut Option<Instant>,
) -> Option<UnixStream> {
    let now = clock.now();
    if let Some(at) = last_connfail {
        if now.duration_since(*at) < CONNFAIL_INTERVAL {
            return None;
        }
    }

    let mut stream = match UnixStream::connect(&ups.sock_path).await {
        Ok(stream) => stream,
        Err(e) => {
            *last_connfail = Some(now);
            warn!(ups = %ups.name, path = %ups.sock_path.display(), error = %e,
                "can't connect to driver");
            return None;
        }
    };

    if write_bounded(&mut stream, DriverRequest::DumpAll.to_line().as_bytes()).await.is_err() {
        *last_connfail = Some(now);
        warn!(ups = %ups.name, "initial write to driver failed");
        return None;
    }

    {
        let mut shadow = ups.shadow();
        shadow.reset(clock.now());
        shadow.connected = true;
    }

    info!(ups = %ups.name, path = %ups.sock_path.display(), "connected to driver");
    Some(stream)
}

async fn serve_connection<C: Clock>(
    ups: &Arc<Ups>,
    mut stream: UnixStream,
    maxage: Duration,
    clock: &C,
    cancel: &CancellationToken,
) {
    let (tx, mut rx) = mpsc::channel::<String>(DRIVER_CMD_QUEUE);
    ups.set_cmd_tx(Some(tx));

    let mut lines = LineBuffer::new();
    let third = maxage / 3;

    loop {
        enum Ev {
            Cancel,
            Tick,
            Cmd(Option<String>),
            Readable,
        }

        let ev = tokio::select! {
            _ = cancel.cancelled() => Ev::Cancel,
            _ = tokio::time::sleep(TICK) => Ev::Tick,
            cmd = rx.recv() => Ev::Cmd(cmd),
            _ = stream.readable() => Ev::Readable,
        };

        match ev {
            Ev::Cancel => break,
            Ev::Tick => {
                let now = clock.now();
                let (elapsed, elapsed_ping) = {
                    let shadow = ups.shadow();
                    (
                        now.duration_since(shadow.last_heard),
                        now.duration_since(shadow.last_ping),
                    )
                };
                if elapsed > third && elapsed_ping > third {
                    debug!(ups = %ups.name, "pinging driver");
                    if write_bounded(&mut stream, DriverRequest::Ping.to_line().as_bytes())
                        .await
                        .is_err()
                    {
                        warn!(ups = %ups.name, "send ping to driver failed");
                        break;
                    }
                    ups.shadow().last_ping = now;
                }
            }
            Ev::Cmd(Some(line)) => {
                if write_bounded(&mut stream, line.as_bytes()).await.is_err() {
                    warn!(ups = %ups.name, "send to driver failed");
                    break;
                }
            }
            Ev::Cmd(None) => break,
            Ev::Readable => {
                let mut buf = [0u8; MAX_READ];
                match stream.try_read(&mut buf) {
                    Ok(0) => {
                        warn!(ups = %ups.name, "driver disconnected - check driver");
                        break;
                    }
                    Ok(n) => {
                        lines.push_bytes(&buf[..n]);
                        while let Some(next) = lines.next_line() {
                            match next {
                                Ok(line) => handle_line(ups, &line, clock),
                                Err(e) => {
                                    warn!(ups = %ups.name, error = %e,
                                        "parse error on driver socket");
                                }
                            }
                        }
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                    Err(e) => {
                        warn!(ups = %ups.name, error = %e, "read from driver failed");
                        break;
                    }
                }
            }
        }
    }

    ups.set_cmd_tx(None);
    {
        let mut shadow = ups.shadow();
        shadow.connected = false;
        shadow.dumpdone = false;
    }
}

fn handle_line<C: Clock>(ups: &Ups, line: &str, clock: &C) {
    let args = match split_args(line) {
        Ok(args) => args,
        Err(e) => {
            warn!(ups = %ups.name, error = %e, "parse error on driver socket");
            return;
        }
    };
    if args.is_empty() {
        return;
    }

    match DriverEvent::parse(&args) {
        Ok(ev) => {
            let mut shadow = ups.shadow();
            shadow.apply_event(&ev);
            shadow.last_heard = clock.now();
            if matches!(ev, DriverEvent::DumpDone) {
                debug!(ups = %ups.name, "dump is done");
            }
        }
        Err(e) => {
            info!(ups = %ups.name, error = %e, line, "unexpected line from driver");
        }
    }
}

async fn write_bounded(stream: &mut UnixStream, bytes: &[u8]) -> std::io::Result<()> {
    match tokio::time::timeout(WRITE_TIMEOUT, stream.write_all(bytes)).await {
        Ok(res) => res,
        Err(_) => Err(std::io::ErrorKind::TimedOut.into()),
    }
}

#[cfg(test)]
#[path = "sstate_tests.rs"]
mod tests;
