// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! nut-dummy: a synthetic UPS driver.
//!
//! Publishes a plausible device tree without any hardware attached. Handy
//! for exercising a server and clients end to end: `SET` requests are
//! applied to the tree, instant commands record a test result.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use nut_driver::{DriverState, PollOutcome, StatePublisher, UpsHandler};
use nut_state::VarFlags;

#[derive(Parser)]
#[command(name = "nut-dummy", about = "Synthetic UPS driver for testing")]
struct Args {
    /// Directory holding driver state sockets
    #[arg(long, env = "NUT_STATE_PATH")]
    state_path: PathBuf,

    /// Device identifier; the socket is created as
    /// <state-path>/nut-dummy-<port>
    #[arg(long, default_value = "ups1")]
    port: String,

    /// Seconds between synthetic readings
    #[arg(long, default_value_t = 1)]
    interval: u64,
}

struct DummyHandler;

impl UpsHandler for DummyHandler {
    fn instcmd(&mut self, state: &mut DriverState, cmd: &str, arg: Option<&str>) {
        info!(cmd, ?arg, "instant command");
        if cmd.starts_with("test.battery") {
            state.set_info("ups.test.result", "done and passed");
        }
    }

    fn setvar(&mut self, state: &mut DriverState, var: &str, val: &str) {
        info!(var, val, "set request");
        let writable = state.tree().get(var).is_some_and(|v| v.flags().rw);
        if writable {
            state.set_info(var, val);
        } else {
            info!(var, "ignoring SET for non-RW variable");
        }
    }
}

fn seed(state: &mut DriverState) {
    state.set_info("ups.mfr", "NUT");
    state.set_info("ups.model", "Dummy UPS");
    state.set_info("battery.charge", "100");
    state.set_info("battery.runtime", "3600");
    state.set_info("input.voltage", "230.0");
    state.set_info("output.voltage", "230.0");

    state.set_info("input.sensitivity", "normal");
    for level in ["normal", "reduced", "low"] {
        let _ = state.add_enum("input.sensitivity", level);
    }
    let _ = state.set_flags("input.sensitivity", VarFlags::RW);

    state.set_info("ups.delay.shutdown", "20");
    let _ = state.add_range("ups.delay.shutdown", 0, 600);
    let _ = state.set_flags(
        "ups.delay.shutdown",
        VarFlags { rw: true, number: true, string: false },
    );

    state.set_info("ups.id", "attic");
    let _ = state.set_flags("ups.id", VarFlags { rw: true, string: true, number: false });
    let _ = state.set_aux("ups.id", 32);

    state.add_cmd("test.battery.start.quick");
    state.add_cmd("test.battery.stop");
    state.add_cmd("shutdown.return");

    state.status_init();
    state.status_set("OL");
    state.status_commit();
    state.data_ok();
}

/// One synthetic reading pass: nudge the charge around, refresh status.
fn tick(state: &mut DriverState, pass: u64) {
    let charge = 95 + (pass % 6);
    state.set_info("battery.charge", &charge.to_string());

    state.status_init();
    state.status_set("OL");
    state.status_commit();
    state.data_ok();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut publisher = match StatePublisher::bind(&args.state_path, "nut-dummy", &args.port) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Fatal error: {e}");
            if let Some(hints) = e.rescue_hints() {
                eprintln!("\n{hints}");
            }
            std::process::exit(1);
        }
    };

    seed(publisher.state_mut());
    info!(socket = %publisher.socket_path().display(), "nut-dummy ready");

    let mut handler = DummyHandler;
    let interval = Duration::from_secs(args.interval.max(1));
    let mut pass: u64 = 0;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            outcome = publisher.poll(interval, &mut handler) => {
                if outcome == PollOutcome::TimerExpired {
                    pass = pass.wrapping_add(1);
                    tick(publisher.state_mut(), pass);
                }
            }
        }
    }

    info!("shutting down");
    drop(publisher);
    Ok(())
}
