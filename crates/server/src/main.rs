// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! nutd: the aggregating UPS server.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use fs2::FileExt;
use std::io::Write;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use nut_server::{netserver, run_monitor, ServerCtx, UpsdConfig};
use nut_state::SystemClock;

#[derive(Parser)]
#[command(name = "nutd", about = "UPS aggregation and network server")]
struct Args {
    /// Path to the configuration file
    #[arg(short = 'c', long, env = "NUTD_CONFIG")]
    config: Option<PathBuf>,

    /// Log to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn default_config_path() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from("/etc")).join("nut/nutd.toml")
}

fn init_tracing(log_file: Option<&PathBuf>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let dir = path.parent().unwrap_or(std::path::Path::new("."));
            let file = path.file_name().map(PathBuf::from).unwrap_or_else(|| "nutd.log".into());
            let appender = tracing_appender::rolling::never(dir, file);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}

/// Hold the pid file lock for the life of the process.
fn acquire_pidfile(config: &UpsdConfig) -> anyhow::Result<std::fs::File> {
    let path = config.state_path.join("nutd.pid");
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)?;
    file.try_lock_exclusive()
        .map_err(|_| anyhow::anyhow!("another nutd appears to be running (lock on {path:?})"))?;
    file.set_len(0)?;
    writeln!(file, "{}", std::process::id())?;
    Ok(file)
}

async fn bind_listeners(config: &UpsdConfig) -> anyhow::Result<Vec<tokio::net::TcpListener>> {
    let mut listeners = Vec::new();
    for addr in &config.listen {
        match tokio::net::TcpListener::bind(addr.as_str()).await {
            Ok(listener) => {
                info!(%addr, "listening");
                listeners.push(listener);
            }
            Err(e) => {
                eprintln!("{}", netserver::bind_rescue_hints(addr, &e));
                anyhow::bail!("bind {addr} failed: {e}");
            }
        }
    }
    Ok(listeners)
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("nutd: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    let _log_guard = init_tracing(args.log_file.as_ref());

    let config_path = args.config.unwrap_or_else(default_config_path);
    let config = UpsdConfig::load(&config_path)
        .map_err(|e| anyhow::anyhow!("configuration: {e}"))?;

    if config.ups.is_empty() {
        warn!("no UPS entries configured; serving an empty device list");
    }

    std::fs::create_dir_all(&config.state_path)?;
    let _pidfile = acquire_pidfile(&config)?;

    let listeners = bind_listeners(&config).await?;

    let maxage = config.maxage_duration();
    let ctx = Arc::new(ServerCtx::new(config));
    let cancel = CancellationToken::new();

    let mut monitors = Vec::new();
    for ups in ctx.upses.values() {
        monitors.push(tokio::spawn(run_monitor(
            Arc::clone(ups),
            maxage,
            SystemClock,
            cancel.clone(),
        )));
    }

    let server = tokio::spawn(netserver::run(Arc::clone(&ctx), listeners, cancel.clone()));
    info!(version = env!("CARGO_PKG_VERSION"), "nutd ready");

    shutdown_signal().await;
    info!("shutting down");
    cancel.cancel();

    let _ = server.await;
    for task in monitors {
        let _ = task.await;
    }

    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(e) => {
            warn!(error = %e, "cannot install SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}
