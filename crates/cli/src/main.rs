// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! nutc: query a UPS server from the command line.
//!
//! `nutc ups1@host` prints every variable, `nutc ups1@host battery.charge`
//! prints one value, `nutc -l host` lists the configured devices.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;

use client::{parse_host, parse_target, Client};

#[derive(Parser)]
#[command(name = "nutc", about = "UPS variable query client")]
struct Args {
    /// List configured devices instead of variables
    #[arg(short = 'l', long)]
    list: bool,

    /// `ups[@host[:port]]`, or `host[:port]` with --list
    target: Option<String>,

    /// Print a single variable instead of all of them
    variable: Option<String>,

    /// Emit JSON instead of the classic `name: value` lines
    #[arg(long)]
    json: bool,

    /// Connection timeout in seconds
    #[arg(long, default_value_t = 5)]
    timeout: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let timeout = Duration::from_secs(args.timeout.max(1));

    if args.list {
        let (host, port) = parse_host(args.target.as_deref().unwrap_or("localhost"))?;
        let mut client = Client::connect(&host, port, timeout)
            .await
            .with_context(|| format!("cannot contact {host}:{port}"))?;

        let devices = client.list_ups().await?;
        if args.json {
            let map: serde_json::Map<String, serde_json::Value> = devices
                .into_iter()
                .map(|(name, desc)| (name, serde_json::Value::String(desc)))
                .collect();
            println!("{}", serde_json::to_string_pretty(&serde_json::Value::Object(map))?);
        } else {
            for (name, desc) in devices {
                println!("{name}: {desc}");
            }
        }
        return Ok(());
    }

    let Some(target) = args.target.as_deref() else {
        bail!("a target is required: ups[@host[:port]]");
    };
    let (ups, host, port) = parse_target(target)?;
    let mut client = Client::connect(&host, port, timeout)
        .await
        .with_context(|| format!("cannot contact {host}:{port}"))?;

    match args.variable {
        Some(var) => {
            let value = client.get_var(&ups, &var).await?;
            println!("{value}");
        }
        None => {
            let vars = client.list_vars(&ups).await?;
            if args.json {
                let map: serde_json::Map<String, serde_json::Value> = vars
                    .into_iter()
                    .map(|(name, value)| (name, serde_json::Value::String(value)))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&serde_json::Value::Object(map))?);
            } else {
                for (name, value) in vars {
                    println!("{name}: {value}");
                }
            }
        }
    }

    Ok(())
}
