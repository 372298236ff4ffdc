// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin protocol client: one connection, one request in flight.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use nut_wire::split_args;

const DEFAULT_PORT: u16 = 3493;

/// Split `ups[@host[:port]]` into its parts.
pub fn parse_target(target: &str) -> Result<(String, String, u16)> {
    let (ups, rest) = match target.split_once('@') {
        Some((ups, rest)) => (ups, rest),
        None => (target, "localhost"),
    };
    if ups.is_empty() {
        bail!("missing UPS name in {target:?}");
    }
    let (host, port) = parse_host(rest)?;
    Ok((ups.to_string(), host, port))
}

/// Split `host[:port]`.
pub fn parse_host(spec: &str) -> Result<(String, u16)> {
    match spec.rsplit_once(':') {
        Some((host, port)) => {
            let port: u16 = port.parse().with_context(|| format!("bad port in {spec:?}"))?;
            if host.is_empty() {
                bail!("missing host in {spec:?}");
            }
            Ok((host.to_string(), port))
        }
        None => {
            if spec.is_empty() {
                bail!("missing host");
            }
            Ok((spec.to_string(), DEFAULT_PORT))
        }
    }
}

pub struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    timeout: Duration,
}

impl Client {
    pub async fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect((host, port)))
            .await
            .context("connection timed out")??;
        let (read_half, writer) = stream.into_split();
        Ok(Self { reader: BufReader::new(read_half), writer, timeout })
    }

    async fn request(&mut self, line: &str) -> Result<Vec<String>> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        let reply = self.read_line().await?;
        let args = split_args(&reply).map_err(|e| anyhow::anyhow!("bad reply: {e}"))?;
        if args.first().map(String::as_str) == Some("ERR") {
            bail!("server answered: {}", args.get(1).cloned().unwrap_or_default());
        }
        Ok(args)
    }

    async fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let n = tokio::time::timeout(self.timeout, self.reader.read_line(&mut line))
            .await
            .context("server stopped answering")??;
        if n == 0 {
            bail!("server closed the connection");
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// `GET VAR`, returning the bare value.
    pub async fn get_var(&mut self, ups: &str, var: &str) -> Result<String> {
        let args = self.request(&format!("GET VAR {ups} {var}")).await?;
        // VAR <ups> <var> "<value>"
        args.get(3).cloned().with_context(|| format!("malformed VAR reply: {args:?}"))
    }

    /// `LIST VAR`, returning `(name, value)` pairs in server order.
    pub async fn list_vars(&mut self, ups: &str) -> Result<Vec<(String, String)>> {
        self.list(&format!("LIST VAR {ups}"), "VAR", 2, 3).await
    }

    /// `LIST UPS`, returning `(name, description)` pairs.
    pub async fn list_ups(&mut self) -> Result<Vec<(String, String)>> {
        self.list("LIST UPS", "UPS", 1, 2).await
    }

    async fn list(
        &mut self,
        query: &str,
        entry_verb: &str,
        key_idx: usize,
        val_idx: usize,
    ) -> Result<Vec<(String, String)>> {
        let first = self.request(query).await?;
        if first.first().map(String::as_str) != Some("BEGIN") {
            bail!("expected BEGIN frame, got {first:?}");
        }

        let mut entries = Vec::new();
        loop {
            let line = self.read_line().await?;
            let args = split_args(&line).map_err(|e| anyhow::anyhow!("bad reply: {e}"))?;
            match args.first().map(String::as_str) {
                Some("END") => break,
                Some(verb) if verb == entry_verb => {
                    let key = args.get(key_idx).cloned().unwrap_or_default();
                    let val = args.get(val_idx).cloned().unwrap_or_default();
                    entries.push((key, val));
                }
                Some("ERR") => {
                    bail!("server answered: {}", args.get(1).cloned().unwrap_or_default())
                }
                _ => bail!("unexpected line in list: {line:?}"),
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
