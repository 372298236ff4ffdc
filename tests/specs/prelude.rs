// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness: spawns a dummy driver plus `nutd` in a temp state dir
//! and hands out line-oriented TCP terminals.

#![allow(dead_code)]

pub use serial_test::serial;

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::Once;
use std::time::{Duration, Instant};

pub const WAIT_MAX: Duration = Duration::from_secs(20);

static BUILD: Once = Once::new();

/// `cargo test` for this package alone does not build the other members'
/// binaries, so make sure of it before spawning them.
fn build_bins() {
    BUILD.call_once(|| {
        let cargo = std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
        let status = Command::new(cargo)
            .args(["build", "--workspace", "--bins"])
            .status()
            .expect("spawning cargo build");
        assert!(status.success(), "building workspace binaries failed");
    });
}

pub fn wait_for(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + WAIT_MAX;
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        std::thread::sleep(Duration::from_millis(50));
    }
}

/// A free TCP port on localhost. Racy in principle, fine in practice as
/// long as the rig tests stay `#[serial]`.
fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("probe port");
    listener.local_addr().expect("probe addr").port()
}

const CONFIG_TEMPLATE: &str = r#"
listen = ["127.0.0.1:@PORT@"]
state_path = "@STATE@"
maxage = 15

[[ups]]
name = "ups1"
driver = "nut-dummy"
port = "ups1"
desc = "Test bench UPS"

[[users]]
name = "admin"
password = "secret"
actions = ["SET", "FSD"]
instcmds = ["ALL"]
upsmon = "primary"

[[users]]
name = "watcher"
password = "peek"
upsmon = "secondary"
"#;

pub struct Rig {
    dir: tempfile::TempDir,
    driver: Child,
    server: Child,
    pub port: u16,
}

impl Rig {
    /// Driver first, then the server, then wait for the first full dump.
    pub fn start() -> Rig {
        build_bins();

        let dir = tempfile::tempdir().expect("tempdir");
        let state = dir.path().join("state");
        std::fs::create_dir_all(&state).expect("state dir");

        let driver_log = std::fs::File::create(dir.path().join("driver.log")).expect("log");
        let driver = Command::new(assert_cmd::cargo::cargo_bin("nut-dummy"))
            .args(["--state-path"])
            .arg(&state)
            .args(["--port", "ups1"])
            .stdout(Stdio::null())
            .stderr(driver_log)
            .spawn()
            .expect("spawning nut-dummy");

        let sock = state.join("nut-dummy-ups1");
        wait_for("driver socket", || sock.exists());

        let port = free_port();
        let config_path = dir.path().join("nutd.toml");
        let config = CONFIG_TEMPLATE
            .replace("@PORT@", &port.to_string())
            .replace("@STATE@", &state.display().to_string());
        std::fs::write(&config_path, config).expect("config");

        let server_log = std::fs::File::create(dir.path().join("nutd.log")).expect("log");
        let server = Command::new(assert_cmd::cargo::cargo_bin("nutd"))
            .args(["-c"])
            .arg(&config_path)
            .stdout(Stdio::null())
            .stderr(server_log)
            .spawn()
            .expect("spawning nutd");

        let rig = Rig { dir, driver, server, port };

        // wait until the server answers and holds a complete dump
        wait_for("server to accept connections", || {
            TcpStream::connect(("127.0.0.1", rig.port)).is_ok()
        });
        let mut term = rig.connect();
        wait_for("the first dump to finish", || {
            let reply = term.req("GET VAR ups1 ups.status");
            reply.starts_with("VAR") && !reply.contains("WAIT")
        });

        rig
    }

    pub fn state_dir(&self) -> PathBuf {
        self.dir.path().join("state")
    }

    pub fn connect(&self) -> Term {
        let stream = TcpStream::connect(("127.0.0.1", self.port)).expect("connect");
        Term::new(stream)
    }

    /// Raw line client on the driver's Unix socket, bypassing the server.
    pub fn connect_driver(&self) -> DriverTerm {
        let stream = std::os::unix::net::UnixStream::connect(
            self.state_dir().join("nut-dummy-ups1"),
        )
        .expect("driver socket");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("read timeout");
        DriverTerm { reader: BufReader::new(stream) }
    }
}

impl Drop for Rig {
    fn drop(&mut self) {
        let _ = self.server.kill();
        let _ = self.server.wait();
        let _ = self.driver.kill();
        let _ = self.driver.wait();
    }
}

/// Blocking line-oriented terminal on the TCP protocol.
pub struct Term {
    reader: BufReader<TcpStream>,
}

impl Term {
    fn new(stream: TcpStream) -> Self {
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("read timeout");
        Term { reader: BufReader::new(stream) }
    }

    pub fn send(&mut self, line: &str) {
        let stream = self.reader.get_mut();
        stream.write_all(line.as_bytes()).expect("send");
        stream.write_all(b"\n").expect("send");
    }

    pub fn recv(&mut self) -> String {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).expect("recv");
        assert!(n > 0, "server closed the connection");
        line.trim_end_matches(['\r', '\n']).to_string()
    }

    /// One request, one reply line.
    pub fn req(&mut self, line: &str) -> String {
        self.send(line);
        self.recv()
    }

    /// One `LIST` request, every line through the `END` frame.
    pub fn req_list(&mut self, line: &str) -> Vec<String> {
        self.send(line);
        let mut lines = vec![self.recv()];
        if !lines[0].starts_with("BEGIN") {
            return lines; // an ERR reply has no frame
        }
        loop {
            let next = self.recv();
            let done = next.starts_with("END");
            lines.push(next);
            if done {
                return lines;
            }
        }
    }

    /// True once the connection reports EOF.
    pub fn at_eof(&mut self) -> bool {
        let mut buf = [0u8; 1];
        matches!(self.reader.read(&mut buf), Ok(0))
    }
}

/// Blocking line client on a driver state socket.
pub struct DriverTerm {
    reader: BufReader<std::os::unix::net::UnixStream>,
}

impl DriverTerm {
    pub fn send(&mut self, line: &str) {
        let stream = self.reader.get_mut();
        stream.write_all(line.as_bytes()).expect("send");
        stream.write_all(b"\n").expect("send");
    }

    pub fn recv(&mut self) -> String {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).expect("recv");
        assert!(n > 0, "driver closed the connection");
        line.trim_end_matches('\n').to_string()
    }

    /// `DUMPALL`, collected through `DUMPDONE`.
    pub fn dump(&mut self) -> Vec<String> {
        self.send("DUMPALL");
        let mut lines = Vec::new();
        loop {
            let line = self.recv();
            let done = line == "DUMPDONE";
            lines.push(line);
            if done {
                return lines;
            }
        }
    }
}
