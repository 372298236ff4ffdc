// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! nut-driver: the driver-side state publisher.
//!
//! A driver owns a [`DriverState`] (its variable tree, command list, and
//! status/alarm scratch buffers) and a [`StatePublisher`] that serves the
//! state on a Unix-domain socket: snapshot dumps for newly connected
//! servers, unsolicited deltas for everyone else, and inbound `SET` /
//! `INSTCMD` dispatch into the driver's [`UpsHandler`].

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod dstate;
pub mod handler;
pub mod sock;

pub use dstate::DriverState;
pub use handler::UpsHandler;
pub use sock::{PollOutcome, StatePublisher};

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("unable to create listener socket at {path}: {source}")]
    Bind {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DriverError {
    /// Remediation hints for the usual listener-socket failures. Driver
    /// binaries print this next to the fatal error; it saves a support
    /// round-trip for first-time setups.
    pub fn rescue_hints(&self) -> Option<String> {
        let DriverError::Bind { path, source } = self else {
            return None;
        };
        let errno = source.raw_os_error().map(nix::errno::Errno::from_raw)?;
        let dir = path.parent().unwrap_or(Path::new("."));

        let hints = match errno {
            nix::errno::Errno::EACCES => format!(
                "Things to try:\n\
                 - set different owners or permissions on {}\n\
                 - run this as some other user",
                dir.display()
            ),
            nix::errno::Errno::ENOENT => format!("Things to try:\n - mkdir {}", dir.display()),
            nix::errno::Errno::ENOTDIR => format!(
                "Things to try:\n - rm {}\n - mkdir {}",
                dir.display(),
                dir.display()
            ),
            _ => return None,
        };
        Some(hints)
    }
}
