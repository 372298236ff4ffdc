// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire codec shared by the driver and server sides.
//!
//! Both protocols are `\n`-terminated text lines whose arguments are
//! whitespace-separated tokens; values containing whitespace or `=` are
//! double-quoted with `\"` and `\\` escapes. This crate owns the escaping
//! rules, the tokenizer, the driver-stream event vocabulary, and the
//! network error-code table. It performs no I/O.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod driver;
mod encode;
mod line;
mod neterr;

pub use driver::{DriverEvent, DriverRequest};
pub use encode::{decode_arg, encode_arg, escape, needs_quoting, unescape};
pub use line::{split_args, LineBuffer, MAX_LINE_LEN};
pub use neterr::ErrCode;

use thiserror::Error;

/// Errors from parsing a protocol line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("unbalanced double quote")]
    UnbalancedQuote,

    #[error("dangling backslash escape")]
    TrailingEscape,

    #[error("line exceeds {MAX_LINE_LEN} bytes")]
    LineTooLong,

    #[error("unknown verb: {0}")]
    UnknownVerb(String),

    #[error("wrong argument count for {0}")]
    BadArgCount(&'static str),

    #[error("argument is not an integer: {0}")]
    BadInteger(String),

    #[error("expected a single token")]
    NotOneToken,
}

#[cfg(test)]
mod property_tests;
