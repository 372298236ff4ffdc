// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Value escaping and quoting.
//!
//! `escape` is the pure re-encoding applied to every stored value (the
//! "safe" form); `encode_arg` additionally decides whether the token needs
//! surrounding double quotes to survive tokenization.

use crate::{split_args, WireError};

/// Backslash-escape every `"` and `\` in `val`.
///
/// Not idempotent: applying it twice double-escapes, so callers must track
/// which form they hold.
pub fn escape(val: &str) -> String {
    let mut out = String::with_capacity(val.len());
    for ch in val.chars() {
        if ch == '\\' || ch == '"' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Reverse of [`escape`]: drop one backslash before any escaped character.
pub fn unescape(val: &str) -> String {
    let mut out = String::with_capacity(val.len());
    let mut chars = val.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
            continue;
        }
        out.push(ch);
    }
    out
}

/// Whether a token must be quoted to survive tokenization: anything with
/// whitespace or `=`, and the empty string (which would otherwise vanish).
pub fn needs_quoting(val: &str) -> bool {
    val.is_empty() || val.chars().any(|c| c.is_whitespace() || c == '=')
}

/// Serialize one value as a wire token: escape it, then wrap in double
/// quotes iff escaping changed it or it needs quoting to stay one token.
pub fn encode_arg(val: &str) -> String {
    let esc = escape(val);
    if esc.len() != val.len() || needs_quoting(val) {
        format!("\"{esc}\"")
    } else {
        esc
    }
}

/// Parse a single wire token (quoted or bare) back to its value.
pub fn decode_arg(token: &str) -> Result<String, WireError> {
    let mut args = split_args(token)?;
    if args.len() != 1 {
        return Err(WireError::NotOneToken);
    }
    args.pop().ok_or(WireError::NotOneToken)
}

#[cfg(test)]
#[path = "encode_tests.rs"]
mod tests;
