// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property tests for the escaping and tokenization layer.

use proptest::prelude::*;

use crate::{decode_arg, encode_arg, escape, split_args, unescape, DriverEvent};

proptest! {
    // Any value survives encode → decode unchanged.
    #[test]
    fn encode_decode_roundtrip(val in ".*") {
        let encoded = encode_arg(&val);
        let decoded = decode_arg(&encoded);
        prop_assert_eq!(decoded.as_deref(), Ok(val.as_str()));
    }

    // The escaped form never contains a bare quote.
    #[test]
    fn escaped_form_has_no_bare_quote(val in ".*") {
        let esc = escape(&val);
        let mut chars = esc.chars();
        while let Some(ch) = chars.next() {
            if ch == '\\' {
                chars.next();
                continue;
            }
            prop_assert_ne!(ch, '"');
        }
    }

    #[test]
    fn unescape_inverts_escape(val in ".*") {
        prop_assert_eq!(unescape(&escape(&val)), val);
    }

    // A whole argument vector survives a serialize → tokenize round trip.
    #[test]
    fn arg_vector_roundtrip(args in proptest::collection::vec("[^\\s=\"\\\\]{1,8}|.{0,8}", 1..5)) {
        let line = args.iter().map(|a| encode_arg(a)).collect::<Vec<_>>().join(" ");
        let parsed = split_args(&line).unwrap();
        prop_assert_eq!(parsed, args);
    }

    // Every SETINFO value round-trips through the driver stream.
    #[test]
    fn setinfo_value_roundtrip(val in ".*") {
        let ev = DriverEvent::SetInfo { var: "x".into(), val: val.clone() };
        let args = split_args(ev.to_line().trim_end()).unwrap();
        prop_assert_eq!(DriverEvent::parse(&args), Ok(ev));
    }
}
