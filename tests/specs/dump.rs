// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driver-socket dump behaviour, observed on the real Unix socket.

use crate::prelude::*;

#[test]
#[serial]
fn dumpall_is_complete_and_stable() {
    let rig = Rig::start();
    let mut driver = rig.connect_driver();

    let first = driver.dump();

    assert!(first.iter().any(|l| l == "SETINFO ups.model \"Dummy UPS\""), "{first:?}");
    assert!(first.iter().any(|l| l == "SETINFO ups.mfr \"NUT\""), "{first:?}");
    assert!(first.iter().any(|l| l.starts_with("SETINFO battery.charge ")), "{first:?}");
    assert!(first.iter().any(|l| l == "ADDCMD shutdown.return"), "{first:?}");
    assert!(first.iter().any(|l| l == "ADDENUM input.sensitivity \"reduced\""), "{first:?}");
    assert!(first.iter().any(|l| l == "ADDRANGE ups.delay.shutdown 0 600"), "{first:?}");
    assert!(first.iter().any(|l| l == "SETFLAGS input.sensitivity RW"), "{first:?}");
    assert_eq!(first.last().map(String::as_str), Some("DUMPDONE"));

    // fresh data: DATAOK comes right before DUMPDONE, DATASTALE never
    assert_eq!(first.get(first.len() - 2).map(String::as_str), Some("DATAOK"));
    assert!(!first.iter().any(|l| l == "DATASTALE"));

    // enumeration order must repeat exactly across dumps
    let second = driver.dump();
    let names = |lines: &[String]| -> Vec<String> {
        lines
            .iter()
            .filter(|l| l.starts_with("SETINFO "))
            .filter_map(|l| l.split_whitespace().nth(1).map(str::to_string))
            .collect()
    };
    assert_eq!(names(&first), names(&second));
}

#[test]
#[serial]
fn ping_pong_on_the_driver_socket() {
    let rig = Rig::start();
    let mut driver = rig.connect_driver();

    driver.send("PING");
    assert_eq!(driver.recv(), "PONG");
}

#[test]
#[serial]
fn values_with_spaces_survive_to_clients() {
    let rig = Rig::start();
    let mut term = rig.connect();

    assert_eq!(term.req("GET VAR ups1 ups.model"), "VAR ups1 ups.model \"Dummy UPS\"");
}
