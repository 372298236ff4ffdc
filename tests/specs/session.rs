// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Full client sessions against the running server.

use crate::prelude::*;

#[test]
#[serial]
fn queries_need_no_authentication() {
    let rig = Rig::start();
    let mut term = rig.connect();

    assert_eq!(term.req("NETVER"), "1.3");
    assert!(term.req("HELP").starts_with("Commands:"));

    let ups_list = term.req_list("LIST UPS");
    assert_eq!(
        ups_list,
        vec![
            "BEGIN LIST UPS".to_string(),
            "UPS ups1 \"Test bench UPS\"".to_string(),
            "END LIST UPS".to_string(),
        ]
    );

    let vars = term.req_list("LIST VAR ups1");
    assert_eq!(vars.first().map(String::as_str), Some("BEGIN LIST VAR ups1"));
    assert_eq!(vars.last().map(String::as_str), Some("END LIST VAR ups1"));
    assert!(vars.iter().any(|l| l == "VAR ups1 ups.status \"OL\""), "{vars:?}");

    let cmds = term.req_list("LIST CMD ups1");
    assert!(cmds.iter().any(|l| l == "CMD ups1 shutdown.return"), "{cmds:?}");

    let enums = term.req_list("LIST ENUM ups1 input.sensitivity");
    assert!(enums.iter().any(|l| l == "ENUM ups1 input.sensitivity \"low\""), "{enums:?}");

    let ranges = term.req_list("LIST RANGE ups1 ups.delay.shutdown");
    assert!(
        ranges.iter().any(|l| l == "RANGE ups1 ups.delay.shutdown \"0\" \"600\""),
        "{ranges:?}"
    );
}

#[test]
#[serial]
fn login_and_instcmd_reach_the_driver() {
    let rig = Rig::start();
    let mut term = rig.connect();

    assert_eq!(term.req("USERNAME admin"), "OK");
    assert_eq!(term.req("PASSWORD secret"), "OK");
    assert_eq!(term.req("LOGIN ups1"), "OK");
    assert_eq!(term.req("INSTCMD ups1 test.battery.start.quick"), "OK");

    // the driver observed the command: its side effect becomes visible
    wait_for("instcmd side effect", || {
        term.req("GET VAR ups1 ups.test.result") == "VAR ups1 ups.test.result \"done and passed\""
    });

    assert_eq!(term.req("GET NUMLOGINS ups1"), "NUMLOGINS ups1 1");
}

#[test]
#[serial]
fn set_validates_against_the_enum_before_forwarding() {
    let rig = Rig::start();
    let mut term = rig.connect();

    assert_eq!(term.req("USERNAME admin"), "OK");
    assert_eq!(term.req("PASSWORD secret"), "OK");

    assert_eq!(term.req("SET VAR ups1 input.sensitivity high"), "ERR INVALID-ARGUMENT");
    assert_eq!(
        term.req("GET VAR ups1 input.sensitivity"),
        "VAR ups1 input.sensitivity \"normal\""
    );

    assert_eq!(term.req("SET VAR ups1 input.sensitivity low"), "OK");
    wait_for("set to apply", || {
        term.req("GET VAR ups1 input.sensitivity") == "VAR ups1 input.sensitivity \"low\""
    });
}

#[test]
#[serial]
fn unauthenticated_writes_are_refused() {
    let rig = Rig::start();
    let mut term = rig.connect();

    assert_eq!(term.req("SET VAR ups1 input.sensitivity low"), "ERR USERNAME-REQUIRED");
    assert_eq!(term.req("INSTCMD ups1 shutdown.return"), "ERR USERNAME-REQUIRED");
    assert_eq!(term.req("LOGIN ups1"), "ERR USERNAME-REQUIRED");

    assert_eq!(term.req("USERNAME watcher"), "OK");
    assert_eq!(term.req("PASSWORD wrong"), "ERR ACCESS-DENIED");
}

#[test]
#[serial]
fn restricted_users_cannot_write() {
    let rig = Rig::start();
    let mut term = rig.connect();

    assert_eq!(term.req("USERNAME watcher"), "OK");
    assert_eq!(term.req("PASSWORD peek"), "OK");

    assert_eq!(term.req("SET VAR ups1 input.sensitivity low"), "ERR ACCESS-DENIED");
    assert_eq!(term.req("INSTCMD ups1 shutdown.return"), "ERR ACCESS-DENIED");
    assert_eq!(term.req("FSD ups1"), "ERR ACCESS-DENIED");
}

#[test]
#[serial]
fn fsd_marks_the_status_for_every_reader() {
    let rig = Rig::start();
    let mut admin = rig.connect();
    let mut other = rig.connect();

    assert_eq!(admin.req("USERNAME admin"), "OK");
    assert_eq!(admin.req("PASSWORD secret"), "OK");
    assert_eq!(admin.req("FSD ups1"), "OK FSD-SET");

    assert_eq!(admin.req("GET VAR ups1 ups.status"), "VAR ups1 ups.status \"FSD OL\"");
    assert_eq!(other.req("GET VAR ups1 ups.status"), "VAR ups1 ups.status \"FSD OL\"");

    let vars = other.req_list("LIST VAR ups1");
    assert!(vars.iter().any(|l| l == "VAR ups1 ups.status \"FSD OL\""), "{vars:?}");
}

#[test]
#[serial]
fn logout_closes_the_session() {
    let rig = Rig::start();
    let mut term = rig.connect();

    assert_eq!(term.req("LOGOUT"), "OK Goodbye");
    assert!(term.at_eof());
}

#[test]
#[serial]
fn unknown_devices_and_verbs_answer_errors() {
    let rig = Rig::start();
    let mut term = rig.connect();

    assert_eq!(term.req("GET VAR ups9 ups.status"), "ERR UNKNOWN-UPS");
    assert_eq!(term.req("FROBNICATE"), "ERR INVALID-ARGUMENT");
    assert_eq!(term.req("STARTTLS"), "ERR FEATURE-NOT-CONFIGURED");

    // the session survives all of the above
    assert_eq!(term.req("NETVER"), "1.3");
}
