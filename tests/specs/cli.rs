// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `nutc` against a live server.

use crate::prelude::*;
use assert_cmd::Command;

fn nutc() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin("nutc"))
}

#[test]
#[serial]
fn lists_devices() {
    let rig = Rig::start();

    let assert = nutc().arg("-l").arg(format!("127.0.0.1:{}", rig.port)).assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(stdout.contains("ups1: Test bench UPS"), "stdout: {stdout}");
}

#[test]
#[serial]
fn prints_all_variables() {
    let rig = Rig::start();

    let assert =
        nutc().arg(format!("ups1@127.0.0.1:{}", rig.port)).assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(stdout.contains("ups.model: Dummy UPS"), "stdout: {stdout}");
    assert!(stdout.contains("ups.status: OL"), "stdout: {stdout}");
}

#[test]
#[serial]
fn prints_a_single_variable() {
    let rig = Rig::start();

    let assert = nutc()
        .arg(format!("ups1@127.0.0.1:{}", rig.port))
        .arg("ups.mfr")
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert_eq!(stdout.trim(), "NUT");
}

#[test]
#[serial]
fn unknown_ups_fails_with_a_message() {
    let rig = Rig::start();

    let assert = nutc().arg(format!("ups9@127.0.0.1:{}", rig.port)).assert().failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("UNKNOWN-UPS"), "stderr: {stderr}");
}
