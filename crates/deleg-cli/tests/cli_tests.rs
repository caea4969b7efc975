// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use std::fs;
use std::path::Path;

use assert_cmd::Command;
use deleg_core::Labels;
use predicates::prelude::*;

const ADMIN: &str = "0x1111111111111111111111111111111111111111";
const ALICE: &str = "0x2222222222222222222222222222222222222222";
const ETH_OWNER: &str = "0x3333333333333333333333333333333333333333";

fn deleg() -> Command {
    let mut cmd = Command::cargo_bin("deleg").expect("deleg binary");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write(dir: &Path, file: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(file);
    fs::write(&path, contents).expect("write fixture");
    path
}

fn delegation_script() -> String {
    format!(
        r#"{{ "steps": [
            {{ "caller": "{ALICE}", "op": {{ "type": "set", "name": "a.b.c.eth",
                "kind": {{ "kind": "text", "key": "url" }}, "payload": "too early" }} }},
            {{ "caller": "{ETH_OWNER}", "op": {{ "type": "approve", "name": "a.b.c.eth", "operator": "{ALICE}" }} }},
            {{ "caller": "{ALICE}", "op": {{ "type": "set", "name": "a.b.c.eth",
                "kind": {{ "kind": "text", "key": "url" }}, "payload": "https://alice" }} }},
            {{ "caller": "{ALICE}", "op": {{ "type": "set", "name": "eth",
                "kind": {{ "kind": "text", "key": "url" }}, "payload": "nope" }} }},
            {{ "op": {{ "type": "get", "name": "a.b.c.eth", "kind": {{ "kind": "text", "key": "url" }} }} }}
        ] }}"#
    )
}

fn config_json() -> String {
    format!(
        r#"{{ "admin": "{ADMIN}", "top_level": [ {{ "label": "eth", "owner": "{ETH_OWNER}" }} ] }}"#
    )
}

#[test]
fn namehash_prints_the_node_id() {
    let expected = Labels::from_dotted("a.eth").unwrap().namehash().to_string();
    deleg()
        .args(["namehash", "a.eth"])
        .assert()
        .success()
        .stdout(predicate::str::contains(expected));
}

#[test]
fn namehash_of_root_is_zero() {
    deleg()
        .args(["namehash", "."])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("0x{}", "00".repeat(32))));
}

#[test]
fn namehash_rejects_empty_labels() {
    deleg()
        .args(["namehash", "a..eth"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid name"));
}

#[test]
fn interfaces_lists_capabilities() {
    deleg()
        .args(["interfaces"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0x3b3b57de"))
        .stdout(predicate::str::contains("0x01ffc9a7"));
}

#[test]
fn interfaces_json_has_every_entry() {
    let out = deleg().args(["interfaces", "--json"]).output().unwrap();
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value.as_array().map(Vec::len), Some(12));
}

#[test]
fn run_reports_failures_without_stopping() {
    let dir = tempfile::tempdir().unwrap();
    let script = write(dir.path(), "script.json", &delegation_script());
    let config = write(dir.path(), "registry.json", &config_json());

    let out = deleg()
        .arg("run")
        .arg(&script)
        .arg("--config")
        .arg(&config)
        .arg("--json")
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let oks: Vec<bool> = value["steps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["ok"].as_bool().unwrap())
        .collect();
    assert_eq!(oks, vec![false, true, true, false, true]);
    assert_eq!(value["failed"], 2);
    assert_eq!(value["steps"][4]["result"]["text"], "https://alice");
    // One approval plus one record write.
    assert_eq!(value["events"].as_array().map(Vec::len), Some(2));
}

#[test]
fn run_renders_tables_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let script = write(dir.path(), "script.json", &delegation_script());
    let config = write(dir.path(), "registry.json", &config_json());
    deleg()
        .arg("run")
        .arg(&script)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Status"))
        .stdout(predicate::str::contains("5 steps, 2 failed, 2 events"));
}

#[test]
fn run_loads_config_from_a_directory_key() {
    let dir = tempfile::tempdir().unwrap();
    let script = write(dir.path(), "script.json", &delegation_script());
    let configs = dir.path().join("configs");
    fs::create_dir(&configs).unwrap();
    write(&configs, "staging.json", &config_json());

    deleg()
        .arg("run")
        .arg(&script)
        .arg("--config-dir")
        .arg(&configs)
        .args(["--config-key", "staging"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 failed"));

    deleg()
        .arg("run")
        .arg(&script)
        .arg("--config-dir")
        .arg(&configs)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no registry config"));
}

#[test]
fn run_with_bare_admin_denies_top_level_owner() {
    let dir = tempfile::tempdir().unwrap();
    let script = write(dir.path(), "script.json", &delegation_script());
    // Without the config, ETH_OWNER owns nothing, so its approval fails too.
    deleg()
        .arg("run")
        .arg(&script)
        .args(["--admin", ADMIN])
        .assert()
        .success()
        .stdout(predicate::str::contains("5 steps, 4 failed, 0 events"));
}

#[test]
fn malformed_script_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let script = write(
        dir.path(),
        "script.json",
        r#"{ "steps": [ { "op": { "type": "teleport" } } ] }"#,
    );
    deleg()
        .arg("run")
        .arg(&script)
        .args(["--admin", ADMIN])
        .assert()
        .failure()
        .stderr(predicate::str::contains("parsing registry script"));
}

#[test]
fn config_log_filter_routes_logs_to_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let script = write(dir.path(), "script.json", &delegation_script());
    let config = write(
        dir.path(),
        "registry.json",
        &format!(r#"{{ "admin": "{ADMIN}", "log_filter": "debug" }}"#),
    );
    deleg()
        .arg("run")
        .arg(&script)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stderr(predicate::str::contains("authorization"))
        .stdout(predicate::str::contains("authorization").not());
}
