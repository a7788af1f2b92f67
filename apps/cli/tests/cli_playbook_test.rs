//! Integration tests for the `ace` playbook commands.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn ace(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ace").unwrap();
    cmd.current_dir(dir.path()).env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

fn playbook_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn first_id(path: &Path) -> String {
    playbook_json(path)["sections"][0]["bulletpoints"][0]["id"].as_str().unwrap().to_string()
}

#[test]
fn test_show_empty_playbook() {
    let dir = TempDir::new().unwrap();
    ace(&dir)
        .args(["--playbook", "playbook.json", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Playbook is empty."));
}

#[test]
fn test_add_then_show() {
    let dir = TempDir::new().unwrap();
    ace(&dir)
        .args(["--playbook", "playbook.json", "add", "--section", "Movement", "--content", "check walls"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Entry added successfully").and(predicate::str::contains("ID:")));

    let id = first_id(&dir.path().join("playbook.json"));
    ace(&dir)
        .args(["--playbook", "playbook.json", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. Movement"))
        .stdout(predicate::str::contains(format!("   - [{id}] check walls; helpful: 0, harmful: 0")));
}

#[test]
fn test_add_without_section_uses_general() {
    let dir = TempDir::new().unwrap();
    ace(&dir).args(["-p", "playbook.json", "add", "--content", "x"]).assert().success();

    let doc = playbook_json(&dir.path().join("playbook.json"));
    assert_eq!(doc["sections"][0]["title"], "General");
}

#[test]
fn test_tag_modify_remove_lifecycle() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("playbook.json");
    ace(&dir)
        .args(["-p", "playbook.json", "add", "--section", "General", "--content", "always check boundaries"])
        .assert()
        .success();
    let id = first_id(&path);

    ace(&dir)
        .args(["-p", "playbook.json", "tag", "--id", &id, "--tag", "helpful"])
        .assert()
        .success()
        .stdout(predicate::str::contains("helpful: 1, harmful: 0"));

    ace(&dir)
        .args(["-p", "playbook.json", "modify", "--id", &id, "--content", "always check boundaries first"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Modified 1"));

    let doc = playbook_json(&path);
    let entry = &doc["sections"][0]["bulletpoints"][0];
    assert_eq!(entry["content"], "always check boundaries first");
    assert_eq!(entry["helpful"], 1);
    assert_eq!(entry["id"], id.as_str());

    ace(&dir).args(["-p", "playbook.json", "remove", "--id", &id]).assert().success();
    ace(&dir)
        .args(["-p", "playbook.json", "remove", "--id", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("No entry with id"));

    let doc = playbook_json(&path);
    assert_eq!(doc["sections"].as_array().unwrap().len(), 1);
    assert!(doc["sections"][0]["bulletpoints"].as_array().unwrap().is_empty());
}

#[test]
fn test_tag_rejects_unknown_value() {
    let dir = TempDir::new().unwrap();
    ace(&dir)
        .args(["-p", "playbook.json", "tag", "--id", "x", "--tag", "great"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown entry tag"));
}

#[test]
fn test_stats_json() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("playbook.json"),
        r#"{"sections": [
            {"title": "A", "bulletpoints": [{"id": "1", "content": "a", "helpful": 2, "harmful": 1}]},
            {"title": "B", "bulletpoints": [{"id": "2", "content": "b", "helpful": 3, "harmful": 0},
                                            {"id": "3", "content": "c", "helpful": 0, "harmful": 4}]}
        ]}"#,
    )
    .unwrap();

    let output = ace(&dir).args(["-p", "playbook.json", "stats", "--json"]).output().unwrap();
    assert!(output.status.success());
    let stats: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["totals"]["sections"], 2);
    assert_eq!(stats["totals"]["entries"], 3);
    assert_eq!(stats["totals"]["helpful"], 5);
    assert_eq!(stats["totals"]["harmful"], 5);
    assert_eq!(stats["sections"][1]["title"], "B");
    assert_eq!(stats["sections"][1]["entries"], 2);
}

#[test]
fn test_corrupt_playbook_shows_empty() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("playbook.json"), "{ not json").unwrap();
    ace(&dir)
        .args(["-p", "playbook.json", "show", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"sections\": []"));
}

#[test]
fn test_config_file_sets_playbook_path_and_default_section() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("ace.toml"),
        "[playbook]\npath = \"data/book.json\"\ndefault_section = \"Misc\"\n",
    )
    .unwrap();

    ace(&dir).args(["add", "--content", "from config"]).assert().success();

    let doc = playbook_json(&dir.path().join("data/book.json"));
    assert_eq!(doc["sections"][0]["title"], "Misc");
}

#[test]
fn test_invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("bad.toml"), "[episode]\nmax_steps = 0\n").unwrap();
    ace(&dir)
        .args(["--config", "bad.toml", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}
