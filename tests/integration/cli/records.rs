//! attach / show / list / verify / copy / migrate against a temp repo.

use predicates::prelude::*;
use tempfile::TempDir;

use super::{convo, json_of};
use crate::fixtures::git::{commit_file, init_repo};
use crate::fixtures::transcript::write_claude_log;

fn attach(repo: &std::path::Path, home: &std::path::Path, file: &std::path::Path, session: &str) {
    convo(repo, home)
        .args(["attach", "--session", session])
        .arg(file)
        .assert()
        .success();
}

#[test]
fn attach_then_show_round_trips() {
    let tmp = TempDir::new().unwrap();
    let repo_dir = tmp.path().join("repo");
    let repo = init_repo(&repo_dir).unwrap();
    let head = commit_file(&repo, "a.txt", "a", "first").unwrap();
    let log = write_claude_log(tmp.path(), "session.jsonl", 4);

    let out = convo(&repo_dir, tmp.path())
        .args(["--json", "attach", "--session", "s-1", "--model", "opus"])
        .arg(&log)
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let attached = json_of(&out.stdout);
    assert_eq!(attached["commit"], head.to_string());
    assert_eq!(attached["message_count"], 4);
    assert_eq!(attached["replaced"], false);

    let out = convo(&repo_dir, tmp.path())
        .args(["--json", "show", "--transcript"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let shown = json_of(&out.stdout);
    assert_eq!(shown["session_id"], "s-1");
    assert_eq!(shown["agent"], "claude-code");
    assert_eq!(shown["model"], "opus");
    assert_eq!(shown["integrity"], "verified");
    let ids: Vec<&str> = shown["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["u1", "u2", "u3", "u4"]);

    convo(&repo_dir, tmp.path())
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("session  s-1"));
}

#[test]
fn show_without_record_fails() {
    let tmp = TempDir::new().unwrap();
    let repo_dir = tmp.path().join("repo");
    let repo = init_repo(&repo_dir).unwrap();
    commit_file(&repo, "a.txt", "a", "first").unwrap();

    convo(&repo_dir, tmp.path())
        .arg("show")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no record attached"));
}

#[test]
fn attach_rejects_unreadable_transcript() {
    let tmp = TempDir::new().unwrap();
    let repo_dir = tmp.path().join("repo");
    let repo = init_repo(&repo_dir).unwrap();
    commit_file(&repo, "a.txt", "a", "first").unwrap();
    let bad = tmp.path().join("bad.jsonl");
    std::fs::write(&bad, "not json\n").unwrap();

    convo(&repo_dir, tmp.path())
        .args(["attach", "--session", "s"])
        .arg(&bad)
        .assert()
        .failure();
    convo(&repo_dir, tmp.path())
        .args(["--json", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn incremental_show_skips_what_the_parent_recorded() {
    let tmp = TempDir::new().unwrap();
    let repo_dir = tmp.path().join("repo");
    let repo = init_repo(&repo_dir).unwrap();

    commit_file(&repo, "a.txt", "a", "first").unwrap();
    let early = write_claude_log(tmp.path(), "early.jsonl", 3);
    attach(&repo_dir, tmp.path(), &early, "s");

    commit_file(&repo, "b.txt", "b", "second").unwrap();
    let late = write_claude_log(tmp.path(), "late.jsonl", 5);
    attach(&repo_dir, tmp.path(), &late, "s");

    let out = convo(&repo_dir, tmp.path())
        .args(["--json", "show", "--incremental"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let shown = json_of(&out.stdout);
    assert_eq!(shown["boundary"]["kind"], "at");
    assert_eq!(shown["boundary"]["last_entry_id"], "u3");
    let ids: Vec<&str> = shown["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["u4", "u5"]);
}

#[test]
fn list_copy_and_verify() {
    let tmp = TempDir::new().unwrap();
    let repo_dir = tmp.path().join("repo");
    let repo = init_repo(&repo_dir).unwrap();
    let first = commit_file(&repo, "a.txt", "a", "first").unwrap();
    let log = write_claude_log(tmp.path(), "s.jsonl", 2);
    convo(&repo_dir, tmp.path())
        .args(["attach", "--session", "s", "--commit"])
        .arg(first.to_string())
        .arg(&log)
        .assert()
        .success();
    let second = commit_file(&repo, "b.txt", "b", "second").unwrap();

    convo(&repo_dir, tmp.path())
        .args(["copy", "HEAD~1", "HEAD"])
        .assert()
        .success();

    let out = convo(&repo_dir, tmp.path())
        .args(["--json", "list"])
        .output()
        .unwrap();
    let listed = json_of(&out.stdout);
    let commits: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["commit"].as_str().unwrap())
        .collect();
    let expected = [second.to_string(), first.to_string()];
    assert_eq!(commits, expected);

    let out = convo(&repo_dir, tmp.path())
        .args(["--json", "verify"])
        .output()
        .unwrap();
    let report = json_of(&out.stdout);
    assert_eq!(report["notes"], 2);
    assert_eq!(report["verified"], 2);
    assert_eq!(report["failures"].as_array().unwrap().len(), 0);
}

#[test]
fn verify_flags_a_tampered_record() {
    let tmp = TempDir::new().unwrap();
    let repo_dir = tmp.path().join("repo");
    let repo = init_repo(&repo_dir).unwrap();
    let head = commit_file(&repo, "a.txt", "a", "first").unwrap();
    let log = write_claude_log(tmp.path(), "s.jsonl", 2);
    attach(&repo_dir, tmp.path(), &log, "s");

    let note = repo
        .find_note(Some("refs/notes/convo"), head)
        .unwrap()
        .message()
        .unwrap()
        .to_string();
    let mut record: serde_json::Value = serde_json::from_str(note.trim()).unwrap();
    record["checksum"] = serde_json::Value::String(format!("sha256:{}", "0".repeat(64)));
    let sig = repo.signature().unwrap();
    repo.note(
        &sig,
        &sig,
        Some("refs/notes/convo"),
        head,
        &format!("{record}\n"),
        true,
    )
    .unwrap();

    let out = convo(&repo_dir, tmp.path())
        .args(["--json", "verify"])
        .output()
        .unwrap();
    let report = json_of(&out.stdout);
    assert_eq!(report["tampered"], 1);
    assert_eq!(report["failures"][0]["status"], "tampered");
}

#[test]
fn migrate_moves_legacy_records() {
    let tmp = TempDir::new().unwrap();
    let repo_dir = tmp.path().join("repo");
    let repo = init_repo(&repo_dir).unwrap();
    let head = commit_file(&repo, "a.txt", "a", "first").unwrap();
    let log = write_claude_log(tmp.path(), "s.jsonl", 2);
    attach(&repo_dir, tmp.path(), &log, "legacy");

    // Move the fresh record under the legacy ref by hand.
    let current = repo.refname_to_id("refs/notes/convo").unwrap();
    repo.reference("refs/notes/conversations", current, true, "test")
        .unwrap();
    repo.find_reference("refs/notes/convo")
        .unwrap()
        .delete()
        .unwrap();
    convo(&repo_dir, tmp.path()).arg("show").assert().failure();

    let out = convo(&repo_dir, tmp.path())
        .args(["--json", "migrate"])
        .output()
        .unwrap();
    assert!(out.status.success());
    assert_eq!(json_of(&out.stdout)["kind"], "renamed");
    assert!(repo.find_reference("refs/notes/conversations").is_err());
    assert!(repo.find_note(Some("refs/notes/convo"), head).is_ok());
    convo(&repo_dir, tmp.path())
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("legacy"));

    convo(&repo_dir, tmp.path())
        .args(["--json", "migrate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing_to_migrate"));
}
