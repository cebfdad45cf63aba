//! remap after a history rewrite.

use predicates::prelude::*;
use tempfile::TempDir;

use super::{convo, json_of};
use crate::fixtures::git::{amend_head, commit_file, init_repo};
use crate::fixtures::transcript::write_claude_log;

#[test]
fn amended_commit_gets_its_record_back() {
    let tmp = TempDir::new().unwrap();
    let repo_dir = tmp.path().join("repo");
    let repo = init_repo(&repo_dir).unwrap();
    commit_file(&repo, "a.txt", "a", "base").unwrap();
    let original = commit_file(&repo, "b.txt", "b", "work").unwrap();
    let log = write_claude_log(tmp.path(), "s.jsonl", 2);
    convo(&repo_dir, tmp.path())
        .args(["attach", "--session", "s"])
        .arg(&log)
        .assert()
        .success();

    let rewritten = amend_head(&repo, "work, reworded").unwrap();
    assert_ne!(original, rewritten);
    convo(&repo_dir, tmp.path()).arg("show").assert().failure();

    // Dry run reports the match but writes nothing.
    let out = convo(&repo_dir, tmp.path())
        .args(["--json", "remap", "--dry-run"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let report = json_of(&out.stdout);
    assert_eq!(report["dry_run"], true);
    assert_eq!(report["remapped"][0]["to"], rewritten.to_string());
    convo(&repo_dir, tmp.path()).arg("show").assert().failure();

    let out = convo(&repo_dir, tmp.path())
        .args(["--json", "remap", "--prune"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let report = json_of(&out.stdout);
    assert_eq!(report["orphans"], 1);
    assert_eq!(report["remapped"][0]["from"], original.to_string());
    assert_eq!(report["remapped"][0]["to"], rewritten.to_string());
    assert_eq!(report["pruned"], 1);

    convo(&repo_dir, tmp.path())
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("session  s"));

    // Nothing left to do.
    let out = convo(&repo_dir, tmp.path())
        .args(["--json", "remap"])
        .output()
        .unwrap();
    let report = json_of(&out.stdout);
    assert_eq!(report["orphans"], 0);
    assert_eq!(report["remapped"].as_array().unwrap().len(), 0);
}
