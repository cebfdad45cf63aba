//! push / pull between two clones of a bare remote.

use predicates::prelude::*;
use tempfile::TempDir;

use super::{convo, json_of};
use crate::fixtures::git::{
    clone_repo, commit_file, init_bare_repo, init_repo, init_repo_with_origin, push_head,
};
use crate::fixtures::transcript::write_claude_log;

#[test]
fn records_travel_through_the_remote() {
    let tmp = TempDir::new().unwrap();
    let remote_dir = tmp.path().join("remote.git");
    init_bare_repo(&remote_dir).unwrap();

    let a_dir = tmp.path().join("a");
    let a = init_repo_with_origin(&a_dir, &remote_dir).unwrap();
    commit_file(&a, "a.txt", "a", "first").unwrap();
    push_head(&a).unwrap();
    let log = write_claude_log(tmp.path(), "s.jsonl", 2);
    convo(&a_dir, tmp.path())
        .args(["attach", "--session", "from-a"])
        .arg(&log)
        .assert()
        .success();

    let out = convo(&a_dir, tmp.path())
        .args(["--json", "push"])
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(json_of(&out.stdout)["kind"], "pushed");

    let b_dir = tmp.path().join("b");
    clone_repo(&remote_dir, &b_dir).unwrap();
    let out = convo(&b_dir, tmp.path())
        .args(["--json", "pull"])
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(json_of(&out.stdout)["outcome"]["kind"], "adopted");

    convo(&b_dir, tmp.path())
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("from-a"));

    convo(&b_dir, tmp.path())
        .arg("pull")
        .assert()
        .success()
        .stdout(predicate::str::contains("Already up to date."));
}

#[test]
fn push_without_notes_is_a_no_op() {
    let tmp = TempDir::new().unwrap();
    let remote_dir = tmp.path().join("remote.git");
    init_bare_repo(&remote_dir).unwrap();
    let repo_dir = tmp.path().join("repo");
    init_repo_with_origin(&repo_dir, &remote_dir).unwrap();

    convo(&repo_dir, tmp.path())
        .arg("push")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to push."));
}

#[test]
fn repo_config_picks_the_remote() {
    let tmp = TempDir::new().unwrap();
    let repo_dir = tmp.path().join("repo");
    init_repo(&repo_dir).unwrap();
    std::fs::write(
        repo_dir.join(".git-convo.toml"),
        "[sync]\nremote = \"upstream\"\n",
    )
    .unwrap();

    convo(&repo_dir, tmp.path())
        .arg("pull")
        .assert()
        .failure()
        .stderr(predicate::str::contains("remote `upstream` is not configured"));

    convo(&repo_dir, tmp.path())
        .env("GIT_CONVO_REMOTE", "elsewhere")
        .arg("pull")
        .assert()
        .failure()
        .stderr(predicate::str::contains("remote `elsewhere` is not configured"));
}
