//! Repository builders shared by the git unit tests.

use std::path::Path;

use git2::{Oid, Repository, Signature};

pub(crate) fn init_repo(path: &Path) -> Repository {
    let repo = Repository::init(path).unwrap();
    {
        let mut cfg = repo.config().unwrap();
        cfg.set_str("user.name", "Test").unwrap();
        cfg.set_str("user.email", "test@test.com").unwrap();
    }
    repo
}

fn sig() -> Signature<'static> {
    Signature::now("test", "test@example.com").unwrap()
}

/// Commit `name = body` on top of HEAD and advance HEAD.
pub(crate) fn commit_file(repo: &Repository, name: &str, body: &str, msg: &str) -> Oid {
    let sig = sig();
    let blob = repo.blob(body.as_bytes()).unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let base_tree = parent.as_ref().map(|p| p.tree().unwrap());
    let mut builder = repo.treebuilder(base_tree.as_ref()).unwrap();
    builder.insert(name, blob, 0o100644).unwrap();
    let tree = repo.find_tree(builder.write().unwrap()).unwrap();
    let parents: Vec<_> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, msg, &tree, &parents)
        .unwrap()
}

/// Replay `commit` on top of `onto` without touching any ref, the way a
/// hosting platform's rebase-merge rewrites it.
pub(crate) fn replay_onto(repo: &Repository, commit: Oid, onto: Oid) -> Oid {
    let commit = repo.find_commit(commit).unwrap();
    let onto = repo.find_commit(onto).unwrap();
    let mut index = repo.cherrypick_commit(&commit, &onto, 0, None).unwrap();
    let tree_oid = index.write_tree_to(repo).unwrap();
    let tree = repo.find_tree(tree_oid).unwrap();
    let rewriter = Signature::now("rewriter", "rewriter@example.com").unwrap();
    repo.commit(
        None,
        &commit.author(),
        &rewriter,
        commit.message().unwrap_or(""),
        &tree,
        &[&onto],
    )
    .unwrap()
}

/// Point `branch` (and HEAD, when it is the current branch) at `oid`.
pub(crate) fn set_branch(repo: &Repository, branch: &str, oid: Oid) {
    repo.reference(&format!("refs/heads/{branch}"), oid, true, "test: move branch")
        .unwrap();
}
