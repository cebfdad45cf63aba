use std::path::Path;

use git2::{Oid, Repository, Signature};

pub fn init_bare_repo(path: &Path) -> Result<Repository, String> {
    Repository::init_bare(path).map_err(|err| format!("git init --bare failed for {path:?}: {err}"))
}

pub fn init_repo(path: &Path) -> Result<Repository, String> {
    let repo =
        Repository::init(path).map_err(|err| format!("git init failed for {path:?}: {err}"))?;
    configure_test_repo(&repo)?;
    Ok(repo)
}

pub fn init_repo_with_origin(repo_dir: &Path, remote_dir: &Path) -> Result<Repository, String> {
    let repo = init_repo(repo_dir)?;
    add_origin_remote(&repo, remote_dir)?;
    Ok(repo)
}

/// Clone `remote_dir` so the new repository shares its commits.
pub fn clone_repo(remote_dir: &Path, repo_dir: &Path) -> Result<Repository, String> {
    let remote = remote_dir
        .to_str()
        .ok_or_else(|| format!("remote dir path is not utf8: {remote_dir:?}"))?;
    let repo = Repository::clone(remote, repo_dir)
        .map_err(|err| format!("git clone failed for {remote_dir:?}: {err}"))?;
    configure_test_repo(&repo)?;
    Ok(repo)
}

/// Commit `name = body` on top of HEAD.
pub fn commit_file(repo: &Repository, name: &str, body: &str, msg: &str) -> Result<Oid, String> {
    let sig = signature()?;
    let blob = repo
        .blob(body.as_bytes())
        .map_err(|err| format!("write blob failed: {err}"))?;
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let base = parent
        .as_ref()
        .map(|p| p.tree())
        .transpose()
        .map_err(|err| format!("read parent tree failed: {err}"))?;
    let mut builder = repo
        .treebuilder(base.as_ref())
        .map_err(|err| format!("treebuilder failed: {err}"))?;
    builder
        .insert(name, blob, 0o100644)
        .map_err(|err| format!("tree insert failed: {err}"))?;
    let tree_id = builder
        .write()
        .map_err(|err| format!("tree write failed: {err}"))?;
    let tree = repo
        .find_tree(tree_id)
        .map_err(|err| format!("find tree failed: {err}"))?;
    let parents: Vec<_> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, msg, &tree, &parents)
        .map_err(|err| format!("commit failed: {err}"))
}

/// Reword HEAD in place, leaving the old commit unreachable.
pub fn amend_head(repo: &Repository, msg: &str) -> Result<Oid, String> {
    let head = repo
        .head()
        .and_then(|h| h.peel_to_commit())
        .map_err(|err| format!("read HEAD failed: {err}"))?;
    head.amend(Some("HEAD"), None, None, None, Some(msg), None)
        .map_err(|err| format!("amend failed: {err}"))
}

/// Push the checked-out branch to origin.
pub fn push_head(repo: &Repository) -> Result<(), String> {
    let head = repo.head().map_err(|err| format!("read HEAD failed: {err}"))?;
    let name = head
        .name()
        .ok_or_else(|| "HEAD name is not utf8".to_string())?
        .to_string();
    let mut remote = repo
        .find_remote("origin")
        .map_err(|err| format!("find origin failed: {err}"))?;
    remote
        .push(&[format!("{name}:{name}")], None)
        .map_err(|err| format!("push {name} failed: {err}"))
}

fn signature() -> Result<Signature<'static>, String> {
    Signature::now("Test", "test@test.com").map_err(|err| format!("signature failed: {err}"))
}

fn configure_test_repo(repo: &Repository) -> Result<(), String> {
    let mut cfg = repo
        .config()
        .map_err(|err| format!("open repo config failed: {err}"))?;
    cfg.set_str("user.name", "Test")
        .map_err(|err| format!("set user.name failed: {err}"))?;
    cfg.set_str("user.email", "test@test.com")
        .map_err(|err| format!("set user.email failed: {err}"))?;
    Ok(())
}

fn add_origin_remote(repo: &Repository, remote_dir: &Path) -> Result<(), String> {
    let remote = remote_dir
        .to_str()
        .ok_or_else(|| format!("remote dir path is not utf8: {remote_dir:?}"))?;
    repo.remote("origin", remote)
        .map_err(|err| format!("git remote add origin failed: {err}"))?;
    Ok(())
}
