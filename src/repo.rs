//! Repository discovery and revision resolution.

use std::path::{Path, PathBuf};

use git2::{Oid, Repository};

use crate::git::StoreError;

/// Open the git repository containing `start` (or the current directory).
pub fn discover(start: Option<&Path>) -> Result<Repository, StoreError> {
    let start = start.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    Repository::discover(&start).map_err(|e| StoreError::OpenRepo(start, e))
}

/// Work tree root, `None` for bare repositories.
pub fn work_tree_root(repo: &Repository) -> Option<PathBuf> {
    repo.workdir().map(Path::to_path_buf)
}

/// Resolve any revision expression (`HEAD~2`, a branch, a short id) to a
/// commit id.
pub fn resolve_commit(repo: &Repository, rev: &str) -> Result<Oid, StoreError> {
    let unknown = |source| StoreError::UnknownRevision {
        rev: rev.to_string(),
        source,
    };
    let object = repo.revparse_single(rev).map_err(unknown)?;
    let commit = object.peel_to_commit().map_err(unknown)?;
    Ok(commit.id())
}
