//! Content identity for commits.
//!
//! Two commits with the same patch id introduce the same change, whatever
//! their parents, authorship or commit time. That is what survives a rebase.

use std::fmt;

use git2::{Oid, Repository};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PatchId(pub Oid);

impl fmt::Display for PatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Derives a stable change identity for a commit.
pub trait ContentIdentity {
    /// `Ok(None)` when the commit introduces no change (its identity would
    /// collide with every other empty commit).
    fn patch_id(&self, repo: &Repository, commit: Oid) -> Result<Option<PatchId>, git2::Error>;
}

/// libgit2 patch id of the diff against the first parent, or against the
/// empty tree for a root commit.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiffPatchId;

impl ContentIdentity for DiffPatchId {
    fn patch_id(&self, repo: &Repository, commit: Oid) -> Result<Option<PatchId>, git2::Error> {
        let commit = repo.find_commit(commit)?;
        let tree = commit.tree()?;
        let parent_tree = if commit.parent_count() > 0 {
            Some(commit.parent(0)?.tree()?)
        } else {
            None
        };
        let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;
        if diff.deltas().len() == 0 {
            return Ok(None);
        }
        Ok(Some(PatchId(diff.patchid(None)?)))
    }
}
