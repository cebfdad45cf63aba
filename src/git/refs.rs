//! Notes ref names and small ref helpers.

use git2::{ErrorCode, Oid, Repository, Signature};

/// Primary notes ref holding conversation records. Kept apart from git's
/// default `refs/notes/commits` so ordinary `git notes` use never collides.
pub const NOTES_REF: &str = "refs/notes/convo";

/// Holding ref for fetched-but-unmerged remote notes.
pub const TRACKING_REF: &str = "refs/notes/convo-tracking";

/// Former primary ref, read only by the migration path.
pub const LEGACY_NOTES_REF: &str = "refs/notes/conversations";

pub(crate) fn refname_to_id_optional(
    repo: &Repository,
    name: &str,
) -> Result<Option<Oid>, git2::Error> {
    match repo.refname_to_id(name) {
        Ok(oid) => Ok(Some(oid)),
        Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Delete a ref; a missing ref is not an error.
pub(crate) fn delete_ref(repo: &Repository, name: &str) -> Result<bool, git2::Error> {
    match repo.find_reference(name) {
        Ok(mut reference) => {
            reference.delete()?;
            Ok(true)
        }
        Err(e) if e.code() == ErrorCode::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Committer identity for notes commits: the repo's configured user when
/// available, otherwise a fixed tool identity.
pub(crate) fn signature(repo: &Repository) -> Result<Signature<'static>, git2::Error> {
    match repo.signature() {
        Ok(sig) => Ok(sig.to_owned()),
        Err(_) => Signature::now("git-convo", "git-convo@localhost"),
    }
}
