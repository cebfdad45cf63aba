//! History walking over the tracked branch tips.
//!
//! "Tracked" means `HEAD`, every local branch and every remote-tracking
//! branch. Walk order is topological with commit time as the tiebreak, which
//! is the order `git log` users expect.

use std::collections::HashSet;

use git2::{Oid, Repository, Sort};

pub(crate) fn tracked_tips(repo: &Repository) -> Result<Vec<Oid>, git2::Error> {
    let mut tips = Vec::new();
    let mut seen = HashSet::new();

    if let Ok(head) = repo.head()
        && let Ok(commit) = head.peel_to_commit()
        && seen.insert(commit.id())
    {
        tips.push(commit.id());
    }

    for glob in ["refs/heads/*", "refs/remotes/*"] {
        for reference in repo.references_glob(glob)? {
            let Ok(commit) = reference?.peel_to_commit() else {
                continue;
            };
            if seen.insert(commit.id()) {
                tips.push(commit.id());
            }
        }
    }

    Ok(tips)
}

/// Commits reachable from `tips`, minus anything reachable from `hide`.
pub(crate) fn walk(
    repo: &Repository,
    tips: &[Oid],
    hide: &[Oid],
) -> Result<Vec<Oid>, git2::Error> {
    if tips.is_empty() {
        return Ok(Vec::new());
    }
    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
    for tip in tips {
        revwalk.push(*tip)?;
    }
    for oid in hide {
        revwalk.hide(*oid)?;
    }
    revwalk.collect()
}

pub(crate) fn tracked_history(repo: &Repository) -> Result<Vec<Oid>, git2::Error> {
    let tips = tracked_tips(repo)?;
    walk(repo, &tips, &[])
}
