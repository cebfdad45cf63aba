//! Remote transport for the notes ref.
//!
//! Every remote call runs under a [`Deadline`]. libgit2 has no per-call
//! timeout, so the deadline is checked before the call and from its progress
//! callbacks, and the transfer is aborted from there. Stalls that produce no
//! callbacks are bounded by libgit2's process-wide server timeouts, which the
//! binary sets from [`server_timeout_millis`] at startup.

use std::cell::{Cell, RefCell};
use std::time::{Duration, Instant};

use git2::{ErrorCode, FetchOptions, PushOptions, RemoteCallbacks, Repository};

use super::error::{PushRejected, SyncError};
use super::refs::{NOTES_REF, TRACKING_REF};

#[derive(Clone, Copy, Debug)]
pub struct Deadline {
    started: Instant,
    limit: Duration,
}

impl Deadline {
    pub fn after(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    pub fn expired(&self) -> bool {
        self.started.elapsed() >= self.limit
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn check(&self, op: &'static str) -> Result<(), SyncError> {
        if self.expired() {
            return Err(self.timed_out(op));
        }
        Ok(())
    }

    fn timed_out(&self, op: &'static str) -> SyncError {
        SyncError::TimedOut {
            op,
            after_ms: self.limit.as_millis(),
        }
    }
}

/// libgit2 server timeout for a sync timeout. Zero would mean "no limit",
/// so the result is at least one millisecond.
pub fn server_timeout_millis(timeout: Duration) -> i32 {
    i32::try_from(timeout.as_millis())
        .unwrap_or(i32::MAX)
        .max(1)
}

fn remote_callbacks<'a>(
    repo: &Repository,
    deadline: Deadline,
    tripped: &'a Cell<bool>,
) -> RemoteCallbacks<'a> {
    let cfg = repo.config().ok();
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |url, username_from_url, allowed| {
        if allowed.is_ssh_key()
            && let Some(user) = username_from_url
        {
            return git2::Cred::ssh_key_from_agent(user);
        }
        if allowed.is_user_pass_plaintext()
            && let Some(ref cfg) = cfg
            && let Ok(cred) = git2::Cred::credential_helper(cfg, url, username_from_url)
        {
            return Ok(cred);
        }
        git2::Cred::default()
    });
    callbacks.transfer_progress(move |_| {
        if deadline.expired() {
            tripped.set(true);
            return false;
        }
        true
    });
    callbacks.sideband_progress(move |_| {
        if deadline.expired() {
            tripped.set(true);
            return false;
        }
        true
    });
    callbacks
}

fn find_remote<'r>(repo: &'r Repository, name: &str) -> Result<git2::Remote<'r>, SyncError> {
    match repo.find_remote(name) {
        Ok(remote) => Ok(remote),
        Err(e) if matches!(e.code(), ErrorCode::NotFound | ErrorCode::InvalidSpec) => {
            Err(SyncError::NoRemote(name.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Force-fetch the remote notes ref into the tracking ref. The local notes
/// ref is never touched.
///
/// Returns `false` when the remote has no notes yet.
pub fn fetch_notes(
    repo: &Repository,
    remote_name: &str,
    deadline: Deadline,
) -> Result<bool, SyncError> {
    let mut remote = find_remote(repo, remote_name)?;
    deadline.check("fetch")?;
    let tripped = Cell::new(false);
    let refspec = format!("+{NOTES_REF}:{TRACKING_REF}");

    let result = {
        let mut fo = FetchOptions::new();
        fo.remote_callbacks(remote_callbacks(repo, deadline, &tripped));
        remote.fetch(&[refspec.as_str()], Some(&mut fo), None)
    };

    match result {
        Ok(()) => {}
        Err(_) if tripped.get() => return Err(deadline.timed_out("fetch")),
        Err(e) if is_missing_remote_ref(&e) => {
            tracing::debug!(remote = remote_name, "remote has no notes");
            return Ok(false);
        }
        Err(source) => {
            return Err(SyncError::Fetch {
                remote: remote_name.to_string(),
                source,
            });
        }
    }
    Ok(repo.refname_to_id(TRACKING_REF).is_ok())
}

fn is_missing_remote_ref(e: &git2::Error) -> bool {
    let msg = e.message();
    msg.contains("couldn't find remote ref") || msg.contains("could not find remote ref")
}

/// Push the local notes ref without force.
///
/// A rejection because the remote moved is [`SyncError::Diverged`]; the
/// caller recovers with pull, merge and another push.
pub fn push_notes(
    repo: &Repository,
    remote_name: &str,
    deadline: Deadline,
) -> Result<(), SyncError> {
    let mut remote = find_remote(repo, remote_name)?;
    deadline.check("push")?;
    let tripped = Cell::new(false);
    let push_error: RefCell<Option<String>> = RefCell::new(None);
    let refspec = format!("{NOTES_REF}:{NOTES_REF}");

    let result = {
        let mut callbacks = remote_callbacks(repo, deadline, &tripped);
        callbacks.push_update_reference(|_ref_name, status| {
            if let Some(msg) = status {
                *push_error.borrow_mut() = Some(msg.to_string());
            }
            Ok(())
        });
        callbacks.push_negotiation(|_updates| {
            if deadline.expired() {
                tripped.set(true);
                return Err(git2::Error::from_str("push deadline exceeded"));
            }
            Ok(())
        });
        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);
        remote.push(&[refspec.as_str()], Some(&mut push_options))
    };

    classify_push(
        remote_name,
        result,
        push_error.into_inner(),
        tripped.get().then(|| deadline.timed_out("push")),
    )
}

/// Map a push result onto the sync error taxonomy. A push that returned
/// `Ok` with no per-ref rejection updated the remote, so a deadline that
/// tripped along the way is not reported.
fn classify_push(
    remote_name: &str,
    result: Result<(), git2::Error>,
    rejection: Option<String>,
    timed_out: Option<SyncError>,
) -> Result<(), SyncError> {
    if let Err(e) = result {
        if let Some(timed_out) = timed_out {
            return Err(timed_out);
        }
        if e.code() == ErrorCode::NotFastForward || is_divergence_message(e.message()) {
            return Err(SyncError::Diverged {
                remote: remote_name.to_string(),
            });
        }
        return Err(SyncError::Push(e));
    }

    if let Some(message) = rejection {
        if is_divergence_message(&message) {
            return Err(SyncError::Diverged {
                remote: remote_name.to_string(),
            });
        }
        return Err(PushRejected { message }.into());
    }
    Ok(())
}

fn is_divergence_message(msg: &str) -> bool {
    msg.contains("non-fast-forward")
        || msg.contains("non-fastforward")
        || msg.contains("fetch first")
        || msg.contains("not present locally")
        || msg.contains("cannot lock ref")
        || msg.contains("failed to update ref")
}
