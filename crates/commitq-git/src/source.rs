// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Remote history retrieval
//!
//! This module clones a remote repository with the `git2` crate into a
//! temporary bare repository and walks its history one commit at a time.
//! Nothing outlives the [`RemoteRepo`] handle: the scratch directory is
//! removed when it drops.

use std::cell::Cell;
use std::collections::HashSet;
use std::io::{self, Write};
use std::iter::FusedIterator;

use git2::build::RepoBuilder;
use git2::{CredentialType, ErrorCode, FetchOptions, Oid, RemoteCallbacks, Repository};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::auth::{Authenticator, DEFAULT_SSH_USER};
use crate::error::GitError;
use crate::record::CommitRecord;

/// Configuration for cloning a remote
#[derive(Debug, Clone, Default)]
pub struct CloneOptions {
    /// Copy the remote's progress messages to stderr
    pub progress: bool,
}

impl CloneOptions {
    /// Create options with progress reporting enabled
    #[must_use]
    pub fn with_progress(mut self) -> Self {
        self.progress = true;
        self
    }
}

/// A transient clone of a remote repository
pub struct RemoteRepo {
    // Declared before `dir` so the repository closes before its files go.
    repo: Repository,
    url: String,
    dir: TempDir,
}

impl RemoteRepo {
    /// Clone the repository at `url` using the given credentials
    ///
    /// # Errors
    ///
    /// Returns `GitError::Transport` if the scratch directory cannot be
    /// created or the clone fails (network, rejected credentials, bad URL).
    pub fn clone(url: &str, auth: &Authenticator, options: &CloneOptions) -> Result<Self, GitError> {
        let dir = tempfile::Builder::new()
            .prefix("commitq-")
            .tempdir()
            .map_err(|e| GitError::transport(url, format!("creating scratch directory: {e}")))?;

        let key_attempts = Cell::new(0u32);
        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(|_url, username_from_url, allowed| {
            if allowed.contains(CredentialType::SSH_KEY) {
                key_attempts.set(key_attempts.get() + 1);
                if key_attempts.get() > 1 {
                    return Err(git2::Error::from_str(
                        "remote rejected the private key",
                    ));
                }
                auth.credentials(username_from_url)
            } else if allowed.contains(CredentialType::USERNAME) {
                git2::Cred::username(username_from_url.unwrap_or(DEFAULT_SSH_USER))
            } else {
                Err(git2::Error::from_str(
                    "remote requires credentials other than an SSH key",
                ))
            }
        });

        if options.progress {
            callbacks.sideband_progress(|data| {
                let mut stderr = io::stderr();
                stderr.write_all(data).is_ok() && stderr.flush().is_ok()
            });
            callbacks.transfer_progress(|stats| {
                debug!(
                    received = stats.received_objects(),
                    total = stats.total_objects(),
                    bytes = stats.received_bytes(),
                    "Transfer progress"
                );
                true
            });
        }

        let mut fetch = FetchOptions::new();
        fetch.remote_callbacks(callbacks);

        info!(url, "Cloning repository");
        let repo = RepoBuilder::new()
            .bare(true)
            .fetch_options(fetch)
            .clone(url, dir.path())
            .map_err(|e| GitError::transport(url, e.message()))?;
        debug!(path = %dir.path().display(), "Clone complete");

        Ok(Self {
            repo,
            url: url.to_string(),
            dir,
        })
    }

    /// The URL this repository was cloned from
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Location of the transient clone
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }

    /// Get the hash of the default branch tip, if there is one
    ///
    /// # Errors
    ///
    /// Returns `GitError::Fetch` if HEAD exists but cannot be resolved.
    pub fn head_hash(&self) -> Result<Option<String>, GitError> {
        Ok(self.head_oid()?.map(|oid| oid.to_string()))
    }

    fn head_oid(&self) -> Result<Option<Oid>, GitError> {
        match self.repo.head() {
            Ok(head) => Ok(head.target()),
            Err(e) if is_unborn(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Walk history from the default branch tip
    ///
    /// The walk is depth-first and follows each commit's first parent
    /// before its other parents. A commit reachable along several paths is
    /// yielded once, where it is first reached. An empty remote yields an
    /// empty log.
    ///
    /// # Errors
    ///
    /// Returns `GitError::Fetch` if HEAD cannot be resolved.
    pub fn log(&self) -> Result<CommitLog<'_>, GitError> {
        let Some(tip) = self.head_oid()? else {
            warn!(url = %self.url, "Remote default branch has no commits");
            return Ok(CommitLog::new(&self.repo, None));
        };
        Ok(CommitLog::new(&self.repo, Some(tip)))
    }

    /// Walk history and normalize each commit
    ///
    /// # Errors
    ///
    /// Returns `GitError::Fetch` if the walk cannot be started.
    pub fn records(
        &self,
    ) -> Result<impl Iterator<Item = Result<CommitRecord, GitError>> + '_, GitError> {
        Ok(self
            .log()?
            .map(|commit| commit.map(|c| CommitRecord::from(&c))))
    }
}

fn is_unborn(e: &git2::Error) -> bool {
    matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound)
}

/// Single-pass iterator over a repository's history
///
/// Pre-order depth-first traversal: a commit is yielded before its
/// parents, and its first parent's history is exhausted before the next
/// parent is visited. After the first error the iterator is exhausted; a
/// failed walk is never resumed.
pub struct CommitLog<'repo> {
    repo: &'repo Repository,
    pending: Vec<Oid>,
    seen: HashSet<Oid>,
}

impl<'repo> CommitLog<'repo> {
    fn new(repo: &'repo Repository, tip: Option<Oid>) -> Self {
        Self {
            repo,
            pending: tip.into_iter().collect(),
            seen: HashSet::new(),
        }
    }
}

impl<'repo> Iterator for CommitLog<'repo> {
    type Item = Result<git2::Commit<'repo>, GitError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let oid = self.pending.pop()?;
            if !self.seen.insert(oid) {
                continue;
            }

            return match self.repo.find_commit(oid) {
                Ok(commit) => {
                    // Reversed so the first parent is popped next
                    let parents: Vec<Oid> = commit.parent_ids().collect();
                    self.pending.extend(
                        parents.into_iter().rev().filter(|p| !self.seen.contains(p)),
                    );
                    Some(Ok(commit))
                }
                Err(e) => {
                    self.pending.clear();
                    Some(Err(GitError::Fetch(e)))
                }
            };
        }
    }
}

impl FusedIterator for CommitLog<'_> {}
