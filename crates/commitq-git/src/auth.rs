// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! SSH private-key authentication
//!
//! The key file is checked eagerly so that a missing or malformed key is
//! reported before any network traffic happens. libgit2 itself only reads
//! the key when the remote asks for credentials.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::GitError;

/// User name offered to the remote when the URL does not carry one
pub const DEFAULT_SSH_USER: &str = "git";

/// Opaque credentials used when talking to the remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticator {
    private_key: PathBuf,
}

impl Authenticator {
    /// Load credentials from a private key file
    ///
    /// A leading `~` is expanded to the calling user's home directory.
    ///
    /// # Errors
    ///
    /// Returns `GitError::HomeDirectory` if `~` expansion is needed but no
    /// home directory is known, and `GitError::Auth` if the file cannot be
    /// read or does not contain a PEM-encoded private key.
    pub fn from_key_file(path: impl AsRef<Path>) -> Result<Self, GitError> {
        let private_key = expand_home(path.as_ref(), dirs::home_dir)?;

        let contents = fs::read_to_string(&private_key).map_err(|e| GitError::Auth {
            path: private_key.clone(),
            reason: e.to_string(),
        })?;

        if !looks_like_private_key(&contents) {
            return Err(GitError::Auth {
                path: private_key,
                reason: "file does not contain a PEM-encoded private key".to_string(),
            });
        }

        debug!(key = %private_key.display(), "Loaded private key");
        Ok(Self { private_key })
    }

    /// Path of the private key backing these credentials
    #[must_use]
    pub fn private_key(&self) -> &Path {
        &self.private_key
    }

    /// Build libgit2 credentials for a remote request
    ///
    /// # Errors
    ///
    /// Returns the libgit2 error if the key cannot be turned into credentials.
    pub fn credentials(&self, username_from_url: Option<&str>) -> Result<git2::Cred, git2::Error> {
        let user = username_from_url.unwrap_or(DEFAULT_SSH_USER);
        git2::Cred::ssh_key(user, None, &self.private_key, None)
    }
}

/// Expand a leading `~` component using the supplied home directory lookup
fn expand_home(
    path: &Path,
    home_dir: impl FnOnce() -> Option<PathBuf>,
) -> Result<PathBuf, GitError> {
    let Ok(rest) = path.strip_prefix("~") else {
        return Ok(path.to_path_buf());
    };

    let home = home_dir().ok_or_else(|| GitError::HomeDirectory {
        path: path.to_path_buf(),
    })?;
    Ok(home.join(rest))
}

fn looks_like_private_key(contents: &str) -> bool {
    contents.lines().any(|line| {
        let line = line.trim();
        line.starts_with("-----BEGIN ") && line.ends_with("PRIVATE KEY-----")
    })
}
