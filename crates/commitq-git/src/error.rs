// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for commitq-git

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while authenticating, cloning, or walking history
#[derive(Debug, Error)]
pub enum GitError {
    /// The calling user's home directory could not be determined
    #[error("Error loading home directory to expand {path}")]
    HomeDirectory {
        /// The path that needed `~` expansion
        path: PathBuf,
    },

    /// The private key file is missing, unreadable, or not a private key
    #[error("Retrieving public keys from private key file {}: {reason}", path.display())]
    Auth {
        /// The key file that was examined
        path: PathBuf,
        /// Why the key could not be used
        reason: String,
    },

    /// The repository could not be cloned
    #[error("Cloning repo {url}: {reason}")]
    Transport {
        /// The remote URL
        url: String,
        /// Description of the transport failure
        reason: String,
    },

    /// History traversal failed after a successful clone
    #[error("Fetching log: {0}")]
    Fetch(#[from] git2::Error),
}

impl GitError {
    pub(crate) fn transport(url: &str, reason: impl ToString) -> Self {
        Self::Transport {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}
