// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for the commitq pipeline
//!
//! Every failure is fatal. [`Error::kind`] classifies a failure into one of
//! the eight kinds the pipeline distinguishes, and [`ErrorKind::failed_stage`]
//! names the state the run ends in.

use std::io;

use commitq_git::GitError;
use commitq_query::QueryError;
use thiserror::Error;

use crate::pipeline::Stage;

/// Errors that can end a run
#[derive(Debug, Error)]
pub enum Error {
    /// Authentication, clone, or history traversal failed
    #[error(transparent)]
    Git(#[from] GitError),

    /// The query failed to compile or evaluate
    #[error(transparent)]
    Query(#[from] QueryError),

    /// A value could not be serialized
    #[error("Serializing output: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The output stream rejected a write
    #[error("Writing output: {0}")]
    Write(#[source] io::Error),
}

impl Error {
    /// Classify this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Git(GitError::HomeDirectory { .. }) => ErrorKind::HomeResolution,
            Self::Git(GitError::Auth { .. }) => ErrorKind::Auth,
            Self::Git(GitError::Transport { .. }) => ErrorKind::Transport,
            Self::Git(GitError::Fetch(_)) => ErrorKind::Fetch,
            Self::Query(QueryError::Compile { .. }) => ErrorKind::Compile,
            Self::Query(QueryError::Runtime { .. }) => ErrorKind::QueryRuntime,
            Self::Query(QueryError::Conversion { .. }) | Self::Serialization(_) => {
                ErrorKind::Serialization
            }
            Self::Write(_) => ErrorKind::Write,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Self::Write(e.into())
        } else {
            Self::Serialization(e)
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Write(e)
    }
}

/// The kinds of failure a run can end with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The home directory needed for `~` expansion is unknown
    HomeResolution,
    /// The private key could not be loaded
    Auth,
    /// The remote could not be cloned
    Transport,
    /// History traversal failed mid-stream
    Fetch,
    /// The query did not compile
    Compile,
    /// The query produced an error value
    QueryRuntime,
    /// A value could not be serialized
    Serialization,
    /// Output could not be written
    Write,
}

impl ErrorKind {
    /// The terminal state a run reaches when it fails this way
    #[must_use]
    pub fn failed_stage(self) -> Stage {
        match self {
            Self::HomeResolution | Self::Auth => Stage::FailedAuth,
            Self::Transport => Stage::FailedClone,
            Self::Fetch => Stage::FailedFetch,
            Self::Compile => Stage::FailedCompile,
            Self::QueryRuntime => Stage::FailedQuery,
            Self::Serialization | Self::Write => Stage::FailedWrite,
        }
    }

    /// Short, stable name used in logs
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HomeResolution => "home_resolution",
            Self::Auth => "auth",
            Self::Transport => "transport",
            Self::Fetch => "fetch",
            Self::Compile => "compile",
            Self::QueryRuntime => "query_runtime",
            Self::Serialization => "serialization",
            Self::Write => "write",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
