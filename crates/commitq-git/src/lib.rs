// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! commitq-git: remote history retrieval for commitq
//!
//! This library crate clones a remote repository into a throwaway location,
//! walks its history lazily, and normalizes each commit into a
//! serialization-stable [`CommitRecord`].

#![warn(missing_docs)]

//! # Example
//!
//! ```no_run
//! use commitq_git::{Authenticator, CloneOptions, RemoteRepo};
//!
//! let auth = Authenticator::from_key_file("~/.ssh/id_rsa").expect("load key");
//! let repo = RemoteRepo::clone("git@github.com:owner/repo.git", &auth, &CloneOptions::default())
//!     .expect("clone repo");
//!
//! for record in repo.records().expect("walk history") {
//!     let record = record.expect("read commit");
//!     println!("{} - {}", record.short_hash(), record.subject());
//! }
//! ```

pub mod auth;
pub mod error;
pub mod record;
pub mod source;

pub use auth::Authenticator;
pub use error::GitError;
pub use record::{CommitRecord, Signature};
pub use source::{CloneOptions, CommitLog, RemoteRepo};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::auth::Authenticator;
    pub use crate::error::GitError;
    pub use crate::record::{CommitRecord, Signature};
    pub use crate::source::{CloneOptions, RemoteRepo};
}
