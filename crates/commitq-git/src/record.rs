// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Canonical commit records
//!
//! [`CommitRecord`] is the serialization-stable projection of a
//! `git2::Commit`. Every hash is rendered as lowercase hex and optional
//! native data is flattened to empty values, so equal commits always
//! serialize to identical bytes.

use chrono::{DateTime, FixedOffset, Offset, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Identity and timestamp of an author or committer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Name as recorded in the commit
    pub name: String,
    /// Email as recorded in the commit
    pub email: String,
    /// Timestamp in the signer's own UTC offset
    #[serde(serialize_with = "serialize_time")]
    pub time: DateTime<FixedOffset>,
}

impl Signature {
    /// Explicit projection into a generic JSON value
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("name".to_string(), Value::String(self.name.clone()));
        obj.insert("email".to_string(), Value::String(self.email.clone()));
        obj.insert("time".to_string(), Value::String(rfc3339(&self.time)));
        Value::Object(obj)
    }
}

impl From<&git2::Signature<'_>> for Signature {
    fn from(sig: &git2::Signature<'_>) -> Self {
        Self {
            name: String::from_utf8_lossy(sig.name_bytes()).into_owned(),
            email: String::from_utf8_lossy(sig.email_bytes()).into_owned(),
            time: to_datetime(sig.when()),
        }
    }
}

/// A normalized git commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    /// The commit hash (lowercase hex)
    pub hash: String,
    /// Who wrote the change
    pub author: Signature,
    /// Who recorded the commit
    pub committer: Signature,
    /// Armored signature, empty when the commit is unsigned
    pub pgp_signature: String,
    /// Raw commit message, trailing newline included
    pub message: String,
    /// Hash of the root tree (lowercase hex)
    pub tree_hash: String,
    /// Parent hashes in recorded order; empty for a root commit
    pub parent_hashes: Vec<String>,
}

impl CommitRecord {
    /// Validate that a hash is a 40-character hex string
    #[must_use]
    pub fn is_valid_hash(hash: &str) -> bool {
        hash.len() == 40 && hash.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Get the short hash (first 7 characters)
    #[must_use]
    pub fn short_hash(&self) -> &str {
        &self.hash[..7.min(self.hash.len())]
    }

    /// Check if this is a merge commit (has multiple parents)
    #[must_use]
    pub fn is_merge(&self) -> bool {
        self.parent_hashes.len() > 1
    }

    /// Check if this is a root commit (has no parents)
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_hashes.is_empty()
    }

    /// Get the first line of the commit message (subject)
    #[must_use]
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// Project the record into a generic JSON value
    ///
    /// Field names and shapes match the serde representation exactly, so
    /// a query sees the same document that pass-through mode prints.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let parents = self
            .parent_hashes
            .iter()
            .map(|p| Value::String(p.clone()))
            .collect();

        let mut obj = Map::new();
        obj.insert("hash".to_string(), Value::String(self.hash.clone()));
        obj.insert("author".to_string(), self.author.to_value());
        obj.insert("committer".to_string(), self.committer.to_value());
        obj.insert(
            "pgpSignature".to_string(),
            Value::String(self.pgp_signature.clone()),
        );
        obj.insert("message".to_string(), Value::String(self.message.clone()));
        obj.insert("treeHash".to_string(), Value::String(self.tree_hash.clone()));
        obj.insert("parentHashes".to_string(), Value::Array(parents));
        Value::Object(obj)
    }
}

impl From<&git2::Commit<'_>> for CommitRecord {
    fn from(commit: &git2::Commit<'_>) -> Self {
        let pgp_signature = commit
            .header_field_bytes("gpgsig")
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
            .unwrap_or_default();

        Self {
            hash: commit.id().to_string(),
            author: Signature::from(&commit.author()),
            committer: Signature::from(&commit.committer()),
            pgp_signature,
            message: String::from_utf8_lossy(commit.message_raw_bytes()).into_owned(),
            tree_hash: commit.tree_id().to_string(),
            parent_hashes: commit.parent_ids().map(|id| id.to_string()).collect(),
        }
    }
}

/// Convert a libgit2 timestamp, keeping its offset
///
/// Out-of-range values fall back to the Unix epoch and UTC so the
/// conversion never fails.
pub(crate) fn to_datetime(time: git2::Time) -> DateTime<FixedOffset> {
    let offset = time
        .offset_minutes()
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix());
    DateTime::<Utc>::from_timestamp(time.seconds(), 0)
        .unwrap_or_default()
        .with_timezone(&offset)
}

/// RFC 3339 with an explicit offset, `+00:00` rather than `Z`
fn rfc3339(time: &DateTime<FixedOffset>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

fn serialize_time<S: Serializer>(time: &DateTime<FixedOffset>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&rfc3339(time))
}
