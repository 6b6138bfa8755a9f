// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Pipeline orchestration
//!
//! A run moves through a fixed sequence of stages:
//!
//! ```text
//! Init -> Authenticated -> Cloned -> Streaming -> Done
//! ```
//!
//! Any error ends the run in the matching `Failed*` stage. Nothing is
//! retried and output already written is left in place.

use std::io::Write;
use std::path::PathBuf;

use commitq_git::{Authenticator, CloneOptions, CommitRecord, GitError, RemoteRepo};
use commitq_query::CompiledQuery;
use tracing::{debug, info};

use crate::error::Error;
use crate::output::OutputSink;

/// Where a run is, or where it stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Nothing has happened yet
    Init,
    /// The private key was loaded
    Authenticated,
    /// The remote was cloned
    Cloned,
    /// Records are flowing to the sink
    Streaming,
    /// Every record was processed
    Done,
    /// The key could not be loaded
    FailedAuth,
    /// The clone failed
    FailedClone,
    /// History traversal failed
    FailedFetch,
    /// The query did not compile
    FailedCompile,
    /// The query produced an error value
    FailedQuery,
    /// Output could not be serialized or written
    FailedWrite,
}

impl Stage {
    /// Whether this is a failure state
    #[must_use]
    pub fn is_failed(self) -> bool {
        matches!(
            self,
            Self::FailedAuth
                | Self::FailedClone
                | Self::FailedFetch
                | Self::FailedCompile
                | Self::FailedQuery
                | Self::FailedWrite
        )
    }

    /// Whether the run has ended, successfully or not
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::Done || self.is_failed()
    }
}

/// Per-record transformation applied before output
#[derive(Debug)]
pub enum QueryPipeline {
    /// Emit each record unchanged
    PassThrough,
    /// Emit every result of a compiled query
    Query(CompiledQuery),
}

impl QueryPipeline {
    /// Select the mode for an optional query expression
    ///
    /// # Errors
    ///
    /// Returns `Error::Query` if the expression does not compile.
    pub fn compile(query: Option<&str>) -> Result<Self, Error> {
        match query {
            None => Ok(Self::PassThrough),
            Some(text) => Ok(Self::Query(CompiledQuery::compile(text)?)),
        }
    }

    /// Apply this pipeline to one record and emit the results
    ///
    /// Returns the number of values written. In query mode all results for
    /// the record are computed before any is written.
    ///
    /// # Errors
    ///
    /// Returns the first query or output error.
    pub fn apply<W: Write>(
        &self,
        record: &CommitRecord,
        sink: &mut OutputSink<W>,
    ) -> Result<usize, Error> {
        match self {
            Self::PassThrough => {
                sink.emit(record)?;
                Ok(1)
            }
            Self::Query(query) => {
                let results = query.run(record.to_value())?;
                for value in &results {
                    sink.emit(value)?;
                }
                Ok(results.len())
            }
        }
    }
}

/// Inputs for one run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Remote repository URL
    pub url: String,
    /// Optional query expression
    pub query: Option<String>,
    /// Private key file; a leading `~` is expanded
    pub key_file: PathBuf,
    /// Clone settings
    pub clone: CloneOptions,
}

/// Counts reported when a run completes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Records read from history
    pub commits: usize,
    /// Values written to the sink
    pub emitted: usize,
}

/// Drives one run and tracks its stage
#[derive(Debug)]
pub struct Pipeline<W: Write> {
    sink: OutputSink<W>,
    stage: Stage,
}

impl<W: Write> Pipeline<W> {
    /// Create a pipeline writing to `sink`
    pub fn new(sink: OutputSink<W>) -> Self {
        Self {
            sink,
            stage: Stage::Init,
        }
    }

    /// The current stage
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Consume the pipeline and return its sink
    pub fn into_sink(self) -> OutputSink<W> {
        self.sink
    }

    /// Authenticate, clone, and stream the remote's history
    ///
    /// The query is compiled before anything touches the network.
    ///
    /// # Errors
    ///
    /// Returns the first error from any stage; the pipeline is left in the
    /// matching failure stage.
    pub fn run(&mut self, options: &RunOptions) -> Result<RunSummary, Error> {
        let result = self.run_inner(options);
        self.settle(result)
    }

    fn run_inner(&mut self, options: &RunOptions) -> Result<RunSummary, Error> {
        let query = QueryPipeline::compile(options.query.as_deref())?;

        let auth = Authenticator::from_key_file(&options.key_file)?;
        self.advance(Stage::Authenticated);

        let remote = RemoteRepo::clone(&options.url, &auth, &options.clone)?;
        self.advance(Stage::Cloned);

        let records = remote.records()?;
        self.stream_inner(&query, records)
    }

    /// Feed already-normalized records through the query and sink
    ///
    /// # Errors
    ///
    /// Returns the first error yielded by `records` or raised while
    /// querying or writing.
    pub fn stream<I>(&mut self, query: &QueryPipeline, records: I) -> Result<RunSummary, Error>
    where
        I: IntoIterator<Item = Result<CommitRecord, GitError>>,
    {
        let result = self.stream_inner(query, records);
        self.settle(result)
    }

    fn stream_inner<I>(&mut self, query: &QueryPipeline, records: I) -> Result<RunSummary, Error>
    where
        I: IntoIterator<Item = Result<CommitRecord, GitError>>,
    {
        self.advance(Stage::Streaming);

        let mut summary = RunSummary::default();
        for record in records {
            let record = record?;
            summary.commits += 1;
            summary.emitted += query.apply(&record, &mut self.sink)?;
        }

        self.advance(Stage::Done);
        Ok(summary)
    }

    fn advance(&mut self, to: Stage) {
        debug!(from = ?self.stage, to = ?to, "Stage transition");
        self.stage = to;
    }

    fn settle(&mut self, result: Result<RunSummary, Error>) -> Result<RunSummary, Error> {
        match &result {
            Ok(summary) => {
                info!(
                    commits = summary.commits,
                    emitted = summary.emitted,
                    "Run complete"
                );
            }
            Err(e) => {
                let kind = e.kind();
                self.advance(kind.failed_stage());
                debug!(kind = %kind, error = %e, "Run failed");
            }
        }
        result
    }
}

/// Run the pipeline once, writing to `sink`
///
/// # Errors
///
/// Returns the first error from any stage.
pub fn run<W: Write>(options: &RunOptions, sink: OutputSink<W>) -> Result<RunSummary, Error> {
    Pipeline::new(sink).run(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::output::OutputFormat;
    use commitq_git::Signature;

    fn record(hash_byte: char, message: &str, parents: Vec<String>) -> CommitRecord {
        let when = chrono::DateTime::parse_from_rfc3339("2026-01-17T02:33:06+00:00").unwrap();
        let sig = Signature {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            time: when,
        };
        CommitRecord {
            hash: hash_byte.to_string().repeat(40),
            author: sig.clone(),
            committer: sig,
            pgp_signature: String::new(),
            message: message.to_string(),
            tree_hash: "4b825dc642cb6eb9a060e54bf8d69288fbee4904".to_string(),
            parent_hashes: parents,
        }
    }

    fn pipeline() -> Pipeline<Vec<u8>> {
        Pipeline::new(OutputSink::new(Vec::new(), OutputFormat::Lines))
    }

    fn output(pipeline: Pipeline<Vec<u8>>) -> String {
        String::from_utf8(pipeline.into_sink().into_inner()).unwrap()
    }

    #[test]
    fn test_stage_terminal_states() {
        assert!(!Stage::Init.is_terminal());
        assert!(!Stage::Streaming.is_terminal());
        assert!(Stage::Done.is_terminal());
        assert!(!Stage::Done.is_failed());
        assert!(Stage::FailedQuery.is_terminal());
    }

    #[test]
    fn test_compile_selects_mode() {
        assert!(matches!(QueryPipeline::compile(None), Ok(QueryPipeline::PassThrough)));
        assert!(matches!(QueryPipeline::compile(Some(".hash")), Ok(QueryPipeline::Query(_))));
        let err = QueryPipeline::compile(Some(".[")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Compile);
    }

    #[test]
    fn test_pass_through_emits_each_record() {
        let mut p = pipeline();
        let records = vec![
            Ok(record('b', "child\n", vec!["a".repeat(40)])),
            Ok(record('a', "root\n", vec![])),
        ];
        let summary = p.stream(&QueryPipeline::PassThrough, records).unwrap();
        assert_eq!(summary, RunSummary { commits: 2, emitted: 2 });
        assert_eq!(p.stage(), Stage::Done);

        let out = output(p);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"message\":\"child\\n\""));
        assert!(lines[1].contains("\"parentHashes\":[]"));
    }

    #[test]
    fn test_query_fan_out_and_filtering() {
        let mut p = pipeline();
        let query = QueryPipeline::compile(Some(".parentHashes[]")).unwrap();
        let records = vec![
            Ok(record('c', "merge\n", vec!["a".repeat(40), "b".repeat(40)])),
            Ok(record('a', "root\n", vec![])),
        ];
        let summary = p.stream(&query, records).unwrap();
        assert_eq!(summary, RunSummary { commits: 2, emitted: 2 });
        assert_eq!(
            output(p),
            format!("\"{}\"\n\"{}\"\n", "a".repeat(40), "b".repeat(40))
        );
    }

    #[test]
    fn test_fetch_error_stops_stream() {
        let mut p = pipeline();
        let records = vec![
            Ok(record('b', "first\n", vec![])),
            Err(GitError::Fetch(git2::Error::from_str("object not found"))),
            Ok(record('a', "never\n", vec![])),
        ];
        let err = p.stream(&QueryPipeline::PassThrough, records).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fetch);
        assert_eq!(p.stage(), Stage::FailedFetch);
        let out = output(p);
        assert!(out.contains("first"));
        assert!(!out.contains("never"));
    }

    #[test]
    fn test_query_error_keeps_earlier_output() {
        let mut p = pipeline();
        let query =
            QueryPipeline::compile(Some(r#"if .message == "bad\n" then error("stop") else .message end"#))
                .unwrap();
        let records = vec![
            Ok(record('c', "one\n", vec![])),
            Ok(record('b', "bad\n", vec![])),
            Ok(record('a', "three\n", vec![])),
        ];
        let err = p.stream(&query, records).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::QueryRuntime);
        assert_eq!(p.stage(), Stage::FailedQuery);
        assert_eq!(output(p), "\"one\\n\"\n");
    }

    #[test]
    fn test_write_failure_sets_failed_write() {
        struct Closed;
        impl Write for Closed {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::ErrorKind::BrokenPipe.into())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut p = Pipeline::new(OutputSink::new(Closed, OutputFormat::Plain));
        let err = p
            .stream(&QueryPipeline::PassThrough, vec![Ok(record('a', "x\n", vec![]))])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Write);
        assert_eq!(p.stage(), Stage::FailedWrite);
    }

    #[test]
    fn test_empty_history_completes() {
        let mut p = pipeline();
        let summary = p.stream(&QueryPipeline::PassThrough, Vec::new()).unwrap();
        assert_eq!(summary, RunSummary::default());
        assert_eq!(p.stage(), Stage::Done);
        assert!(output(p).is_empty());
    }

    #[test]
    fn test_bad_query_fails_before_auth() {
        let options = RunOptions {
            url: "ssh://example.invalid/repo.git".to_string(),
            query: Some(".[".to_string()),
            key_file: PathBuf::from("/definitely/not/a/key"),
            clone: CloneOptions::default(),
        };
        let mut p = pipeline();
        let err = p.run(&options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Compile);
        assert_eq!(p.stage(), Stage::FailedCompile);
    }

    #[test]
    fn test_missing_key_fails_auth() {
        let options = RunOptions {
            url: "ssh://example.invalid/repo.git".to_string(),
            query: None,
            key_file: PathBuf::from("/definitely/not/a/key"),
            clone: CloneOptions::default(),
        };
        let mut p = pipeline();
        let err = p.run(&options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert_eq!(p.stage(), Stage::FailedAuth);
    }
}
