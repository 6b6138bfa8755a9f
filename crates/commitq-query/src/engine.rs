// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Query compilation and evaluation
//!
//! Queries use jq syntax with the jaq standard library. Evaluation of one
//! input runs to completion before returning, so a caller never sees part
//! of a failed input's results.

use std::fmt;

use jaq_core::load::{self, Arena, File, Loader};
use jaq_core::{Compiler, Ctx, Native, RcIter};
use jaq_json::Val;
use serde_json::Value;
use tracing::debug;

use crate::error::QueryError;

/// Longest piece of query text quoted back in a lexer complaint
const SNIPPET_LEN: usize = 16;

/// A query compiled once and reusable for any number of inputs
pub struct CompiledQuery {
    text: String,
    filter: jaq_core::Filter<Native<Val>>,
}

impl fmt::Debug for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledQuery")
            .field("text", &self.text)
            .finish_non_exhaustive()
    }
}

impl CompiledQuery {
    /// Parse and compile a query
    ///
    /// # Errors
    ///
    /// Returns `QueryError::Compile` if the text does not parse or names an
    /// undefined filter, variable, or label.
    pub fn compile(text: &str) -> Result<Self, QueryError> {
        let loader = Loader::new(jaq_std::defs().chain(jaq_json::defs()));
        let arena = Arena::default();
        let program = File {
            code: text,
            path: (),
        };

        let modules = loader
            .load(&arena, program)
            .map_err(|errs| compile_error(text, load_reasons(errs)))?;

        let filter = Compiler::default()
            .with_funs(jaq_std::funs().chain(jaq_json::funs()))
            .compile(modules)
            .map_err(|errs| {
                let reasons = errs
                    .into_iter()
                    .flat_map(|(_file, undefined)| undefined)
                    .map(|(name, kind)| format!("undefined {} `{}`", kind.as_str(), name))
                    .collect();
                compile_error(text, reasons)
            })?;

        debug!(query = text, "Compiled query");
        Ok(Self {
            text: text.to_string(),
            filter,
        })
    }

    /// The query text this was compiled from
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Evaluate the query against one input
    ///
    /// Returns every result in the order the engine produces them; an empty
    /// vector means the input was filtered out.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::Runtime` on the first error value the query
    /// produces, and `QueryError::Conversion` if a result cannot be
    /// represented as JSON. Results after the failure are not evaluated.
    pub fn run(&self, input: Value) -> Result<Vec<Value>, QueryError> {
        let inputs = RcIter::new(core::iter::empty());
        let outputs = self.filter.run((Ctx::new([], &inputs), Val::from(input)));

        let mut results = Vec::new();
        for output in outputs {
            let val = output.map_err(|e| QueryError::Runtime {
                message: e.to_string(),
            })?;
            results.push(to_json(&val)?);
        }
        Ok(results)
    }
}

/// Read an engine value back through its JSON rendering
fn to_json(val: &Val) -> Result<Value, QueryError> {
    let rendered = val.to_string();
    serde_json::from_str(&rendered).map_err(|source| QueryError::Conversion {
        value: rendered,
        source,
    })
}

fn compile_error(text: &str, reasons: Vec<String>) -> QueryError {
    QueryError::Compile {
        query: text.to_string(),
        reasons,
    }
}

fn load_reasons(errs: load::Errors<&str, ()>) -> Vec<String> {
    errs.into_iter()
        .flat_map(|(_file, err)| match err {
            load::Error::Io(_) => vec!["could not load module".to_string()],
            load::Error::Lex(errs) => errs
                .into_iter()
                .map(|(expected, found)| {
                    format!("expected {} near `{}`", expected.as_str(), snippet(found))
                })
                .collect(),
            load::Error::Parse(errs) => errs
                .into_iter()
                .map(|(expected, _found)| format!("expected {}", expected.as_str()))
                .collect(),
        })
        .collect()
}

fn snippet(found: &str) -> String {
    found.chars().take(SNIPPET_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use similar_asserts::assert_eq;

    fn commit_value(message: &str, parents: &[&str]) -> Value {
        json!({
            "hash": "1945ab9c752534e733c38ba0109dc3b741f0a6eb",
            "author": {"name": "A", "email": "a@example.com", "time": "2026-01-17T02:33:06+00:00"},
            "committer": {"name": "A", "email": "a@example.com", "time": "2026-01-17T02:33:06+00:00"},
            "pgpSignature": "",
            "message": message,
            "treeHash": "4b825dc642cb6eb9a060e54bf8d69288fbee4904",
            "parentHashes": parents,
        })
    }

    #[test]
    fn test_identity_returns_input() {
        let query = CompiledQuery::compile(".").expect("compile");
        let input = commit_value("init\n", &[]);
        assert_eq!(query.run(input.clone()).expect("run"), vec![input]);
    }

    #[test]
    fn test_select_filters_out_non_matching() {
        let query = CompiledQuery::compile(r#"select(.message | contains("fix"))"#).expect("compile");
        assert!(query.run(commit_value("init\n", &[])).expect("run").is_empty());
        assert_eq!(query.run(commit_value("fix: bug\n", &[])).expect("run").len(), 1);
    }

    #[test]
    fn test_fan_out_preserves_order() {
        let query = CompiledQuery::compile(".parentHashes[]").expect("compile");
        let results = query
            .run(commit_value("merge\n", &["aaa", "bbb", "ccc"]))
            .expect("run");
        assert_eq!(results, vec![json!("aaa"), json!("bbb"), json!("ccc")]);
    }

    #[test]
    fn test_object_construction() {
        let query = CompiledQuery::compile("{hash, author: .author.name}").expect("compile");
        let results = query.run(commit_value("init\n", &[])).expect("run");
        assert_eq!(
            results,
            vec![json!({"hash": "1945ab9c752534e733c38ba0109dc3b741f0a6eb", "author": "A"})]
        );
    }

    #[test]
    fn test_numbers_and_null_convert() {
        let query = CompiledQuery::compile(".parentHashes | length, 1.5, null, true").expect("compile");
        let results = query.run(commit_value("m\n", &["a", "b"])).expect("run");
        assert_eq!(results, vec![json!(2), json!(1.5), json!(null), json!(true)]);
    }

    #[test]
    fn test_escaped_strings_convert() {
        let query = CompiledQuery::compile(".message").expect("compile");
        let message = "line one\nline \"two\"\ttabbed\\";
        let results = query.run(commit_value(message, &[])).expect("run");
        assert_eq!(results, vec![json!(message)]);
    }

    #[test]
    fn test_error_value_is_runtime_error() {
        let query = CompiledQuery::compile(r#"error("boom")"#).expect("compile");
        match query.run(json!({})) {
            Err(QueryError::Runtime { message }) => assert!(message.contains("boom"), "{message}"),
            other => panic!("Expected Runtime error, got {other:?}"),
        }
    }

    #[test]
    fn test_type_error_is_runtime_error() {
        let query = CompiledQuery::compile(".message + 1").expect("compile");
        let result = query.run(commit_value("init\n", &[]));
        assert!(matches!(result, Err(QueryError::Runtime { .. })));
    }

    #[test]
    fn test_error_discards_earlier_results_of_same_input() {
        let query = CompiledQuery::compile(r#"1, error("late"), 2"#).expect("compile");
        assert!(matches!(query.run(json!(null)), Err(QueryError::Runtime { .. })));
    }

    #[test]
    fn test_syntax_error_is_compile_error() {
        match CompiledQuery::compile(".[") {
            Err(QueryError::Compile { query, reasons }) => {
                assert_eq!(query, ".[");
                assert!(!reasons.is_empty());
            }
            other => panic!("Expected Compile error, got {other:?}"),
        }
    }

    #[test]
    fn test_undefined_filter_is_compile_error() {
        match CompiledQuery::compile("no_such_filter_xyz") {
            Err(QueryError::Compile { reasons, .. }) => {
                assert!(
                    reasons.iter().any(|r| r.contains("no_such_filter_xyz")),
                    "{reasons:?}"
                );
            }
            other => panic!("Expected Compile error, got {other:?}"),
        }
    }

    #[test]
    fn test_compiled_query_is_reusable() {
        let query = CompiledQuery::compile(".message").expect("compile");
        for message in ["a", "b", "c"] {
            assert_eq!(
                query.run(commit_value(message, &[])).expect("run"),
                vec![json!(message)]
            );
        }
        assert_eq!(query.text(), ".message");
    }

    #[test]
    fn test_snippet_truncates() {
        assert_eq!(snippet("abcdefghijklmnopqrstuvwxyz"), "abcdefghijklmnop");
        assert_eq!(snippet("ab"), "ab");
    }
}
