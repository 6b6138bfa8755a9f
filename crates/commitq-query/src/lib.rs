// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! commitq-query: jq-style filters over JSON values
//!
//! A thin adapter over the `jaq` engine. Queries are compiled once and then
//! evaluated against one [`serde_json::Value`] at a time, producing zero or
//! more results.

#![warn(missing_docs)]

//! # Example
//!
//! ```
//! use commitq_query::CompiledQuery;
//! use serde_json::json;
//!
//! let query = CompiledQuery::compile(".parentHashes[]").expect("compile");
//! let results = query
//!     .run(json!({"parentHashes": ["aaa", "bbb"]}))
//!     .expect("run");
//! assert_eq!(results, vec![json!("aaa"), json!("bbb")]);
//! ```

pub mod engine;
pub mod error;

pub use engine::CompiledQuery;
pub use error::QueryError;
