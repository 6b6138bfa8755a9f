// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for commitq-query

use thiserror::Error;

/// Errors that can occur while compiling or evaluating a query
#[derive(Debug, Error)]
pub enum QueryError {
    /// The query text failed to parse or refers to undefined names
    #[error("Compiling query `{query}`: {}", reasons.join("; "))]
    Compile {
        /// The query text as supplied
        query: String,
        /// One entry per problem reported by the parser or compiler
        reasons: Vec<String>,
    },

    /// Evaluation produced an error value
    #[error("Evaluating query: {message}")]
    Runtime {
        /// The rendered error value
        message: String,
    },

    /// A result value has no JSON representation
    #[error("Converting query result {value} to JSON: {source}")]
    Conversion {
        /// The engine's rendering of the offending value
        value: String,
        /// Why it could not be read back as JSON
        #[source]
        source: serde_json::Error,
    },
}
