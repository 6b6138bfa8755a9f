//! commitq library
//!
//! This module exports the pipeline that backs the `commitq` binary for use
//! in integration tests and as a library.

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;

pub use error::{Error, ErrorKind};
pub use output::{ColorScheme, OutputFormat, OutputSink, PrettyConfig};
pub use pipeline::{Pipeline, QueryPipeline, RunOptions, RunSummary, Stage, run};
