//! commitq: stream a remote repository's commit history as JSON
//!
//! This binary clones a remote over SSH into a temporary directory, walks
//! its history from the branch tip, and writes each commit (or each result of a jq
//! query over it) to standard output.

use std::io::{self, BufWriter, IsTerminal};

use anyhow::Context;
use clap::Parser;
use tracing::debug;

use commitq::OutputSink;
use commitq::config::Config;

fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Logs go to stderr so stdout carries only JSON
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_level().into()),
        )
        .init();

    config.validate().context("Invalid arguments")?;
    let options = config.run_options()?;

    let stdout = io::stdout();
    let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
    let format = config.output_format(stdout.is_terminal(), no_color);
    debug!(?format, url = %options.url, "Starting run");

    let sink = OutputSink::new(BufWriter::new(stdout.lock()), format);
    commitq::run(&options, sink)?;
    Ok(())
}
