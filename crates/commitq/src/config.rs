//! Configuration for the commitq command line
//!
//! This module provides the argument parser and the translation from
//! command-line options to pipeline settings: run options, output layout,
//! and log level.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use commitq_git::CloneOptions;

use crate::output::{OutputFormat, PrettyConfig};
use crate::pipeline::RunOptions;

/// Default private key location
pub const DEFAULT_KEY_FILE: &str = "~/.ssh/id_rsa";

/// commitq - stream a remote repository's commit history as JSON
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "commitq")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Remote repository URL
    #[arg(value_name = "REPO", conflicts_with = "repo")]
    pub repo_arg: Option<String>,

    /// Remote repository URL (alternative to the positional argument)
    #[arg(short, long)]
    pub repo: Option<String>,

    /// jq expression applied to each commit record
    ///
    /// Without a query every commit is written as compact JSON. With one,
    /// each result is pretty-printed on its own.
    #[arg(short, long)]
    pub query: Option<String>,

    /// SSH private key used to authenticate with the remote
    ///
    /// A leading `~` is expanded to the home directory.
    /// Defaults to ~/.ssh/id_rsa.
    #[arg(short, long, env = "COMMITQ_KEY_FILE")]
    pub key_file: Option<PathBuf>,

    /// Write query results as compact JSON, one per line
    #[arg(short, long, default_value = "false")]
    pub compact: bool,

    /// Spaces of indentation for query results (0 implies --compact)
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(0..=7))]
    pub indent: u8,

    /// When to colorize query results
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Enable verbose logging (debug level)
    ///
    /// Logs are written to stderr so they never mix with JSON output.
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - only warnings and errors, no clone progress
    #[arg(long, default_value = "false")]
    pub quiet: bool,
}

/// Colorization policy
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Color when writing to a terminal and `NO_COLOR` is unset
    #[default]
    Auto,
    /// Always color
    Always,
    /// Never color
    Never,
}

impl ColorChoice {
    /// Resolve the policy against the output stream
    #[must_use]
    pub fn enabled(self, is_terminal: bool, no_color: bool) -> bool {
        match self {
            Self::Auto => is_terminal && !no_color,
            Self::Always => true,
            Self::Never => false,
        }
    }
}

impl Config {
    /// The repository URL from whichever form was given
    #[must_use]
    pub fn repo_url(&self) -> Option<&str> {
        self.repo_arg.as_deref().or(self.repo.as_deref())
    }

    /// Get the key file path, using the default if not specified
    #[must_use]
    pub fn key_file_path(&self) -> PathBuf {
        self.key_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_KEY_FILE))
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No repository was given, or it was given both ways
    /// - The query is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        match (&self.repo_arg, &self.repo) {
            (None, None) => return Err(ConfigError::MissingRepo),
            (Some(_), Some(_)) => return Err(ConfigError::AmbiguousRepo),
            _ => {}
        }

        if self.repo_url().is_some_and(|url| url.trim().is_empty()) {
            return Err(ConfigError::MissingRepo);
        }

        if self.query.as_deref().is_some_and(|q| q.trim().is_empty()) {
            return Err(ConfigError::EmptyQuery);
        }

        Ok(())
    }

    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }

    /// Output layout for this invocation
    ///
    /// Pass-through runs always write compact JSON with no separator.
    #[must_use]
    pub fn output_format(&self, stdout_is_terminal: bool, no_color: bool) -> OutputFormat {
        if self.query.is_none() {
            OutputFormat::Plain
        } else if self.compact || self.indent == 0 {
            OutputFormat::Lines
        } else {
            OutputFormat::Pretty(PrettyConfig {
                indent: usize::from(self.indent),
                color: self.color.enabled(stdout_is_terminal, no_color),
            })
        }
    }

    /// Pipeline inputs for this invocation
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingRepo` if no repository was given.
    pub fn run_options(&self) -> Result<RunOptions, ConfigError> {
        let url = self.repo_url().ok_or(ConfigError::MissingRepo)?;
        let clone = if self.quiet {
            CloneOptions::default()
        } else {
            CloneOptions::default().with_progress()
        };
        Ok(RunOptions {
            url: url.to_string(),
            query: self.query.clone(),
            key_file: self.key_file_path(),
            clone,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No repository URL
    #[error("A repository URL is required (REPO or --repo)")]
    MissingRepo,

    /// Both the positional URL and --repo
    #[error("Give the repository URL either as REPO or with --repo, not both")]
    AmbiguousRepo,

    /// Query text is empty
    #[error("The query expression is empty")]
    EmptyQuery,
}
