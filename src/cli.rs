// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `logpipes`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "logpipes",
    version,
    about = "Run commands with their output captured per task: buffered, live, or merged into the root log.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML). Ignored when a command is given
    /// after `--`.
    #[arg(long, value_name = "PATH", default_value = "Logpipes.toml")]
    pub config: String,

    /// Merge identity-tagged output into the root log instead of a private
    /// logger.
    #[arg(long)]
    pub suppress_output: bool,

    /// Log output lines as they arrive instead of buffering per task.
    #[arg(long)]
    pub suppress_buffer: bool,

    /// Component shown in line prefixes.
    #[arg(long, value_name = "NAME", default_value = "Logpipes")]
    pub component: String,

    /// Operation name for a command given after `--`.
    #[arg(long, value_name = "NAME", default_value = "run")]
    pub operation: String,

    /// Only run these tasks from the config file (repeatable).
    #[arg(long, value_name = "NAME")]
    pub task: Vec<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `LOGPIPES_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the selected policy and tasks, but don't run
    /// anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Command to run instead of the configured tasks.
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
