// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `runpipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "runpipe",
    version,
    about = "Run external commands and pipelines with shell-style expansion.",
    long_about = None
)]
pub struct CliArgs {
    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RUNPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Run a single command line and propagate its exit code.
    Run {
        /// The command line; quote it as one argument or pass the words
        /// separately.
        #[arg(required = true)]
        command: Vec<String>,

        /// Discard the command's output instead of inheriting it.
        #[arg(long)]
        quiet: bool,

        /// Capture the output and print the result as JSON.
        #[arg(long, conflicts_with = "quiet")]
        json: bool,
    },

    /// Run command lines as a pipeline, first stage to last.
    Pipe {
        /// One command line per stage, in order.
        #[arg(required = true, value_name = "STAGE")]
        stages: Vec<String>,

        /// Capture the terminal stage and print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Resolve an executable name to an absolute path.
    Which {
        name: String,

        /// Return a previously cached resolution without re-validating it.
        #[arg(long)]
        cached: bool,

        /// Directory to search before the PATH list (repeatable).
        #[arg(long = "path", value_name = "DIR")]
        prepend_paths: Vec<String>,
    },

    /// Expand $NAME / ${...} references in a template string.
    Expand {
        template: String,

        /// Substitute purely numeric references from the positional
        /// arguments.
        #[arg(long)]
        positional: bool,
    },

    /// Split a command line into its argument vector, one per line.
    Split { command: String },
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
