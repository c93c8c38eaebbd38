// src/errors.rs

//! Crate-wide error types.
//!
//! Command and pipeline failures carry the best-effort [`ExecutionResult`]
//! alongside the underlying cause, so callers can still inspect the partial
//! state (sentinel exit code, timestamps, captured bytes) after a failure.
//! Pipeline failures keep one cause per affected stage instead of folding
//! everything into a single message.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::exec::ExecutionResult;

/// Errors produced by template expansion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
    /// Malformed reference: empty or invalid variable name, or an
    /// unterminated `${...}` interpolation.
    #[error("bad substitution: {0}")]
    BadSubstitution(String),

    /// A `${NAME:?message}` reference whose variable was empty or unset.
    #[error("{name}: {message}")]
    UnsetRequiredVariable { name: String, message: String },
}

/// Errors produced by executable resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No candidate for the requested logical name matched an existing
    /// executable.
    #[error("executable not found: {0}")]
    NotFound(String),
}

/// A single process-level failure.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to start {program}: {source}")]
    Start {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to connect pipe for {program}: {source}")]
    Pipe {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The command's wait delay expired before the process exited; the
    /// process was killed.
    #[error("{program} did not exit within {delay:?}")]
    Timeout { program: String, delay: Duration },
}

impl ProcessError {
    /// The program the failure belongs to.
    pub fn program(&self) -> &str {
        match self {
            ProcessError::Start { program, .. }
            | ProcessError::Wait { program, .. }
            | ProcessError::Pipe { program, .. }
            | ProcessError::Timeout { program, .. } => program,
        }
    }
}

/// Failure of a single command, carrying the best-effort result.
///
/// The result's exit code is the sentinel value
/// [`FAILURE_EXIT_CODE`](crate::exec::FAILURE_EXIT_CODE); check the error
/// rather than inferring failure from the code alone.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct CommandError {
    pub result: ExecutionResult,
    pub error: ProcessError,
}

/// Aggregate failure of a pipeline.
///
/// `causes` collects every error encountered across the stages (start,
/// wait, pipe plumbing) in launch order. `result` reflects whatever the
/// furthest-reached stage produced and may be incomplete if the pipeline
/// aborted early.
#[derive(Debug, Error)]
#[error("pipeline failed with {} stage error(s)", .causes.len())]
pub struct PipelineError {
    pub result: ExecutionResult,
    pub causes: Vec<ProcessError>,
}

impl From<CommandError> for PipelineError {
    fn from(err: CommandError) -> Self {
        PipelineError {
            result: err.result,
            causes: vec![err.error],
        }
    }
}
