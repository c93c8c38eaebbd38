// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`command`] owns the single-invocation [`Command`] type, its three
//!   execution modes, and the launch-observer hook.
//! - [`pipeline`] chains commands stdout → stdin with best-effort failure
//!   semantics.
//! - [`result`] holds the timestamped [`ExecutionResult`] and its views.

pub mod command;
pub mod pipeline;
pub mod result;

pub use command::{
    Command, LaunchObserver, StdioMode, clear_launch_observer, set_launch_observer,
};
pub use pipeline::Pipeline;
pub use result::{ExecutionResult, FAILURE_EXIT_CODE};

use crate::errors::CommandError;

/// Parse and run a command line with inherited streams.
pub fn run(command_line: &str) -> Result<ExecutionResult, CommandError> {
    Command::parse(command_line).run()
}

/// Parse and run a command line with captured streams.
pub fn output(command_line: &str) -> Result<ExecutionResult, CommandError> {
    Command::parse(command_line).output()
}
