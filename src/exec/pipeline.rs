// src/exec/pipeline.rs

//! Command pipelines.
//!
//! Adjacent stages are connected through anonymous OS pipes
//! (`std::io::pipe`): stage *i*'s stdout is the write end, stage *i+1*'s
//! stdin the read end. Both ends move into the children, so end-of-stream
//! reaches a downstream stage as soon as its upstream process exits and
//! the kernel releases the write end.
//!
//! Launch proceeds stage-by-stage in order; after starting stage *i+1*
//! the pipeline waits for stage *i* before continuing. Failure policy is
//! best-effort, not atomic: a start failure aborts launching further
//! stages but does not retroactively cancel already-started ones. Every
//! encountered error is collected into [`PipelineError::causes`]; the
//! returned result reflects whatever the furthest-reached stage produced.

use std::io;
use std::process::{Child, Stdio};

use tracing::info;

use crate::errors::{PipelineError, ProcessError};

use super::command::{CaptureReaders, Command, stdio_for};
use super::result::{ExecutionResult, FAILURE_EXIT_CODE};

/// An ordered chain of commands wired stdout → stdin.
#[derive(Debug, Default)]
pub struct Pipeline {
    stages: Vec<Command>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage.
    pub fn pipe(mut self, command: Command) -> Self {
        self.stages.push(command);
        self
    }

    /// Append a stage parsed from a command-line string.
    pub fn pipe_str(self, command_line: &str) -> Self {
        self.pipe(Command::parse(command_line))
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run the pipeline with the terminal stage inheriting the host
    /// streams.
    pub fn run(self) -> Result<ExecutionResult, PipelineError> {
        self.execute(false)
    }

    /// Run the pipeline with the terminal stage's stdout/stderr captured
    /// into the result.
    pub fn output(self) -> Result<ExecutionResult, PipelineError> {
        self.execute(true)
    }

    fn execute(mut self, capture: bool) -> Result<ExecutionResult, PipelineError> {
        if self.stages.is_empty() {
            let mut result = ExecutionResult::started("", Vec::new());
            result.finish(FAILURE_EXIT_CODE);
            return Err(PipelineError {
                result,
                causes: vec![ProcessError::Start {
                    program: String::new(),
                    source: io::Error::new(io::ErrorKind::InvalidInput, "empty pipeline"),
                }],
            });
        }

        // A single stage degenerates to the command's own mode.
        if self.stages.len() == 1 {
            let cmd = self.stages.remove(0);
            let outcome = if capture { cmd.output() } else { cmd.run() };
            return outcome.map_err(Into::into);
        }

        let count = self.stages.len();
        info!(stages = count, "starting pipeline");

        let mut causes: Vec<ProcessError> = Vec::new();
        let mut result = ExecutionResult::started("", Vec::new());
        let mut prev: Option<Running> = None;
        let mut upstream: Option<io::PipeReader> = None;
        let mut completed = false;

        for (i, mut cmd) in self.stages.into_iter().enumerate() {
            let is_last = i + 1 == count;
            cmd.prepare();

            // First stage reads from its own configured stdin; every
            // later stage reads from the previous stage's pipe.
            let stdin = match upstream.take() {
                Some(reader) => Stdio::from(reader),
                None => cmd.stdin_stdio(),
            };

            if !is_last {
                let (next_reader, writer) = match io::pipe() {
                    Ok(pair) => pair,
                    Err(source) => {
                        causes.push(ProcessError::Pipe {
                            program: cmd.program().to_string(),
                            source,
                        });
                        break;
                    }
                };
                let stderr = stdio_for(cmd.stderr);
                let mut child = match cmd.spawn_prepared(stdin, Stdio::from(writer), stderr) {
                    Ok(child) => child,
                    Err(error) => {
                        causes.push(error);
                        break;
                    }
                };
                cmd.feed_stdin(&mut child);

                if let Some(mut previous) = prev.take() {
                    if let Err(error) = previous.wait() {
                        causes.push(error);
                    }
                }
                upstream = Some(next_reader);
                prev = Some(Running { child, cmd });
            } else {
                result.program = cmd.program().to_string();
                result.args = cmd.args().to_vec();

                let (stdout, stderr) = if capture {
                    (Stdio::piped(), Stdio::piped())
                } else {
                    (Stdio::inherit(), Stdio::inherit())
                };
                let mut child = match cmd.spawn_prepared(stdin, stdout, stderr) {
                    Ok(child) => child,
                    Err(error) => {
                        causes.push(error);
                        break;
                    }
                };
                let readers = if capture {
                    CaptureReaders::attach(&mut child)
                } else {
                    CaptureReaders::default()
                };

                if let Some(mut previous) = prev.take() {
                    if let Err(error) = previous.wait() {
                        causes.push(error);
                    }
                }

                match cmd.wait_child(&mut child) {
                    Ok(status) => {
                        let (out, err) = readers.join();
                        result.stdout = out;
                        result.stderr = err;
                        result.finish(status.code().unwrap_or(-1));
                        completed = true;
                    }
                    Err(error) => {
                        let (out, err) = readers.join();
                        result.stdout = out;
                        result.stderr = err;
                        causes.push(error);
                    }
                }
            }
        }

        if !completed {
            result.finish(FAILURE_EXIT_CODE);
        }

        if causes.is_empty() {
            Ok(result)
        } else {
            Err(PipelineError { result, causes })
        }
    }
}

/// A launched stage the pipeline still has to wait for.
struct Running {
    child: Child,
    cmd: Command,
}

impl Running {
    fn wait(&mut self) -> Result<(), ProcessError> {
        self.child
            .wait()
            .map(|_| ())
            .map_err(|source| ProcessError::Wait {
                program: self.cmd.program().to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_counts_stages() {
        let pipeline = Pipeline::new()
            .pipe_str("echo hello")
            .pipe_str("grep hello");
        assert_eq!(pipeline.len(), 2);
        assert!(!pipeline.is_empty());
    }

    #[test]
    fn empty_pipeline_is_a_stage_failure() {
        let err = Pipeline::new().output().unwrap_err();
        assert_eq!(err.causes.len(), 1);
        assert_eq!(err.result.code, FAILURE_EXIT_CODE);
        assert!(matches!(err.causes[0], ProcessError::Start { .. }));
    }

    #[test]
    fn command_pipe_builds_a_two_stage_pipeline() {
        let pipeline = Command::parse("echo hi").pipe(Command::parse("cat"));
        assert_eq!(pipeline.len(), 2);
    }
}
