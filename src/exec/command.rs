// src/exec/command.rs

//! Single external-process invocations.
//!
//! A [`Command`] is built from an explicit program + argument vector
//! ([`Command::new`]) or parsed from one string ([`Command::parse`]), then
//! run in one of three modes:
//!
//! - [`quiet`](Command::quiet): both standard streams discarded;
//! - [`run`](Command::run): host streams inherited;
//! - [`output`](Command::output): stdout/stderr captured into the result.
//!
//! All modes block until the process exits and return a timestamped
//! [`ExecutionResult`]. On a start or wait failure the result is still
//! populated (with [`FAILURE_EXIT_CODE`]) and returned inside the error.
//!
//! Before launch, a non-absolute program name is substituted through the
//! shared resolver; a resolution failure is silently ignored and the
//! process is launched with the original name, letting the spawn fail
//! naturally. An injectable [`LaunchObserver`] runs immediately before
//! launch with no influence on control flow.

use std::fmt;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::args;
use crate::errors::{CommandError, ProcessError};
use crate::resolve::{self, ResolveOptions};

use super::pipeline::Pipeline;
use super::result::{ExecutionResult, FAILURE_EXIT_CODE};

/// Routing mode for one standard stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StdioMode {
    Inherit,
    Piped,
    #[default]
    Null,
}

/// Hook invoked immediately before a process is launched.
///
/// Observers are a side channel: they cannot alter the command or stop the
/// launch. The process-wide default is a no-op.
pub trait LaunchObserver: Send + Sync {
    fn before_launch(&self, command: &Command);
}

static OBSERVER: Mutex<Option<Arc<dyn LaunchObserver>>> = Mutex::new(None);

/// Install a process-wide launch observer.
pub fn set_launch_observer(observer: Arc<dyn LaunchObserver>) {
    *OBSERVER.lock().expect("observer lock poisoned") = Some(observer);
}

/// Remove the process-wide launch observer.
pub fn clear_launch_observer() {
    *OBSERVER.lock().expect("observer lock poisoned") = None;
}

fn global_observer() -> Option<Arc<dyn LaunchObserver>> {
    OBSERVER.lock().expect("observer lock poisoned").clone()
}

/// Descriptor of one external-process invocation.
pub struct Command {
    pub(crate) program: String,
    pub(crate) args: Vec<String>,
    pub(crate) envs: Vec<(String, String)>,
    pub(crate) clear_env: bool,
    pub(crate) cwd: Option<PathBuf>,
    pub(crate) stdin: StdioMode,
    pub(crate) stdout: StdioMode,
    pub(crate) stderr: StdioMode,
    pub(crate) stdin_bytes: Option<Vec<u8>>,
    pub(crate) wait_delay: Option<Duration>,
    observer: Option<Arc<dyn LaunchObserver>>,
    observer_disabled: bool,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("cwd", &self.cwd)
            .finish_non_exhaustive()
    }
}

impl Command {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            clear_env: false,
            cwd: None,
            stdin: StdioMode::Null,
            stdout: StdioMode::Null,
            stderr: StdioMode::Null,
            stdin_bytes: None,
            wait_delay: None,
            observer: None,
            observer_disabled: false,
        }
    }

    /// Build a command by tokenizing a single command-line string.
    ///
    /// ```
    /// use runpipe::exec::Command;
    ///
    /// let cmd = Command::parse("echo 'hello world'");
    /// assert_eq!(cmd.program(), "echo");
    /// assert_eq!(cmd.args(), ["hello world"]);
    /// ```
    pub fn parse(command_line: &str) -> Self {
        let mut tokens = args::split(command_line);
        let program = if tokens.is_empty() {
            String::new()
        } else {
            tokens.remove(0)
        };
        let mut cmd = Self::new(program);
        cmd.args = tokens;
        cmd
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args_from<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add an environment override on top of the inherited environment.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.envs
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Start from an empty environment instead of the inherited one.
    pub fn clear_env(mut self) -> Self {
        self.clear_env = true;
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn stdin(mut self, mode: StdioMode) -> Self {
        self.stdin = mode;
        self
    }

    pub fn stdout(mut self, mode: StdioMode) -> Self {
        self.stdout = mode;
        self
    }

    pub fn stderr(mut self, mode: StdioMode) -> Self {
        self.stderr = mode;
        self
    }

    /// Feed the given bytes to the child's standard input.
    pub fn stdin_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.stdin_bytes = Some(bytes.into());
        self
    }

    /// Kill the process and fail the wait if it has not exited within
    /// `delay`.
    pub fn wait_delay(mut self, delay: Duration) -> Self {
        self.wait_delay = Some(delay);
        self
    }

    /// Attach a per-command launch observer.
    pub fn observer(mut self, observer: Arc<dyn LaunchObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Skip all launch observers for this command.
    pub fn without_observer(mut self) -> Self {
        self.observer_disabled = true;
        self
    }

    /// Chain this command into a pipeline with `next`.
    pub fn pipe(self, next: Command) -> Pipeline {
        Pipeline::new().pipe(self).pipe(next)
    }

    /// Run with both standard streams discarded.
    pub fn quiet(mut self) -> Result<ExecutionResult, CommandError> {
        self.stdout = StdioMode::Null;
        self.stderr = StdioMode::Null;
        self.execute(false)
    }

    /// Run with the host's standard streams inherited.
    pub fn run(mut self) -> Result<ExecutionResult, CommandError> {
        self.stdin = StdioMode::Inherit;
        self.stdout = StdioMode::Inherit;
        self.stderr = StdioMode::Inherit;
        self.execute(false)
    }

    /// Run with stdout/stderr captured into the result.
    pub fn output(mut self) -> Result<ExecutionResult, CommandError> {
        self.stdout = StdioMode::Piped;
        self.stderr = StdioMode::Piped;
        self.execute(true)
    }

    fn execute(mut self, capture: bool) -> Result<ExecutionResult, CommandError> {
        self.prepare();
        let mut result = ExecutionResult::started(&self.program, self.args.clone());

        let stdin = self.stdin_stdio();
        let stdout = stdio_for(self.stdout);
        let stderr = stdio_for(self.stderr);

        let mut child = match self.spawn_prepared(stdin, stdout, stderr) {
            Ok(child) => child,
            Err(error) => {
                result.finish(FAILURE_EXIT_CODE);
                return Err(CommandError { result, error });
            }
        };

        self.feed_stdin(&mut child);
        let readers = if capture {
            CaptureReaders::attach(&mut child)
        } else {
            CaptureReaders::default()
        };

        match self.wait_child(&mut child) {
            Ok(status) => {
                let (out, err) = readers.join();
                result.stdout = out;
                result.stderr = err;
                result.finish(status.code().unwrap_or(-1));
                info!(
                    program = %self.program,
                    exit_code = result.code,
                    success = result.success(),
                    "process exited"
                );
                Ok(result)
            }
            Err(error) => {
                let (out, err) = readers.join();
                result.stdout = out;
                result.stderr = err;
                result.finish(FAILURE_EXIT_CODE);
                Err(CommandError { result, error })
            }
        }
    }

    /// Observer + resolver steps shared by every launch path.
    pub(crate) fn prepare(&mut self) {
        if !self.observer_disabled {
            if let Some(observer) = &self.observer {
                observer.before_launch(self);
            }
            if let Some(observer) = global_observer() {
                observer.before_launch(self);
            }
        }

        if !self.program.is_empty() && !Path::new(&self.program).is_absolute() {
            match resolve::resolve(&self.program, &ResolveOptions::default()) {
                Ok(path) => self.program = path.to_string_lossy().into_owned(),
                Err(err) => {
                    debug!(
                        program = %self.program,
                        error = %err,
                        "resolution failed; launching with the original name"
                    );
                }
            }
        }
    }

    /// Spawn with explicit stream wiring. `prepare` must have run.
    pub(crate) fn spawn_prepared(
        &mut self,
        stdin: Stdio,
        stdout: Stdio,
        stderr: Stdio,
    ) -> Result<Child, ProcessError> {
        info!(program = %self.program, args = ?self.args, "starting process");

        let mut cmd = std::process::Command::new(&self.program);
        cmd.args(&self.args);
        if self.clear_env {
            cmd.env_clear();
        }
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd.stdin(stdin).stdout(stdout).stderr(stderr);

        cmd.spawn().map_err(|source| ProcessError::Start {
            program: self.program.clone(),
            source,
        })
    }

    /// The `Stdio` for this command's configured stdin routing.
    pub(crate) fn stdin_stdio(&self) -> Stdio {
        if self.stdin_bytes.is_some() {
            Stdio::piped()
        } else {
            stdio_for(self.stdin)
        }
    }

    /// Hand any configured stdin bytes to a writer thread so the parent
    /// never blocks on a full pipe.
    pub(crate) fn feed_stdin(&mut self, child: &mut Child) {
        if let (Some(bytes), Some(mut stdin)) = (self.stdin_bytes.take(), child.stdin.take()) {
            thread::spawn(move || {
                let _ = stdin.write_all(&bytes);
            });
        }
    }

    /// Wait for the child, honoring the configured wait delay.
    pub(crate) fn wait_child(&self, child: &mut Child) -> Result<ExitStatus, ProcessError> {
        let Some(delay) = self.wait_delay else {
            return child.wait().map_err(|source| ProcessError::Wait {
                program: self.program.clone(),
                source,
            });
        };

        let deadline = Instant::now() + delay;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(ProcessError::Timeout {
                            program: self.program.clone(),
                            delay,
                        });
                    }
                    thread::sleep(Duration::from_millis(10));
                }
                Err(source) => {
                    return Err(ProcessError::Wait {
                        program: self.program.clone(),
                        source,
                    });
                }
            }
        }
    }
}

pub(crate) fn stdio_for(mode: StdioMode) -> Stdio {
    match mode {
        StdioMode::Inherit => Stdio::inherit(),
        StdioMode::Piped => Stdio::piped(),
        StdioMode::Null => Stdio::null(),
    }
}

/// Background readers draining a child's piped stdout/stderr.
///
/// Draining concurrently with the wait keeps the child from blocking on a
/// full pipe buffer.
#[derive(Default)]
pub(crate) struct CaptureReaders {
    stdout: Option<JoinHandle<Vec<u8>>>,
    stderr: Option<JoinHandle<Vec<u8>>>,
}

impl CaptureReaders {
    pub(crate) fn attach(child: &mut Child) -> Self {
        Self {
            stdout: child.stdout.take().map(spawn_reader),
            stderr: child.stderr.take().map(spawn_reader),
        }
    }

    pub(crate) fn join(self) -> (Vec<u8>, Vec<u8>) {
        let stdout = self
            .stdout
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        let stderr = self
            .stderr
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        (stdout, stderr)
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut stream: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stream.read_to_end(&mut buf);
        buf
    })
}
