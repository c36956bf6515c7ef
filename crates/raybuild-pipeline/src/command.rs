// SPDX-License-Identifier: CEPL-1.0
use std::ffi::OsStr;
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Sender};
use tracing::debug;

use crate::error::BuildError;

/// A program and its ordered argument tokens. Tokens are passed to the OS
/// as-is, so paths with spaces need no quoting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        CommandLine {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args.iter().map(OsStr::new));
        cmd
    }
}

impl fmt::Display for CommandLine {
    /// Shell-like rendering for logs; tokens containing whitespace are quoted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_token(f, &self.program)?;
        for a in &self.args {
            f.write_str(" ")?;
            write_token(f, a)?;
        }
        Ok(())
    }
}

fn write_token(f: &mut fmt::Formatter<'_>, token: &str) -> fmt::Result {
    if token.is_empty() || token.chars().any(char::is_whitespace) {
        write!(f, "{token:?}")
    } else {
        f.write_str(token)
    }
}

/// Captured outcome of one external invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process ended without an exit code (signal).
    pub code: Option<i32>,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn is_silent(&self) -> bool {
        self.stdout.is_empty() && self.stderr.is_empty()
    }
}

/// Turns command lines into processes. `Sync` so shader units can be
/// compiled from a worker pool.
pub trait Executor: Sync {
    /// Runs to completion with stdout/stderr captured.
    fn capture(&self, cmd: &CommandLine) -> Result<CommandResult, BuildError>;

    /// Runs with inherited stdio; returns the exit code.
    fn attach(&self, cmd: &CommandLine) -> Result<Option<i32>, BuildError>;
}

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stream {
    Out,
    Err,
}

/// Applies `timeout` to captured compiler invocations only; attached runs
/// wait for the process however long it takes.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemExecutor {
    timeout: Option<Duration>,
}

impl SystemExecutor {
    pub fn new(timeout: Option<Duration>) -> Self {
        SystemExecutor { timeout }
    }

    fn wait(
        &self,
        child: &mut Child,
        cmd: &CommandLine,
        deadline: Option<Instant>,
    ) -> Result<ExitStatus, BuildError> {
        let wait_err = |source: std::io::Error| BuildError::Wait {
            program: cmd.program().to_owned(),
            source,
        };

        let Some(deadline) = deadline else {
            return child.wait().map_err(wait_err);
        };

        loop {
            if let Some(status) = child.try_wait().map_err(wait_err)? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(self.timed_out(cmd));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    fn timed_out(&self, cmd: &CommandLine) -> BuildError {
        BuildError::Timeout {
            program: cmd.program().to_owned(),
            after: self.timeout.unwrap_or_default(),
        }
    }
}

fn drain<R: Read>(pipe: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut p) = pipe {
        let _ = p.read_to_end(&mut buf);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Detached so a grandchild still holding the pipe open cannot keep us
/// waiting past the deadline.
fn spawn_drain<R: Read + Send + 'static>(
    which: Stream,
    pipe: Option<R>,
    tx: Sender<(Stream, String)>,
) {
    thread::spawn(move || {
        let _ = tx.send((which, drain(pipe)));
    });
}

impl Executor for SystemExecutor {
    fn capture(&self, cmd: &CommandLine) -> Result<CommandResult, BuildError> {
        debug!("exec: {cmd}");
        let deadline = self.timeout.map(|t| Instant::now() + t);
        let mut child = cmd
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| BuildError::Spawn {
                program: cmd.program().to_owned(),
                source,
            })?;

        // Drain both pipes while waiting, or a chatty child blocks on a full pipe.
        let (tx, rx) = bounded(2);
        spawn_drain(Stream::Out, child.stdout.take(), tx.clone());
        spawn_drain(Stream::Err, child.stderr.take(), tx);

        let status = self.wait(&mut child, cmd, deadline)?;

        let mut result = CommandResult {
            code: status.code(),
            ..Default::default()
        };
        for _ in 0..2 {
            let msg = match deadline {
                Some(d) => rx.recv_deadline(d).map_err(|e| e.is_timeout()),
                None => rx.recv().map_err(|_| false),
            };
            match msg {
                Ok((Stream::Out, text)) => result.stdout = text,
                Ok((Stream::Err, text)) => result.stderr = text,
                // the child exited but something it started still holds the pipe
                Err(true) => return Err(self.timed_out(cmd)),
                Err(false) => break,
            }
        }
        Ok(result)
    }

    fn attach(&self, cmd: &CommandLine) -> Result<Option<i32>, BuildError> {
        debug!("exec (attached): {cmd}");
        let mut child = cmd.to_command().spawn().map_err(|source| BuildError::Spawn {
            program: cmd.program().to_owned(),
            source,
        })?;
        let status = self.wait(&mut child, cmd, None)?;
        Ok(status.code())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builder_keeps_token_order() {
        let cmd = CommandLine::new("glslc")
            .arg("--target-env=vulkan1.2")
            .path_arg(Path::new("shaders/my shader.rgen"))
            .args(["-o", "out.spv"]);
        assert_eq!(cmd.program(), "glslc");
        assert_eq!(
            cmd.get_args(),
            ["--target-env=vulkan1.2", "shaders/my shader.rgen", "-o", "out.spv"]
        );
        assert!(cmd.has_arg("-o"));
        assert!(!cmd.has_arg("shaders/my"));
    }

    #[test]
    fn display_quotes_whitespace() {
        let cmd = CommandLine::new("odin")
            .arg("build")
            .arg("my src")
            .arg("");
        assert_eq!(cmd.to_string(), r#"odin build "my src" """#);
    }

    #[test]
    fn result_success_is_exit_status_only() {
        let noisy = CommandResult {
            stdout: String::new(),
            stderr: "warning: unused".into(),
            code: Some(0),
        };
        assert!(noisy.success());
        assert!(!noisy.is_silent());

        let quiet_failure = CommandResult {
            code: Some(1),
            ..Default::default()
        };
        assert!(!quiet_failure.success());
        assert!(quiet_failure.is_silent());

        let killed = CommandResult::default();
        assert!(!killed.success());
    }

    #[test]
    fn spawn_failure_names_the_program() {
        let exec = SystemExecutor::default();
        let err = exec
            .capture(&CommandLine::new("raybuild-definitely-not-a-real-binary"))
            .unwrap_err();
        assert!(
            matches!(err, BuildError::Spawn { ref program, .. } if program == "raybuild-definitely-not-a-real-binary")
        );
    }

    #[cfg(unix)]
    #[test]
    fn captures_streams_and_code() {
        let exec = SystemExecutor::default();
        let cmd = CommandLine::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]);
        let res = exec.capture(&cmd).unwrap();
        assert_eq!(res.stdout, "out\n");
        assert_eq!(res.stderr, "err\n");
        assert_eq!(res.code, Some(3));
    }

    #[cfg(unix)]
    #[test]
    fn timeout_kills_hung_child() {
        let exec = SystemExecutor::new(Some(Duration::from_millis(100)));
        let started = Instant::now();
        let err = exec
            .capture(&CommandLine::new("sh").args(["-c", "exec sleep 10"]))
            .unwrap_err();
        assert!(matches!(err, BuildError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[test]
    fn attach_reports_exit_code() {
        let exec = SystemExecutor::default();
        let code = exec
            .attach(&CommandLine::new("sh").args(["-c", "exit 7"]))
            .unwrap();
        assert_eq!(code, Some(7));
    }

    #[cfg(unix)]
    #[test]
    fn timeout_bounds_orphaned_grandchild() {
        let exec = SystemExecutor::new(Some(Duration::from_millis(200)));
        let started = Instant::now();
        // no `exec`: the sleep outlives sh and keeps the pipes open
        let err = exec
            .capture(&CommandLine::new("sh").args(["-c", "sleep 4; true"]))
            .unwrap_err();
        assert!(matches!(err, BuildError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[cfg(unix)]
    #[test]
    fn timeout_after_exit_with_pipe_held_open() {
        let exec = SystemExecutor::new(Some(Duration::from_millis(300)));
        let started = Instant::now();
        let err = exec
            .capture(&CommandLine::new("sh").args(["-c", "sleep 4 & echo started"]))
            .unwrap_err();
        assert!(matches!(err, BuildError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[cfg(unix)]
    #[test]
    fn attach_ignores_compiler_timeout() {
        let exec = SystemExecutor::new(Some(Duration::from_millis(100)));
        let code = exec
            .attach(&CommandLine::new("sh").args(["-c", "sleep 0.5; exit 7"]))
            .unwrap();
        assert_eq!(code, Some(7));
    }
}
