//! External command execution with bounded timeouts.
//!
//! Every collaborator the provisioner shells out to (package manager,
//! version manager, git, third-party installer commands) goes through the
//! [`CommandExecutor`] seam so tests can substitute stubs, and every real
//! invocation carries an explicit timeout so a wedged subprocess cannot
//! stall an otherwise re-runnable provisioning pass.

use crate::user::TargetUser;
use std::io;
use std::process::{Command, Output, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Default timeout applied to invocations that do not set their own.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

/// A fully-described external command: program, arguments, and timeout.
///
/// # Examples
///
/// ```
/// use outfitter_common::exec::Invocation;
/// use std::time::Duration;
///
/// let invocation = Invocation::new("git", ["--version"])
///     .with_timeout(Duration::from_secs(30));
/// assert_eq!(invocation.program(), "git");
/// ```
#[derive(Debug, Clone)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl Invocation {
    /// Build an invocation with the default timeout.
    pub fn new<P, A, S>(program: P, args: A) -> Self
    where
        P: Into<String>,
        A: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Replace the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Rewrap the invocation to run as `user` when the process is elevated.
    ///
    /// When the target user requires a privilege drop the command is wrapped
    /// in `sudo -u <name> --`; otherwise it is returned unchanged. The
    /// timeout is preserved either way.
    #[must_use]
    pub fn as_user(self, user: &TargetUser) -> Self {
        if !user.needs_privilege_drop() {
            return self;
        }
        let mut args = vec![
            "-u".to_owned(),
            user.name().to_owned(),
            "--".to_owned(),
            self.program,
        ];
        args.extend(self.args);
        Self {
            program: "sudo".to_owned(),
            args,
            timeout: self.timeout,
        }
    }

    /// The program to execute.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The arguments passed to the program.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The timeout applied to this invocation.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Errors arising from external command execution.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// The program could not be spawned at all.
    #[error("failed to launch {program}: {source}")]
    Launch {
        /// The program that failed to start.
        program: String,
        /// The underlying spawn error.
        #[source]
        source: io::Error,
    },

    /// The program ran past its timeout and was killed.
    #[error("{program} timed out after {timeout_secs}s")]
    Timeout {
        /// The program that was killed.
        program: String,
        /// The timeout that was exceeded, in seconds.
        timeout_secs: u64,
    },

    /// I/O error while managing the child process.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Run the invocation and return the captured output.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError`] if the program cannot be spawned, times out,
    /// or its pipes cannot be managed. A non-zero exit status is not an
    /// error at this layer; callers inspect `Output::status`.
    fn run(&self, invocation: &Invocation) -> Result<Output, ExecError>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, invocation: &Invocation) -> Result<Output, ExecError> {
        log::trace!("running {} {:?}", invocation.program(), invocation.args());

        let mut child = Command::new(invocation.program())
            .args(invocation.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExecError::Launch {
                program: invocation.program().to_owned(),
                source,
            })?;

        // Drain both pipes on background threads so a chatty subprocess
        // cannot fill a pipe buffer and deadlock against the timeout wait.
        let stdout = drain_pipe(child.stdout.take());
        let stderr = drain_pipe(child.stderr.take());

        let status = match child.wait_timeout(invocation.timeout())? {
            Some(status) => status,
            None => {
                child.kill()?;
                child.wait()?;
                return Err(ExecError::Timeout {
                    program: invocation.program().to_owned(),
                    timeout_secs: invocation.timeout().as_secs(),
                });
            }
        };

        Ok(Output {
            status,
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        })
    }
}

/// Read a child pipe to EOF on a background thread.
fn drain_pipe<R>(pipe: Option<R>) -> std::thread::JoinHandle<Vec<u8>>
where
    R: io::Read + Send + 'static,
{
    std::thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut reader) = pipe {
            let _ = reader.read_to_end(&mut buffer);
        }
        buffer
    })
}

/// The trimmed stderr of a command, for error reporting.
#[must_use]
pub fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::TargetUser;
    use camino::Utf8PathBuf;

    #[test]
    fn captures_stdout_of_successful_command() {
        let executor = SystemCommandExecutor;
        let invocation = Invocation::new("sh", ["-c", "printf outfitted"]);
        let output = executor.run(&invocation).expect("command runs");
        assert!(output.status.success());
        assert_eq!(output.stdout, b"outfitted");
    }

    #[test]
    fn nonzero_exit_is_not_an_exec_error() {
        let executor = SystemCommandExecutor;
        let invocation = Invocation::new("sh", ["-c", "echo failed >&2; exit 3"]);
        let output = executor.run(&invocation).expect("command runs");
        assert!(!output.status.success());
        assert_eq!(stderr_text(&output), "failed");
    }

    #[test]
    fn missing_program_is_a_launch_error() {
        let executor = SystemCommandExecutor;
        let invocation = Invocation::new("outfitter-no-such-program", Vec::<String>::new());
        let err = executor.run(&invocation).expect_err("spawn fails");
        assert!(matches!(err, ExecError::Launch { .. }));
    }

    #[test]
    fn overrunning_command_is_killed_and_reported() {
        let executor = SystemCommandExecutor;
        let invocation =
            Invocation::new("sleep", ["5"]).with_timeout(Duration::from_millis(100));
        let err = executor.run(&invocation).expect_err("times out");
        assert!(matches!(err, ExecError::Timeout { .. }));
    }

    #[test]
    fn as_user_wraps_in_sudo_when_privileges_must_drop() {
        let user = TargetUser::with_home("dev", Utf8PathBuf::from("/home/dev"), true);
        let invocation = Invocation::new("git", ["--version"]).as_user(&user);
        assert_eq!(invocation.program(), "sudo");
        assert_eq!(
            invocation.args(),
            ["-u", "dev", "--", "git", "--version"]
        );
    }

    #[test]
    fn as_user_is_identity_without_privilege_drop() {
        let user = TargetUser::with_home("dev", Utf8PathBuf::from("/home/dev"), false);
        let invocation = Invocation::new("git", ["--version"]).as_user(&user);
        assert_eq!(invocation.program(), "git");
        assert_eq!(invocation.args(), ["--version"]);
    }
}
