//! Process driver
//!
//! Runs the target once per scenario as `sh -c "<exe> < <script> > <capture> 2>&1"`
//! and hands back the raw exit code. Interpreting the code is the verdict
//! engine's job.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::{Child, Command};

use super::verdict::TIMEOUT_CODE;
use crate::common::{Error, Result};

/// One run of the target program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Target program, relative to `work_dir` or absolute
    pub program: PathBuf,
    /// Script redirected into stdin; stdin is closed when absent
    pub input: Option<PathBuf>,
    /// File receiving stdout and stderr
    pub capture: PathBuf,
    /// Directory the target runs in
    pub work_dir: PathBuf,
}

impl Invocation {
    /// The shell line executed for this invocation
    pub fn command_line(&self) -> String {
        match &self.input {
            Some(input) => format!(
                "{} < {} > {} 2>&1",
                shell_quote(&self.program),
                shell_quote(input),
                shell_quote(&self.capture)
            ),
            None => format!(
                "{} > {} 2>&1",
                shell_quote(&self.program),
                shell_quote(&self.capture)
            ),
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Quote a path for `sh` only when it needs it
fn shell_quote(path: &Path) -> String {
    let s = path.to_string_lossy();
    let plain = s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '-' | '+'));
    if plain && !s.is_empty() {
        s.into_owned()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

/// Runs invocations and reports exit codes
#[async_trait]
pub trait Driver: Send + Sync {
    /// Execute the invocation and return its exit code
    ///
    /// A nonzero exit is not an error. Errors are reserved for failing to
    /// launch the shell at all.
    async fn run(&self, invocation: &Invocation) -> Result<i32>;

    /// Whether the target is actually executed
    fn executes(&self) -> bool {
        true
    }
}

/// Executes invocations through `sh -c`
#[derive(Debug, Clone)]
pub struct ShellDriver {
    timeout: Duration,
}

impl ShellDriver {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Driver for ShellDriver {
    async fn run(&self, invocation: &Invocation) -> Result<i32> {
        let line = invocation.command_line();
        tracing::debug!(command = %line, dir = %invocation.work_dir.display(), "spawning target");

        let mut shell = std::process::Command::new("sh");
        shell
            .arg("-c")
            .arg(&line)
            .current_dir(&invocation.work_dir)
            .stdin(Stdio::null());
        // The shell forks the target; a group of its own lets a timeout reach both
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            shell.process_group(0);
        }

        let mut command = Command::from(shell);
        command.kill_on_drop(true);

        let mut child = command.spawn().map_err(|source| Error::Launch {
            command: line.clone(),
            source,
        })?;

        match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(status) => {
                let status = status?;
                let code = exit_code(status);
                tracing::debug!(code, "target exited");
                Ok(code)
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.timeout.as_secs(),
                    command = %line,
                    "target timed out, killing"
                );
                kill_group(&mut child).await;
                Ok(TIMEOUT_CODE)
            }
        }
    }
}

/// Kill the shell and everything it started, then reap the shell
async fn kill_group(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            // SAFETY: plain syscall on a process group we created
            let rc = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
            if rc != 0 {
                tracing::debug!(pid, error = %std::io::Error::last_os_error(), "killpg failed");
            }
        }
    }
    let _ = child.kill().await;
}

/// Shell-style exit code: signal `N` maps to `128 + N`
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

/// Builds scripts and fixtures but never runs the target
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunDriver;

#[async_trait]
impl Driver for DryRunDriver {
    async fn run(&self, invocation: &Invocation) -> Result<i32> {
        tracing::info!(command = %invocation, "dry run, not executing");
        Ok(0)
    }

    fn executes(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn invocation(dir: &Path, program: &str, input: Option<&str>) -> Invocation {
        Invocation {
            program: PathBuf::from(program),
            input: input.map(PathBuf::from),
            capture: PathBuf::from("out.txt"),
            work_dir: dir.to_path_buf(),
        }
    }

    #[test]
    fn test_command_line_shapes() {
        let inv = invocation(Path::new("/tmp"), "./main", Some("test_input_add.txt"));
        assert_eq!(inv.command_line(), "./main < test_input_add.txt > out.txt 2>&1");

        let inv = invocation(Path::new("/tmp"), "./main", None);
        assert_eq!(inv.to_string(), "./main > out.txt 2>&1");
    }

    #[test]
    fn test_shell_quote_spaces() {
        assert_eq!(shell_quote(Path::new("my dir/main")), "'my dir/main'");
        assert_eq!(shell_quote(Path::new("it's")), r"'it'\''s'");
    }

    #[cfg(unix)]
    fn write_script(dir: &Path, name: &str, body: &str) {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_driver_feeds_stdin_and_captures_output() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("in.txt"), "hello\n").unwrap();
        write_script(
            tmp.path(),
            "echo.sh",
            "#!/bin/sh\nread line\necho \"got $line\"\necho oops >&2\nexit 3\n",
        );

        let inv = invocation(tmp.path(), "./echo.sh", Some("in.txt"));
        let code = ShellDriver::new(Duration::from_secs(10)).run(&inv).await.unwrap();
        assert_eq!(code, 3);

        let out = std::fs::read_to_string(tmp.path().join("out.txt")).unwrap();
        assert!(out.contains("got hello"));
        assert!(out.contains("oops"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_signal_surfaces_as_shell_code() {
        let tmp = TempDir::new().unwrap();
        write_script(tmp.path(), "crash.sh", "#!/bin/sh\nkill -SEGV $$\n");

        let inv = invocation(tmp.path(), "./crash.sh", None);
        let code = ShellDriver::new(Duration::from_secs(10)).run(&inv).await.unwrap();
        assert_eq!(code, 139);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_target() {
        let tmp = TempDir::new().unwrap();
        write_script(tmp.path(), "hang.sh", "#!/bin/sh\nsleep 30\n");

        let inv = invocation(tmp.path(), "./hang.sh", None);
        let code = ShellDriver::new(Duration::from_millis(200)).run(&inv).await.unwrap();
        assert_eq!(code, TIMEOUT_CODE);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_target_not_just_shell() {
        let tmp = TempDir::new().unwrap();
        write_script(
            tmp.path(),
            "slow.sh",
            "#!/bin/sh\nsleep 1\necho late > movie_queue_updated.txt\n",
        );

        let inv = invocation(tmp.path(), "./slow.sh", None);
        let code = ShellDriver::new(Duration::from_millis(200)).run(&inv).await.unwrap();
        assert_eq!(code, TIMEOUT_CODE);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!tmp.path().join("movie_queue_updated.txt").exists());
    }

    #[tokio::test]
    async fn test_dry_run_has_no_side_effects() {
        let tmp = TempDir::new().unwrap();
        let inv = invocation(tmp.path(), "./main", Some("in.txt"));
        assert_eq!(DryRunDriver.run(&inv).await.unwrap(), 0);
        assert!(!DryRunDriver.executes());
        assert!(!tmp.path().join("out.txt").exists());
    }
}
