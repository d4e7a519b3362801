use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::process::{Child, Command};

use crate::config::ExecutorConfig;
use crate::task::StepResult;
use crate::util::RingBytes;

use super::capture;
use super::context::SandboxContext;

/// Interpreter-backed step kinds that run from a script file in the workdir.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptLang {
    Python,
    TypeScript,
}

impl ScriptLang {
    pub fn file_name(self) -> &'static str {
        match self {
            ScriptLang::Python => "script.py",
            ScriptLang::TypeScript => "script.js",
        }
    }

    fn label(self) -> &'static str {
        match self {
            ScriptLang::Python => "python",
            ScriptLang::TypeScript => "typescript",
        }
    }
}

#[derive(Debug)]
struct ProcessOutcome {
    status: Option<ExitStatus>,
    timed_out: bool,
    stdout: String,
    stderr: String,
}

/// Runs shell commands inside a task's working directory with a hard time limit.
///
/// Failures of the command itself (non-zero exit, timeout, spawn error) are reported
/// as a failed [`StepResult`], never as an `Err`.
#[derive(Debug, Clone)]
pub struct SandboxExecutor {
    shell: String,
    default_timeout: Duration,
    capture_bytes: usize,
    io_capture_timeout: Duration,
}

impl SandboxExecutor {
    pub fn new(cfg: &ExecutorConfig) -> Self {
        Self {
            shell: cfg.shell.clone(),
            default_timeout: cfg.step_timeout(),
            capture_bytes: cfg.capture_bytes.max(1),
            io_capture_timeout: cfg.io_capture_timeout(),
        }
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Run `command` through the shell. The invocation and its full output are appended
    /// to the task log before this returns.
    pub async fn execute(
        &self,
        command: &str,
        ctx: &SandboxContext,
        timeout: Duration,
    ) -> StepResult {
        ctx.log()
            .info(format!("Executing shell command: {command}"))
            .await;

        let started = Instant::now();
        let result = match self.run_process(command, ctx.workdir(), timeout).await {
            Ok(outcome) => {
                ctx.log()
                    .info(format!(
                        "Shell command output:\nSTDOUT:\n{}\nSTDERR:\n{}",
                        outcome.stdout, outcome.stderr
                    ))
                    .await;
                let result = outcome_to_result(outcome, timeout);
                if let Some(err) = &result.error {
                    ctx.log().error(err).await;
                }
                result
            }
            Err(e) => {
                let msg = format!("Error executing shell command: {e}");
                ctx.log().error(&msg).await;
                StepResult::failed("shell", msg)
            }
        };
        result.with_duration_ms(started.elapsed().as_millis() as u64)
    }

    /// Write `source` to the language's script file in the workdir, then run it with
    /// `interpreter` through [`execute`](Self::execute).
    pub async fn run_script(
        &self,
        lang: ScriptLang,
        interpreter: &str,
        source: &str,
        ctx: &SandboxContext,
        timeout: Duration,
    ) -> StepResult {
        ctx.log()
            .info(format!("Executing {} code:\n{source}", lang.label()))
            .await;

        let script = ctx.workdir().join(lang.file_name());
        if let Err(e) = tokio::fs::write(&script, source).await {
            let msg = format!("Error writing {}: {e}", lang.file_name());
            ctx.log().error(&msg).await;
            return StepResult::failed(lang.label(), msg);
        }

        self.execute(&format!("{interpreter} {}", lang.file_name()), ctx, timeout)
            .await
            .with_tool(lang.label())
    }

    async fn run_process(
        &self,
        command: &str,
        workdir: &Path,
        timeout: Duration,
    ) -> std::io::Result<ProcessOutcome> {
        let mut cmd = self.shell_command(command);
        cmd.current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn()?;
        tracing::debug!(pid = ?child.id(), workdir = %workdir.display(), "spawned step process");

        let out_ring = RingBytes::new(self.capture_bytes);
        let err_ring = RingBytes::new(self.capture_bytes);
        let out_task = child
            .stdout
            .take()
            .map(|s| capture::pump(s, out_ring.clone(), "stdout"));
        let err_task = child
            .stderr
            .take()
            .map(|s| capture::pump(s, err_ring.clone(), "stderr"));

        let (status, timed_out) = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(status) => (Some(status?), false),
            Err(_) => {
                tracing::warn!(timeout_secs = timeout.as_secs(), "step timed out; killing process group");
                terminate_tree(&mut child).await;
                (None, true)
            }
        };

        let (stdout, stderr) = tokio::join!(
            capture::collect(out_task, &out_ring, self.io_capture_timeout, "stdout"),
            capture::collect(err_task, &err_ring, self.io_capture_timeout, "stderr"),
        );

        Ok(ProcessOutcome {
            status,
            timed_out,
            stdout,
            stderr,
        })
    }

    #[cfg(unix)]
    fn shell_command(&self, command: &str) -> Command {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c").arg(command);
        cmd
    }

    #[cfg(windows)]
    fn shell_command(&self, command: &str) -> Command {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command);
        cmd
    }
}

fn outcome_to_result(outcome: ProcessOutcome, timeout: Duration) -> StepResult {
    let (success, exit_code, error) = if outcome.timed_out {
        (
            false,
            None,
            Some(format!(
                "Error: Command timed out after {} seconds.",
                timeout.as_secs()
            )),
        )
    } else {
        match outcome.status {
            Some(status) if status.success() => (true, status.code(), None),
            Some(status) => (false, status.code(), Some(format!("Command failed: {status}"))),
            None => (false, None, Some("Command produced no exit status".to_string())),
        }
    };

    StepResult {
        tool: "shell".to_string(),
        success,
        stdout: outcome.stdout,
        stderr: outcome.stderr,
        exit_code,
        timed_out: outcome.timed_out,
        error,
        duration_ms: 0,
    }
}

/// Kill the child and everything in its process group, then reap it.
async fn terminate_tree(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        // The child was spawned as its own group leader, so pgid == pid.
        let rc = unsafe { libc::kill(-(pid as libc::pid_t), libc::SIGKILL) };
        if rc != 0 {
            tracing::debug!(pid, error = %std::io::Error::last_os_error(), "killpg failed");
        }
    }
    if let Err(e) = child.kill().await {
        tracing::debug!(error = %e, "child kill after timeout failed");
    }
}
