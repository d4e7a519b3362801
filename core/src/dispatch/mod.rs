//! Maps a declared step onto the sandbox operation that carries it out.

mod files;

use std::time::{Duration, Instant};

use crate::config::ExecutorConfig;
use crate::sandbox::{SandboxContext, SandboxExecutor, ScriptLang};
use crate::task::{Step, StepEntry, StepResult};

/// Stateless apart from configuration; safe to share across concurrent task runs.
#[derive(Debug, Clone)]
pub struct StepDispatcher {
    executor: SandboxExecutor,
    python_bin: String,
    node_bin: String,
    gui_tool: String,
}

impl StepDispatcher {
    pub fn new(cfg: &ExecutorConfig) -> Self {
        Self {
            executor: SandboxExecutor::new(cfg),
            python_bin: cfg.python_bin.clone(),
            node_bin: cfg.node_bin.clone(),
            gui_tool: cfg.gui_tool.clone(),
        }
    }

    /// Carry out one step. Every failure, including unknown or malformed steps, comes
    /// back as an unsuccessful result so the task keeps going.
    pub async fn dispatch(&self, entry: &StepEntry, ctx: &SandboxContext) -> StepResult {
        let started = Instant::now();
        let result = match entry {
            StepEntry::Step(step) => self.dispatch_step(step, ctx).await,
            StepEntry::Unknown { tool } => {
                let msg = format!("Unknown tool: {tool}");
                ctx.log().error(&msg).await;
                StepResult::failed(tool.as_str(), msg)
            }
            StepEntry::Malformed { reason, .. } => {
                let msg = format!("Invalid step: {reason}");
                ctx.log().error(&msg).await;
                StepResult::failed(entry.tool_name(), msg)
            }
        };
        result
            .with_tool(entry.tool_name())
            .with_duration_ms(started.elapsed().as_millis() as u64)
    }

    async fn dispatch_step(&self, step: &Step, ctx: &SandboxContext) -> StepResult {
        let timeout = step
            .timeout_secs()
            .map(|s| Duration::from_secs(s.max(1)))
            .unwrap_or_else(|| self.executor.default_timeout());

        match step {
            Step::Shell { command, .. } => {
                if command.trim().is_empty() {
                    return reject(ctx, "shell", "command is empty").await;
                }
                self.executor.execute(command, ctx, timeout).await
            }
            Step::Python { code, .. } => {
                self.executor
                    .run_script(ScriptLang::Python, &self.python_bin, code, ctx, timeout)
                    .await
            }
            Step::Typescript { code, .. } => {
                self.executor
                    .run_script(ScriptLang::TypeScript, &self.node_bin, code, ctx, timeout)
                    .await
            }
            Step::WriteFile { path, content } => files::write_file(ctx, path, content).await,
            Step::ReadFile { path } => files::read_file(ctx, path).await,
            Step::SimulateGui { command, .. } => {
                if command.trim().is_empty() {
                    return reject(ctx, "simulate_gui", "command is empty").await;
                }
                ctx.log()
                    .info(format!("Simulating GUI action: {command}"))
                    .await;
                self.executor
                    .execute(&format!("{} {command}", self.gui_tool), ctx, timeout)
                    .await
            }
        }
    }
}

async fn reject(ctx: &SandboxContext, tool: &str, reason: &str) -> StepResult {
    let msg = format!("Invalid step: {reason}");
    ctx.log().error(&msg).await;
    StepResult::failed(tool, msg)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::store::TaskPaths;
    use serde_json::json;

    async fn setup(cfg: ExecutorConfig) -> (tempfile::TempDir, SandboxContext, StepDispatcher) {
        let dir = tempfile::tempdir().unwrap();
        let paths = TaskPaths::new(dir.path(), "t-dispatch");
        tokio::fs::create_dir_all(&paths.dir).await.unwrap();
        let ctx = SandboxContext::prepare("t-dispatch", &paths).await.unwrap();
        (dir, ctx, StepDispatcher::new(&cfg))
    }

    fn entry(v: serde_json::Value) -> StepEntry {
        StepEntry::from_value(v)
    }

    #[tokio::test]
    async fn shell_step_runs() {
        let (_d, ctx, d) = setup(ExecutorConfig::default()).await;
        let r = d
            .dispatch(&entry(json!({"tool": "shell", "command": "echo hi"})), &ctx)
            .await;
        assert!(r.success);
        assert_eq!(r.tool, "shell");
        assert_eq!(r.stdout, "hi\n");
    }

    #[tokio::test]
    async fn unknown_and_malformed_steps_fail_without_panicking() {
        let (_d, ctx, d) = setup(ExecutorConfig::default()).await;

        let r = d.dispatch(&entry(json!({"tool": "teleport"})), &ctx).await;
        assert!(!r.success);
        assert_eq!(r.tool, "teleport");
        assert_eq!(r.error.as_deref(), Some("Unknown tool: teleport"));

        let r = d.dispatch(&entry(json!({"tool": "shell"})), &ctx).await;
        assert!(!r.success);
        assert_eq!(r.tool, "shell");
        assert!(r.error.unwrap().starts_with("Invalid step"));

        let r = d
            .dispatch(&entry(json!({"tool": "shell", "command": "  "})), &ctx)
            .await;
        assert!(!r.success);
    }

    #[tokio::test]
    async fn gui_step_invokes_configured_tool() {
        let cfg = ExecutorConfig {
            gui_tool: "echo".into(),
            ..ExecutorConfig::default()
        };
        let (_d, ctx, d) = setup(cfg).await;
        let r = d
            .dispatch(
                &entry(json!({"tool": "simulate_gui", "command": "key Return"})),
                &ctx,
            )
            .await;
        assert!(r.success);
        assert_eq!(r.tool, "simulate_gui");
        assert_eq!(r.stdout.trim(), "key Return");
    }

    #[tokio::test]
    async fn step_timeout_override_applies() {
        let (_d, ctx, d) = setup(ExecutorConfig::default()).await;
        let r = d
            .dispatch(
                &entry(json!({"tool": "shell", "command": "sleep 20", "timeout_secs": 1})),
                &ctx,
            )
            .await;
        assert!(r.timed_out);
        assert!(!r.success);
    }

    #[tokio::test]
    async fn typescript_step_writes_script_js() {
        let cfg = ExecutorConfig {
            node_bin: "cat".into(),
            ..ExecutorConfig::default()
        };
        let (_d, ctx, d) = setup(cfg).await;
        let r = d
            .dispatch(
                &entry(json!({"tool": "typescript", "code": "console.log(1)"})),
                &ctx,
            )
            .await;
        assert!(r.success);
        assert_eq!(r.tool, "typescript");
        assert_eq!(r.stdout, "console.log(1)");
        assert!(ctx.workdir().join("script.js").exists());
    }
}
