use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::dispatch::StepDispatcher;
use crate::error::{LoadError, StoreError, SubmitError};
use crate::sandbox::SandboxContext;
use crate::store::TaskStore;
use crate::task::{new_task_id, TaskDefinition, TaskState, TaskStatus, TransitionError};

/// Anything that ends a run before its steps are exhausted. Each one is recorded as a
/// `failed` status; none of them escapes [`TaskRunner::run`] except a failed final save.
#[derive(Error, Debug)]
pub enum RunFault {
    #[error("failed to prepare task sandbox: {0}")]
    Sandbox(#[source] std::io::Error),
    #[error("failed to load task definition: {0}")]
    Load(#[from] LoadError),
    #[error("failed to persist task status: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

pub struct TaskRunner {
    store: Arc<dyn TaskStore>,
    dispatcher: StepDispatcher,
}

impl TaskRunner {
    pub fn new(store: Arc<dyn TaskStore>, dispatcher: StepDispatcher) -> Self {
        Self { store, dispatcher }
    }

    /// Execute `task_id` to completion and return its final status.
    ///
    /// The status is persisted on entering `running`, after every step, and on reaching
    /// the terminal state. Runs on a task that is already terminal return it unchanged.
    #[tracing::instrument(skip_all, fields(task_id = %task_id))]
    pub async fn run(&self, task_id: &str) -> Result<TaskStatus, StoreError> {
        let mut status = self
            .store
            .get_status(task_id)
            .await?
            .unwrap_or_else(|| TaskStatus::scheduled(task_id));

        if status.is_terminal() {
            tracing::warn!(state = %status.status, "task already finished; not re-running");
            return Ok(status);
        }
        if status.status == TaskState::Scheduled {
            if let Err(e) = status.transition(TaskState::Running, "Task execution started.") {
                tracing::error!(error = %e, "cannot start task");
                return Ok(status);
            }
        }
        self.store.set_status(&status).await?;
        tracing::info!("task started");

        if let Err(fault) = self.execute(task_id, &mut status).await {
            tracing::error!(error = %fault, "task failed");
            if let Err(e) = status.transition(TaskState::Failed, fault.to_string()) {
                tracing::error!(error = %e, "cannot mark task failed");
            }
        }

        self.store.set_status(&status).await?;
        tracing::info!(
            state = %status.status,
            steps = status.results.len(),
            failed_steps = status.failed_steps(),
            "task finished"
        );
        Ok(status)
    }

    async fn execute(&self, task_id: &str, status: &mut TaskStatus) -> Result<(), RunFault> {
        let paths = self.store.paths(task_id)?;
        let ctx = SandboxContext::prepare(task_id, &paths)
            .await
            .map_err(RunFault::Sandbox)?;
        ctx.log()
            .info(format!("Starting execution for task {task_id}"))
            .await;

        let definition = match self.store.load_definition(task_id).await {
            Ok(d) => d,
            Err(e) => {
                ctx.log().error(format!("Failed to load task definition: {e}")).await;
                return Err(e.into());
            }
        };

        let total = definition.steps.len();
        let mut stopped_early = false;
        for (idx, entry) in definition.steps.iter().enumerate() {
            ctx.log()
                .info(format!(
                    "Executing step {}/{} with tool: {}",
                    idx + 1,
                    total,
                    entry.tool_name()
                ))
                .await;

            let result = self.dispatcher.dispatch(entry, &ctx).await;
            let step_failed = !result.success;
            tracing::debug!(
                step = idx + 1,
                tool = %result.tool,
                success = result.success,
                duration_ms = result.duration_ms,
                "step finished"
            );
            status.push_result(result);
            self.store.set_status(status).await?;

            if step_failed && definition.fail_fast {
                ctx.log()
                    .warn(format!("Step {} failed; stopping (fail_fast).", idx + 1))
                    .await;
                stopped_early = true;
                break;
            }
        }

        let failed = status.failed_steps();
        let message = if stopped_early {
            format!(
                "Task stopped early after step {} failed (fail_fast).",
                status.results.len()
            )
        } else if failed > 0 {
            format!("Task finished with {failed} failed step(s).")
        } else {
            "Task finished successfully.".to_string()
        };
        status.transition(TaskState::Completed, message.clone())?;
        ctx.log().info(message).await;
        Ok(())
    }

    /// Persist `document` as a new task and execute it on the calling task, bypassing
    /// any queue. Used by one-shot command line runs.
    pub async fn run_document(&self, document: &Value) -> Result<TaskStatus, SubmitError> {
        TaskDefinition::from_document(document)?;
        let task_id = new_task_id();
        self.store.put_definition(&task_id, document).await?;
        self.store
            .set_status(&TaskStatus::scheduled(task_id.clone()))
            .await?;
        Ok(self.run(&task_id).await?)
    }

    /// Force a non-terminal task into `failed`, e.g. after its worker crashed or the
    /// process restarted mid-run. Terminal or unknown tasks are left alone.
    pub async fn mark_failed(&self, task_id: &str, reason: &str) -> Result<(), StoreError> {
        let Some(mut status) = self.store.get_status(task_id).await? else {
            return Ok(());
        };
        if status.is_terminal() {
            return Ok(());
        }
        if status.transition(TaskState::Failed, reason).is_ok() {
            self.store.set_status(&status).await?;
        }
        Ok(())
    }
}
