use crate::error::StoreError;
use crate::store::TaskStore;
use crate::task::{TaskId, TaskState};

use super::queue::TaskQueue;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryReport {
    pub requeued: Vec<TaskId>,
    pub interrupted: Vec<TaskId>,
}

/// Reconcile persisted state after a restart.
///
/// Tasks left `running` lost their executor and are marked `failed`. Tasks still
/// `scheduled` never started and are queued again, oldest first.
pub async fn recover_tasks(
    store: &dyn TaskStore,
    queue: &TaskQueue,
) -> Result<RecoveryReport, StoreError> {
    let mut report = RecoveryReport::default();

    for mut status in store.list_statuses().await?.into_iter().rev() {
        match status.status {
            TaskState::Running => {
                if status
                    .transition(
                        TaskState::Failed,
                        "Task interrupted: the service stopped while it was running.",
                    )
                    .is_ok()
                {
                    store.set_status(&status).await?;
                    report.interrupted.push(status.task_id);
                }
            }
            TaskState::Scheduled => {
                if let Err(e) = queue.enqueue_wait(status.task_id.clone()).await {
                    tracing::warn!(task_id = %status.task_id, error = %e, "could not requeue task");
                    continue;
                }
                report.requeued.push(status.task_id);
            }
            TaskState::Completed | TaskState::Failed => {}
        }
    }

    if !report.requeued.is_empty() || !report.interrupted.is_empty() {
        tracing::info!(
            requeued = report.requeued.len(),
            interrupted = report.interrupted.len(),
            "recovered tasks from previous run"
        );
    }
    Ok(report)
}
