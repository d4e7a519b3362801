use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::{StoreError, SubmitError};
use crate::store::TaskStore;
use crate::task::{new_task_id, TaskDefinition, TaskId, TaskState, TaskStatus};

use super::queue::TaskQueue;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitReceipt {
    pub task_id: TaskId,
    pub status: TaskState,
    pub message: String,
}

/// Front door for clients: accepts definitions and answers status/log/list queries.
/// Execution happens on the worker pool behind [`TaskQueue`].
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
    queue: TaskQueue,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>, queue: TaskQueue) -> Self {
        Self { store, queue }
    }

    /// Validate and persist `document`, then hand it to the workers.
    ///
    /// When this returns `Ok`, the task's status already reads `scheduled`. A document
    /// without `steps` is rejected before any id is assigned.
    pub async fn submit(&self, document: &Value) -> Result<SubmitReceipt, SubmitError> {
        let definition = TaskDefinition::from_document(document)?;

        let task_id = new_task_id();
        self.store.put_definition(&task_id, document).await?;
        let mut status = TaskStatus::scheduled(task_id.clone());
        self.store.set_status(&status).await?;

        if let Err(e) = self.queue.enqueue(task_id.clone()) {
            tracing::warn!(task_id = %task_id, error = %e, "task could not be queued");
            if status
                .transition(TaskState::Failed, format!("Task could not be queued: {e}"))
                .is_ok()
            {
                if let Err(se) = self.store.set_status(&status).await {
                    tracing::error!(task_id = %task_id, error = %se, "failed to record queue rejection");
                }
            }
            return Err(e);
        }

        tracing::info!(
            task_id = %task_id,
            steps = definition.steps.len(),
            fail_fast = definition.fail_fast,
            "task scheduled"
        );
        Ok(SubmitReceipt {
            task_id,
            status: status.status,
            message: status.message,
        })
    }

    /// `None` for unknown ids, including ids that are not well formed.
    pub async fn status(&self, task_id: &str) -> Result<Option<TaskStatus>, StoreError> {
        self.store.get_status(task_id).await
    }

    pub async fn log(&self, task_id: &str) -> Result<Option<String>, StoreError> {
        self.store.get_log(task_id).await
    }

    pub async fn list(&self) -> Result<Vec<TaskStatus>, StoreError> {
        self.store.list_statuses().await
    }

    /// Path of the task's log file, reported alongside status queries.
    pub fn log_path(&self, task_id: &str) -> Option<std::path::PathBuf> {
        self.store.paths(task_id).ok().map(|p| p.log)
    }
}
