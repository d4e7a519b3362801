use async_trait::async_trait;
use serde_json::Value;

use crate::error::{LoadError, StoreError};
use crate::task::{TaskDefinition, TaskStatus};

use super::layout::TaskPaths;

/// Persistence for task records.
///
/// Status writes replace the whole record atomically. Lookups of unknown or
/// malformed ids yield `Ok(None)`, never an error.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// File locations for `task_id`; fails for ids that are not valid task ids.
    fn paths(&self, task_id: &str) -> Result<TaskPaths, StoreError>;

    /// Create the task directory and persist the submitted document as-is.
    async fn put_definition(&self, task_id: &str, document: &Value) -> Result<(), StoreError>;

    async fn load_definition(&self, task_id: &str) -> Result<TaskDefinition, LoadError>;

    /// Replace the status record of `status.task_id`.
    async fn set_status(&self, status: &TaskStatus) -> Result<(), StoreError>;

    async fn get_status(&self, task_id: &str) -> Result<Option<TaskStatus>, StoreError>;

    /// Every readable status, newest `created_at` first.
    async fn list_statuses(&self) -> Result<Vec<TaskStatus>, StoreError>;

    /// Full log text; `None` when the task or its log does not exist.
    async fn get_log(&self, task_id: &str) -> Result<Option<String>, StoreError>;
}
