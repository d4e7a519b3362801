//! Stable re-exports for consumers (`cli` and external crates).
//!
//! Prefer importing from `agentbox_core::api` instead of reaching into internal modules.

pub use crate::config::{
    load_default, load_from_path, AppConfig, ExecutorConfig, HttpServerConfig, LoggingConfig,
    WorkerConfig,
};
pub use crate::dispatch::StepDispatcher;
pub use crate::error::{CliError, ErrorCode, LoadError, PathError, StoreError, SubmitError};
pub use crate::runner::TaskRunner;
pub use crate::sandbox::{SandboxContext, SandboxExecutor};
pub use crate::service::{Engine, RecoveryReport, SubmitReceipt, TaskQueue, TaskService, WorkerPool};
pub use crate::store::{FsTaskStore, TaskPaths, TaskStore};
pub use crate::task::{
    is_valid_task_id, new_task_id, Step, StepEntry, StepResult, TaskDefinition, TaskId,
    TaskState, TaskStatus, TaskTransition,
};
