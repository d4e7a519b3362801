//! Task data model: definitions, steps, per-step results and lifecycle status.

mod definition;
mod result;
mod status;
mod step;
pub mod transitions;

pub use definition::TaskDefinition;
pub use result::StepResult;
pub use status::{TaskState, TaskStatus};
pub use step::{Step, StepEntry};
pub use transitions::{TaskTransition, TransitionError};

/// Opaque task identifier; doubles as the task's directory name in the store.
pub type TaskId = String;

const MAX_TASK_ID_LEN: usize = 128;

pub fn new_task_id() -> TaskId {
    uuid::Uuid::new_v4().to_string()
}

/// Only ids made of ASCII alphanumerics, `-` and `_` may be mapped onto the filesystem.
pub fn is_valid_task_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_TASK_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
