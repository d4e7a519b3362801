//! Drives one task from `scheduled` to a terminal state.

mod task_runner;

pub use task_runner::{RunFault, TaskRunner};
