//! Submission, background execution and status queries, wired together.

mod engine;
mod queue;
mod recovery;
mod submit;
mod worker;

pub use engine::Engine;
pub use queue::TaskQueue;
pub use recovery::{recover_tasks, RecoveryReport};
pub use submit::{SubmitReceipt, TaskService};
pub use worker::WorkerPool;
