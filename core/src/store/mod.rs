//! Durable per-task records: definition, status, and the execution log.

mod atomic;
mod fs;
mod layout;
mod traits;

pub use atomic::atomic_write;
pub use fs::FsTaskStore;
pub use layout::{TaskPaths, DEFINITION_FILE, LOG_FILE, STATUS_FILE, WORKSPACE_DIR};
pub use traits::TaskStore;
