use std::path::{Path, PathBuf};

pub const DEFINITION_FILE: &str = "task.json";
pub const STATUS_FILE: &str = "status.json";
pub const LOG_FILE: &str = "agent.log";
pub const WORKSPACE_DIR: &str = "workspace";

/// Location of every file belonging to one task under the store root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPaths {
    pub dir: PathBuf,
    pub definition: PathBuf,
    pub status: PathBuf,
    pub log: PathBuf,
    pub workspace: PathBuf,
}

impl TaskPaths {
    /// Callers validate `task_id` first; this only joins paths.
    pub fn new(root: &Path, task_id: &str) -> Self {
        let dir = root.join(task_id);
        Self {
            definition: dir.join(DEFINITION_FILE),
            status: dir.join(STATUS_FILE),
            log: dir.join(LOG_FILE),
            workspace: dir.join(WORKSPACE_DIR),
            dir,
        }
    }
}
