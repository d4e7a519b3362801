use std::path::{Path, PathBuf};

use crate::error::PathError;
use crate::store::TaskPaths;

use super::log::TaskLog;
use super::paths;

/// Execution context of one task: the canonical working directory and its log.
/// Owned by a single task run and never shared.
pub struct SandboxContext {
    workdir: PathBuf,
    log: TaskLog,
}

impl SandboxContext {
    /// Create the working directory (if absent) and open the log. Must succeed before
    /// any step runs.
    pub async fn prepare(task_id: &str, paths: &TaskPaths) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(&paths.workspace).await?;
        let workdir = tokio::fs::canonicalize(&paths.workspace).await?;
        let log = TaskLog::open(task_id, &paths.log).await?;
        log.info(format!(
            "Agent initialized (workdir: {}).",
            workdir.display()
        ))
        .await;
        Ok(Self {
            workdir,
            log,
        })
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn log(&self) -> &TaskLog {
        &self.log
    }

    /// Map a step-supplied path into the working directory.
    pub async fn resolve(&self, requested: &str) -> Result<PathBuf, PathError> {
        paths::confine(&self.workdir, requested).await
    }
}
