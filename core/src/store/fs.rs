use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{LoadError, StoreError};
use crate::task::{is_valid_task_id, TaskDefinition, TaskStatus};

use super::atomic::atomic_write;
use super::layout::TaskPaths;
use super::traits::TaskStore;

/// Filesystem store: one directory per task under `root`.
#[derive(Debug, Clone)]
pub struct FsTaskStore {
    root: PathBuf,
}

impl FsTaskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the root directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| StoreError::io(&root, e))?;
        Ok(Self { root })
    }

    async fn read_status(path: &Path) -> Result<Option<TaskStatus>, StoreError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(path, e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Serde {
                path: path.to_path_buf(),
                source,
            })
    }
}

#[async_trait]
impl TaskStore for FsTaskStore {
    fn paths(&self, task_id: &str) -> Result<TaskPaths, StoreError> {
        if !is_valid_task_id(task_id) {
            return Err(StoreError::InvalidTaskId(task_id.to_string()));
        }
        Ok(TaskPaths::new(&self.root, task_id))
    }

    async fn put_definition(&self, task_id: &str, document: &Value) -> Result<(), StoreError> {
        let paths = self.paths(task_id)?;
        tokio::fs::create_dir_all(&paths.dir)
            .await
            .map_err(|e| StoreError::io(&paths.dir, e))?;
        let bytes = serde_json::to_vec_pretty(document).map_err(|source| StoreError::Serde {
            path: paths.definition.clone(),
            source,
        })?;
        atomic_write(&paths.definition, &bytes)
            .await
            .map_err(|e| StoreError::io(&paths.definition, e))
    }

    async fn load_definition(&self, task_id: &str) -> Result<TaskDefinition, LoadError> {
        let paths = self
            .paths(task_id)
            .map_err(|_| LoadError::InvalidTaskId(task_id.to_string()))?;
        let path = paths.definition;
        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LoadError::Missing(path))
            }
            Err(source) => return Err(LoadError::Read { path, source }),
        };
        let document: Value = serde_json::from_slice(&bytes).map_err(|e| LoadError::Malformed {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        TaskDefinition::from_document(&document).map_err(|e| LoadError::Malformed {
            path,
            reason: e.to_string(),
        })
    }

    async fn set_status(&self, status: &TaskStatus) -> Result<(), StoreError> {
        let paths = self.paths(&status.task_id)?;
        tokio::fs::create_dir_all(&paths.dir)
            .await
            .map_err(|e| StoreError::io(&paths.dir, e))?;
        let bytes = serde_json::to_vec_pretty(status).map_err(|source| StoreError::Serde {
            path: paths.status.clone(),
            source,
        })?;
        atomic_write(&paths.status, &bytes)
            .await
            .map_err(|e| StoreError::io(&paths.status, e))
    }

    async fn get_status(&self, task_id: &str) -> Result<Option<TaskStatus>, StoreError> {
        if !is_valid_task_id(task_id) {
            return Ok(None);
        }
        Self::read_status(&TaskPaths::new(&self.root, task_id).status).await
    }

    async fn list_statuses(&self) -> Result<Vec<TaskStatus>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.root, e)),
        };

        let mut statuses = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&self.root, e))?
        {
            let name = entry.file_name();
            let Some(task_id) = name.to_str() else {
                continue;
            };
            if !is_valid_task_id(task_id) {
                continue;
            }
            let path = TaskPaths::new(&self.root, task_id).status;
            match Self::read_status(&path).await {
                Ok(Some(status)) => statuses.push(status),
                Ok(None) => {}
                Err(e) => tracing::warn!(task_id, error = %e, "skipping unreadable task status"),
            }
        }

        statuses.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.task_id.cmp(&b.task_id))
        });
        Ok(statuses)
    }

    async fn get_log(&self, task_id: &str) -> Result<Option<String>, StoreError> {
        if !is_valid_task_id(task_id) {
            return Ok(None);
        }
        let path = TaskPaths::new(&self.root, task_id).log;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }
}
