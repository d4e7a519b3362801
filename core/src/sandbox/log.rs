use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::util::preview;

/// Append-only execution log of a single task (`agent.log`).
///
/// Each record is `<timestamp> - <LEVEL> - <message>` and is flushed before the
/// call returns, so the trail survives a crash of the caller right after.
pub struct TaskLog {
    task_id: String,
    path: PathBuf,
    file: Mutex<File>,
}

impl TaskLog {
    pub async fn open(task_id: &str, path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        Ok(Self {
            task_id: task_id.to_string(),
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn info(&self, message: impl AsRef<str>) {
        self.append("INFO", message.as_ref()).await;
    }

    pub async fn warn(&self, message: impl AsRef<str>) {
        self.append("WARNING", message.as_ref()).await;
    }

    pub async fn error(&self, message: impl AsRef<str>) {
        self.append("ERROR", message.as_ref()).await;
    }

    async fn append(&self, level: &str, message: &str) {
        tracing::debug!(
            target: "agentbox.task_log",
            task_id = %self.task_id,
            level,
            message = %preview(message, 200)
        );

        let line = format!(
            "{} - {} - {}\n",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level,
            message
        );
        let mut file = self.file.lock().await;
        let written = match file.write_all(line.as_bytes()).await {
            Ok(()) => file.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            tracing::warn!(
                task_id = %self.task_id,
                path = %self.path.display(),
                error = %e,
                "failed to append to task log"
            );
        }
    }
}
