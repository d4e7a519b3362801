use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::result::StepResult;
use super::transitions::{TaskTransition, TransitionError};
use super::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Scheduled,
    Running,
    Completed,
    Failed,
}

impl TaskState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// The persisted status document of one task. Every store write replaces it whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub task_id: TaskId,
    pub status: TaskState,
    #[serde(default)]
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub results: Vec<StepResult>,
}

impl TaskStatus {
    pub fn scheduled(task_id: impl Into<TaskId>) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskState::Scheduled,
            message: "Task scheduled.".to_string(),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            results: Vec::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        TaskTransition::is_terminal(self.status)
    }

    /// Move to `to`, stamping start/completion times. Rejects backward or skipping moves.
    pub fn transition(
        &mut self,
        to: TaskState,
        message: impl Into<String>,
    ) -> Result<(), TransitionError> {
        TaskTransition::validate(self.status, to)?;
        let now = Utc::now();
        self.status = to;
        self.message = message.into();
        match to {
            TaskState::Running => self.started_at = Some(now),
            TaskState::Completed | TaskState::Failed => self.completed_at = Some(now),
            TaskState::Scheduled => {}
        }
        Ok(())
    }

    pub fn push_result(&mut self, result: StepResult) {
        self.results.push(result);
    }

    pub fn failed_steps(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }
}
