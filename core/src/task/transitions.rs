//! Task lifecycle transition rules.

use super::status::TaskState;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid transition from {from:?} to {to:?}")]
    InvalidTransition { from: TaskState, to: TaskState },
    #[error("Cannot transition from terminal state {state:?}")]
    FromTerminalState { state: TaskState },
}

pub struct TaskTransition;

impl TaskTransition {
    /// Forward-only: scheduled -> running -> completed, with failed reachable from
    /// any non-terminal state.
    pub fn validate(from: TaskState, to: TaskState) -> Result<(), TransitionError> {
        if Self::is_terminal(from) {
            return Err(TransitionError::FromTerminalState { state: from });
        }

        let is_valid = matches!(
            (from, to),
            (TaskState::Scheduled, TaskState::Running)
                | (TaskState::Running, TaskState::Completed)
                | (_, TaskState::Failed)
        );

        if is_valid {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition { from, to })
        }
    }

    pub fn is_terminal(state: TaskState) -> bool {
        matches!(state, TaskState::Completed | TaskState::Failed)
    }

    pub fn state_description(state: TaskState) -> &'static str {
        match state {
            TaskState::Scheduled => "waiting for a worker",
            TaskState::Running => "executing steps",
            TaskState::Completed => "finished",
            TaskState::Failed => "aborted with an error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(TaskTransition::validate(TaskState::Scheduled, TaskState::Running).is_ok());
        assert!(TaskTransition::validate(TaskState::Running, TaskState::Completed).is_ok());
        assert!(TaskTransition::validate(TaskState::Running, TaskState::Failed).is_ok());
        assert!(TaskTransition::validate(TaskState::Scheduled, TaskState::Failed).is_ok());
    }

    #[test]
    fn test_invalid_transitions() {
        assert_eq!(
            TaskTransition::validate(TaskState::Scheduled, TaskState::Completed),
            Err(TransitionError::InvalidTransition {
                from: TaskState::Scheduled,
                to: TaskState::Completed
            })
        );
        assert!(TaskTransition::validate(TaskState::Running, TaskState::Scheduled).is_err());
        assert!(TaskTransition::validate(TaskState::Running, TaskState::Running).is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(TaskTransition::is_terminal(TaskState::Completed));
        assert!(TaskTransition::is_terminal(TaskState::Failed));
        assert!(!TaskTransition::is_terminal(TaskState::Running));
        assert_eq!(
            TaskTransition::validate(TaskState::Completed, TaskState::Failed),
            Err(TransitionError::FromTerminalState {
                state: TaskState::Completed
            })
        );
    }

    #[test]
    fn test_state_description() {
        assert_eq!(
            TaskTransition::state_description(TaskState::Scheduled),
            "waiting for a worker"
        );
        assert_eq!(
            TaskTransition::state_description(TaskState::Failed),
            "aborted with an error"
        );
    }
}
