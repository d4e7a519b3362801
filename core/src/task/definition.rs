use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SubmitError;

use super::step::StepEntry;

/// A submitted task: ordered steps plus the `fail_fast` flag. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub steps: Vec<StepEntry>,
    #[serde(default)]
    pub fail_fast: bool,
}

impl TaskDefinition {
    /// Validate a submission document. Only the envelope is checked here; individual
    /// steps are accepted as-is and judged by the dispatcher.
    pub fn from_document(document: &Value) -> Result<Self, SubmitError> {
        let obj = document.as_object().ok_or(SubmitError::NotAnObject)?;
        let steps = obj.get("steps").ok_or(SubmitError::MissingSteps)?;
        if !steps.is_array() {
            return Err(SubmitError::Invalid("'steps' must be an array".into()));
        }
        if let Some(ff) = obj.get("fail_fast") {
            if !ff.is_boolean() && !ff.is_null() {
                return Err(SubmitError::Invalid("'fail_fast' must be a boolean".into()));
            }
        }
        let fail_fast = obj
            .get("fail_fast")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let steps = steps
            .as_array()
            .map(|items| items.iter().cloned().map(StepEntry::from_value).collect())
            .unwrap_or_default();
        Ok(Self { steps, fail_fast })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_minimal_document() {
        let def = TaskDefinition::from_document(&json!({"steps": []})).unwrap();
        assert!(def.steps.is_empty());
        assert!(!def.fail_fast);
    }

    #[test]
    fn rejects_missing_steps() {
        let err = TaskDefinition::from_document(&json!({"fail_fast": true})).unwrap_err();
        assert!(matches!(err, SubmitError::MissingSteps));
    }

    #[test]
    fn rejects_non_object_and_non_array() {
        assert!(matches!(
            TaskDefinition::from_document(&json!([1, 2])).unwrap_err(),
            SubmitError::NotAnObject
        ));
        assert!(matches!(
            TaskDefinition::from_document(&json!({"steps": "echo"})).unwrap_err(),
            SubmitError::Invalid(_)
        ));
        assert!(matches!(
            TaskDefinition::from_document(&json!({"steps": [], "fail_fast": "yes"})).unwrap_err(),
            SubmitError::Invalid(_)
        ));
    }

    #[test]
    fn unknown_steps_do_not_reject_the_task() {
        let def = TaskDefinition::from_document(&json!({
            "steps": [{"tool": "nope"}, {"tool": "shell", "command": "true"}],
            "fail_fast": true
        }))
        .unwrap();
        assert_eq!(def.steps.len(), 2);
        assert_eq!(def.steps[0].tool_name(), "nope");
        assert!(def.fail_fast);
    }

    #[test]
    fn stored_document_round_trips_through_serde() {
        let doc = json!({"steps": [{"tool": "read_file", "path": "a"}]});
        let def = TaskDefinition::from_document(&doc).unwrap();
        let parsed: TaskDefinition = serde_json::from_value(doc).unwrap();
        assert_eq!(def, parsed);
    }
}
