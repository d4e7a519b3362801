//! Request validation helpers

use agentbox_core::api::is_valid_task_id;

use super::models::HttpServerError;

/// Extract a task id query parameter. Absent or blank ids are a bad request; ids
/// that cannot name a task are reported as not found.
pub fn require_task_id(task_id: Option<&str>) -> Result<&str, HttpServerError> {
    let id = task_id.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(|| {
        HttpServerError::InvalidRequest("Missing required parameter: task_id".to_string())
    })?;
    validate_task_id(id)?;
    Ok(id)
}

pub fn validate_task_id(task_id: &str) -> Result<(), HttpServerError> {
    if !is_valid_task_id(task_id) {
        return Err(not_found(task_id));
    }
    Ok(())
}

pub fn not_found(task_id: &str) -> HttpServerError {
    HttpServerError::NotFound(format!("Task {task_id} not found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_blank_id_is_bad_request() {
        assert!(matches!(
            require_task_id(None),
            Err(HttpServerError::InvalidRequest(_))
        ));
        assert!(matches!(
            require_task_id(Some("  ")),
            Err(HttpServerError::InvalidRequest(_))
        ));
    }

    #[test]
    fn malformed_id_is_not_found() {
        assert!(matches!(
            require_task_id(Some("../etc")),
            Err(HttpServerError::NotFound(_))
        ));
        assert_eq!(require_task_id(Some(" abc-1 ")).unwrap(), "abc-1");
    }
}
