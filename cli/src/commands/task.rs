use std::path::Path;
use std::sync::Arc;

use agentbox_core::api::{
    AppConfig, CliError, FsTaskStore, StepDispatcher, TaskRunner, TaskState, TaskStatus, TaskStore,
    TaskTransition,
};
use serde_json::Value;
use tokio::io::AsyncReadExt;

use super::cli::{ListArgs, RunArgs, TaskIdArgs};

/// Exit status of `run`: 0 when every step succeeded, 1 when the task completed with
/// failed steps, 2 when the task itself failed.
pub fn exit_code_for_status(status: &TaskStatus) -> i32 {
    match status.status {
        TaskState::Completed if status.failed_steps() == 0 => 0,
        TaskState::Completed => 1,
        _ => 2,
    }
}

/// Read a task document from `file` (`-` is stdin), forcing `fail_fast` when asked.
async fn read_task_document(file: &Path, fail_fast: bool) -> Result<Value, CliError> {
    let raw = if file.as_os_str() == "-" {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        buf
    } else {
        tokio::fs::read_to_string(file)
            .await
            .map_err(|e| CliError::Command(format!("cannot read {}: {e}", file.display())))?
    };
    let mut document: Value = serde_json::from_str(&raw)
        .map_err(|e| CliError::Command(format!("task file is not valid JSON: {e}")))?;
    if fail_fast {
        if let Some(obj) = document.as_object_mut() {
            obj.insert("fail_fast".into(), Value::Bool(true));
        }
    }
    Ok(document)
}

pub async fn handle_run(args: RunArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let document = read_task_document(&args.file, args.fail_fast).await?;

    let store = Arc::new(FsTaskStore::open(cfg.tasks_root()).await?);
    let runner = TaskRunner::new(store, StepDispatcher::new(&cfg.executor));
    let status = runner.run_document(&document).await?;

    if args.summary {
        print_status(&status);
    } else {
        print_json(&status)?;
    }
    Ok(exit_code_for_status(&status))
}

pub async fn handle_status(args: TaskIdArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let store = FsTaskStore::new(cfg.tasks_root());
    let status = store
        .get_status(&args.task_id)
        .await?
        .ok_or_else(|| CliError::NotFound(args.task_id.clone()))?;
    if args.json {
        print_json(&status)?;
    } else {
        print_status(&status);
    }
    Ok(0)
}

pub async fn handle_logs(args: TaskIdArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let store = FsTaskStore::new(cfg.tasks_root());
    let logs = store
        .get_log(&args.task_id)
        .await?
        .ok_or_else(|| CliError::NotFound(args.task_id.clone()))?;
    if args.json {
        print_json(&serde_json::json!({ "task_id": args.task_id, "logs": logs }))?;
    } else {
        print!("{logs}");
    }
    Ok(0)
}

pub async fn handle_list(args: ListArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let store = FsTaskStore::new(cfg.tasks_root());
    let mut tasks = store.list_statuses().await?;
    if let Some(limit) = args.limit {
        tasks.truncate(limit);
    }
    if args.json {
        print_json(&serde_json::json!({ "tasks": tasks }))?;
        return Ok(0);
    }
    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(0);
    }
    for t in &tasks {
        println!(
            "{}  {:<9}  {}  {} step(s)  {}",
            t.task_id,
            t.status,
            t.created_at.format("%Y-%m-%d %H:%M:%S"),
            t.results.len(),
            t.message
        );
    }
    Ok(0)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let s = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::Command(format!("failed to encode output: {e}")))?;
    println!("{s}");
    Ok(())
}

fn status_header(status: &TaskStatus) -> String {
    format!(
        "Task {}: {} ({})",
        status.task_id,
        status.status,
        TaskTransition::state_description(status.status)
    )
}

fn print_status(status: &TaskStatus) {
    println!("{}", status_header(status));
    if !status.message.is_empty() {
        println!("  {}", status.message);
    }
    for (idx, r) in status.results.iter().enumerate() {
        let outcome = if r.success {
            "ok"
        } else if r.timed_out {
            "timeout"
        } else {
            "failed"
        };
        println!("  [{}] {:<12} {:<7} {}ms", idx + 1, r.tool, outcome, r.duration_ms);
        if let Some(err) = &r.error {
            println!("      {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentbox_core::api::StepResult;

    #[tokio::test]
    async fn task_document_is_read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("task.json");
        std::fs::write(&path, r#"{"steps": [{"tool": "shell", "command": "true"}]}"#).unwrap();

        let doc = read_task_document(&path, true).await.unwrap();
        assert_eq!(doc["fail_fast"], Value::Bool(true));
        assert_eq!(doc["steps"][0]["tool"], "shell");

        std::fs::write(&path, "not json").unwrap();
        let err = read_task_document(&path, false).await.unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));

        let missing = read_task_document(&dir.path().join("nope.json"), false).await;
        assert!(matches!(missing, Err(CliError::Command(_))));
    }

    #[test]
    fn status_header_describes_state() {
        let mut s = TaskStatus::scheduled("t1");
        assert_eq!(status_header(&s), "Task t1: scheduled (waiting for a worker)");
        s.transition(TaskState::Failed, "boom").unwrap();
        assert_eq!(status_header(&s), "Task t1: failed (aborted with an error)");
    }

    #[test]
    fn run_exit_codes_follow_outcome() {
        let mut s = TaskStatus::scheduled("t");
        s.transition(TaskState::Running, "go").unwrap();
        let mut ok = s.clone();
        ok.push_result(StepResult::succeeded("shell", "hi"));
        ok.transition(TaskState::Completed, "done").unwrap();
        assert_eq!(exit_code_for_status(&ok), 0);

        let mut partial = s.clone();
        partial.push_result(StepResult::failed("shell", "boom"));
        partial.transition(TaskState::Completed, "done").unwrap();
        assert_eq!(exit_code_for_status(&partial), 1);

        let mut failed = s;
        failed.transition(TaskState::Failed, "load").unwrap();
        assert_eq!(exit_code_for_status(&failed), 2);
    }
}
