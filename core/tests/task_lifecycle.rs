#![cfg(unix)]

mod common;

use std::time::Duration;

use agentbox_core::api::{TaskState, TaskStore};
use pretty_assertions::assert_eq;
use serde_json::json;

use common::{engine, has_interpreter, runner, test_config, wait_terminal};

#[tokio::test]
async fn echo_step_completes_with_output() {
    let (_d, _store, runner) = runner(&test_config(30, 1)).await;
    let status = runner
        .run_document(&json!({"steps": [{"tool": "shell", "command": "echo hi"}]}))
        .await
        .unwrap();

    assert_eq!(status.status, TaskState::Completed);
    assert_eq!(status.results.len(), 1);
    assert!(status.results[0].success);
    assert!(status.results[0].stdout.contains("hi"));
}

#[tokio::test]
async fn python_step_prints_result() {
    if !has_interpreter("python3") {
        eprintln!("python3 not available; skipping");
        return;
    }
    let (_d, _store, runner) = runner(&test_config(30, 1)).await;
    let status = runner
        .run_document(&json!({"steps": [{"tool": "python", "code": "print(1+1)"}]}))
        .await
        .unwrap();

    assert_eq!(status.status, TaskState::Completed);
    assert!(status.results[0].success, "{:?}", status.results[0]);
    assert_eq!(status.results[0].stdout.trim(), "2");
}

#[tokio::test]
async fn write_then_read_round_trips_content() {
    let (_d, _store, runner) = runner(&test_config(30, 1)).await;
    let status = runner
        .run_document(&json!({"steps": [
            {"tool": "write_file", "path": "data/out.txt", "content": "line one\nline two"},
            {"tool": "read_file", "path": "data/out.txt"}
        ]}))
        .await
        .unwrap();

    assert_eq!(status.status, TaskState::Completed);
    assert!(status.results.iter().all(|r| r.success));
    assert_eq!(status.results[1].stdout, "line one\nline two");
}

#[tokio::test]
async fn escaping_paths_fail_and_touch_nothing_outside() {
    let (dir, _store, runner) = runner(&test_config(30, 1)).await;
    let status = runner
        .run_document(&json!({"steps": [
            {"tool": "write_file", "path": "../../escaped.txt", "content": "nope"},
            {"tool": "read_file", "path": "../status.json"}
        ]}))
        .await
        .unwrap();

    assert_eq!(status.status, TaskState::Completed);
    assert!(status.results.iter().all(|r| !r.success));
    assert!(!dir.path().join("escaped.txt").exists());
    assert!(!dir.path().join("tasks").join("escaped.txt").exists());
}

#[tokio::test]
async fn timed_out_step_still_reaches_terminal_state() {
    let (_d, _store, runner) = runner(&test_config(1, 1)).await;
    let started = std::time::Instant::now();
    let status = runner
        .run_document(&json!({"steps": [
            {"tool": "shell", "command": "sleep 30"},
            {"tool": "shell", "command": "echo after"}
        ]}))
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(15));
    assert_eq!(status.status, TaskState::Completed);
    assert!(status.results[0].timed_out);
    assert!(!status.results[0].success);
    assert!(status.results[1].success);
}

#[tokio::test]
async fn fail_fast_keeps_results_up_to_first_failure() {
    let (_d, _store, runner) = runner(&test_config(30, 1)).await;
    let status = runner
        .run_document(&json!({"fail_fast": true, "steps": [
            {"tool": "shell", "command": "echo 1"},
            {"tool": "shell", "command": "echo 2"},
            {"tool": "shell", "command": "exit 1"},
            {"tool": "shell", "command": "echo 4"}
        ]}))
        .await
        .unwrap();

    assert_eq!(status.status, TaskState::Completed);
    assert_eq!(status.results.len(), 3);
    assert!(!status.results[2].success);
}

#[tokio::test]
async fn without_fail_fast_every_step_has_a_result() {
    let (_d, _store, runner) = runner(&test_config(30, 1)).await;
    let status = runner
        .run_document(&json!({"steps": [
            {"tool": "shell", "command": "exit 2"},
            {"tool": "bogus"},
            {"tool": "shell", "command": "echo last"}
        ]}))
        .await
        .unwrap();

    assert_eq!(status.status, TaskState::Completed);
    assert_eq!(status.results.len(), 3);
    let tools: Vec<_> = status.results.iter().map(|r| r.tool.as_str()).collect();
    assert_eq!(tools, vec!["shell", "bogus", "shell"]);
}

#[tokio::test]
async fn submitted_task_is_scheduled_then_runs_in_background() {
    let h = engine(test_config(30, 2)).await;
    let receipt = h
        .service()
        .submit(&json!({"steps": [{"tool": "shell", "command": "echo bg"}]}))
        .await
        .unwrap();
    assert_eq!(receipt.status, TaskState::Scheduled);

    // Readable right away, before any worker has necessarily picked it up.
    let first = h.service().status(&receipt.task_id).await.unwrap().unwrap();
    assert!(matches!(
        first.status,
        TaskState::Scheduled | TaskState::Running | TaskState::Completed
    ));

    let done = wait_terminal(h.store.as_ref(), &receipt.task_id, Duration::from_secs(20)).await;
    assert_eq!(done.status, TaskState::Completed);
    let log = h.service().log(&receipt.task_id).await.unwrap().unwrap();
    assert!(log.contains("echo bg"));
    h.engine.shutdown().await;
}

#[tokio::test]
async fn unknown_task_is_not_found_everywhere() {
    let h = engine(test_config(30, 1)).await;
    assert!(h.service().status("does-not-exist").await.unwrap().is_none());
    assert!(h.service().log("does-not-exist").await.unwrap().is_none());
    assert!(h.service().status("../../etc/passwd").await.unwrap().is_none());
    h.engine.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_tasks_are_isolated() {
    let h = engine(test_config(30, 4)).await;
    let mut ids = Vec::new();
    for i in 0..6 {
        let receipt = h
            .service()
            .submit(&json!({"steps": [
                {"tool": "write_file", "path": "mine.txt", "content": format!("task-{i}")},
                {"tool": "shell", "command": "sleep 0.2"},
                {"tool": "read_file", "path": "mine.txt"}
            ]}))
            .await
            .unwrap();
        ids.push((i, receipt.task_id));
    }

    for (i, id) in &ids {
        let status = wait_terminal(h.store.as_ref(), id, Duration::from_secs(30)).await;
        assert_eq!(status.status, TaskState::Completed);
        assert_eq!(status.results[2].stdout, format!("task-{i}"));

        let log = h.store.get_log(id).await.unwrap().unwrap();
        assert!(log.contains(&format!("task {id}")));
        for (_, other) in &ids {
            if other != id {
                assert!(!log.contains(other.as_str()));
            }
        }
    }
    h.engine.shutdown().await;
}

#[tokio::test]
async fn list_returns_newest_first() {
    let h = engine(test_config(30, 1)).await;
    let mut ids = Vec::new();
    for _ in 0..3 {
        let r = h.service().submit(&json!({"steps": []})).await.unwrap();
        ids.push(r.task_id);
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let listed: Vec<_> = h
        .service()
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.task_id)
        .collect();
    ids.reverse();
    assert_eq!(listed, ids);
    h.engine.shutdown().await;
}

#[tokio::test]
async fn restart_recovers_interrupted_and_pending_tasks() {
    let cfg = test_config(30, 1);
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("tasks");
    let store = std::sync::Arc::new(agentbox_core::api::FsTaskStore::open(&root).await.unwrap());

    // Simulate state left by a crashed process.
    let mut running = agentbox_core::api::TaskStatus::scheduled("left-running");
    running.transition(TaskState::Running, "go").unwrap();
    store.set_status(&running).await.unwrap();

    store
        .put_definition("left-pending", &json!({"steps": [{"tool": "shell", "command": "echo resumed"}]}))
        .await
        .unwrap();
    store
        .set_status(&agentbox_core::api::TaskStatus::scheduled("left-pending"))
        .await
        .unwrap();

    let engine = agentbox_core::api::Engine::with_store(store.clone(), &cfg)
        .await
        .unwrap();
    assert_eq!(engine.recovery().interrupted, vec!["left-running".to_string()]);
    assert_eq!(engine.recovery().requeued, vec!["left-pending".to_string()]);

    let pending = wait_terminal(store.as_ref(), "left-pending", Duration::from_secs(20)).await;
    assert_eq!(pending.status, TaskState::Completed);
    let crashed = store.get_status("left-running").await.unwrap().unwrap();
    assert_eq!(crashed.status, TaskState::Failed);
    engine.shutdown().await;
}
