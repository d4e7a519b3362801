#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use agentbox_core::api::{
    AppConfig, Engine, FsTaskStore, StepDispatcher, TaskRunner, TaskService, TaskStatus, TaskStore,
};

pub struct Harness {
    pub dir: tempfile::TempDir,
    pub store: Arc<FsTaskStore>,
    pub engine: Engine,
}

impl Harness {
    pub fn service(&self) -> &TaskService {
        self.engine.service()
    }
}

pub fn test_config(step_timeout_secs: u64, max_concurrency: usize) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.executor.step_timeout_secs = step_timeout_secs;
    cfg.executor.io_capture_timeout_ms = 300;
    cfg.worker.max_concurrency = max_concurrency;
    cfg
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub async fn engine(cfg: AppConfig) -> Harness {
    init_tracing();
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(
        FsTaskStore::open(dir.path().join("tasks"))
            .await
            .expect("open store"),
    );
    let engine = Engine::with_store(store.clone(), &cfg)
        .await
        .expect("start engine");
    Harness { dir, store, engine }
}

pub async fn runner(cfg: &AppConfig) -> (tempfile::TempDir, Arc<FsTaskStore>, TaskRunner) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(
        FsTaskStore::open(dir.path().join("tasks"))
            .await
            .expect("open store"),
    );
    let runner = TaskRunner::new(store.clone(), StepDispatcher::new(&cfg.executor));
    (dir, store, runner)
}

/// Poll until the task reaches a terminal state or `limit` elapses.
pub async fn wait_terminal(store: &dyn TaskStore, task_id: &str, limit: Duration) -> TaskStatus {
    let deadline = tokio::time::Instant::now() + limit;
    loop {
        if let Some(status) = store.get_status(task_id).await.expect("get status") {
            if status.is_terminal() {
                return status;
            }
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "task {task_id} did not finish within {limit:?}"
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

pub fn has_interpreter(bin: &str) -> bool {
    std::process::Command::new(bin)
        .arg("--version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
