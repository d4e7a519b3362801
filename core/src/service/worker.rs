use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::{mpsc, oneshot, Semaphore};
use tokio::task::{JoinError, JoinHandle};

use crate::config::WorkerConfig;
use crate::error::StoreError;
use crate::runner::TaskRunner;
use crate::task::{TaskId, TaskStatus};

use super::queue::TaskQueue;

type RunOutcome = Result<Result<TaskStatus, StoreError>, JoinError>;

/// Background executor: pulls task ids off the queue and runs up to
/// `max_concurrency` of them at once, each on its own tokio task.
pub struct WorkerPool {
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl WorkerPool {
    pub fn start(runner: Arc<TaskRunner>, cfg: &WorkerConfig) -> (Self, TaskQueue) {
        let (queue, rx) = TaskQueue::bounded(cfg.queue_capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let max_concurrency = cfg.max_concurrency.max(1);
        tracing::info!(
            max_concurrency,
            queue_capacity = cfg.queue_capacity,
            "worker pool started"
        );
        let handle = tokio::spawn(dispatch_loop(rx, shutdown_rx, runner, max_concurrency));
        (
            Self {
                shutdown_tx: Some(shutdown_tx),
                handle,
            },
            queue,
        )
    }

    /// Stop accepting new tasks, finish everything already queued or running, then return.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.handle).await {
            tracing::error!(error = %e, "worker pool dispatcher crashed");
        }
        tracing::info!("worker pool stopped");
    }
}

async fn dispatch_loop(
    mut rx: mpsc::Receiver<TaskId>,
    mut shutdown_rx: oneshot::Receiver<()>,
    runner: Arc<TaskRunner>,
    max_concurrency: usize,
) {
    let sem = Arc::new(Semaphore::new(max_concurrency));
    let mut inflight = FuturesUnordered::new();
    let mut closing = false;

    loop {
        tokio::select! {
            _ = &mut shutdown_rx, if !closing => {
                // Buffered ids are still delivered after close().
                closing = true;
                rx.close();
            }
            next = rx.recv() => {
                let Some(task_id) = next else { break };
                let Ok(permit) = sem.clone().acquire_owned().await else { break };
                let runner_for_task = runner.clone();
                let id = task_id.clone();
                let handle = tokio::spawn(async move {
                    let _permit = permit;
                    runner_for_task.run(&id).await
                });
                inflight.push(join_run(task_id, handle));
            }
            Some((task_id, outcome)) = inflight.next(), if !inflight.is_empty() => {
                settle(&runner, &task_id, outcome).await;
            }
        }
    }

    while let Some((task_id, outcome)) = inflight.next().await {
        settle(&runner, &task_id, outcome).await;
    }
}

async fn join_run(
    task_id: TaskId,
    handle: JoinHandle<Result<TaskStatus, StoreError>>,
) -> (TaskId, RunOutcome) {
    (task_id, handle.await)
}

async fn settle(runner: &TaskRunner, task_id: &str, outcome: RunOutcome) {
    match outcome {
        Ok(Ok(status)) => {
            tracing::debug!(task_id, state = %status.status, "task run settled");
        }
        Ok(Err(e)) => {
            tracing::error!(task_id, error = %e, "task status could not be saved");
            let reason = format!("Task status could not be saved: {e}");
            if let Err(se) = runner.mark_failed(task_id, &reason).await {
                tracing::error!(task_id, error = %se, "failed to record store fault");
            }
        }
        Err(e) => {
            tracing::error!(task_id, error = %e, "task worker crashed");
            let reason = format!("Task worker crashed: {e}");
            if let Err(se) = runner.mark_failed(task_id, &reason).await {
                tracing::error!(task_id, error = %se, "failed to record worker crash");
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::ExecutorConfig;
    use crate::dispatch::StepDispatcher;
    use crate::store::{FsTaskStore, TaskStore};
    use crate::error::{LoadError, StoreError};
    use crate::store::TaskPaths;
    use crate::task::{TaskDefinition, TaskState};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    /// Rejects every write that would move a task to `running`.
    struct RunningWriteFails(FsTaskStore);

    #[async_trait]
    impl TaskStore for RunningWriteFails {
        fn paths(&self, task_id: &str) -> Result<TaskPaths, StoreError> {
            self.0.paths(task_id)
        }

        async fn put_definition(&self, task_id: &str, document: &Value) -> Result<(), StoreError> {
            self.0.put_definition(task_id, document).await
        }

        async fn load_definition(&self, task_id: &str) -> Result<TaskDefinition, LoadError> {
            self.0.load_definition(task_id).await
        }

        async fn set_status(&self, status: &TaskStatus) -> Result<(), StoreError> {
            if status.status == TaskState::Running {
                return Err(StoreError::io(
                    "status.json",
                    std::io::Error::other("disk full"),
                ));
            }
            self.0.set_status(status).await
        }

        async fn get_status(&self, task_id: &str) -> Result<Option<TaskStatus>, StoreError> {
            self.0.get_status(task_id).await
        }

        async fn list_statuses(&self) -> Result<Vec<TaskStatus>, StoreError> {
            self.0.list_statuses().await
        }

        async fn get_log(&self, task_id: &str) -> Result<Option<String>, StoreError> {
            self.0.get_log(task_id).await
        }
    }

    #[tokio::test]
    async fn store_fault_on_start_marks_task_failed() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(RunningWriteFails(FsTaskStore::open(dir.path()).await.unwrap()));
        store
            .put_definition("stuck", &json!({"steps": [{"tool": "shell", "command": "echo x"}]}))
            .await
            .unwrap();
        store.set_status(&TaskStatus::scheduled("stuck")).await.unwrap();

        let runner = Arc::new(TaskRunner::new(
            store.clone(),
            StepDispatcher::new(&ExecutorConfig::default()),
        ));
        let (pool, queue) = WorkerPool::start(runner, &WorkerConfig::default());
        queue.enqueue("stuck".into()).unwrap();
        pool.shutdown().await;

        let s = store.get_status("stuck").await.unwrap().unwrap();
        assert_eq!(s.status, TaskState::Failed);
        assert!(s.message.contains("could not be saved"));
        assert!(s.results.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn shutdown_drains_queued_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FsTaskStore::open(dir.path()).await.unwrap());
        let runner = Arc::new(TaskRunner::new(
            store.clone(),
            StepDispatcher::new(&ExecutorConfig::default()),
        ));
        let cfg = WorkerConfig {
            max_concurrency: 2,
            queue_capacity: 16,
        };
        let (pool, queue) = WorkerPool::start(runner, &cfg);

        let ids: Vec<String> = (0..5).map(|i| format!("task-{i}")).collect();
        for id in &ids {
            store
                .put_definition(id, &json!({"steps": [{"tool": "shell", "command": "echo ok"}]}))
                .await
                .unwrap();
            store.set_status(&TaskStatus::scheduled(id.as_str())).await.unwrap();
            queue.enqueue(id.clone()).unwrap();
        }

        pool.shutdown().await;
        assert!(queue.is_closed());
        for id in &ids {
            let s = store.get_status(id).await.unwrap().unwrap();
            assert_eq!(s.status, TaskState::Completed, "{id}");
        }
    }
}
