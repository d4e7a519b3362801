use std::sync::Arc;

use crate::config::AppConfig;
use crate::dispatch::StepDispatcher;
use crate::error::StoreError;
use crate::runner::TaskRunner;
use crate::store::{FsTaskStore, TaskStore};

use super::recovery::{recover_tasks, RecoveryReport};
use super::submit::TaskService;
use super::worker::WorkerPool;

/// A running task engine: store, worker pool and the service in front of them.
pub struct Engine {
    service: TaskService,
    pool: WorkerPool,
    recovery: RecoveryReport,
}

impl Engine {
    /// Open the store under `cfg.tasks_root()`, start the workers and recover tasks
    /// left over from a previous process.
    pub async fn start(cfg: &AppConfig) -> Result<Self, StoreError> {
        let store: Arc<dyn TaskStore> = Arc::new(FsTaskStore::open(cfg.tasks_root()).await?);
        Self::with_store(store, cfg).await
    }

    pub async fn with_store(store: Arc<dyn TaskStore>, cfg: &AppConfig) -> Result<Self, StoreError> {
        let runner = Arc::new(TaskRunner::new(
            store.clone(),
            StepDispatcher::new(&cfg.executor),
        ));
        let (pool, queue) = WorkerPool::start(runner, &cfg.worker);
        let recovery = recover_tasks(store.as_ref(), &queue).await?;
        Ok(Self {
            service: TaskService::new(store, queue),
            pool,
            recovery,
        })
    }

    pub fn service(&self) -> &TaskService {
        &self.service
    }

    pub fn recovery(&self) -> &RecoveryReport {
        &self.recovery
    }

    /// Drop the intake side and wait for queued and running tasks to finish.
    pub async fn shutdown(self) {
        drop(self.service);
        self.pool.shutdown().await;
    }
}
