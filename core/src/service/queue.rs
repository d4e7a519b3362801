use tokio::sync::mpsc;

use crate::error::SubmitError;
use crate::task::TaskId;

/// Producer side of the bounded hand-off between submission and the worker pool.
#[derive(Debug, Clone)]
pub struct TaskQueue {
    tx: mpsc::Sender<TaskId>,
}

impl TaskQueue {
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<TaskId>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Enqueue without waiting; a full or closed queue is reported to the caller.
    pub fn enqueue(&self, task_id: TaskId) -> Result<(), SubmitError> {
        self.tx.try_send(task_id).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SubmitError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => SubmitError::QueueClosed,
        })
    }

    /// Enqueue, waiting for capacity. Used for startup re-enqueueing.
    pub async fn enqueue_wait(&self, task_id: TaskId) -> Result<(), SubmitError> {
        self.tx
            .send(task_id)
            .await
            .map_err(|_| SubmitError::QueueClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
