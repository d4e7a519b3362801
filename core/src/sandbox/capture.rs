use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::task::JoinHandle;

use crate::util::RingBytes;

/// Copy a child pipe into `ring` until EOF.
pub(crate) fn pump<R>(
    mut rd: R,
    ring: Arc<RingBytes>,
    label: &'static str,
) -> JoinHandle<std::io::Result<u64>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; 16 * 1024];
        let mut total = 0u64;
        loop {
            let n = rd.read(&mut buf).await.map_err(|e| {
                tracing::debug!(stream = label, error = %e, "pipe read failed");
                e
            })?;
            if n == 0 {
                break;
            }
            ring.push(&buf[..n]);
            total += n as u64;
        }
        Ok(total)
    })
}

/// Wait (bounded) for a pump to reach EOF and return what was captured.
///
/// A background process that inherited the pipe can keep it open after the direct
/// child exits; in that case the reader is abandoned and the retained bytes returned.
pub(crate) async fn collect(
    task: Option<JoinHandle<std::io::Result<u64>>>,
    ring: &RingBytes,
    wait: Duration,
    label: &'static str,
) -> String {
    if let Some(mut task) = task {
        match tokio::time::timeout(wait, &mut task).await {
            Ok(Ok(Ok(_))) => {}
            Ok(Ok(Err(e))) => tracing::warn!(stream = label, error = %e, "capture failed"),
            Ok(Err(e)) => tracing::warn!(stream = label, error = %e, "capture task panicked"),
            Err(_) => {
                tracing::warn!(stream = label, "capture timed out; pipe still held open");
                task.abort();
            }
        }
    }
    ring.to_text()
}
