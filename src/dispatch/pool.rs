use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::error::DispatchError;

/// Runs blocking jobs on at most `size` worker threads, each under a deadline.
///
/// The deadline covers queueing plus execution. A job that overruns is told to
/// stop through its [`CancellationToken`] and keeps its worker slot until it
/// actually returns.
#[derive(Debug, Clone)]
pub struct InferencePool {
    permits: Arc<Semaphore>,
    size: usize,
    timeout: Duration,
}

impl InferencePool {
    pub fn new(size: usize, timeout: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
            timeout,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Idle worker slots.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub async fn run<T, F>(&self, job: F) -> Result<T, DispatchError>
    where
        F: FnOnce(&CancellationToken) -> T + Send + 'static,
        T: Send + 'static,
    {
        let started = Instant::now();
        let cancel = CancellationToken::new();

        let worker_token = cancel.clone();
        let permits = Arc::clone(&self.permits);
        let work = async move {
            let permit = permits
                .acquire_owned()
                .await
                .map_err(|_| DispatchError::PoolClosed)?;
            debug!(queued_ms = started.elapsed().as_millis() as u64, "Inference slot acquired");

            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                job(&worker_token)
            })
            .await
            .map_err(|e| {
                error!(error = %e, "Inference worker panicked");
                DispatchError::WorkerFailed {
                    reason: e.to_string(),
                }
            })
        };

        match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                cancel.cancel();
                warn!(
                    timeout_secs = self.timeout.as_secs_f32(),
                    "Inference timed out; worker cancelled"
                );
                Err(DispatchError::Timeout {
                    after: self.timeout,
                })
            }
        }
    }
}
