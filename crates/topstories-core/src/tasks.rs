use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Default)]
struct Inner {
    inflight: AtomicUsize,
    idle: Notify,
}

/// Decrements the in-flight count even if the task panics.
struct InflightGuard(Arc<Inner>);

impl Drop for InflightGuard {
    fn drop(&mut self) {
        if self.0.inflight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// Detached work that outlives the request which started it.
///
/// Failures are logged and dropped; nothing is retried. Call [`drain`] before
/// the process exits so pending writes get a chance to land.
///
/// [`drain`]: BackgroundTasks::drain
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    inner: Arc<Inner>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `fut` on the current tokio runtime without waiting for it.
    pub fn spawn<F, E>(&self, name: &'static str, fut: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        self.inner.inflight.fetch_add(1, Ordering::SeqCst);
        let guard = InflightGuard(self.inner.clone());
        tokio::spawn(async move {
            let _guard = guard;
            if let Err(e) = fut.await {
                log::warn!("background task {} failed: {}", name, e);
            }
        });
    }

    pub fn inflight(&self) -> usize {
        self.inner.inflight.load(Ordering::SeqCst)
    }

    /// Resolve once nothing is in flight.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.inflight() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Wait for in-flight tasks for at most `grace`. Returns `false` if some
    /// were still running when the grace period ran out.
    pub async fn drain(&self, grace: Duration) -> bool {
        tokio::time::timeout(grace, self.wait_idle()).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TopStoriesError;
    use std::sync::atomic::AtomicBool;

    #[tokio::test]
    async fn test_drain_waits_for_spawned_work() {
        let tasks = BackgroundTasks::new();
        let done = Arc::new(AtomicBool::new(false));

        let flag = done.clone();
        tasks.spawn("sleepy", async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            flag.store(true, Ordering::SeqCst);
            Ok::<_, TopStoriesError>(())
        });

        assert!(tasks.drain(Duration::from_secs(5)).await);
        assert!(done.load(Ordering::SeqCst));
        assert_eq!(tasks.inflight(), 0);
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let tasks = BackgroundTasks::new();
        tasks.spawn("failing", async { Err::<(), _>(TopStoriesError::server("boom")) });
        assert!(tasks.drain(Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn test_drain_gives_up_after_grace() {
        let tasks = BackgroundTasks::new();
        tasks.spawn("stuck", async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, TopStoriesError>(())
        });

        assert!(!tasks.drain(Duration::from_millis(20)).await);
        assert_eq!(tasks.inflight(), 1);
    }

    #[tokio::test]
    async fn test_drain_when_idle() {
        assert!(BackgroundTasks::new().drain(Duration::from_millis(1)).await);
    }
}
