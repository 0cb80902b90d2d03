//! Interval-driven background refresh.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::fetch::FetchError;

use super::entry::VALIDITY_WINDOW_MINUTES;

/// A running refresh schedule. Dropping the handle stops the schedule;
/// [`stop`](Self::stop) does the same and waits for the task to wind
/// down.
pub struct RefreshHandle {
    stop: watch::Sender<()>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    pub async fn stop(self) {
        drop(self.stop);
        let _ = self.task.await;
    }
}

/// Run `refresh` once per validity window until the handle is stopped
/// or dropped. The first run happens one full window after spawn; the
/// caller has typically just loaded its data.
///
/// Refresh errors are logged and the schedule keeps going; the cached
/// payload from the last good refresh stays in place.
pub fn spawn_refresh<F, Fut>(name: &'static str, mut refresh: F) -> RefreshHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), FetchError>> + Send + 'static,
{
    let (stop, mut stopped) = watch::channel(());
    let interval = Duration::from_secs(60 * VALIDITY_WINDOW_MINUTES as u64);
    let task = tokio::spawn(async move {
        debug!(domain = name, "Background refresh started");
        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = stopped.changed() => {
                    debug!(domain = name, "Background refresh stopped");
                    return;
                }
            }
            if let Err(e) = refresh().await {
                warn!(domain = name, error = %e, "Background refresh failed");
            }
        }
    });
    RefreshHandle { stop, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting(calls: &Arc<AtomicUsize>) -> impl FnMut() -> futures::future::Ready<Result<(), FetchError>> + Send + 'static {
        let calls = Arc::clone(calls);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(Ok(()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_fires_once_per_window() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = spawn_refresh("orders", counting(&calls));

        tokio::time::sleep(Duration::from_secs(301)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_the_schedule() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = spawn_refresh("finance", counting(&calls));

        tokio::time::sleep(Duration::from_secs(301)).await;
        handle.stop().await;

        tokio::time::sleep(Duration::from_secs(900)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_errors_do_not_kill_the_schedule() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = spawn_refresh("dealer_details", {
            let calls = Arc::clone(&calls);
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                futures::future::ready(Err(FetchError::Remote("store offline".to_string())))
            }
        });

        tokio::time::sleep(Duration::from_secs(601)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        handle.stop().await;
    }
}
