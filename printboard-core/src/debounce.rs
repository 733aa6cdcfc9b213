/// Debounced reaction to board change events.
///
/// The worker waits for a change, then for a quiet window of `delay`.
/// Every further change inside the window re-arms the timer, so a burst of
/// mutations yields one action. The action reads the latest state when it
/// fires. A pending action is flushed when the event channel closes.
use std::future::Future;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::events::BoardChangeEvent;

/// Quiet window before the snapshot is saved locally.
pub const SAVE_DEBOUNCE: Duration = Duration::from_millis(250);
/// Quiet window before an automatic remote upload.
pub const AUTO_SYNC_DEBOUNCE: Duration = Duration::from_secs(2);

/// Spawn a debounced worker on the current tokio runtime.
pub fn spawn_debounced<F, Fut>(
    mut rx: broadcast::Receiver<BoardChangeEvent>,
    delay: Duration,
    label: &'static str,
    mut action: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(_) => {}
                Err(RecvError::Lagged(n)) => {
                    log::debug!("[printboard.debounce.{}] Lagged by {} events", label, n);
                }
                Err(RecvError::Closed) => break,
            }

            // Pending: wait for a quiet window, re-arming on every change.
            let closed = loop {
                tokio::select! {
                    result = rx.recv() => match result {
                        Ok(_) | Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break true,
                    },
                    _ = tokio::time::sleep(delay) => break false,
                }
            };

            action().await;
            if closed {
                break;
            }
        }
        log::debug!("[printboard.debounce.{}] Event channel closed, worker exiting", label);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::BoardChange;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn event(revision: u64) -> BoardChangeEvent {
        BoardChangeEvent {
            revision,
            change: BoardChange::ViewChanged,
        }
    }

    fn counting_worker(
        rx: broadcast::Receiver<BoardChangeEvent>,
        delay: Duration,
    ) -> (JoinHandle<()>, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let handle = spawn_debounced(rx, delay, "test", move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });
        (handle, count)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces_into_one_action() {
        let (tx, rx) = broadcast::channel(16);
        let (_handle, count) = counting_worker(rx, SAVE_DEBOUNCE);

        for i in 0..5 {
            tx.send(event(i)).unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_fire_separately() {
        let (tx, rx) = broadcast::channel(16);
        let (_handle, count) = counting_worker(rx, SAVE_DEBOUNCE);

        tx.send(event(1)).unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        tx.send(event(2)).unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_action_flushed_on_close() {
        let (tx, rx) = broadcast::channel(16);
        let (handle, count) = counting_worker(rx, AUTO_SYNC_DEBOUNCE);

        tx.send(event(1)).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(tx);
        handle.await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_close_runs_nothing() {
        let (tx, rx) = broadcast::channel::<BoardChangeEvent>(16);
        let (handle, count) = counting_worker(rx, SAVE_DEBOUNCE);
        drop(tx);
        handle.await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
