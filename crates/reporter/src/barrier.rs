use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::info;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Tracks in-flight publishes.
///
/// A publish registers a token before it starts and the token is removed on
/// completion, success or failure. Shutdown must not proceed while the set
/// is non-empty.
#[derive(Debug, Default)]
pub(crate) struct CompletionBarrier {
    pending: Mutex<HashSet<u64>>,
    next_token: AtomicU64,
}

/// Removes its token when dropped, so every exit path of a publish clears
/// its accounting.
pub(crate) struct PublishGuard {
    barrier: Arc<CompletionBarrier>,
    token: u64,
}

impl Drop for PublishGuard {
    fn drop(&mut self) {
        self.barrier.pending.lock().unwrap().remove(&self.token);
    }
}

impl CompletionBarrier {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(self: &Arc<Self>) -> PublishGuard {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        self.pending.lock().unwrap().insert(token);
        PublishGuard {
            barrier: Arc::clone(self),
            token,
        }
    }

    pub(crate) fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Poll until no publish is in flight, logging the remaining count only
    /// when it decreased since the previous poll.
    pub(crate) async fn drain(&self, logging: bool) {
        let mut previous = self.pending_count();
        loop {
            let remaining = self.pending_count();
            if remaining == 0 {
                break;
            }
            if remaining < previous {
                if logging {
                    info!(remaining, "waiting for in-flight publishes");
                }
                previous = remaining;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_clears_token_on_drop() {
        let barrier = Arc::new(CompletionBarrier::new());
        let guard = barrier.register();
        assert_eq!(barrier.pending_count(), 1);
        drop(guard);
        assert_eq!(barrier.pending_count(), 0);
    }

    #[test]
    fn tokens_are_distinct() {
        let barrier = Arc::new(CompletionBarrier::new());
        let first = barrier.register();
        let second = barrier.register();
        assert_eq!(barrier.pending_count(), 2);
        drop(first);
        assert_eq!(barrier.pending_count(), 1);
        drop(second);
        assert_eq!(barrier.pending_count(), 0);
    }

    #[tokio::test]
    async fn drain_returns_immediately_when_empty() {
        let barrier = CompletionBarrier::new();
        barrier.drain(false).await;
    }

    #[tokio::test]
    async fn drain_waits_for_outstanding_publishes() {
        let barrier = Arc::new(CompletionBarrier::new());
        let guard = barrier.register();

        let waiter = {
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move { barrier.drain(false).await })
        };

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }
}
