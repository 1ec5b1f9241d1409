//! Cancellation token for loads and watch loops

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Token for cancelling a load or a running watch
///
/// Cancellation is cooperative: the merge coordinator checks it around each
/// source load and the watch loop selects on [`CancellationToken::cancelled`].
/// Clones share one flag, and cancelling is permanent.
#[derive(Clone, Default)]
pub struct CancellationToken {
    shared: Arc<Shared>,
}

#[derive(Default)]
struct Shared {
    flag: AtomicBool,
    waiters: Notify,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.flag.load(Ordering::SeqCst)
    }

    /// Cancel every clone of this token and wake all tasks in
    /// [`cancelled`](Self::cancelled). Later calls do nothing.
    pub fn cancel(&self) {
        if !self.shared.flag.swap(true, Ordering::SeqCst) {
            self.shared.waiters.notify_waiters();
        }
    }

    /// Resolves once the token is cancelled, immediately if it already is
    pub async fn cancelled(&self) {
        let notified = self.shared.waiters.notified();
        tokio::pin!(notified);
        // notify_waiters only wakes registered futures
        notified.as_mut().enable();

        if !self.is_cancelled() {
            notified.await;
        }
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CancellationToken").field(&self.is_cancelled()).finish()
    }
}
