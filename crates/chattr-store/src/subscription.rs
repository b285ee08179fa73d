use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::mpsc;
use uuid::Uuid;

use chattr_types::Record;

use crate::store::MemoryStore;

/// Live handle onto one collection path. Yields the full current snapshot
/// on open and again after every mutation of the path.
///
/// The handle owns its registration in the store: `close` or drop detaches
/// the watcher, after which no further snapshots are delivered. A consumer
/// switching to a different path must tear this handle down first, or
/// stale-path snapshots keep arriving in the new view.
pub struct Subscription {
    store: MemoryStore,
    path: String,
    watcher_id: Uuid,
    rx: mpsc::UnboundedReceiver<Vec<Record>>,
    detached: bool,
}

impl Subscription {
    pub(crate) fn new(
        store: MemoryStore,
        path: String,
        watcher_id: Uuid,
        rx: mpsc::UnboundedReceiver<Vec<Record>>,
    ) -> Self {
        Self {
            store,
            path,
            watcher_id,
            rx,
            detached: false,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Wait for the next snapshot. `None` means the stream has ended and
    /// will never deliver again — the health signal for resubscribing.
    pub async fn next(&mut self) -> Option<Vec<Record>> {
        self.rx.recv().await
    }

    /// Explicit teardown. Equivalent to dropping the handle.
    pub fn close(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if !self.detached {
            self.detached = true;
            self.store.detach(&self.path, self.watcher_id);
            self.rx.close();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl Stream for Subscription {
    type Item = Vec<Record>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
