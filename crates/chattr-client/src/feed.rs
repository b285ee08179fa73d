use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use tracing::{debug, warn};

use chattr_store::{MemoryStore, Subscription};
use chattr_types::{ChannelId, Message, Record};

use crate::paths;

/// Live ordered view of one conversation's messages.
///
/// Snapshot-replace model: every delivery is the full message list,
/// ascending by server-assigned timestamp — consumers overwrite their local
/// list instead of patching. Switching conversations means dropping this
/// feed and opening a new one; the old subscription is detached so stale
/// snapshots cannot land in the new view.
pub struct MessageFeed {
    channel_id: ChannelId,
    sub: Subscription,
}

impl MessageFeed {
    pub fn open(store: &MemoryStore, channel_id: ChannelId) -> Self {
        let sub = store.subscribe_ordered(&paths::channel_messages(&channel_id));
        debug!(channel = %channel_id, "message feed opened");
        Self { channel_id, sub }
    }

    pub fn channel_id(&self) -> &ChannelId {
        &self.channel_id
    }

    /// Wait for the next full snapshot. `None` means the feed has ended
    /// and will never deliver again; the caller may reopen it.
    pub async fn next(&mut self) -> Option<Vec<Message>> {
        let records = self.sub.next().await?;
        Some(decode(&self.channel_id, records))
    }

    /// Explicit teardown. Equivalent to dropping the feed.
    pub fn close(self) {
        self.sub.close();
    }
}

impl Stream for MessageFeed {
    type Item = Vec<Message>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        Pin::new(&mut this.sub)
            .poll_next(cx)
            .map(|snapshot| snapshot.map(|records| decode(&this.channel_id, records)))
    }
}

/// Snapshot order is the store's; a record that does not decode is skipped
/// rather than wedging the feed.
fn decode(channel_id: &ChannelId, records: Vec<Record>) -> Vec<Message> {
    records
        .iter()
        .filter_map(|record| match Message::from_record(record) {
            Ok(message) => Some(message),
            Err(err) => {
                warn!(channel = %channel_id, %err, "skipping undecodable message record");
                None
            }
        })
        .collect()
}
