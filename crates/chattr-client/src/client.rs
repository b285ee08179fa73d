use tracing::warn;

use chattr_store::MemoryStore;
use chattr_types::{ChannelId, ChannelSummary, UserId, UserProfile};

use crate::directory::UserDirectory;
use crate::error::ClientError;
use crate::feed::MessageFeed;
use crate::paths;
use crate::publish::{Composer, SendOutcome, send_message};
use crate::session::{AuthProfile, Session};

/// One signed-in user's handle on the whole model: the session context plus
/// the store everything hangs off. Feeds, composers and the directory are
/// opened from here so they all share the same identity and channel keys.
pub struct ChatClient {
    store: MemoryStore,
    session: Session,
}

impl ChatClient {
    pub async fn sign_in(store: MemoryStore, profile: AuthProfile) -> Self {
        let session = Session::sign_in(&store, profile).await;
        Self { store, session }
    }

    pub fn user(&self) -> &UserProfile {
        self.session.user()
    }

    pub fn uid(&self) -> &UserId {
        self.session.uid()
    }

    /// Canonical key for the conversation with `other`.
    pub fn channel_with(&self, other: &UserId) -> ChannelId {
        ChannelId::between(self.uid(), other)
    }

    /// Open the live message feed for the conversation with `other`.
    /// A previously opened feed for another conversation must be dropped
    /// by the caller first.
    pub fn open_feed(&self, other: &UserId) -> MessageFeed {
        MessageFeed::open(&self.store, self.channel_with(other))
    }

    pub fn composer(&self, other: &UserId) -> Composer {
        Composer::new(self.uid().clone(), other.clone())
    }

    /// One-shot send to `other`, without going through a composer.
    pub async fn send(&self, other: &UserId, text: &str) -> Result<SendOutcome, ClientError> {
        send_message(
            &self.store,
            &self.channel_with(other),
            self.uid(),
            other,
            text,
        )
        .await
    }

    pub fn directory(&self) -> UserDirectory {
        UserDirectory::open(&self.store, self.uid().clone())
    }

    /// Point read of the summary for the conversation with `other`.
    pub fn channel_summary(&self, other: &UserId) -> Option<ChannelSummary> {
        let channel_id = self.channel_with(other);
        let record = self.store.get(paths::CHANNELS, channel_id.as_str())?;
        match ChannelSummary::from_record(&record) {
            Ok(summary) => Some(summary),
            Err(err) => {
                warn!(channel = %channel_id, %err, "undecodable channel summary");
                None
            }
        }
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn sign_out(self) {
        self.session.sign_out();
    }
}
