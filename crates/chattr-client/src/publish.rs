use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use chattr_store::MemoryStore;
use chattr_types::{ChannelId, ChannelSummary, Message, UserId};

use crate::error::ClientError;
use crate::paths;

/// What a send attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Message durably appended with this server-assigned timestamp.
    Sent { timestamp: DateTime<Utc> },
    /// Empty or whitespace-only input; nothing was written.
    Empty,
}

/// Append a message to the conversation and refresh its summary.
///
/// Two writes, deliberately not a transaction: the message append comes
/// first, then a merge-upsert of the channel summary (participants, last
/// message text, the message's own timestamp). If the summary write fails
/// after a durable append, the send still counts — the summary is stale
/// until the next send and that window is accepted. Only an append failure
/// is an error to the caller.
pub async fn send_message(
    store: &MemoryStore,
    channel_id: &ChannelId,
    sender: &UserId,
    recipient: &UserId,
    text: &str,
) -> Result<SendOutcome, ClientError> {
    let text = text.trim();
    if text.is_empty() {
        debug!(channel = %channel_id, "dropping empty message");
        return Ok(SendOutcome::Empty);
    }

    let ack = store.append(
        &paths::channel_messages(channel_id),
        Message::fields(sender, text),
    )?;

    let summary = ChannelSummary {
        channel_id: channel_id.clone(),
        users: vec![sender.clone(), recipient.clone()],
        last_message: text.to_owned(),
        last_message_at: ack.timestamp,
    };
    if let Err(err) = store.upsert_merge(paths::CHANNELS, channel_id.as_str(), summary.fields()) {
        warn!(channel = %channel_id, %err, "summary upsert failed, stale until next send");
    }

    debug!(channel = %channel_id, message = %ack.id, "message sent");
    Ok(SendOutcome::Sent {
        timestamp: ack.timestamp,
    })
}

/// Draft input state for one conversation.
///
/// Submission is optimistic: the draft is cleared before the write and put
/// back if the append fails, so a failed send never loses typed text. The
/// `&mut self` receiver makes overlapping submissions for the same composer
/// unrepresentable — no in-flight flag to check.
pub struct Composer {
    channel_id: ChannelId,
    sender: UserId,
    recipient: UserId,
    draft: String,
}

impl Composer {
    pub fn new(sender: UserId, recipient: UserId) -> Self {
        Self {
            channel_id: ChannelId::between(&sender, &recipient),
            sender,
            recipient,
            draft: String::new(),
        }
    }

    pub fn channel_id(&self) -> &ChannelId {
        &self.channel_id
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Send the current draft. Clears it up front; restores it on failure.
    pub async fn submit(&mut self, store: &MemoryStore) -> Result<SendOutcome, ClientError> {
        let text = std::mem::take(&mut self.draft);
        let result = send_message(
            store,
            &self.channel_id,
            &self.sender,
            &self.recipient,
            &text,
        )
        .await;
        if result.is_err() {
            self.draft = text;
        }
        result
    }
}
