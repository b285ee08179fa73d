//! Store layout. Feed and publisher both address a conversation through
//! these helpers, so they can never disagree on where its messages live.

use chattr_types::ChannelId;

pub(crate) const USERS: &str = "users";
pub(crate) const CHANNELS: &str = "channels";

/// Message sub-collection of one conversation.
pub(crate) fn channel_messages(channel_id: &ChannelId) -> String {
    format!("channels/{channel_id}/messages")
}
