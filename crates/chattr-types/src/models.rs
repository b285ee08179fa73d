use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ChannelId, UserId};
use crate::record::{Fields, Record, RecordError, to_fields};

/// A user as the directory sees them. Upsert-merged on every sign-in;
/// never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: UserId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn from_record(record: &Record) -> Result<Self, RecordError> {
        record.decode("UserProfile")
    }

    pub fn fields(&self) -> Fields {
        to_fields(self)
    }
}

/// One message in a conversation. The id and timestamp are assigned by the
/// store at append time; only the sender and text travel in the field map.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub sender_id: UserId,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct MessageFields {
    sender_id: UserId,
    text: String,
}

impl Message {
    pub fn from_record(record: &Record) -> Result<Self, RecordError> {
        let MessageFields { sender_id, text } = record.decode("Message")?;
        Ok(Self {
            id: record.id.clone(),
            sender_id,
            text,
            timestamp: record.created_at,
        })
    }

    pub fn fields(sender_id: &UserId, text: &str) -> Fields {
        to_fields(&MessageFields {
            sender_id: sender_id.clone(),
            text: text.to_owned(),
        })
    }
}

/// Per-conversation summary shown in a chat list: who is in it and what was
/// said last. Merge-upserted on every send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub channel_id: ChannelId,
    pub users: Vec<UserId>,
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
}

impl ChannelSummary {
    pub fn from_record(record: &Record) -> Result<Self, RecordError> {
        record.decode("ChannelSummary")
    }

    pub fn fields(&self) -> Fields {
        to_fields(self)
    }
}
