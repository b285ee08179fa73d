pub mod ids;
pub mod models;
pub mod record;

pub use ids::{ChannelId, UserId};
pub use models::{ChannelSummary, Message, UserProfile};
pub use record::{Fields, Record, RecordError};
