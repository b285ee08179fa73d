//! Realtime conversation synchronization for a two-party chat client.
//!
//! The model: a conversation is addressed by a canonical key derived from
//! its two participants; each conversation is an append-only message stream
//! that subscribers consume as full ordered snapshots; sending is an
//! optimistic two-step write (message append, then summary merge). All
//! ordering, persistence and fan-out live in the store — this crate is the
//! client-side contract around it.

pub mod client;
pub mod directory;
pub mod error;
pub mod feed;
pub mod publish;
pub mod session;

mod paths;

pub use client::ChatClient;
pub use directory::{UserDirectory, filter_by_name};
pub use error::ClientError;
pub use feed::MessageFeed;
pub use publish::{Composer, SendOutcome, send_message};
pub use session::{AuthProfile, Session};
