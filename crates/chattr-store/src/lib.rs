//! In-process realtime document store.
//!
//! Stands in for the hosted document database the chat client originally
//! delegated to. Collections are keyed by string path and hold records with
//! server-assigned, strictly monotonic timestamps. Reads are live: a
//! subscription receives the full current snapshot immediately and again
//! after every mutation of its path — consumers replace their local state
//! wholesale instead of patching diffs.

pub mod error;
pub mod store;
pub mod subscription;

pub use error::StoreError;
pub use store::{AppendAck, MemoryStore, server_timestamp};
pub use subscription::Subscription;
