use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use tracing::{debug, warn};

use chattr_store::{MemoryStore, Subscription};
use chattr_types::{Record, UserId, UserProfile};

use crate::paths;

/// Live view of every known user except the signed-in one, for picking a
/// conversation partner. The whole set is delivered on each change; any
/// narrowing (name search included) happens client-side, which only holds
/// up for small populations.
pub struct UserDirectory {
    self_id: UserId,
    sub: Subscription,
}

impl UserDirectory {
    pub fn open(store: &MemoryStore, self_id: UserId) -> Self {
        let sub = store.subscribe_collection(paths::USERS);
        debug!(uid = %self_id, "user directory opened");
        Self { self_id, sub }
    }

    /// Wait for the next directory snapshot, minus the signed-in user.
    pub async fn next(&mut self) -> Option<Vec<UserProfile>> {
        let records = self.sub.next().await?;
        Some(decode(&self.self_id, records))
    }

    /// Explicit teardown. Equivalent to dropping the directory.
    pub fn close(self) {
        self.sub.close();
    }
}

impl Stream for UserDirectory {
    type Item = Vec<UserProfile>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        Pin::new(&mut this.sub)
            .poll_next(cx)
            .map(|snapshot| snapshot.map(|records| decode(&this.self_id, records)))
    }
}

fn decode(self_id: &UserId, records: Vec<Record>) -> Vec<UserProfile> {
    records
        .iter()
        .filter_map(|record| match UserProfile::from_record(record) {
            Ok(profile) if profile.uid == *self_id => None,
            Ok(profile) => Some(profile),
            Err(err) => {
                warn!(%err, "skipping undecodable user record");
                None
            }
        })
        .collect()
}

/// Case-insensitive name filter over a delivered snapshot.
pub fn filter_by_name<'a>(users: &'a [UserProfile], query: &str) -> Vec<&'a UserProfile> {
    let query = query.to_lowercase();
    users
        .iter()
        .filter(|user| user.name.to_lowercase().contains(&query))
        .collect()
}
