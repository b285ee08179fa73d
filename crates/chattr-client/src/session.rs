use tracing::{debug, warn};

use chattr_store::{MemoryStore, server_timestamp};
use chattr_types::{UserId, UserProfile};

use crate::paths;

/// Identity as the external provider hands it over after a successful
/// sign-in. How the provider authenticated the user is not this crate's
/// concern.
#[derive(Debug, Clone)]
pub struct AuthProfile {
    pub uid: UserId,
    pub name: String,
    pub email: String,
    pub photo_url: Option<String>,
}

/// One signed-in identity. Created on sign-in, consumed on sign-out; passed
/// explicitly to whatever needs to know who is acting — there is no global
/// session state.
pub struct Session {
    user: UserProfile,
}

impl Session {
    /// Record the sign-in in the user directory: merge-upsert the profile
    /// with a server-assigned last-seen. A store failure is logged and the
    /// session falls back to a local profile, so sign-in never fails on a
    /// directory write.
    pub async fn sign_in(store: &MemoryStore, profile: AuthProfile) -> Session {
        let local = UserProfile {
            uid: profile.uid.clone(),
            name: profile.name,
            email: profile.email,
            photo_url: profile.photo_url,
            last_seen: None,
        };

        let mut fields = local.fields();
        fields.insert("last_seen".to_owned(), server_timestamp());

        let user = match store.upsert_merge(paths::USERS, local.uid.as_str(), fields) {
            Ok(()) => {
                // Read back so the session carries the resolved last-seen.
                store
                    .get(paths::USERS, local.uid.as_str())
                    .and_then(|record| UserProfile::from_record(&record).ok())
                    .unwrap_or(local)
            }
            Err(err) => {
                warn!(uid = %local.uid, %err, "profile upsert failed, signing in with local profile");
                local
            }
        };

        debug!(uid = %user.uid, "signed in");
        Session { user }
    }

    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    pub fn uid(&self) -> &UserId {
        &self.user.uid
    }

    /// Clear local session state. Directory records are never deleted;
    /// live subscriptions are owned by their holders and torn down there.
    pub fn sign_out(self) {
        debug!(uid = %self.user.uid, "signed out");
    }
}
