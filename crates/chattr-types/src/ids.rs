use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier for a user, as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Canonical key for a two-party conversation.
///
/// Derived from the participant pair, never assigned by a backend. Both the
/// message feed and the publisher address the conversation through this key,
/// so the derivation lives here in one place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    /// Derive the channel key for a pair of users: sort the two ids
    /// lexicographically and join with `_`. Symmetric in its arguments,
    /// so `between(a, b) == between(b, a)`.
    ///
    /// Assumes `a != b`; a self-conversation key is never validated against.
    pub fn between(a: &UserId, b: &UserId) -> Self {
        let (lo, hi) = if a.as_str() <= b.as_str() {
            (a, b)
        } else {
            (b, a)
        };
        Self(format!("{}_{}", lo.as_str(), hi.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_key_is_symmetric() {
        let pairs = [("alice", "bob"), ("u1", "u2"), ("zz", "aa"), ("9", "10")];
        for (a, b) in pairs {
            let a = UserId::from(a);
            let b = UserId::from(b);
            assert_eq!(ChannelId::between(&a, &b), ChannelId::between(&b, &a));
        }
    }

    #[test]
    fn channel_key_distinguishes_partners() {
        let a = UserId::from("u1");
        let b = UserId::from("u2");
        let c = UserId::from("u3");
        assert_ne!(ChannelId::between(&a, &b), ChannelId::between(&a, &c));
        assert_ne!(ChannelId::between(&a, &b), ChannelId::between(&b, &c));
    }

    #[test]
    fn channel_key_sorts_lexicographically() {
        let a = UserId::from("bob");
        let b = UserId::from("alice");
        assert_eq!(ChannelId::between(&a, &b).as_str(), "alice_bob");
    }
}
