//! Normalized domain model.
//!
//! Everything here is the output of wire normalization: no optional ids, no
//! string-or-object unions, no wrapper-or-bare-array ambiguity.

use serde::{Deserialize, Serialize};

/// Username the client falls back to when an authenticated session carries
/// no usable identity record at all.
pub const DEFAULT_USERNAME: &str = "admin";

/// The channel every session starts in.
pub const DEFAULT_CHANNEL: &str = "general";

/// Canonical local identity, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_id: Option<String>,
}

impl Identity {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            peer_id: None,
        }
    }

    pub fn with_peer_id(username: impl Into<String>, peer_id: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            peer_id: Some(peer_id.into()),
        }
    }

    /// The fixed fallback identity. Never used for sending credentials,
    /// only for labelling a session the server already accepted.
    pub fn fallback() -> Self {
        Self::new(DEFAULT_USERNAME)
    }

    /// Whether an online-peer entry refers to this identity, by peer id or
    /// by username.
    pub fn matches_peer(&self, peer: &Peer) -> bool {
        if peer.username == self.username {
            return true;
        }
        match &self.peer_id {
            Some(id) => !id.is_empty() && peer.id == *id,
            None => false,
        }
    }
}

/// A chat channel. `id` and `name` are never empty; degraded bare-string
/// wire entries normalize to `id == name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Channel {
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            status: None,
        }
    }
}

/// Another online user as reported by the tracker. The tracker also gossips
/// address fields; they ride along untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<f64>,
}

impl Peer {
    /// Display name, matching the original UI's `username || 'Anonymous'`.
    pub fn display_name(&self) -> &str {
        if self.username.is_empty() {
            "Anonymous"
        } else {
            &self.username
        }
    }
}

/// A chat message. Order is whatever the server sent; timestamps are unix
/// seconds and may be fractional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub sender: String,
    pub text: String,
    #[serde(default)]
    pub timestamp: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(id: &str, username: &str) -> Peer {
        Peer {
            id: id.to_string(),
            username: username.to_string(),
            ip: None,
            port: None,
            last_seen: None,
        }
    }

    #[test]
    fn identity_matches_peer_by_username() {
        let me = Identity::new("bob");
        assert!(me.matches_peer(&peer("p9", "bob")));
        assert!(!me.matches_peer(&peer("p1", "alice")));
    }

    #[test]
    fn identity_matches_peer_by_peer_id() {
        let me = Identity::with_peer_id("bob", "web_1");
        assert!(me.matches_peer(&peer("web_1", "someone-else")));
        assert!(!me.matches_peer(&peer("web_2", "alice")));
    }

    #[test]
    fn identity_without_peer_id_never_matches_on_empty_id() {
        let me = Identity::new("bob");
        assert!(!me.matches_peer(&peer("", "alice")));
    }

    #[test]
    fn fallback_identity_is_stable() {
        assert_eq!(Identity::fallback(), Identity::fallback());
        assert_eq!(Identity::fallback().username, DEFAULT_USERNAME);
        assert!(Identity::fallback().peer_id.is_none());
    }

    #[test]
    fn anonymous_display_name_for_blank_username() {
        assert_eq!(peer("p1", "").display_name(), "Anonymous");
        assert_eq!(peer("p1", "alice").display_name(), "alice");
    }
}
