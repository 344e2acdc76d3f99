//! Wire-level reply shapes and their normalization.
//!
//! The daemon's replies drifted across drafts: channel entries are bare
//! strings in the current server and `{id, name, status}` objects in an
//! older one, message lists arrive either bare or wrapped, and read
//! endpoints answer `{"error": "Unauthorized"}` with a 200 when the auth
//! cookie is missing. Every union is decoded here into a tagged enum and
//! collapsed exactly once; callers never see the raw shapes.

use serde::{Deserialize, Serialize};

use crate::model::{Channel, Message, Peer};

// ── Requests ───────────────────────────────────────────────────────────

/// Body of `POST /send`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub channel: String,
    pub sender: String,
    pub text: String,
    pub timestamp: f64,
}

/// Body of `POST /create-channel`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChannelRequest {
    pub channel: String,
}

/// Body of `POST /submit-info` (tracker registration).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitInfoRequest {
    pub id: String,
    pub ip: String,
    pub port: u16,
    pub username: String,
}

/// Body of `POST /connect-peer`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectPeerRequest {
    pub id: String,
}

/// Body of `POST /broadcast-peer`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastPeerRequest {
    pub sender: String,
    pub message: String,
}

// ── Replies ────────────────────────────────────────────────────────────

/// Generic `{status}` / `{error}` reply used by the write endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusReply {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StatusReply {
    /// Whether the reply carries the expected success marker.
    pub fn is(&self, expected: &str) -> bool {
        self.status.as_deref() == Some(expected)
    }

    /// Server-provided failure text, if any.
    pub fn error_text(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Reply of `GET /channels`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ChannelsReply {
    // `channels` must stay required: with a default the variant would match
    // any object and the error shape below would never be reached.
    Channels { channels: Vec<ChannelEntry> },
    Failure { error: String },
}

impl ChannelsReply {
    /// Collapse to the normalized channel list, or the server's error text.
    pub fn into_channels(self) -> Result<Vec<Channel>, String> {
        match self {
            Self::Channels { channels } => Ok(channels
                .into_iter()
                .filter_map(ChannelEntry::normalize)
                .collect()),
            Self::Failure { error } => Err(error),
        }
    }
}

/// One channel-list entry as it appears on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ChannelEntry {
    /// The current server: a bare channel name.
    Name(String),
    /// The superseded draft: an object, any subset of whose fields may be
    /// present.
    Object {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        status: Option<String>,
    },
}

impl ChannelEntry {
    /// Normalize to a [`Channel`]. Entries that carry neither an id nor a
    /// name are dropped; the result never has an empty `id` or `name`.
    pub fn normalize(self) -> Option<Channel> {
        match self {
            Self::Name(name) => {
                let name = non_empty(name)?;
                Some(Channel {
                    id: name.clone(),
                    name,
                    status: None,
                })
            }
            Self::Object { id, name, status } => {
                let id = id.and_then(non_empty);
                let name = name.and_then(non_empty);
                let (id, name) = match (id, name) {
                    (Some(id), Some(name)) => (id, name),
                    (Some(id), None) => (id.clone(), id),
                    (None, Some(name)) => (name.clone(), name),
                    (None, None) => return None,
                };
                Some(Channel { id, name, status })
            }
        }
    }
}

/// Reply of `GET /get-list`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PeersReply {
    Peers { peers: Vec<Peer> },
    Failure { error: String },
}

impl PeersReply {
    pub fn into_peers(self) -> Result<Vec<Peer>, String> {
        match self {
            Self::Peers { peers } => Ok(peers),
            Self::Failure { error } => Err(error),
        }
    }
}

/// Reply of `GET /messages?channel=<id>`: a wrapper object from the current
/// server, a bare array from the superseded draft.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessagesReply {
    Wrapped { messages: Vec<Message> },
    Bare(Vec<Message>),
    Failure { error: String },
}

impl MessagesReply {
    pub fn into_messages(self) -> Result<Vec<Message>, String> {
        match self {
            Self::Wrapped { messages } | Self::Bare(messages) => Ok(messages),
            Self::Failure { error } => Err(error),
        }
    }
}

/// Reply of `POST /connect-peer`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectPeerReply {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub peer: Option<Peer>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Reply of `POST /broadcast-peer`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BroadcastReply {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total_peers: u64,
    #[serde(default)]
    pub successful: u64,
    #[serde(default)]
    pub failed: u64,
    #[serde(default)]
    pub error: Option<String>,
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
