//! Typed HTTP client for the peer-tracker chat daemon.
//!
//! Wraps the seven chat endpoints plus the tracker extras behind one
//! [`PeerChatClient`]. The server's auth cookie lives in the client's
//! cookie jar exactly as it lived in the browser; tolerant response-shape
//! handling is delegated to `peerchat-proto` so each reply is normalized
//! once, at this boundary.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::cookie::Jar;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use peerchat_client_core::ChatTransport;
use peerchat_proto::wire::{
    BroadcastPeerRequest, BroadcastReply, ChannelsReply, ConnectPeerReply, ConnectPeerRequest,
    CreateChannelRequest, MessagesReply, PeersReply, StatusReply,
};
use peerchat_proto::{Channel, Message, Peer, SendMessageRequest, SubmitInfoRequest};

#[derive(Debug, Clone)]
pub struct PeerChatClientConfig {
    pub base_url: String,
}

impl PeerChatClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("chat_client_base_url_missing")]
    BaseUrlMissing,
    #[error("chat_client_invalid_path")]
    InvalidPath,
    #[error("chat_client_build_failed:{message}")]
    Build { message: String },
    #[error("chat_request_failed:{message}")]
    Request { message: String },
    #[error("chat_read_failed:{message}")]
    Read { message: String },
    #[error("chat_auth_required")]
    AuthRequired,
    #[error("chat_http_{status}:{body}")]
    Http { status: StatusCode, body: String },
    #[error("chat_json_decode_failed:{message}")]
    Decode { message: String },
    #[error("chat_server_error:{message}")]
    Server { message: String },
}

/// Client over the chat daemon's HTTP surface. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PeerChatClient {
    base_url: String,
    http: reqwest::Client,
    cookies: Arc<Jar>,
}

impl PeerChatClient {
    pub fn new(config: PeerChatClientConfig) -> Result<Self, ClientError> {
        let base_url = normalize_base_url(&config.base_url)?;
        let cookies = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&cookies))
            .build()
            .map_err(|error| ClientError::Build {
                message: error.to_string(),
            })?;
        Ok(Self {
            base_url,
            http,
            cookies,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join a path against the base URL; accepts both `/channels` and
    /// `channels` (the drafts disagreed on the leading slash).
    #[must_use]
    pub fn endpoint(&self, path: &str) -> Option<String> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.starts_with('/') {
            Some(format!("{}{}", self.base_url, trimmed))
        } else {
            Some(format!("{}/{}", self.base_url, trimmed))
        }
    }

    // ── Auth ───────────────────────────────────────────────────────────

    /// `POST /login`. A 2xx reply is success and its body (an HTML page)
    /// is ignored; the auth cookie the server sets stays in the jar. A 401
    /// maps to [`ClientError::AuthRequired`].
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        peer_id: &str,
    ) -> Result<(), ClientError> {
        let url = self
            .endpoint("/login")
            .ok_or(ClientError::InvalidPath)?;
        let response = self
            .http
            .post(url)
            .header("x-request-id", request_id())
            .form(&[
                ("username", username),
                ("password", password),
                ("peerId", peer_id),
            ])
            .send()
            .await
            .map_err(|error| ClientError::Request {
                message: error.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::AuthRequired);
        }
        if status.is_success() {
            debug!(username, "login accepted");
            return Ok(());
        }

        let bytes = response.bytes().await.map_err(|error| ClientError::Read {
            message: error.to_string(),
        })?;
        Err(format_http_error(status, &bytes))
    }

    /// Drop the auth cookie, the typed analogue of the browser's
    /// `document.cookie = 'auth=; expires=...'` on logout.
    pub fn expire_auth_cookie(&self) {
        if let Ok(url) = reqwest::Url::parse(&self.base_url) {
            self.cookies.add_cookie_str("auth=; Max-Age=0", &url);
        }
    }

    // ── Tracker extras ─────────────────────────────────────────────────

    /// `POST /connect-peer`: ask the tracker to probe a peer.
    pub async fn connect_peer(&self, peer_id: &str) -> Result<ConnectPeerReply, ClientError> {
        let mut reply: ConnectPeerReply = self
            .post_json(
                "/connect-peer",
                &ConnectPeerRequest {
                    id: peer_id.to_string(),
                },
            )
            .await?;
        if let Some(message) = reply.error.take() {
            return Err(ClientError::Server { message });
        }
        Ok(reply)
    }

    /// `POST /broadcast-peer`: fan a message out over the tracker's direct
    /// peer links.
    pub async fn broadcast_peer(
        &self,
        sender: &str,
        message: &str,
    ) -> Result<BroadcastReply, ClientError> {
        let mut reply: BroadcastReply = self
            .post_json(
                "/broadcast-peer",
                &BroadcastPeerRequest {
                    sender: sender.to_string(),
                    message: message.to_string(),
                },
            )
            .await?;
        if let Some(message) = reply.error.take() {
            return Err(ClientError::Server { message });
        }
        Ok(reply)
    }

    // ── Plumbing ───────────────────────────────────────────────────────

    async fn get_json<T>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, ClientError>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let url = self.endpoint(path).ok_or(ClientError::InvalidPath)?;
        let response = self
            .http
            .get(url)
            .query(query)
            .header("x-request-id", request_id())
            .send()
            .await
            .map_err(|error| ClientError::Request {
                message: error.to_string(),
            })?;
        decode_json_response(response).await
    }

    async fn post_json<Req, Res>(&self, path: &str, payload: &Req) -> Result<Res, ClientError>
    where
        Req: serde::Serialize + ?Sized,
        Res: for<'de> serde::Deserialize<'de>,
    {
        let url = self.endpoint(path).ok_or(ClientError::InvalidPath)?;
        let response = self
            .http
            .post(url)
            .header("x-request-id", request_id())
            .json(payload)
            .send()
            .await
            .map_err(|error| ClientError::Request {
                message: error.to_string(),
            })?;
        decode_json_response(response).await
    }
}

#[async_trait]
impl ChatTransport for PeerChatClient {
    type Error = ClientError;

    async fn channels(&self) -> Result<Vec<Channel>, Self::Error> {
        let reply: ChannelsReply = self.get_json("/channels", &[]).await?;
        reply
            .into_channels()
            .map_err(|message| ClientError::Server { message })
    }

    async fn peers(&self) -> Result<Vec<Peer>, Self::Error> {
        let reply: PeersReply = self.get_json("/get-list", &[]).await?;
        reply
            .into_peers()
            .map_err(|message| ClientError::Server { message })
    }

    async fn messages(&self, channel_id: &str) -> Result<Vec<Message>, Self::Error> {
        let reply: MessagesReply = self
            .get_json("/messages", &[("channel", channel_id)])
            .await?;
        reply
            .into_messages()
            .map_err(|message| ClientError::Server { message })
    }

    async fn send_message(&self, request: &SendMessageRequest) -> Result<(), Self::Error> {
        let reply: StatusReply = self.post_json("/send", request).await?;
        if reply.is("sent") {
            return Ok(());
        }
        Err(ClientError::Server {
            message: reply
                .error_text()
                .unwrap_or("send was not acknowledged")
                .to_string(),
        })
    }

    async fn create_channel(&self, name: &str) -> Result<(), Self::Error> {
        let reply: StatusReply = self
            .post_json(
                "/create-channel",
                &CreateChannelRequest {
                    channel: name.to_string(),
                },
            )
            .await?;
        if reply.is("created") {
            return Ok(());
        }
        Err(ClientError::Server {
            message: reply
                .error_text()
                .unwrap_or("could not create channel")
                .to_string(),
        })
    }

    async fn register_peer(&self, request: &SubmitInfoRequest) -> Result<(), Self::Error> {
        let reply: StatusReply = self.post_json("/submit-info", request).await?;
        if reply.is("ok") {
            return Ok(());
        }
        Err(ClientError::Server {
            message: reply
                .error_text()
                .unwrap_or("registration was not acknowledged")
                .to_string(),
        })
    }
}

pub fn format_http_error(status: StatusCode, body: &[u8]) -> ClientError {
    let body = String::from_utf8_lossy(body);
    let body = body.trim();
    let body = if body.is_empty() { "<empty>" } else { body };
    ClientError::Http {
        status,
        body: body.to_string(),
    }
}

fn request_id() -> String {
    format!("req_{}", Uuid::new_v4().simple())
}

fn normalize_base_url(base_url: &str) -> Result<String, ClientError> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(ClientError::BaseUrlMissing);
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

async fn decode_json_response<T>(response: reqwest::Response) -> Result<T, ClientError>
where
    T: for<'de> serde::Deserialize<'de>,
{
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ClientError::AuthRequired);
    }

    let bytes = response.bytes().await.map_err(|error| ClientError::Read {
        message: error.to_string(),
    })?;

    if !status.is_success() {
        return Err(format_http_error(status, &bytes));
    }

    serde_json::from_slice::<T>(&bytes).map_err(|error| ClientError::Decode {
        message: error.to_string(),
    })
}
