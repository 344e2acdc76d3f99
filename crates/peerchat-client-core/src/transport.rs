//! Transport seam between the sync loop and the HTTP client.
//!
//! The loop and the command layer only ever speak normalized model types;
//! whatever tolerant wire decoding a transport needs happens on its side of
//! this trait. Test fakes implement it in a handful of lines.

use async_trait::async_trait;

use peerchat_proto::{Channel, Message, Peer, SendMessageRequest, SubmitInfoRequest};

#[async_trait]
pub trait ChatTransport: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// `GET /channels`, normalized.
    async fn channels(&self) -> Result<Vec<Channel>, Self::Error>;

    /// `GET /get-list`, unfiltered (the caller removes the local identity).
    async fn peers(&self) -> Result<Vec<Peer>, Self::Error>;

    /// `GET /messages?channel=<id>`, normalized, server order preserved.
    async fn messages(&self, channel_id: &str) -> Result<Vec<Message>, Self::Error>;

    /// `POST /send`; `Ok` only on the server's `{status:"sent"}`.
    async fn send_message(&self, request: &SendMessageRequest) -> Result<(), Self::Error>;

    /// `POST /create-channel`; `Err` carries the server's failure text.
    async fn create_channel(&self, name: &str) -> Result<(), Self::Error>;

    /// `POST /submit-info` (tracker registration).
    async fn register_peer(&self, request: &SubmitInfoRequest) -> Result<(), Self::Error>;
}
