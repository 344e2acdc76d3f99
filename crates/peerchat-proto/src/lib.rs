//! PeerChat wire contracts.
//!
//! This crate owns the serde types for every reply shape the chat daemon has
//! ever produced, and the normalization that collapses them into one model.
//! It intentionally separates wire types ([`wire`]) from the normalized
//! domain model ([`model`]): the tolerant decoding happens exactly once, at
//! the boundary, and the rest of the client only ever sees the model.

pub mod model;
pub mod wire;

pub use model::{Channel, Identity, Message, Peer};
pub use wire::{
    BroadcastReply, ChannelsReply, CreateChannelRequest, MessagesReply, PeersReply,
    SendMessageRequest, StatusReply, SubmitInfoRequest,
};
