//! PeerChat client core.
//!
//! Owns everything between the wire and the front end: session bootstrap
//! ([`session`]), the controller that holds the single source of view state
//! ([`controller`]), the repeating sync loop ([`sync`]), and the transport
//! seam ([`transport`]) that lets all of it run against fakes in tests.

pub mod controller;
pub mod session;
pub mod state;
pub mod sync;
pub mod transport;

pub use controller::ChatController;
pub use session::{
    JsonFileStore, SessionError, SessionRecord, SessionStore, resolve_base_url, resolve_identity,
    DEFAULT_BASE_URL, ENV_BASE_URL,
};
pub use state::{ChannelCursor, ChatState};
pub use sync::{SyncEvent, DEFAULT_POLL_INTERVAL};
pub use transport::ChatTransport;
