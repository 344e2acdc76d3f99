//! Polling sync loop.
//!
//! One repeating timer drives [`ChatController::poll_once`]. Ticks are
//! sequential: a tick's fetches settle before the next tick is taken, and a
//! failed tick changes nothing except a warning and a [`SyncEvent::SyncFailed`].
//! There is no backoff and no retry; the fixed interval is the recovery
//! mechanism.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use peerchat_proto::{Channel, Message, Peer};

use crate::controller::ChatController;
use crate::session::SessionStore;
use crate::transport::ChatTransport;

/// The interval the browser client polled at.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Floor for configurable intervals.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// What the front end renders. Every state change the loop or a command
/// makes is mirrored here, so render decisions are observable.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// Channel list refreshed; re-rendered unconditionally.
    ChannelsUpdated {
        channels: Vec<Channel>,
        active_id: String,
    },
    /// Online peers refreshed (local identity already filtered out);
    /// re-rendered unconditionally.
    PeersUpdated { peers: Vec<Peer> },
    /// A channel switch invalidated the message pane; show the loading
    /// placeholder until the next `MessagesRendered`.
    MessagesCleared {
        channel_id: String,
        channel_name: String,
    },
    /// The message pane must be redrawn with this list.
    MessagesRendered {
        channel_id: String,
        messages: Vec<Message>,
    },
    /// A tick or out-of-band fetch failed; the previous render stays.
    SyncFailed { detail: String },
    /// Session ended; the front end returns to the login view.
    LoggedOut,
}

pub(crate) async fn run_loop<T, S>(controller: Arc<ChatController<T, S>>, interval: Duration)
where
    T: ChatTransport + 'static,
    S: SessionStore + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval(interval.max(MIN_POLL_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        controller.poll_once().await;
    }
}
