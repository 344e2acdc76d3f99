//! The chat controller: one instance owns the session state the browser
//! code kept in module-level globals (current user, current channel, timer
//! handle), and every mutation goes through it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use peerchat_proto::{SendMessageRequest, SubmitInfoRequest};
use peerchat_proto::{Identity, Peer};

use crate::session::SessionStore;
use crate::state::{ChannelCursor, ChatState};
use crate::sync::{self, SyncEvent};
use crate::transport::ChatTransport;

pub struct ChatController<T: ChatTransport, S: SessionStore> {
    transport: T,
    store: S,
    state: Mutex<ChatState>,
    events: mpsc::UnboundedSender<SyncEvent>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl<T, S> ChatController<T, S>
where
    T: ChatTransport + 'static,
    S: SessionStore + Send + Sync + 'static,
{
    /// Build a controller around a resolved identity. Returns the event
    /// stream the front end renders from.
    pub fn new(
        transport: T,
        store: S,
        identity: Identity,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<SyncEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let controller = Arc::new(Self {
            transport,
            store,
            state: Mutex::new(ChatState::new(identity)),
            events,
            poll_task: Mutex::new(None),
        });
        (controller, receiver)
    }

    /// The concrete transport, for front-end concerns that sit outside the
    /// trait (cookie expiry on logout).
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn identity(&self) -> Identity {
        self.state.lock().await.identity.clone()
    }

    pub async fn cursor(&self) -> ChannelCursor {
        self.state.lock().await.cursor.clone()
    }

    // ── Polling ────────────────────────────────────────────────────────

    /// Start the repeating sync timer. Idempotent while a loop is running.
    pub async fn start_polling(self: &Arc<Self>, interval: Duration) {
        let mut task = self.poll_task.lock().await;
        if task.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }
        let controller = Arc::clone(self);
        *task = Some(tokio::spawn(sync::run_loop(controller, interval)));
    }

    /// Cancel the sync timer. The only cancellable resource in the client.
    pub async fn stop_polling(&self) {
        if let Some(task) = self.poll_task.lock().await.take() {
            task.abort();
        }
    }

    pub async fn is_polling(&self) -> bool {
        self.poll_task
            .lock()
            .await
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// One sync tick: channel list and peer list concurrently, then
    /// messages for the cursor read at call time. Best-effort throughout.
    pub async fn poll_once(&self) {
        let (channels_result, peers_result) =
            tokio::join!(self.transport.channels(), self.transport.peers());

        let (channels, peers) = match (channels_result, peers_result) {
            (Ok(channels), Ok(peers)) => (channels, peers),
            (Err(error), _) | (_, Err(error)) => {
                warn!(error = %error, "sidebar refresh failed, keeping previous render");
                let _ = self.events.send(SyncEvent::SyncFailed {
                    detail: error.to_string(),
                });
                return;
            }
        };

        let (peers, active_id) = {
            let mut state = self.state.lock().await;
            state.channels = channels.clone();
            let filtered: Vec<Peer> = peers
                .into_iter()
                .filter(|peer| !state.identity.matches_peer(peer))
                .collect();
            state.peers = filtered.clone();
            (filtered, state.cursor.id.clone())
        };

        let _ = self.events.send(SyncEvent::ChannelsUpdated {
            channels,
            active_id,
        });
        let _ = self.events.send(SyncEvent::PeersUpdated { peers });

        self.refresh_messages().await;
    }

    /// Fetch messages for the current cursor and re-render when the gate
    /// says so. Also the out-of-band path used after send and switch.
    pub async fn refresh_messages(&self) {
        let channel_id = { self.state.lock().await.cursor.id.clone() };

        match self.transport.messages(&channel_id).await {
            Ok(messages) => {
                let render = {
                    let mut state = self.state.lock().await;
                    if state.cursor.id != channel_id {
                        // A switch won the race while this fetch was in
                        // flight; its result belongs to the old channel.
                        debug!(channel = %channel_id, "dropping stale message fetch");
                        return;
                    }
                    if state.view.should_render(messages.len()) {
                        state.messages = messages.clone();
                        true
                    } else {
                        false
                    }
                };
                if render {
                    let _ = self.events.send(SyncEvent::MessagesRendered {
                        channel_id,
                        messages,
                    });
                } else {
                    debug!(channel = %channel_id, "message count unchanged, skipping render");
                }
            }
            Err(error) => {
                warn!(channel = %channel_id, error = %error, "message fetch failed");
                let _ = self.events.send(SyncEvent::SyncFailed {
                    detail: error.to_string(),
                });
            }
        }
    }

    // ── Commands ───────────────────────────────────────────────────────

    /// Send a message to the active channel. Whitespace-only input is a
    /// no-op with no network traffic; `Ok(true)` means the input field
    /// should be cleared.
    pub async fn send_message(&self, text: &str) -> Result<bool, T::Error> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            debug!("ignoring empty message");
            return Ok(false);
        }

        let (sender, channel) = {
            let state = self.state.lock().await;
            (state.identity.username.clone(), state.cursor.id.clone())
        };
        let request = SendMessageRequest {
            channel,
            sender,
            text: trimmed.to_string(),
            timestamp: unix_now(),
        };

        self.transport.send_message(&request).await?;

        // Latency-sensitive path: do not wait for the next poll tick.
        self.refresh_messages().await;
        Ok(true)
    }

    /// Switch the active channel. The message pane is invalidated before
    /// any fetch so the old channel's content can never linger.
    pub async fn switch_channel(&self, channel_id: &str, channel_name: &str) {
        {
            let mut state = self.state.lock().await;
            state.cursor = ChannelCursor {
                id: channel_id.to_string(),
                name: channel_name.to_string(),
            };
            state.messages.clear();
            state.view.note_switch();
        }
        let _ = self.events.send(SyncEvent::MessagesCleared {
            channel_id: channel_id.to_string(),
            channel_name: channel_name.to_string(),
        });
        self.refresh_messages().await;
    }

    /// Create a channel and switch to it. `Err` carries the server's
    /// failure text for the front end to surface.
    pub async fn create_channel(&self, name: &str) -> Result<bool, T::Error> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(false);
        }

        self.transport.create_channel(name).await?;

        match self.transport.channels().await {
            Ok(channels) => {
                let active_id = {
                    let mut state = self.state.lock().await;
                    state.channels = channels.clone();
                    state.cursor.id.clone()
                };
                let _ = self.events.send(SyncEvent::ChannelsUpdated {
                    channels,
                    active_id,
                });
            }
            Err(error) => {
                warn!(error = %error, "channel list refresh after create failed");
            }
        }

        self.switch_channel(name, name).await;
        Ok(true)
    }

    /// Register this client with the peer tracker. Best-effort: failures
    /// are logged and swallowed, and clients without a peer id skip it.
    pub async fn register_peer(&self) {
        let identity = self.identity().await;
        let Some(peer_id) = identity.peer_id else {
            debug!("no peer id, skipping tracker registration");
            return;
        };
        let request = SubmitInfoRequest {
            id: peer_id,
            ip: "127.0.0.1".to_string(),
            port: 0,
            username: identity.username,
        };
        match self.transport.register_peer(&request).await {
            Ok(()) => debug!(peer = %request.id, "registered with tracker"),
            Err(error) => warn!(error = %error, "peer registration failed"),
        }
    }

    /// End the session: cancel the timer, clear persisted state, and tell
    /// the front end to fall back to the login view.
    pub async fn logout(&self) {
        self.stop_polling().await;
        if let Err(error) = self.store.clear_session() {
            warn!(error = %error, "failed to clear session store");
        }
        let _ = self.events.send(SyncEvent::LoggedOut);
    }
}

fn unix_now() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or(0.0)
}
