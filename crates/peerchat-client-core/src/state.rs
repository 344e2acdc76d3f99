//! View state owned by the controller.

use peerchat_proto::{Channel, Identity, Message, Peer, model::DEFAULT_CHANNEL};

/// The single active channel. Mutated only by an explicit switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelCursor {
    pub id: String,
    pub name: String,
}

impl ChannelCursor {
    pub fn initial() -> Self {
        Self {
            id: DEFAULT_CHANNEL.to_string(),
            name: DEFAULT_CHANNEL.to_string(),
        }
    }
}

/// Bookkeeping for the message pane render gate.
#[derive(Debug, Clone, Default)]
pub struct MessageViewState {
    /// Count shown by the last render, `None` before the first fetch for
    /// the current channel.
    last_rendered_count: Option<usize>,
    /// Set by a channel switch; the next render happens regardless of
    /// count so the cleared view is always replaced.
    force_next_render: bool,
}

impl MessageViewState {
    /// Reset for a fresh channel: nothing rendered yet, next render forced.
    pub fn note_switch(&mut self) {
        self.last_rendered_count = None;
        self.force_next_render = true;
    }

    /// Decide whether an incoming message list must be rendered, consuming
    /// the forced flag if it fires.
    pub fn should_render(&mut self, incoming_count: usize) -> bool {
        let render = self.force_next_render
            || self.last_rendered_count != Some(incoming_count);
        if render {
            self.force_next_render = false;
            self.last_rendered_count = Some(incoming_count);
        }
        render
    }
}

/// Everything the chat view knows, owned by the controller behind one lock.
#[derive(Debug, Clone)]
pub struct ChatState {
    pub identity: Identity,
    pub cursor: ChannelCursor,
    pub channels: Vec<Channel>,
    pub peers: Vec<Peer>,
    pub messages: Vec<Message>,
    pub view: MessageViewState,
}

impl ChatState {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            cursor: ChannelCursor::initial(),
            channels: Vec::new(),
            peers: Vec::new(),
            messages: Vec::new(),
            view: MessageViewState::default(),
        }
    }
}
