//! Input parsing and view formatting for the terminal front end.
//!
//! Kept out of `main.rs` so the chat view's copy (placeholders, sidebar
//! layout, message lines) stays testable. The placeholder strings are the
//! original UI's.

use chrono::DateTime;

use peerchat_proto::{Channel, Message, Peer};

pub const LOADING_PLACEHOLDER: &str = "Loading...";
pub const EMPTY_MESSAGES_PLACEHOLDER: &str = "No messages yet. Start the conversation!";
pub const NO_PEERS_PLACEHOLDER: &str = "No other users online";

/// One line of user input, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    /// Plain text: send to the active channel.
    Send(String),
    /// `/join <channel> [display name]`
    Join { id: String, name: String },
    /// `/create <channel>`
    Create(String),
    /// `/connect <peer id>`
    Connect(String),
    /// `/broadcast <text>`
    Broadcast(String),
    /// `/refresh`: force a sync tick now.
    Refresh,
    Logout,
    Quit,
    Help,
    /// Blank line or a slash command with a missing argument.
    Nothing,
    Unknown(String),
}

pub fn parse_input(line: &str) -> InputCommand {
    let line = line.trim();
    if line.is_empty() {
        return InputCommand::Nothing;
    }
    let Some(command) = line.strip_prefix('/') else {
        return InputCommand::Send(line.to_string());
    };

    let mut parts = command.splitn(2, char::is_whitespace);
    let verb = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or("").trim();

    match verb {
        "join" => {
            let mut args = rest.splitn(2, char::is_whitespace);
            let id = args.next().unwrap_or("").trim();
            if id.is_empty() {
                return InputCommand::Nothing;
            }
            let name = args.next().map(str::trim).filter(|name| !name.is_empty());
            InputCommand::Join {
                id: id.to_string(),
                name: name.unwrap_or(id).to_string(),
            }
        }
        "create" => {
            if rest.is_empty() {
                InputCommand::Nothing
            } else {
                InputCommand::Create(rest.to_string())
            }
        }
        "connect" => {
            if rest.is_empty() {
                InputCommand::Nothing
            } else {
                InputCommand::Connect(rest.to_string())
            }
        }
        "broadcast" => {
            if rest.is_empty() {
                InputCommand::Nothing
            } else {
                InputCommand::Broadcast(rest.to_string())
            }
        }
        "refresh" => InputCommand::Refresh,
        "logout" => InputCommand::Logout,
        "quit" | "exit" => InputCommand::Quit,
        "help" => InputCommand::Help,
        other => InputCommand::Unknown(other.to_string()),
    }
}

pub fn help_text() -> &'static str {
    "commands:\n  /join <channel> [name]   switch channel\n  /create <channel>        create a channel and switch to it\n  /connect <peer id>       probe a peer via the tracker\n  /broadcast <text>        send over direct peer links\n  /refresh                 poll now\n  /logout                  end the session\n  /quit                    leave, keeping the session\n  anything else            send as a message"
}

/// Sidebar: channels with the active marker, the way the web view drew
/// `# name` rows with an `active` class.
pub fn render_channels(channels: &[Channel], active_id: &str) -> String {
    let mut out = String::from("channels:");
    for channel in channels {
        let marker = if channel.id == active_id { "*" } else { " " };
        out.push_str(&format!("\n {marker} # {}", channel.name));
        if let Some(status) = &channel.status {
            out.push_str(&format!(" ({status})"));
        }
    }
    out
}

/// Sidebar: online peers, or the empty-state line.
pub fn render_peers(peers: &[Peer]) -> String {
    if peers.is_empty() {
        return format!("online: {NO_PEERS_PLACEHOLDER}");
    }
    let mut out = String::from("online:");
    for peer in peers {
        out.push_str(&format!("\n   • {}", peer.display_name()));
    }
    out
}

/// Message pane content for a freshly rendered list.
pub fn render_messages(channel_name: &str, messages: &[Message]) -> String {
    if messages.is_empty() {
        return format!("#{channel_name}\n  {EMPTY_MESSAGES_PLACEHOLDER}");
    }
    let mut out = format!("#{channel_name}");
    for message in messages {
        out.push_str(&format!(
            "\n  [{}] {}: {}",
            format_timestamp(message.timestamp),
            message.sender,
            message.text
        ));
    }
    out
}

/// `HH:MM:SS` from unix seconds, fractional values truncated.
pub fn format_timestamp(timestamp: f64) -> String {
    DateTime::from_timestamp(timestamp as i64, 0)
        .map(|instant| instant.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(sender: &str, text: &str, timestamp: f64) -> Message {
        Message {
            sender: sender.to_string(),
            text: text.to_string(),
            timestamp,
        }
    }

    #[test]
    fn plain_text_is_a_send() {
        assert_eq!(
            parse_input("hello there"),
            InputCommand::Send("hello there".to_string())
        );
    }

    #[test]
    fn blank_lines_do_nothing() {
        assert_eq!(parse_input(""), InputCommand::Nothing);
        assert_eq!(parse_input("   "), InputCommand::Nothing);
    }

    #[test]
    fn join_takes_id_and_optional_display_name() {
        assert_eq!(
            parse_input("/join tech"),
            InputCommand::Join {
                id: "tech".to_string(),
                name: "tech".to_string()
            }
        );
        assert_eq!(
            parse_input("/join c2 Tech Talk"),
            InputCommand::Join {
                id: "c2".to_string(),
                name: "Tech Talk".to_string()
            }
        );
        assert_eq!(parse_input("/join   "), InputCommand::Nothing);
    }

    #[test]
    fn commands_parse() {
        assert_eq!(
            parse_input("/create ops"),
            InputCommand::Create("ops".to_string())
        );
        assert_eq!(parse_input("/logout"), InputCommand::Logout);
        assert_eq!(parse_input("/quit"), InputCommand::Quit);
        assert_eq!(parse_input("/exit"), InputCommand::Quit);
        assert_eq!(
            parse_input("/frobnicate"),
            InputCommand::Unknown("frobnicate".to_string())
        );
    }

    #[test]
    fn empty_message_list_renders_the_placeholder_not_an_error() {
        let rendered = render_messages("general", &[]);
        assert!(rendered.contains(EMPTY_MESSAGES_PLACEHOLDER));
    }

    #[test]
    fn messages_render_in_server_order() {
        let rendered = render_messages(
            "general",
            &[
                message("alice", "later entry first", 200.0),
                message("bob", "earlier entry second", 100.0),
            ],
        );
        let first = rendered.find("later entry first").unwrap_or(usize::MAX);
        let second = rendered.find("earlier entry second").unwrap_or(0);
        assert!(first < second, "render must not re-sort by timestamp");
    }

    #[test]
    fn channel_sidebar_marks_the_active_channel() {
        let channels = vec![Channel::named("general"), Channel::named("random")];
        let rendered = render_channels(&channels, "random");
        assert!(rendered.contains(" * # random"));
        assert!(rendered.contains("   # general"));
    }

    #[test]
    fn empty_peer_list_shows_the_no_users_line() {
        assert!(render_peers(&[]).contains(NO_PEERS_PLACEHOLDER));
    }

    #[test]
    fn fractional_timestamps_truncate() {
        assert_eq!(format_timestamp(0.75), "00:00:00");
    }
}
