//! Terminal chat client: login flow, polling view, slash commands.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;
use uuid::Uuid;

use peerchat_cli::{
    InputCommand, LOADING_PLACEHOLDER, help_text, parse_input, render_channels, render_messages,
    render_peers,
};
use peerchat_client::{ClientError, PeerChatClient, PeerChatClientConfig};
use peerchat_client_core::{
    ChatController, JsonFileStore, SessionError, SessionRecord, SessionStore, SyncEvent,
    resolve_base_url, resolve_identity,
};
use peerchat_proto::Identity;

type CliController = Arc<ChatController<PeerChatClient, JsonFileStore>>;
type Input = Lines<BufReader<Stdin>>;

#[derive(Parser, Debug)]
#[command(
    name = "peerchat",
    about = "Terminal client for the peer-tracker chat daemon"
)]
struct Args {
    /// Daemon base URL. Falls back to PEERCHAT_BASE_URL, then the stored
    /// session's URL, then http://127.0.0.1:8000.
    #[arg(long)]
    base_url: Option<String>,

    /// Poll interval in milliseconds.
    #[arg(long, default_value_t = 5000)]
    interval_ms: u64,

    /// Session file location. Defaults to the user data directory.
    #[arg(long)]
    session_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let store = JsonFileStore::new(session_path(args.session_file.clone()));
    let stored = store.load_session().ok().flatten();
    let (base_url, source) = resolve_base_url(
        args.base_url.as_deref(),
        stored.as_ref().and_then(|record| record.base_url.as_deref()),
    );
    tracing::info!(base_url = %base_url, source, "using chat daemon");

    let client = PeerChatClient::new(PeerChatClientConfig::new(base_url.clone()))
        .context("building HTTP client")?;

    let mut input = BufReader::new(tokio::io::stdin()).lines();

    // Bootstrap: a valid stored session skips the login view entirely.
    let identity = match resolve_identity(&store) {
        Ok(identity) => identity,
        Err(SessionError::AuthRequired) => {
            match login_flow(&client, &store, &base_url, &mut input).await? {
                Some(identity) => identity,
                None => return Ok(()),
            }
        }
    };

    println!("Logged in as {}", identity.username);

    let (controller, events) = ChatController::new(client, store, identity.clone());
    controller.register_peer().await;
    controller
        .start_polling(Duration::from_millis(args.interval_ms))
        .await;

    let render_task = tokio::spawn(render_events(events));

    chat_loop(&controller, &identity, &mut input).await;

    drop(controller);
    let _ = render_task.await;
    Ok(())
}

fn session_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("peerchat")
            .join("session.json")
    })
}

/// Interactive login against `POST /login`, then best-effort tracker
/// registration happens later through the controller. Returns `None` on
/// EOF.
async fn login_flow(
    client: &PeerChatClient,
    store: &JsonFileStore,
    base_url: &str,
    input: &mut Input,
) -> Result<Option<Identity>> {
    loop {
        let Some(username) = prompt(input, "username: ").await? else {
            return Ok(None);
        };
        let username = username.trim().to_string();
        if username.is_empty() {
            println!("Please enter a username");
            continue;
        }

        let Some(password) = prompt(input, "password: ").await? else {
            return Ok(None);
        };
        let password = password.trim().to_string();
        if password.is_empty() {
            println!("Please enter a password");
            continue;
        }

        let peer_id = format!("web_{}", Uuid::new_v4().simple());
        match client.login(&username, &password, &peer_id).await {
            Ok(()) => {
                let record =
                    SessionRecord::authenticated(username.as_str(), peer_id.as_str(), base_url);
                if let Err(error) = store.save_session(&record) {
                    tracing::warn!(error = %error, "could not persist session");
                }
                return Ok(Some(Identity::with_peer_id(username, peer_id)));
            }
            Err(ClientError::AuthRequired) => {
                println!("Invalid username or password");
            }
            Err(error) => {
                tracing::warn!(error = %error, "login request failed");
                println!("Connection failed. Please try again.");
            }
        }
    }
}

async fn prompt(input: &mut Input, label: &str) -> Result<Option<String>> {
    print!("{label}");
    std::io::stdout().flush().ok();
    Ok(input.next_line().await?)
}

/// Draw sync events as they arrive. Ends on logout or when the controller
/// goes away.
async fn render_events(mut events: mpsc::UnboundedReceiver<SyncEvent>) {
    let mut channel_name = String::from("general");
    while let Some(event) = events.recv().await {
        match event {
            SyncEvent::ChannelsUpdated {
                channels,
                active_id,
            } => println!("{}", render_channels(&channels, &active_id)),
            SyncEvent::PeersUpdated { peers } => println!("{}", render_peers(&peers)),
            SyncEvent::MessagesCleared {
                channel_name: name, ..
            } => {
                channel_name = name;
                println!("#{channel_name}\n  {LOADING_PLACEHOLDER}");
            }
            SyncEvent::MessagesRendered { messages, .. } => {
                println!("{}", render_messages(&channel_name, &messages));
            }
            SyncEvent::SyncFailed { detail } => {
                // Already logged by the core; the previous render stays.
                tracing::debug!(detail = %detail, "tick failed");
            }
            SyncEvent::LoggedOut => {
                println!("Logged out.");
                break;
            }
        }
    }
}

async fn chat_loop(controller: &CliController, identity: &Identity, input: &mut Input) {
    loop {
        let line = match input.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                controller.stop_polling().await;
                break;
            }
            Err(error) => {
                tracing::warn!(error = %error, "stdin read failed");
                controller.stop_polling().await;
                break;
            }
        };

        match parse_input(&line) {
            InputCommand::Send(text) => {
                if let Err(error) = controller.send_message(&text).await {
                    println!("Failed to send message: {error}");
                }
            }
            InputCommand::Join { id, name } => controller.switch_channel(&id, &name).await,
            InputCommand::Create(name) => match controller.create_channel(&name).await {
                Ok(_) => {}
                Err(ClientError::Server { message }) => println!("Error: {message}"),
                Err(error) => println!("Error: {error}"),
            },
            InputCommand::Connect(peer_id) => {
                match controller.transport().connect_peer(&peer_id).await {
                    Ok(reply) => println!(
                        "peer {peer_id}: {}",
                        reply.status.as_deref().unwrap_or("unknown")
                    ),
                    Err(ClientError::Server { message }) => println!("Error: {message}"),
                    Err(error) => println!("Error: {error}"),
                }
            }
            InputCommand::Broadcast(text) => {
                match controller
                    .transport()
                    .broadcast_peer(&identity.username, &text)
                    .await
                {
                    Ok(reply) => println!(
                        "broadcast reached {}/{} peers",
                        reply.successful, reply.total_peers
                    ),
                    Err(ClientError::Server { message }) => println!("Error: {message}"),
                    Err(error) => println!("Error: {error}"),
                }
            }
            InputCommand::Refresh => controller.poll_once().await,
            InputCommand::Help => println!("{}", help_text()),
            InputCommand::Nothing => {}
            InputCommand::Unknown(verb) => println!("unknown command: /{verb} (try /help)"),
            InputCommand::Logout => {
                controller.logout().await;
                controller.transport().expire_auth_cookie();
                break;
            }
            InputCommand::Quit => {
                controller.stop_polling().await;
                break;
            }
        }
    }
}
