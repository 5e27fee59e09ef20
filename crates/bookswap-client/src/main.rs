//! bookswap-chat: terminal client for the book community chat.
//!
//! Reads lines from stdin and posts them to the chat; prints everything the
//! server sends. `/quit` or end of input exits.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use bookswap_client::{ChatClient, ClientSettings, ConnectionStatus};
use bookswap_common::{BookswapError, ChatMessage, ClientEvent, ServerEvent};

/// Longest display name the chat shows.
const MAX_NAME_CHARS: usize = 20;

#[derive(Parser, Debug)]
#[command(name = "bookswap-chat", version, about = "Terminal client for the book community chat")]
struct Args {
    /// Display name shown next to your messages.
    #[arg(short, long)]
    name: String,

    /// Chat server URL (overrides the config file).
    #[arg(short, long)]
    url: Option<String>,

    /// Config file path override.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter directive, e.g. "bookswap_client=debug".
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let log_directive = args.log_level.as_deref().unwrap_or("bookswap_client=warn");
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                log_directive
                    .parse()
                    .unwrap_or_else(|_| "bookswap_client=warn".parse().unwrap()),
            ),
        )
        .init();

    if let Err(e) = run(args).await {
        eprintln!("bookswap-chat: {e}");
        std::process::exit(2);
    }
}

/// Connect, then relay stdin to the chat until `/quit` or end of input.
async fn run(args: Args) -> bookswap_common::Result<()> {
    let name = display_name(&args.name)
        .ok_or_else(|| BookswapError::Other("--name must not be empty".into()))?;

    let config = bookswap_config::load_config(args.config.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        bookswap_config::BookswapConfig::default()
    });
    let mut settings = ClientSettings::from(&config.client);
    if let Some(url) = args.url {
        settings.url = url;
    }

    let client = Arc::new(ChatClient::start(settings)?);

    let _printer = client.subscribe(|event| {
        println!("{}", render(event));
        Ok(())
    });

    // Announce ourselves on every (re)connect.
    let mut status_rx = client.status_watch();
    let watcher = Arc::clone(&client);
    let join_name = name.clone();
    tokio::spawn(async move {
        loop {
            let status = *status_rx.borrow_and_update();
            println!("* {}", status_line(status));
            if status == ConnectionStatus::Connected {
                watcher.publish(&ClientEvent::join(join_name.clone()));
            }
            if status_rx.changed().await.is_err() {
                break;
            }
        }
    });

    let relayed = relay_stdin(&client, &name).await;
    client.shutdown().await;
    relayed?;
    Ok(())
}

async fn relay_stdin(client: &ChatClient, name: &str) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text == "/quit" {
            break;
        }
        if !client.publish(&ClientEvent::message(name, text)) {
            println!("! not connected, message not sent");
        }
    }
    Ok(())
}

/// Trim and cap a display name. `None` when nothing is left.
fn display_name(raw: &str) -> Option<String> {
    let name: String = raw.trim().chars().take(MAX_NAME_CHARS).collect();
    (!name.is_empty()).then_some(name)
}

fn status_line(status: ConnectionStatus) -> &'static str {
    match status {
        ConnectionStatus::Disconnected => "disconnected",
        ConnectionStatus::Connecting => "connecting...",
        ConnectionStatus::Connected => "connected",
        ConnectionStatus::Error => "connection error, will retry",
    }
}

fn render_message(message: &ChatMessage) -> String {
    // Timestamps are RFC 3339 UTC; show HH:MM.
    let time = message.timestamp.get(11..16).unwrap_or("--:--");
    format!("[{time}] {}: {}", message.user_name, message.text)
}

fn render(event: &ServerEvent) -> String {
    match event {
        ServerEvent::Welcome {
            greeting,
            history_count,
            ..
        } => format!("* {greeting} ({history_count} messages so far)"),
        ServerEvent::MessageHistory { messages } => {
            let mut out = String::from("--- recent messages ---");
            for message in messages {
                out.push('\n');
                out.push_str(&render_message(message));
            }
            out.push_str("\n--- end of history ---");
            out
        }
        ServerEvent::NewMessage { message } => render_message(message),
        ServerEvent::UserJoined { user_name, .. } => format!("* {user_name} joined the chat"),
        ServerEvent::UserLeft { session_id, .. } => format!("* {session_id} left the chat"),
        ServerEvent::Error { reason } => format!("! server error: {reason}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookswap_common::{ClientError, SessionId};

    fn message(text: &str) -> ChatMessage {
        ChatMessage {
            id: "msg-1-user-1-abcde".into(),
            kind: "chat".into(),
            session_id: SessionId::from("user-1-abcde"),
            user_name: "Ada".into(),
            text: text.into(),
            timestamp: "2024-05-01T09:30:12.000Z".into(),
            user_color: "#EF4444".into(),
        }
    }

    #[test]
    fn display_name_is_trimmed_and_capped() {
        assert_eq!(display_name("  Ada  ").as_deref(), Some("Ada"));
        assert_eq!(
            display_name("abcdefghijklmnopqrstuvwxyz").as_deref(),
            Some("abcdefghijklmnopqrst")
        );
        assert_eq!(display_name("   "), None);
    }

    #[test]
    fn renders_new_message_with_time() {
        let line = render(&ServerEvent::NewMessage {
            message: message("Loved it"),
        });
        assert_eq!(line, "[09:30] Ada: Loved it");
    }

    #[test]
    fn renders_history_block() {
        let out = render(&ServerEvent::MessageHistory {
            messages: vec![message("one"), message("two")],
        });
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "[09:30] Ada: one");
        assert_eq!(lines[2], "[09:30] Ada: two");
    }

    #[test]
    fn renders_notices() {
        let joined = ServerEvent::user_joined(SessionId::from("user-1-abcde"), "Ada".into());
        assert_eq!(render(&joined), "* Ada joined the chat");
        assert_eq!(
            render(&ServerEvent::invalid_format()),
            "! server error: Invalid message format"
        );
    }

    #[test]
    fn args_require_name() {
        assert!(Args::try_parse_from(["bookswap-chat"]).is_err());
        let args = Args::try_parse_from(["bookswap-chat", "--name", "Ada", "--url", "ws://x/chat"])
            .unwrap();
        assert_eq!(args.name, "Ada");
        assert_eq!(args.url.as_deref(), Some("ws://x/chat"));
    }

    fn args(name: &str, url: &str) -> Args {
        Args {
            name: name.into(),
            url: Some(url.into()),
            config: Some(PathBuf::from("/nonexistent/bookswap/config.toml")),
            log_level: None,
        }
    }

    #[tokio::test]
    async fn run_rejects_blank_name() {
        let err = run(args("   ", "ws://127.0.0.1:9/chat")).await.unwrap_err();
        assert!(matches!(err, BookswapError::Other(_)));
        assert_eq!(err.to_string(), "--name must not be empty");
    }

    #[tokio::test]
    async fn run_rejects_non_websocket_url() {
        let err = run(args("Ada", "http://127.0.0.1:9/chat")).await.unwrap_err();
        assert!(
            matches!(err, BookswapError::Client(ClientError::InvalidUrl(_))),
            "{err}"
        );
    }
}
