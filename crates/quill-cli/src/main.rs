//! quill - terminal chat client for a streaming completion endpoint

mod config;
mod history;

use clap::Parser;
use std::sync::Arc;

use quill_ai::{CompletionClient, EndpointConfig};
use quill_chat::{ChatSession, EndpointTransport, HistoryStore, Message, Role, SessionEvent};

use config::{Config, DEFAULT_MAX_TOKENS};
use history::FileHistoryStore;

/// quill - streaming chat client
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Completion endpoint URL (overrides config)
    #[arg(short, long)]
    base_url: Option<String>,

    /// Response-length cap sent with each request (overrides config)
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Resume a saved chat by id
    #[arg(long)]
    resume: Option<String>,

    /// List saved chats
    #[arg(long)]
    chats: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup tracing
    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("quill=debug")
            .init();
    }

    // Initialize config and exit
    if args.init_config {
        match Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let cfg = Config::load();
    let store = Arc::new(FileHistoryStore::new(FileHistoryStore::default_dir()));

    // List chats and exit
    if args.chats {
        return list_chats(store.as_ref()).await;
    }

    let Some(base_url) = args.base_url.clone().or_else(|| cfg.get_base_url()) else {
        eprintln!("Error: no completion endpoint configured");
        eprintln!();
        eprintln!("Options:");
        eprintln!("  1. Pass it: quill --base-url https://...");
        eprintln!("  2. Set it: export QUILL_BASE_URL=https://...");
        eprintln!("  3. Add it to config: quill --init-config");
        std::process::exit(1);
    };

    let Some(api_key) = cfg.get_api_key() else {
        eprintln!("Error: no API key found");
        eprintln!();
        eprintln!("Set your API key with: export QUILL_API_KEY=your-key");
        eprintln!("Or add it to the config file: quill --init-config");
        std::process::exit(1);
    };

    let max_tokens = args
        .max_tokens
        .or(cfg.max_tokens)
        .unwrap_or(DEFAULT_MAX_TOKENS);

    let client = CompletionClient::new(EndpointConfig {
        base_url,
        api_key,
        max_tokens,
    });
    let transport = Arc::new(EndpointTransport::new(client));
    let mut session = ChatSession::new(transport, store.clone());

    // Resume a saved chat if specified
    if let Some(ref chat_id) = args.resume {
        if session.load_chat(chat_id).await? {
            render_transcript(session.messages());
        } else {
            eprintln!("Chat not found: {}", chat_id);
            std::process::exit(1);
        }
    }

    run_interactive(&mut session, store.as_ref()).await
}

/// What the next streamed turn is driven by.
enum TurnInput<'a> {
    Submit(&'a str),
    Retry,
}

async fn run_interactive(
    session: &mut ChatSession,
    store: &dyn HistoryStore,
) -> anyhow::Result<()> {
    use tokio::io::AsyncBufReadExt;

    // Show minimal startup info (only if TTY)
    if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        eprintln!("quill — type a message, /help for commands");
        eprintln!();
    }

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::Write::flush(&mut std::io::stdout())?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            let mut parts = command.split_whitespace();
            match parts.next() {
                Some("help") => print_help(),
                Some("new") => {
                    session.new_chat();
                    println!("Started a new chat.");
                }
                Some("chats") => list_chats(store).await?,
                Some("load") => match parts.next() {
                    Some(id) => {
                        if session.load_chat(id).await? {
                            render_transcript(session.messages());
                        } else {
                            println!("Chat not found: {}", id);
                        }
                    }
                    None => println!("Usage: /load <id>"),
                },
                Some("delete") => match parts.next() {
                    Some(id) => {
                        session.delete_chat(id).await?;
                        println!("Deleted {}", id);
                    }
                    None => println!("Usage: /delete <id>"),
                },
                Some("retry") => drive_turn(session, store, TurnInput::Retry).await?,
                Some("quit") | Some("exit") => break,
                _ => println!(
                    "Unknown command: /{}\nType /help for available commands.",
                    command
                ),
            }
            continue;
        }

        drive_turn(session, store, TurnInput::Submit(line)).await?;
    }

    Ok(())
}

/// Drive one streamed turn to completion, printing deltas as they arrive.
///
/// The submit future stays pinned and polled even while Ctrl-C is handled,
/// so cancellation lands through the session's own stop path (partial
/// content + stop marker) instead of tearing the future down.
async fn drive_turn(
    session: &mut ChatSession,
    store: &dyn HistoryStore,
    input: TurnInput<'_>,
) -> anyhow::Result<()> {
    let handle = session.handle();
    let mut events = session.subscribe();
    let mut printed = String::new();

    {
        let fut = async {
            match input {
                TurnInput::Submit(text) => session.submit(text).await,
                TurnInput::Retry => session.retry().await,
            }
        };
        tokio::pin!(fut);

        loop {
            tokio::select! {
                _ = &mut fut => break,
                event = events.recv() => {
                    if let Ok(event) = event {
                        handle_event(event, &mut printed, store).await;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    handle.stop();
                }
            }
        }
    }

    // Drain any events that arrived after the future finished.
    while let Ok(event) = events.try_recv() {
        handle_event(event, &mut printed, store).await;
    }

    Ok(())
}

async fn handle_event(event: SessionEvent, printed: &mut String, store: &dyn HistoryStore) {
    match event {
        SessionEvent::StreamStart { .. } => printed.clear(),
        SessionEvent::MessageUpdate { content, .. } => {
            match content.strip_prefix(printed.as_str()) {
                Some(suffix) => print!("{}", suffix),
                // Content was replaced wholesale (error notice): reprint.
                None => print!("\r{}", content),
            }
            let _ = std::io::Write::flush(&mut std::io::stdout());
            *printed = content;
        }
        SessionEvent::StreamEnd { .. } => println!(),
        SessionEvent::TranscriptChanged { summary } => {
            if let Err(e) = store.save(summary).await {
                tracing::warn!(error = %e, "failed to persist chat");
            }
        }
    }
}

async fn list_chats(store: &dyn HistoryStore) -> anyhow::Result<()> {
    let chats = store.load_all().await?;
    if chats.is_empty() {
        println!("No saved chats.");
        return Ok(());
    }

    println!("Saved chats:");
    for chat in chats {
        println!(
            "  {}  {}  ({} messages, {})",
            chat.id,
            chat.title,
            chat.messages.len(),
            format_timestamp(chat.updated_at)
        );
    }
    Ok(())
}

fn render_transcript(messages: &[Message]) {
    for message in messages {
        match message.role {
            Role::User => println!("> {}", message.content),
            Role::Assistant => println!("{}\n", message.content),
        }
    }
}

fn format_timestamp(millis: i64) -> String {
    use chrono::{TimeZone, Utc};
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn print_help() {
    println!("Commands:");
    println!("  /new           Start a new chat");
    println!("  /chats         List saved chats");
    println!("  /load <id>     Load a saved chat");
    println!("  /delete <id>   Delete a saved chat");
    println!("  /retry         Re-send the last prompt");
    println!("  /quit          Exit");
    println!();
    println!("Ctrl-C while a response streams stops it.");
}
