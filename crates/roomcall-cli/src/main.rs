//! roomcall terminal client
//!
//! Drives a [`SessionController`] from stdin against the in-process loopback
//! SDK. Remote activity is simulated with `peer` and `drop`.

mod console;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use roomcall_core::bootstrap::{AppIdSource, EnvAppId, FileAppId};
use roomcall_core::logging::parse_log_level;
use roomcall_core::sdk::loopback::LoopbackEngine;
use roomcall_core::{
    LoggingConfig, MediaKind, RemoteUser, SdkEvent, SessionConfig, SessionController, TransportState,
    setup_logging,
};

use console::ConsoleUi;

#[derive(Parser, Debug)]
#[command(author, version, about = "Join a voice room from the terminal", long_about = None)]
struct Args {
    /// TOML session configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// App ID (overrides the config file)
    #[arg(long, env = "ROOMCALL_APP_ID")]
    app_id: Option<String>,

    /// File the App ID is dropped into, polled until it appears
    #[arg(long)]
    app_id_file: Option<PathBuf>,

    /// Credential token passed through to the SDK
    #[arg(long)]
    token: Option<String>,

    /// Page origin used for the secure-context check
    #[arg(long)]
    origin: Option<String>,

    /// Display name to join with right away
    #[arg(short, long)]
    name: Option<String>,

    /// Room to join right away
    #[arg(short, long)]
    room: Option<String>,

    /// Start with the microphone muted
    #[arg(long)]
    muted: bool,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Echo debug panel lines as they are written
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    fn session_config(&self) -> Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => SessionConfig::new(),
        };
        if let Some(app_id) = &self.app_id {
            config = config.with_app_id(app_id.clone());
        }
        if let Some(token) = &self.token {
            config = config.with_token(token.clone());
        }
        if let Some(origin) = &self.origin {
            config = config.with_page_origin(origin.clone());
        }
        if self.muted {
            config = config.with_start_muted(true);
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut logging = LoggingConfig::new(parse_log_level(&args.log_level)?, "roomcall");
    if args.json_logs {
        logging = logging.with_json();
    }
    setup_logging(logging)?;

    let config = args.session_config()?;
    let ui = Arc::new(ConsoleUi::new(config.status_ttl(), args.debug));
    let engine = LoopbackEngine::new();
    let controller = SessionController::builder(Arc::new(engine.clone()))
        .config(config)
        .ui(ui.clone())
        .build()?;
    let _events = controller.spawn_event_loop();

    if controller.app_id().is_none() {
        let source: Box<dyn AppIdSource> = match &args.app_id_file {
            Some(path) => {
                println!("Waiting for an App ID in {}", path.display());
                Box::new(FileAppId::new(path))
            }
            None => Box::new(EnvAppId::default()),
        };
        if let Err(e) = controller.bootstrap_app_id(source.as_ref()).await {
            eprintln!("! {}", e);
        }
    }
    if !controller.startup_report() {
        println!("Not ready to join yet; see `debug` for details");
    }

    if let (Some(name), Some(room)) = (&args.name, &args.room) {
        // failures are already on screen
        let _ = controller.join(name, room).await;
    }

    print_help();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let next_peer = AtomicU32::new(2000);

    while let Some(line) = lines.next_line().await? {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(command) = parts.first() else {
            continue;
        };

        match *command {
            "join" => match (parts.get(1), parts.get(2)) {
                (Some(name), Some(room)) => {
                    let _ = controller.join(name, room).await;
                }
                _ => println!("usage: join <name> <room>"),
            },
            "mute" => {
                controller.toggle_mute().await;
            }
            "leave" => {
                let _ = controller.leave().await;
            }
            "status" => {
                let snapshot = controller.snapshot();
                println!("State: {}", snapshot.state);
                if let Some(uid) = snapshot.local_uid {
                    println!("Local uid: {}", uid);
                }
                ui.print_status();
            }
            "peer" => {
                let uid = parts
                    .get(1)
                    .and_then(|v| v.parse().ok())
                    .unwrap_or_else(|| next_peer.fetch_add(1, Ordering::Relaxed));
                debug!("simulating remote publish from {}", uid);
                if !engine.emit(SdkEvent::UserPublished {
                    user: RemoteUser::new(uid),
                    media: MediaKind::Audio,
                }) {
                    println!("No client to deliver to; join a room first");
                }
            }
            "drop" => {
                engine.emit(SdkEvent::ConnectionStateChanged {
                    previous: TransportState::Connected,
                    current: TransportState::Disconnected,
                    reason: Some("NETWORK_ERROR".to_string()),
                });
            }
            "debug" => ui.print_debug(),
            "help" => print_help(),
            "quit" | "exit" => break,
            other => println!("Unknown command: {} (try `help`)", other),
        }
    }

    controller.cleanup().await;
    info!("roomcall exiting");
    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  join <name> <room>   join a room");
    println!("  mute                 toggle the microphone");
    println!("  leave                leave the room");
    println!("  status               show state and recent banners");
    println!("  peer [uid]           simulate a remote user publishing audio");
    println!("  drop                 simulate a transport disconnect");
    println!("  debug                show the debug panel");
    println!("  quit                 leave and exit");
}
