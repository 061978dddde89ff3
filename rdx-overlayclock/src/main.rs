use anyhow::Result;
use clap::Parser;
use overlayclock::prelude::*;
use overlayclock::{server, ENGINE_NAME, VERSION};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "OVERLAY_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind, overriding the configuration
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, overriding the configuration
    #[arg(short, long)]
    port: Option<u16>,

    /// Disable text-to-speech for messages
    #[arg(long)]
    mute: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // 2. Load the configuration and apply command-line overrides.
    let args = Args::parse();
    let mut config = OverlayConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.mute {
        config.speech.enabled = false;
    }
    info!("{} v{} starting up...", ENGINE_NAME, VERSION);

    // 3. Start the speech worker and build the store around it.
    let (notifier, _speech_worker) = SpeechQueue::from_config(&config.speech);
    let store = StateStore::with_parts(config.defaults.clone(), Arc::new(SystemClock), notifier);

    // 4. Log every applied command.
    spawn_event_logger(&store);

    // 5. Serve until Ctrl+C.
    server::serve(&config.server, store).await?;
    info!("{} has shut down.", ENGINE_NAME);
    Ok(())
}

/// Spawns a task that writes the control-event stream to the log.
fn spawn_event_logger(store: &StateStore) {
    let mut events = store.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => info!("[CONTROL] => {:?}", event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event logger fell behind by {} events.", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}
