mod commands;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use commands::{CountdownAction, ShellCommand, TimerAction, HELP};
use overlayclock::prelude::*;
use overlayclock::{server, ENGINE_NAME, VERSION as LIB_VERSION};
use rustyline::highlight::Highlighter;
use rustyline::Editor;
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use std::borrow::Cow;
use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SHELL_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "OVERLAY_CONFIG")]
    config: Option<PathBuf>,

    /// Drive the store locally without serving the HTTP API
    #[arg(long)]
    offline: bool,
}

/// A custom helper struct for rustyline that enables syntax highlighting.
#[derive(Completer, Helper, Hinter, Validator)]
struct ShellHighlighter;

impl Highlighter for ShellHighlighter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if let Some((command, rest)) = line.split_once(' ') {
            let colored_command = command.yellow().bold();
            let colored_rest = rest.yellow();
            Cow::Owned(format!("{} {}", colored_command, colored_rest))
        } else {
            Cow::Owned(line.yellow().bold().to_string())
        }
    }
    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

fn print_banner() {
    if env::var("QUIET_MODE").is_ok() {
        return;
    }
    println!("{}", format!("  {} operator shell", ENGINE_NAME).cyan().bold());
    println!(
        "{}",
        format!(
            "  Shell   v{:<8} Library   v{:<8}",
            SHELL_VERSION, LIB_VERSION
        )
        .dimmed()
    );
    println!("{}", "-".repeat(64).dimmed());
}

/// Formats seconds as `HH:MM:SS`, the way the display page shows counters.
fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

fn print_state(snapshot: &Snapshot, now: Timestamp) {
    let flag = |on: bool, label: &str| {
        if on {
            label.green().to_string()
        } else {
            label.dimmed().to_string()
        }
    };
    println!(
        "  timer      {}  {} {}",
        format_clock(snapshot.timer.value).bold(),
        flag(snapshot.timer.running, "running"),
        flag(snapshot.timer.visible, "visible"),
    );
    println!(
        "  countdown  {}  {} {}  {:>3.0}% of {}",
        format_clock(snapshot.countdown.value).bold(),
        flag(snapshot.countdown.running, "running"),
        flag(snapshot.countdown.visible, "visible"),
        snapshot.countdown.progress * 100.0,
        format_clock(snapshot.countdown.initial),
    );
    if snapshot.message.active {
        println!(
            "  message    \"{}\" {} ({:.1}s left)",
            snapshot.message.text,
            snapshot.message.color.dimmed(),
            (snapshot.message.expires_at - now).max(0.0),
        );
    } else {
        println!("  message    {}", "none".dimmed());
    }
    if snapshot.event.active {
        println!(
            "  event      {} ({:.1}s left)",
            snapshot.event.event_type.magenta(),
            (snapshot.event.expires_at - now).max(0.0),
        );
    } else {
        println!("  event      {}", "none".dimmed());
    }
}

/// Spawns a task printing control events while `watching` is set.
fn spawn_event_listener(store: &StateStore, watching: Arc<AtomicBool>) {
    let mut events = store.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if watching.load(Ordering::Relaxed) {
                println!("\n<-- [CONTROL EVENT] {:?}", event);
            }
        }
    });
}

/// Applies one parsed command. Returns `false` when the shell should exit.
async fn execute(command: ShellCommand, store: &StateStore, watching: &AtomicBool) -> bool {
    let outcome = match command {
        ShellCommand::Timer(action) => {
            match action {
                TimerAction::Start => store.timer_start().await,
                TimerAction::Stop => store.timer_stop().await,
                TimerAction::Reset => store.timer_reset().await,
            }
            Ok(format!("Timer {:?}.", action).to_lowercase())
        }
        ShellCommand::Countdown(CountdownAction::Start { minutes }) => store
            .countdown_start(minutes)
            .await
            .map(|_| format!("Countdown started from {} minute(s).", minutes)),
        ShellCommand::Countdown(CountdownAction::Stop) => {
            store.countdown_stop().await;
            Ok("Countdown stopped.".to_string())
        }
        ShellCommand::Countdown(CountdownAction::Reset) => {
            store.countdown_reset().await;
            Ok("Countdown reset.".to_string())
        }
        ShellCommand::Toggle(target) => {
            let visible = store.toggle_visibility(target).await;
            Ok(format!(
                "{} is now {}.",
                target,
                if visible { "visible" } else { "hidden" }
            ))
        }
        ShellCommand::Message {
            text,
            color,
            duration,
        } => store
            .set_message(text, color, duration)
            .await
            .map(|_| "Message set.".to_string()),
        ShellCommand::Clear => {
            store.clear_message().await;
            Ok("Message cleared.".to_string())
        }
        ShellCommand::Event {
            event_type,
            duration,
        } => {
            let label = event_type.clone();
            store
                .trigger_event(event_type, duration)
                .await
                .map(|_| format!("Event '{}' triggered.", label))
        }
        ShellCommand::State => {
            let snapshot = store.get_state().await;
            print_state(&snapshot, SystemClock.now());
            return true;
        }
        ShellCommand::Watch(on) => {
            watching.store(on, Ordering::Relaxed);
            Ok(if on {
                "Watching control events.".to_string()
            } else {
                "Stopped watching control events.".to_string()
            })
        }
        ShellCommand::Help => {
            println!("Available commands:");
            for (usage, summary) in HELP {
                println!("  {:<44} - {}", usage, summary);
            }
            return true;
        }
        ShellCommand::Exit => return false,
        ShellCommand::Empty => return true,
    };

    match outcome {
        Ok(done) => println!("--> {}", done),
        Err(e) => println!("{} {}", "Error:".red().bold(), e),
    }
    true
}

#[tokio::main]
async fn main() -> Result<()> {
    print_banner();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = OverlayConfig::load(args.config.as_deref())?;

    let (notifier, _speech_worker) = SpeechQueue::from_config(&config.speech);
    let store = StateStore::with_parts(config.defaults.clone(), Arc::new(SystemClock), notifier);

    // Shared flag for the control-event printer.
    let watching = Arc::new(AtomicBool::new(false));
    spawn_event_listener(&store, watching.clone());

    if !args.offline {
        info!("Spawning the control API in the background...");
        let server_store = store.clone();
        let server_config = config.server.clone();
        tokio::spawn(async move {
            if let Err(e) = server::serve(&server_config, server_store).await {
                eprintln!("\nControl API stopped with an error: {:#}", e);
            }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        println!(
            "Control API at {}",
            format!("http://{}", config.server.address()).cyan()
        );
    }

    let mut rl = Editor::new()?;
    rl.set_helper(Some(ShellHighlighter));

    println!(
        "{} shell is ready. Type 'help' for commands or 'exit' to quit.",
        ENGINE_NAME.cyan()
    );

    loop {
        let prompt = format!("{}", ">> ".cyan().bold());
        match rl.readline(&prompt) {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                match commands::parse(&line) {
                    Ok(command) => {
                        if !execute(command, &store, &watching).await {
                            break;
                        }
                    }
                    Err(usage) => println!("{}", usage),
                }
            }
            Err(_) => {
                println!("Exiting overlayshell...");
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_clock_like_the_display() {
        assert_eq!(format_clock(0.0), "00:00:00");
        assert_eq!(format_clock(59.9), "00:00:59");
        assert_eq!(format_clock(3_723.4), "01:02:03");
        assert_eq!(format_clock(-4.0), "00:00:00");
    }

    #[tokio::test]
    async fn execute_drives_the_store() {
        let store = StateStore::new(DefaultsConfig::default());
        let watching = AtomicBool::new(false);

        assert!(execute(ShellCommand::Toggle(Target::Timer), &store, &watching).await);
        assert!(
            execute(
                ShellCommand::Countdown(CountdownAction::Start { minutes: 10.0 }),
                &store,
                &watching
            )
            .await
        );
        assert!(execute(ShellCommand::Watch(true), &store, &watching).await);
        assert!(!execute(ShellCommand::Exit, &store, &watching).await);

        let snapshot = store.get_state().await;
        assert!(!snapshot.timer.visible);
        assert!(snapshot.countdown.running);
        assert_eq!(snapshot.countdown.initial, 600.0);
        assert!(watching.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn rejected_input_keeps_the_shell_running() {
        let store = StateStore::new(DefaultsConfig::default());
        let watching = AtomicBool::new(false);
        let keep_going = execute(
            ShellCommand::Countdown(CountdownAction::Start { minutes: -3.0 }),
            &store,
            &watching,
        )
        .await;
        assert!(keep_going);
        assert!(!store.get_state().await.countdown.running);
    }
}
