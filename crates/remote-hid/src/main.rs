//! remote-hid entry point.
//!
//! Loads the configuration, wires the transport, session, sequencer and
//! dispatcher together, then serves newline-delimited JSON commands on stdin.
//! Responses and session notifications are written to stdout, one JSON
//! object per line; logs go to stderr.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ SimulatedTransport::new()   -- transport + its event channel
//!  └─ HidSession::new()           -- state machine + notification channel
//!  └─ spawn_event_pump()          -- transport events -> session
//!  └─ Sequencer::spawn()          -- timed report sequences
//!  └─ command loop
//!       ├─ stdin line        -> handle_line() -> stdout
//!       ├─ notification      -> notification_line() -> stdout
//!       └─ Ctrl-C / EOF      -> unregister, flush, exit
//! ```
//!
//! # Usage
//!
//! ```text
//! remote-hid [OPTIONS]
//!
//! Options:
//!   --config <PATH>       Config file [env: REMOTE_HID_CONFIG]
//!   --log-level <FILTER>  Log filter, e.g. "debug" [env: REMOTE_HID_LOG]
//!   --print-config        Print the effective config as TOML and exit
//! ```
//!
//! `RUST_LOG` wins over `--log-level`, which wins over `[logging] level`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use remote_hid::application::dispatch_input::{InputDispatcher, PressTimings};
use remote_hid::application::sequencer::Sequencer;
use remote_hid::application::session::{spawn_event_pump, HidSession};
use remote_hid::application::transport::{AppRegistration, HidTransport};
use remote_hid::infrastructure::command_bridge::{handle_line, notification_line};
use remote_hid::infrastructure::storage::config::{
    load_config, load_config_from, render_config, AppConfig, ConfigError,
};
use remote_hid::infrastructure::transport::simulated::SimulatedTransport;

const OUTPUT_CAPACITY: usize = 256;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Bluetooth HID remote: mouse, keyboard and media keys over JSON commands.
#[derive(Debug, Parser)]
#[command(name = "remote-hid", version)]
struct Cli {
    /// Config file to load instead of the platform default.
    #[arg(long, env = "REMOTE_HID_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter directive; overrides `[logging] level`.
    #[arg(long, env = "REMOTE_HID_LOG")]
    log_level: Option<String>,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,
}

fn load(cli: &Cli) -> Result<AppConfig, ConfigError> {
    match &cli.config {
        Some(path) => load_config_from(path),
        None => match load_config() {
            Err(ConfigError::NoPlatformConfigDir) => Ok(AppConfig::default()),
            other => other,
        },
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load(&cli).context("failed to load configuration")?;

    // ── Logging setup ─────────────────────────────────────────────────────────
    let directive = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log filter: '{directive}'"))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if cli.print_config {
        print!("{}", render_config(&config).context("failed to render configuration")?);
        return Ok(());
    }

    info!(device = %config.device.name, "remote-hid starting");

    // ── Wiring ────────────────────────────────────────────────────────────────
    let (transport, transport_events) = SimulatedTransport::new();
    let transport: Arc<dyn HidTransport> = Arc::new(transport);
    let (session, mut notifications) =
        HidSession::new(transport, AppRegistration::from(&config.device));
    let session = Arc::new(session);
    let pump = spawn_event_pump(Arc::clone(&session), transport_events);
    let sequencer = Sequencer::spawn(Arc::clone(&session));
    let dispatcher = InputDispatcher::new(
        Arc::clone(&session),
        sequencer,
        PressTimings::from(&config.timing),
    );

    // ── Stdout writer ─────────────────────────────────────────────────────────
    let (out_tx, mut out_rx) = mpsc::channel::<String>(OUTPUT_CAPACITY);
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(mut line) = out_rx.recv().await {
            line.push('\n');
            if let Err(e) = stdout.write_all(line.as_bytes()).await {
                warn!(error = %e, "stdout closed");
                break;
            }
            if stdout.flush().await.is_err() {
                break;
            }
        }
    });

    // ── Command loop ──────────────────────────────────────────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!(session = %session.id(), "ready for commands on stdin");

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("shutdown signal received");
                break;
            }
            Some(notification) = notifications.recv() => {
                if out_tx.send(notification_line(&notification)).await.is_err() {
                    break;
                }
            }
            line = lines.next_line() => {
                match line.context("failed to read stdin")? {
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => {
                        let response = handle_line(&dispatcher, &line).await;
                        if out_tx.send(response).await.is_err() {
                            break;
                        }
                    }
                    None => {
                        info!("stdin closed");
                        break;
                    }
                }
            }
        }
    }

    // ── Shutdown ──────────────────────────────────────────────────────────────
    dispatcher.unregister_device().await;
    while let Ok(notification) = notifications.try_recv() {
        if out_tx.send(notification_line(&notification)).await.is_err() {
            break;
        }
    }
    drop(out_tx);
    pump.abort();
    if let Err(e) = writer.await {
        warn!(error = %e, "stdout writer task failed");
    }

    info!("remote-hid stopped");
    Ok(())
}
