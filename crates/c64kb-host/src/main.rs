//! c64kb entry point.
//!
//! Wires the terminal, the transport and the dispatch use case together and
//! runs one session until the operator presses Ctrl+C or the link fails.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config() + CLI overrides
//!  └─ open_link()            -- BleTransport, or DryRunTransport
//!  └─ TerminalGuard::enter() -- raw mode for the session
//!  └─ TerminalInput::start() -- capture thread → KeyQueue
//!  └─ DispatchUseCase::run() -- until input closes or the link fails
//! ```

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use c64kb_host::application::dispatch::DispatchUseCase;
use c64kb_host::application::link::FrameTransport;
use c64kb_host::infrastructure::console::{print_help, CrlfWriter, KeyQueue};
use c64kb_host::infrastructure::input_capture::terminal::{TerminalGuard, TerminalInput};
use c64kb_host::infrastructure::input_capture::InputSource;
use c64kb_host::infrastructure::storage::config::{load_config, to_toml, AppConfig};
use c64kb_host::infrastructure::storage::program::FsProgramLoader;
use c64kb_host::infrastructure::transport::dry_run::DryRunTransport;

#[cfg(feature = "ble")]
use c64kb_host::infrastructure::transport::ble::BleTransport;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Type on a Bluetooth-attached C64 from the local keyboard.
///
/// Values given here override the configuration file.
#[derive(Debug, Parser)]
#[command(name = "c64kb", version)]
struct Cli {
    /// Configuration file to read instead of the platform default.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Bluetooth MAC address of the peripheral.
    #[arg(long, env = "C64KB_ADDRESS")]
    address: Option<String>,

    /// GATT characteristic UUID used for every exchange.
    #[arg(long, env = "C64KB_CHARACTERISTIC")]
    characteristic: Option<Uuid>,

    /// Log frames instead of sending them.
    #[arg(long)]
    dry_run: bool,

    /// Log level when `RUST_LOG` is not set.
    #[arg(long)]
    log_level: Option<String>,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    /// Applies the command-line overrides to `config`.
    fn apply(&self, config: &mut AppConfig) {
        if let Some(address) = &self.address {
            config.peripheral.address = address.clone();
        }
        if let Some(characteristic) = self.characteristic {
            config.peripheral.characteristic_uuid = characteristic;
        }
        if let Some(level) = &self.log_level {
            config.host.log_level = level.clone();
        }
    }
}

// ── Link selection ────────────────────────────────────────────────────────────

/// The transport chosen for this session.
enum Link {
    DryRun(Arc<DryRunTransport>),
    #[cfg(feature = "ble")]
    Ble(Arc<BleTransport>),
}

impl Link {
    fn transport(&self) -> Arc<dyn FrameTransport> {
        match self {
            Link::DryRun(t) => Arc::clone(t) as Arc<dyn FrameTransport>,
            #[cfg(feature = "ble")]
            Link::Ble(t) => Arc::clone(t) as Arc<dyn FrameTransport>,
        }
    }

    async fn close(&self) {
        match self {
            Link::DryRun(t) => info!("dry run finished after {} frame(s)", t.frame_count()),
            #[cfg(feature = "ble")]
            Link::Ble(t) => {
                if let Err(e) = t.disconnect().await {
                    warn!("disconnect failed: {e}");
                }
            }
        }
    }
}

#[cfg(feature = "ble")]
async fn open_link(cli: &Cli, config: &AppConfig) -> anyhow::Result<Link> {
    if cli.dry_run {
        return Ok(Link::DryRun(Arc::new(DryRunTransport::new())));
    }
    let peripheral = &config.peripheral;
    let transport = BleTransport::connect(
        &peripheral.address,
        peripheral.characteristic_uuid,
        peripheral.scan_timeout(),
    )
    .await
    .with_context(|| format!("failed to connect to {}", peripheral.address))?;
    Ok(Link::Ble(Arc::new(transport)))
}

#[cfg(not(feature = "ble"))]
async fn open_link(cli: &Cli, _config: &AppConfig) -> anyhow::Result<Link> {
    if !cli.dry_run {
        warn!("built without the `ble` feature; frames are only logged");
    }
    Ok(Link::DryRun(Arc::new(DryRunTransport::new())))
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).context("failed to load configuration")?;
    cli.apply(&mut config);

    if cli.print_config {
        print!("{}", to_toml(&config)?);
        return Ok(());
    }

    // `RUST_LOG` wins over the configured level.  Log lines go to stderr and
    // need explicit carriage returns once the terminal is in raw mode.
    let level = config.host.log_level.clone();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(|| CrlfWriter::new(io::stderr()))
        .init();

    info!("c64kb {} starting", env!("CARGO_PKG_VERSION"));

    let link = open_link(&cli, &config).await?;
    let programs = Arc::new(FsProgramLoader::new(config.host.program_dir.clone()));
    let mut dispatcher = DispatchUseCase::new(link.transport(), programs);

    let guard = TerminalGuard::enter().context("failed to prepare the terminal")?;
    let mut out = CrlfWriter::new(io::stdout());
    print_help(&mut out).context("failed to write to the terminal")?;

    let input = TerminalInput::new();
    let keys = input.start().context("failed to start key capture")?;
    let mut operator = KeyQueue::new(keys, out);

    let result = dispatcher.run(&mut operator).await;

    input.stop();
    drop(guard);
    link.close().await;

    result.context("session ended by a link failure")?;
    info!("session ended");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
