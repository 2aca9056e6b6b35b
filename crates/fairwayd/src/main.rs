//! fairwayd — the Fairway daemon.
//!
//! Single binary that runs the fair-sharing allocator as a standalone
//! process:
//! - Allocator engine (DRF sorter, ledger, offer filters)
//! - Whitelist watcher (hosts file polling)
//!
//! Offers are logged as they are emitted; a real deployment embeds the
//! allocator crate directly and consumes offers from the channel.
//!
//! # Usage
//!
//! ```text
//! fairwayd run --config /etc/fairway/fairway.toml
//! ```

mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use fairway_allocator::{Allocator, AllocatorConfig};
use fairway_resources::ResourceVector;
use fairway_whitelist::{Whitelist, WhitelistCallback, WhitelistWatcher};

use config::FairwaydConfig;

#[derive(Parser)]
#[command(name = "fairwayd", about = "Fairway allocator daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the allocator as a long-lived process.
    Run {
        /// Path to fairway.toml.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Milliseconds between periodic allocation passes.
        #[arg(long)]
        allocation_interval_ms: Option<u64>,

        /// Hosts file naming the agents eligible for offers.
        #[arg(long)]
        whitelist: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fairwayd=debug,fairway=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            config,
            allocation_interval_ms,
            whitelist,
        } => run_daemon(config, allocation_interval_ms, whitelist).await,
    }
}

async fn run_daemon(
    config_path: Option<PathBuf>,
    allocation_interval_ms: Option<u64>,
    whitelist_flag: Option<PathBuf>,
) -> anyhow::Result<()> {
    info!("Fairway daemon starting");

    let file_config = match &config_path {
        Some(path) => {
            let config = FairwaydConfig::from_file(path)?;
            info!(path = ?path, "configuration loaded");
            config
        }
        None => FairwaydConfig::default(),
    };

    // Command-line flags override the file.
    let allocation = file_config.allocation.unwrap_or_else(|| config::AllocationSection {
        interval_ms: None,
        min_allocatable: None,
    });
    let interval_ms = allocation_interval_ms.or(allocation.interval_ms);
    let whitelist_path = whitelist_flag.or(file_config
        .whitelist
        .as_ref()
        .and_then(|section| section.path.clone()));
    let poll_interval = file_config
        .whitelist
        .as_ref()
        .and_then(|section| section.poll_interval_secs)
        .map(Duration::from_secs);

    // ── Assemble the allocator configuration ───────────────────

    let mut allocator_config = AllocatorConfig::default();
    if let Some(ms) = interval_ms {
        allocator_config = allocator_config.with_allocation_interval(Duration::from_millis(ms));
    }
    if let Some(text) = &allocation.min_allocatable {
        let min: ResourceVector = text.parse()?;
        allocator_config = allocator_config.with_min_allocatable(min);
    }
    if let Some(path) = &whitelist_path {
        // Seed the engine synchronously so no offer escapes to a
        // non-whitelisted agent before the first poll.
        match Whitelist::load(path) {
            Ok(list) => allocator_config = allocator_config.with_initial_whitelist(list),
            Err(err) => warn!(path = ?path, %err, "initial whitelist load failed, allowing all"),
        }
    }

    // ── Start the engine and the watcher ───────────────────────

    let (allocator, mut offers) = Allocator::spawn(allocator_config);
    info!("allocator engine spawned");

    let watcher_handle = whitelist_path.map(|path| {
        let mut watcher = WhitelistWatcher::new(&path);
        if let Some(interval) = poll_interval {
            watcher = watcher.with_poll_interval(interval);
        }
        info!(path = ?path, "whitelist watcher started");
        let updater = allocator.clone();
        let callback: WhitelistCallback = Arc::new(move |list| {
            let updater = updater.clone();
            Box::pin(async move {
                updater.update_whitelist(list);
            })
        });
        watcher.start(callback)
    });

    // ── Run until interrupted ──────────────────────────────────

    loop {
        tokio::select! {
            maybe = offers.recv() => match maybe {
                Some(offer) => info!(
                    tenant = %offer.tenant_id,
                    agents = offer.allocations.len(),
                    resources = %offer.total_resources(),
                    "offer emitted"
                ),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    if let Some(handle) = watcher_handle {
        handle.stop();
    }

    info!("Fairway daemon stopped");
    Ok(())
}
