//! Swap Orchestrator - command line access to actors' swap nodes
//!
//! Inspects swaps, peers nodes, opens Lightning channels and waits for swap
//! events using the actors described in the configuration file.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::signal;
use tracing::info;

use swap_orchestrator::config::Settings;
use swap_orchestrator::{ActionKind, Actor, Swap, Wallets};

#[derive(Debug, Parser)]
#[command(name = "swap-orchestrator", version, about)]
struct Cli {
    /// Configuration file, defaults to $SWAP_ORCHESTRATOR_CONFIG or config/default.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the action the swap node currently recommends
    NextAction {
        #[arg(long)]
        actor: String,
        /// Swap link, defaults to the first swap the node knows about
        #[arg(long)]
        swap: Option<String>,
    },
    /// Print the swap's full state including its event log
    Events {
        #[arg(long)]
        actor: String,
        #[arg(long)]
        swap: Option<String>,
    },
    /// Peer one actor's swap node with another's
    Connect {
        #[arg(long)]
        actor: String,
        #[arg(long)]
        peer: String,
    },
    /// Open a Lightning channel from one actor to another
    OpenChannel {
        #[arg(long)]
        actor: String,
        #[arg(long)]
        peer: String,
        /// Funding amount in satoshis
        #[arg(long)]
        amount: u64,
    },
    /// Wait until the event confirming an action shows up
    AwaitEvent {
        #[arg(long)]
        actor: String,
        #[arg(long)]
        swap: Option<String>,
        /// init, deploy, fund, redeem or refund
        #[arg(long)]
        action: ActionKind,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    let cli = Cli::parse();
    info!("Starting Swap Orchestrator v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    info!("Loaded configuration for {} actors", settings.actors.len());

    tokio::select! {
        result = run(cli.command, &settings) => result,
        _ = shutdown_signal() => {
            info!("Shutdown signal received, stopping...");
            Ok(())
        }
    }
}

async fn run(command: Command, settings: &Settings) -> Result<()> {
    let actor = |name: &str| Actor::from_settings(name, settings, Wallets::new());

    match command {
        Command::NextAction { actor: name, swap } => {
            let actor = actor(&name)?;
            let swap = select_swap(&actor, swap).await?;
            match actor.next_action(&swap).await? {
                Some(action) => println!("{}", serde_json::to_string_pretty(&action)?),
                None => println!("no action available on {}", swap.href()),
            }
        }
        Command::Events { actor: name, swap } => {
            let actor = actor(&name)?;
            let swap = select_swap(&actor, swap).await?;
            let state = actor.dump_state(&swap).await?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        Command::Connect { actor: name, peer } => {
            let (actor, peer) = (actor(&name)?, actor(&peer)?);
            actor.connect(&peer).await?;
            println!("{} is connected to {}", actor.name(), peer.name());
        }
        Command::OpenChannel {
            actor: name,
            peer,
            amount,
        } => {
            let (actor, peer) = (actor(&name)?, actor(&peer)?);
            let channel = actor.open_channel(&peer, amount).await?;
            println!("{}", serde_json::to_string_pretty(&channel)?);
        }
        Command::AwaitEvent {
            actor: name,
            swap,
            action,
        } => {
            let actor = actor(&name)?;
            let swap = select_swap(&actor, swap).await?;
            actor.wait_for_event(&swap, action).await?;
            println!("{} confirmed on {}", action, swap.href());
        }
    }

    Ok(())
}

async fn select_swap(actor: &Actor, href: Option<String>) -> Result<Swap> {
    Ok(match href {
        Some(href) => actor.swap(href),
        None => actor.wait_for_swap().await?,
    })
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,swap_orchestrator=debug,reqwest=warn,hyper=warn")
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
