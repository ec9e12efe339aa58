//! Perpetua governance node
//!
//! Loads the latest snapshots, serves the HTTP API and writes a final
//! snapshot on shutdown.

use clap::Parser;
use owo_colors::OwoColorize;
use perpetua_api::{ApiState, DevChainClient, DisabledChainClient};
use perpetua_governance::GovernanceRegistry;
use perpetua_ledger::{LedgerBook, Role};
use perpetua_storage::PlatformDb;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "perpetuad")]
#[command(about = "Perpetua governance node")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Data directory (overrides config)
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Listen address (overrides config)
    #[arg(long, value_name = "ADDR")]
    listen: Option<SocketAddr>,

    /// Run with dev seeding and the dev chain signer
    #[arg(long)]
    dev: bool,

    /// Show version
    #[arg(short, long)]
    version: bool,
}

#[derive(Debug, Deserialize, Default)]
struct Config {
    #[serde(default)]
    node: NodeConfig,
}

#[derive(Debug, Deserialize, Default)]
struct NodeConfig {
    listen: Option<SocketAddr>,
    data_dir: Option<PathBuf>,
    #[serde(default)]
    dev_mode: bool,
}

fn load_config(path: &PathBuf) -> Result<Config, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&contents)?)
}

/// Populate a fresh dev node with a few accounts worth playing with.
fn seed_dev_data(book: &mut LedgerBook) {
    let now = chrono::Utc::now();
    let admin = book
        .create_account("treasury-admin", Role::Admin, 100_000.0, now)
        .expect("seed admin");
    let alice = book
        .create_account("alice", Role::Member, 1_000.0, now)
        .expect("seed alice");
    book.create_account("bob", Role::Member, 250.0, now)
        .expect("seed bob");
    book.record_investment(&alice.id, 1_500.0, now)
        .expect("seed investment");
    tracing::info!(admin_id = %admin.id, "dev accounts seeded");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.version {
        println!("perpetuad {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => {
            let default_path = PathBuf::from("perpetua.toml");
            if default_path.exists() {
                load_config(&default_path)?
            } else {
                Config::default()
            }
        }
    };

    let listen = cli
        .listen
        .or(config.node.listen)
        .unwrap_or_else(|| "127.0.0.1:8080".parse().expect("default listen addr"));
    let data_dir = cli
        .data_dir
        .or(config.node.data_dir)
        .unwrap_or_else(|| PathBuf::from("perpetua-data"));
    let dev_mode = cli.dev || config.node.dev_mode;

    println!(
        "{} {}",
        "Perpetua Governance Node".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("Listen:   {}", listen.to_string().yellow());
    println!("Data dir: {}", data_dir.display().to_string().yellow());
    if dev_mode {
        println!("{}", "Dev mode enabled".magenta());
    }

    let store = Arc::new(PlatformDb::open(&data_dir)?);

    let ledger = match store.load_ledger()? {
        Some(book) => {
            tracing::info!("ledger snapshot loaded");
            book
        }
        None => {
            let mut book = LedgerBook::new();
            if dev_mode {
                seed_dev_data(&mut book);
            }
            book
        }
    };
    let governance = store.load_governance()?.unwrap_or_else(|| {
        tracing::info!("starting with an empty governance registry");
        GovernanceRegistry::new()
    });

    let ledger = Arc::new(RwLock::new(ledger));
    let governance = Arc::new(RwLock::new(governance));

    let chain: Arc<dyn perpetua_api::ChainClient> = if dev_mode {
        Arc::new(DevChainClient)
    } else {
        Arc::new(DisabledChainClient)
    };

    let state = ApiState::new(
        Arc::clone(&ledger),
        Arc::clone(&governance),
        Some(Arc::clone(&store)),
        chain,
        dev_mode,
    );

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received");
    };

    perpetua_api::start_server_with_shutdown(listen, state, shutdown).await?;

    // final snapshot so nothing since the last mutation is lost
    {
        let book = ledger.read().await;
        let registry = governance.read().await;
        store.save_all(&book, &registry)?;
    }
    tracing::info!("final snapshot written, goodbye");

    Ok(())
}
