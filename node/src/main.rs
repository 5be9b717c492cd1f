use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use chain::{
    crypto::wallet::Wallet,
    diagnostics::print_block_hashes,
    storage::{Database, RedbDatabase},
};
use clap::{Args, Parser, Subcommand};
use node::{config::NodeConfig, logging::build_logger, node::run};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(
    name = "minchain",
    about = "Minimal gossip blockchain node",
    version,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// TOML configuration file; missing files are skipped
    #[arg(long, short, global = true, default_value = "minchain.toml", env = "MINCHAIN_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Run the node (default)
    Run(RunArgs),
    /// Generate a new secret key file
    Keygen {
        /// Destination of the hex-encoded key
        #[arg(long, default_value = ".pk")]
        out: PathBuf,
        /// Replace an existing key file
        #[arg(long)]
        force: bool,
    },
    /// Print the stored hash chain, head first
    Chain {
        /// redb database file; defaults to the configured storage path
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// P2P listen port
    #[arg(long)]
    port: Option<u16>,
    /// Produce blocks on this node
    #[arg(long)]
    block_producer: bool,
    /// Seconds between produced blocks
    #[arg(long)]
    block_time: Option<u64>,
    /// Secret key file
    #[arg(long)]
    key: Option<PathBuf>,
    /// Address for the HTTP message input, e.g. 127.0.0.1:8080
    #[arg(long)]
    http: Option<SocketAddr>,
    /// Peer to dial, repeatable
    #[arg(long = "peer")]
    peers: Vec<SocketAddr>,
}

impl RunArgs {
    fn apply(self, config: &mut NodeConfig) {
        if let Some(port) = self.port {
            config.p2p.listen_addr.set_port(port);
        }
        if self.block_producer {
            config.node.app.block_producer = true;
        }
        if let Some(secs) = self.block_time {
            config.node.app.block_time = Duration::from_secs(secs);
        }
        if let Some(key) = self.key {
            config.node.key_path = key;
        }
        if let Some(http) = self.http {
            config.http.listen_addr = Some(http);
        }
        config.p2p.peers.extend(self.peers);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = NodeConfig::load(&cli.config)
        .with_context(|| format!("failed to load config {}", cli.config.display()))?;

    match cli.command {
        Some(Command::Keygen { out, force }) => keygen(&out, force),
        Some(Command::Chain { db }) => print_chain(&db.unwrap_or(config.storage.path)),
        Some(Command::Run(args)) => {
            args.apply(&mut config);
            run_node(config).await
        }
        None => {
            cli.run.apply(&mut config);
            run_node(config).await
        }
    }
}

async fn run_node(config: NodeConfig) -> Result<()> {
    let logger = build_logger(&config.logging.level)?;
    let cancel = CancellationToken::new();

    let shutdown = cancel.clone();
    let signal_logger = logger.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            slog::info!(signal_logger, "Interrupt received");
        }
        shutdown.cancel();
    });

    run(config, logger, cancel).await
}

fn keygen(out: &Path, force: bool) -> Result<()> {
    if out.exists() && !force {
        anyhow::bail!("{} already exists, pass --force to replace it", out.display());
    }
    let wallet = Wallet::generate(&mut rand::rngs::OsRng);
    wallet
        .save_to_file(out)
        .with_context(|| format!("failed to write {}", out.display()))?;
    println!("{}", wallet.address());
    Ok(())
}

fn print_chain(path: &Path) -> Result<()> {
    let db = RedbDatabase::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let chain = print_block_hashes(&db);
    db.close()?;
    println!("{}", chain?);
    Ok(())
}
