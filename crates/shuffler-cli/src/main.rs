//! `shuffler` binary: host a card table or join one from the terminal.

use std::path::PathBuf;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use shuffler::prelude::*;
use shuffler::{parse_join_link, run_client, run_console};
use tokio::io::BufReader;
use tracing::info;

#[derive(Parser)]
#[command(name = "shuffler", version)]
#[command(about = "Host or join a shared deck of cards")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Host a table and run the operator console
    Host {
        /// Address to listen on
        #[arg(long, env = "SHUFFLER_BIND", default_value = "127.0.0.1:8080")]
        bind: String,

        /// Deck template file (JSON list of {"name", "count"})
        #[arg(long, env = "SHUFFLER_DECK")]
        deck: Option<PathBuf>,

        /// Origin join links are built from
        #[arg(long, env = "SHUFFLER_PUBLIC_URL", default_value = "http://localhost:8080")]
        public_url: String,

        /// Seed for reproducible shuffles
        #[arg(long)]
        seed: Option<u64>,

        /// Leave a departed client's cards out of play instead of discarding them
        #[arg(long)]
        no_reclaim: bool,
    },

    /// Join a table
    Join {
        /// Host id to connect to
        #[arg(long, conflicts_with = "link")]
        host_id: Option<String>,

        /// Join link shared by the host
        #[arg(long)]
        link: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they do not interleave with the console.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Host {
            bind,
            deck,
            public_url,
            seed,
            no_reclaim,
        } => {
            let deck = match deck {
                Some(path) => DeckTemplate::load(&path)
                    .with_context(|| format!("loading deck from {}", path.display()))?,
                None => DeckTemplate::default(),
            };
            let config = HostConfig {
                bind_addr: bind,
                public_url,
                deck,
                reclaim_on_disconnect: !no_reclaim,
                seed,
                ..HostConfig::default()
            };
            handle_host(config).await
        }
        Commands::Join { host_id, link } => {
            let host_id = host_id.or_else(|| link.as_deref().and_then(parse_join_link));
            handle_join(host_id).await
        }
    }
}

async fn handle_host(config: HostConfig) -> anyhow::Result<()> {
    let host = ShufflerHost::builder()
        .config(config)
        .build()
        .await
        .context("starting host")?;

    let link = host.join_link();
    let handle = host.handle();
    info!(%link, "host ready");
    println!("join link: {link}");
    println!("type `help` for commands");

    let server = tokio::spawn(host.run());

    let stdin = BufReader::new(tokio::io::stdin());
    run_console(&handle, &link, &SystemClipboard, stdin, tokio::io::stdout()).await?;

    // The accept loop ends once the actor is gone.
    let _ = handle.shutdown().await;
    server.await.context("host task panicked")??;
    Ok(())
}

async fn handle_join(host_id: Option<String>) -> anyhow::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    match run_client(host_id.as_deref(), stdin, tokio::io::stdout()).await {
        Err(ShufflerError::MissingHostId) => {
            eprintln!("no host to join: pass --host-id or --link\n");
            let mut cmd = Cli::command();
            if let Some(join) = cmd.find_subcommand_mut("join") {
                join.print_help()?;
            }
            Ok(())
        }
        result => result.context("joining host"),
    }
}
