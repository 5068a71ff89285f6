use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ticketlens_core::config::Config;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ticketlens", about = "Ticket export analyzer", version)]
struct Cli {
    /// Force debug-level logging (overrides `[log] level`, not RUST_LOG).
    #[arg(long, global = true)]
    debug: bool,

    /// Config file to use instead of ~/.config/ticketlens/config.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API.
    Serve {
        /// Listen address, e.g. 0.0.0.0:5000.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Ingest a file and print the report bundle as JSON.
    Report {
        file: PathBuf,
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    let level = if cli.debug { "debug" } else { config.log.level.as_str() };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();

    match cli.command {
        Command::Serve { bind } => ticketlens::server::serve(&config, bind.as_deref()).await,
        Command::Report { file, pretty } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let bundle = ticketlens::report_bytes(&config, &bytes)
                .with_context(|| format!("failed to ingest {}", file.display()))?;
            let json = if pretty {
                serde_json::to_string_pretty(&bundle)?
            } else {
                serde_json::to_string(&bundle)?
            };
            println!("{json}");
            Ok(())
        }
    }
}
