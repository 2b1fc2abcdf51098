mod cmds;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "blockpulse")]
#[command(version = "0.1.0")]
#[command(about = "Real-time block cadence and proposer latency monitor", long_about = None)]
struct Cli {
    /// Log level for operational messages (error, warn, info, debug, trace).
    /// Measurement output always goes to stdout regardless.
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Watch block production and attribute latency to proposers")]
    Watch(cmds::watch::Opts),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&cli.log_level),
    )
    .init();

    match &cli.command {
        Commands::Watch(opts) => cmds::watch::run(opts).await?,
    }

    Ok(())
}
