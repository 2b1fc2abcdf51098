use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use pulse_chain::NodeCommandClient;
use pulse_observer::{report, BlockMonitor, MonitorConfig, StatsConfig};

#[derive(Debug, Parser)]
#[command(about = "Watch block production and attribute latency to proposers")]
pub struct Opts {
    /// Chain CLI binary used for every node query
    #[clap(long, default_value = "shidod")]
    pub bin: String,

    /// Milliseconds between status polls
    #[clap(long, default_value_t = 400)]
    pub poll_interval_ms: u64,

    /// Blocks between validator-set refreshes
    #[clap(long, default_value_t = 200)]
    pub refresh_interval: u64,

    /// Bech32 prefix for validator consensus addresses
    #[clap(long, default_value = "shidovalcons")]
    pub prefix: String,

    /// Blocks at or under this many seconds count as fast
    #[clap(long, default_value_t = 0.7)]
    pub fast_threshold: f64,

    /// Blocks at or over this many seconds count as failed
    #[clap(long, default_value_t = 5.0)]
    pub fail_threshold: f64,
}

pub async fn run(opts: &Opts) -> Result<()> {
    let source = Arc::new(NodeCommandClient::new(&opts.bin));
    let config = MonitorConfig {
        poll_interval: Duration::from_millis(opts.poll_interval_ms),
        refresh_interval_blocks: opts.refresh_interval,
        valcons_prefix: opts.prefix.clone(),
        stats: StatsConfig {
            fast_threshold_secs: opts.fast_threshold,
            fail_threshold_secs: opts.fail_threshold,
        },
    };

    let mut monitor = BlockMonitor::new(source, config);
    monitor.load_monikers().await;

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log::info!("Received Ctrl-C, initiating shutdown...");
                signal_cancel.cancel();
            }
            Err(e) => log::warn!("Failed to listen for Ctrl+C: {e}"),
        }
    });

    println!("👀 Watching block production via {} (Ctrl-C to stop)", opts.bin);
    monitor.run(cancel).await;

    print!("{}", report::final_summary(monitor.book(), monitor.directory()));
    Ok(())
}
