//! The polling loop that drives everything else.
//!
//! The monitor samples the node's status on a fixed interval, turns
//! height advances into evenly amortized per-block durations, attributes
//! each newly observed height to its proposer, and records the result in
//! the cadence book. It is written to run unattended indefinitely
//! against a flaky node: every external call is checked at its own call
//! site and failure never escapes the tick that hit it.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use pulse_chain::{ChainSource, NodeStatus};
use pulse_common::encode_consensus_address;

use crate::directory::{ValidatorDirectory, UNKNOWN_LABEL};
use crate::report;
use crate::stats::{CadenceBook, StatsConfig};

/// Monitor tuning knobs.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Interval between status polls.
    pub poll_interval: Duration,
    /// Blocks between validator-set refreshes.
    pub refresh_interval_blocks: u64,
    /// Bech32 prefix for consensus addresses.
    pub valcons_prefix: String,
    pub stats: StatsConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(400),
            refresh_interval_blocks: 200,
            valcons_prefix: "shidovalcons".to_string(),
            stats: StatsConfig::default(),
        }
    }
}

/// One newly observed block.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub height: u64,
    pub wall_time: DateTime<Utc>,
    pub per_block_secs: f64,
    /// Consensus address of the proposer, or the unknown label.
    pub proposer_key: String,
}

/// Last fully processed (height, block time) pair.
#[derive(Debug, Clone, Copy)]
struct LastObserved {
    height: u64,
    time: DateTime<Utc>,
}

pub struct BlockMonitor {
    source: Arc<dyn ChainSource>,
    config: MonitorConfig,
    book: CadenceBook,
    directory: ValidatorDirectory,
    last: Option<LastObserved>,
}

impl BlockMonitor {
    pub fn new(source: Arc<dyn ChainSource>, config: MonitorConfig) -> Self {
        let book = CadenceBook::new(config.stats);
        let directory = ValidatorDirectory::new(config.refresh_interval_blocks);
        Self { source, config, book, directory, last: None }
    }

    /// Build the moniker index once before polling starts. Best-effort.
    pub async fn load_monikers(&mut self) {
        self.directory.load_monikers(self.source.as_ref()).await;
    }

    /// Poll until cancelled, printing one live line per observation.
    pub async fn run(&mut self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    log::info!("cancellation received, monitor stopping");
                    break;
                }
                _ = ticker.tick() => {
                    for observation in self.tick().await {
                        println!("{}", report::live_line(&observation, &self.book, &self.directory));
                    }
                }
            }
        }
    }

    async fn tick(&mut self) -> Vec<Observation> {
        match self.source.status().await {
            Ok(status) => self.handle_status(status).await,
            Err(e) => {
                // Retried at the next tick, same interval, no backoff.
                log::debug!("status fetch failed: {e}");
                Vec::new()
            }
        }
    }

    /// Process one status sample. Split out from the timer so the
    /// polling semantics are testable against a scripted chain.
    pub async fn handle_status(&mut self, status: NodeStatus) -> Vec<Observation> {
        let Some(last) = self.last else {
            log::info!("baseline at height {}", status.latest_height);
            self.directory.refresh(self.source.as_ref(), status.latest_height).await;
            self.last = Some(LastObserved {
                height: status.latest_height,
                time: status.latest_block_time,
            });
            return Vec::new();
        };

        // Refresh check runs once per tick against the tick's resulting
        // height, whatever the tick ends up producing.
        if self.directory.needs_refresh(status.latest_height) {
            self.directory.refresh(self.source.as_ref(), status.latest_height).await;
        }

        if status.latest_height <= last.height {
            return Vec::new();
        }

        let blocks_advanced = status.latest_height - last.height;
        let elapsed_secs = (status.latest_block_time - last.time)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);

        let mut observations = Vec::new();
        if elapsed_secs > 0.0 {
            let per_block_secs = elapsed_secs / blocks_advanced as f64;

            // Height gaps happen when polling is slower than block
            // production; every intervening height gets the same
            // amortized duration and its own proposer lookup.
            for offset in 1..=blocks_advanced {
                let height = last.height + offset;
                let proposer_key = self.resolve_proposer(height).await;
                self.book.record(&proposer_key, per_block_secs);
                observations.push(Observation {
                    height,
                    wall_time: status.latest_block_time,
                    per_block_secs,
                    proposer_key,
                });
            }
        } else {
            // Clock anomaly: advance bookkeeping so the anomaly cannot
            // wedge the monitor, but record nothing.
            log::warn!(
                "non-positive elapsed time across heights {}..{}, dropping advance",
                last.height,
                status.latest_height
            );
        }

        self.last = Some(LastObserved {
            height: status.latest_height,
            time: status.latest_block_time,
        });
        observations
    }

    /// Fetch a block's proposer and encode its consensus address.
    /// Identity failures degrade to the unknown label; the caller still
    /// records the duration under that scope.
    async fn resolve_proposer(&self, height: u64) -> String {
        let raw = match self.source.block_proposer(height).await {
            Ok(raw) => raw,
            Err(e) => {
                log::debug!("block {height}: proposer unavailable: {e}");
                return UNKNOWN_LABEL.to_string();
            }
        };
        match encode_consensus_address(&self.config.valcons_prefix, &raw) {
            Ok(address) => address,
            Err(e) => {
                log::debug!("block {height}: {e}");
                UNKNOWN_LABEL.to_string()
            }
        }
    }

    pub fn book(&self) -> &CadenceBook {
        &self.book
    }

    pub fn directory(&self) -> &ValidatorDirectory {
        &self.directory
    }
}
