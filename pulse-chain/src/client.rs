//! Chain queries through the node's CLI binary.

use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{ChainError, Result};
use crate::types::{
    parse_staking_monikers, parse_validator_set, proposer_from_block, MonikerRecord, NodeStatus,
    ValidatorSetEntry,
};

/// Everything the monitor asks the chain for.
///
/// The polling loop and the validator directory are written against this
/// trait so they can be driven by an in-memory source in tests.
#[async_trait]
pub trait ChainSource: Send + Sync {
    /// Latest height and block time from the node's sync state.
    async fn status(&self) -> Result<NodeStatus>;

    /// Raw proposer address bytes of the block at `height`.
    async fn block_proposer(&self, height: u64) -> Result<Vec<u8>>;

    /// Validator set as of `height`.
    async fn validator_set(&self, height: u64) -> Result<Vec<ValidatorSetEntry>>;

    /// Staking validator monikers keyed by consensus public key.
    async fn staking_validators(&self) -> Result<Vec<MonikerRecord>>;
}

/// [`ChainSource`] backed by the chain's CLI binary.
///
/// Each query is one subprocess invocation; stdout is parsed as JSON and
/// stderr is discarded. The binary name defaults to `shidod` and is
/// configurable for other chains.
pub struct NodeCommandClient {
    bin: String,
}

impl NodeCommandClient {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    async fn run_json(&self, args: &[&str]) -> Result<Value> {
        let rendered = self.render(args);
        log::debug!("running {rendered}");
        let output = Command::new(&self.bin)
            .args(args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|source| ChainError::Spawn { command: rendered.clone(), source })?;
        if !output.status.success() {
            return Err(ChainError::CommandFailed { command: rendered, status: output.status });
        }
        serde_json::from_slice(&output.stdout)
            .map_err(|source| ChainError::Json { command: rendered, source })
    }

    fn render(&self, args: &[&str]) -> String {
        let mut rendered = self.bin.clone();
        for arg in args {
            rendered.push(' ');
            rendered.push_str(arg);
        }
        rendered
    }
}

#[async_trait]
impl ChainSource for NodeCommandClient {
    async fn status(&self) -> Result<NodeStatus> {
        let reply = self.run_json(&["status"]).await?;
        NodeStatus::from_json(&reply)
    }

    async fn block_proposer(&self, height: u64) -> Result<Vec<u8>> {
        // The CLI defaults to --type=hash; force lookup by height.
        let height = height.to_string();
        let reply = self
            .run_json(&["query", "block", "--type=height", &height, "-o", "json"])
            .await?;
        proposer_from_block(&reply)
    }

    async fn validator_set(&self, height: u64) -> Result<Vec<ValidatorSetEntry>> {
        let height = height.to_string();
        let reply = self
            .run_json(&["query", "tendermint-validator-set", &height, "-o", "json"])
            .await?;
        Ok(parse_validator_set(&reply))
    }

    async fn staking_validators(&self) -> Result<Vec<MonikerRecord>> {
        let reply = self
            .run_json(&["query", "staking", "validators", "-o", "json"])
            .await?;
        Ok(parse_staking_monikers(&reply))
    }
}
