//! Chain boundary error types.

use thiserror::Error;

/// Errors produced while querying the node or decoding its replies.
///
/// The monitor never treats any of these as fatal; the split between
/// fetch and decode failures exists so call sites can decide whether a
/// whole tick is lost or only a single observation's identity.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("failed to run {command:?}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command:?} exited with {status}")]
    CommandFailed {
        command: String,
        status: std::process::ExitStatus,
    },

    #[error("invalid JSON from {command:?}: {source}")]
    Json {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("node reply is missing {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    BlockTime(#[from] pulse_common::BlockTimeError),

    #[error("undecodable proposer address: {0}")]
    ProposerAddress(String),
}

impl ChainError {
    /// True when the query itself failed before yielding JSON; false for
    /// replies we received but could not decode.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, ChainError::Spawn { .. } | ChainError::CommandFailed { .. })
    }
}

pub type Result<T> = std::result::Result<T, ChainError>;
