//! Typed views over the node's JSON replies.
//!
//! The node's CLI output is treated as hostile: every field may be
//! missing, renamed, or wrapped one level deeper depending on the chain
//! build. Parsing is therefore tolerant `serde_json::Value` navigation —
//! a malformed reply degrades a single observation, never the session.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ChainError, Result};

/// Snapshot of the node's sync state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeStatus {
    pub latest_height: u64,
    pub latest_block_time: DateTime<Utc>,
}

impl NodeStatus {
    /// Extract height and block time from a `status` reply.
    pub fn from_json(value: &Value) -> Result<Self> {
        let sync_info = value
            .get("sync_info")
            .ok_or(ChainError::MissingField("sync_info"))?;
        let latest_height = parse_u64(sync_info.get("latest_block_height"))
            .ok_or(ChainError::MissingField("sync_info.latest_block_height"))?;
        let raw_time = sync_info
            .get("latest_block_time")
            .and_then(Value::as_str)
            .ok_or(ChainError::MissingField("sync_info.latest_block_time"))?;
        let latest_block_time = pulse_common::parse_block_time(raw_time)?;
        Ok(Self { latest_height, latest_block_time })
    }
}

/// One member of the validator set at a height.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorSetEntry {
    pub consensus_address: String,
    pub pubkey_b64: String,
    pub voting_power: u64,
}

/// Parse a `tendermint-validator-set` reply. Entries missing either the
/// address or the public key are skipped.
pub fn parse_validator_set(value: &Value) -> Vec<ValidatorSetEntry> {
    let Some(validators) = value.get("validators").and_then(Value::as_array) else {
        return Vec::new();
    };
    validators
        .iter()
        .filter_map(|item| {
            let consensus_address = item.get("address")?.as_str()?.to_string();
            let pubkey_b64 = item.get("pub_key")?.get("key")?.as_str()?.to_string();
            let voting_power = parse_u64(item.get("voting_power")).unwrap_or(0);
            Some(ValidatorSetEntry { consensus_address, pubkey_b64, voting_power })
        })
        .collect()
}

/// A staking validator's display name keyed by its consensus public key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonikerRecord {
    pub pubkey_b64: String,
    pub moniker: String,
}

/// Parse a `staking validators` reply. Entries missing either the
/// moniker or the consensus public key are skipped; whitespace-only
/// monikers count as missing.
pub fn parse_staking_monikers(value: &Value) -> Vec<MonikerRecord> {
    let Some(validators) = value.get("validators").and_then(Value::as_array) else {
        return Vec::new();
    };
    validators
        .iter()
        .filter_map(|item| {
            let moniker = item
                .get("description")?
                .get("moniker")?
                .as_str()?
                .trim()
                .to_string();
            if moniker.is_empty() {
                return None;
            }
            let pubkey_b64 = item
                .get("consensus_pubkey")?
                .get("value")?
                .as_str()?
                .to_string();
            Some(MonikerRecord { pubkey_b64, moniker })
        })
        .collect()
}

/// Locate the block header in a `query block` reply.
///
/// Chain builds disagree on nesting: some return the header at the top
/// level, some under `block`, some under `result.block`.
pub fn extract_header(block: &Value) -> Option<&Value> {
    block
        .get("header")
        .or_else(|| block.get("block").and_then(|b| b.get("header")))
        .or_else(|| {
            block
                .get("result")
                .and_then(|r| r.get("block"))
                .and_then(|b| b.get("header"))
        })
}

/// Pull the raw proposer address bytes out of a `query block` reply.
pub fn proposer_from_block(block: &Value) -> Result<Vec<u8>> {
    let header = extract_header(block).ok_or(ChainError::MissingField("header"))?;
    let encoded = header
        .get("proposer_address")
        .and_then(Value::as_str)
        .ok_or(ChainError::MissingField("header.proposer_address"))?;
    BASE64
        .decode(encoded)
        .map_err(|e| ChainError::ProposerAddress(format!("{encoded:?}: {e}")))
}

/// Accept a JSON number or a numeric string; chain CLIs emit both.
fn parse_u64(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_parses_string_height_and_timestamp() {
        let reply = json!({
            "sync_info": {
                "latest_block_height": "12345",
                "latest_block_time": "2025-01-01T00:00:00.123456789Z"
            }
        });
        let status = NodeStatus::from_json(&reply).unwrap();
        assert_eq!(status.latest_height, 12345);
        assert_eq!(status.latest_block_time.timestamp(), 1735689600);
    }

    #[test]
    fn status_accepts_numeric_height() {
        let reply = json!({
            "sync_info": {
                "latest_block_height": 77,
                "latest_block_time": "2025-01-01T00:00:00Z"
            }
        });
        assert_eq!(NodeStatus::from_json(&reply).unwrap().latest_height, 77);
    }

    #[test]
    fn status_without_sync_info_is_a_decode_failure() {
        let err = NodeStatus::from_json(&json!({})).unwrap_err();
        assert!(!err.is_fetch_failure());
    }

    #[test]
    fn header_is_found_at_all_known_nestings() {
        let header = json!({"proposer_address": "aGVsbG8="});
        for wrapped in [
            json!({"header": header}),
            json!({"block": {"header": header}}),
            json!({"result": {"block": {"header": header}}}),
        ] {
            assert!(extract_header(&wrapped).is_some());
        }
        assert!(extract_header(&json!({"other": 1})).is_none());
    }

    #[test]
    fn proposer_bytes_decode_from_base64() {
        let raw: Vec<u8> = (0u8..20).collect();
        let block = json!({
            "block": {"header": {"proposer_address": BASE64.encode(&raw)}}
        });
        assert_eq!(proposer_from_block(&block).unwrap(), raw);
    }

    #[test]
    fn malformed_proposer_is_an_error_not_a_panic() {
        let block = json!({"header": {"proposer_address": "!!not-base64!!"}});
        assert!(proposer_from_block(&block).is_err());
        assert!(proposer_from_block(&json!({"header": {}})).is_err());
    }

    #[test]
    fn validator_set_skips_incomplete_entries() {
        let reply = json!({
            "validators": [
                {"address": "valconsA", "pub_key": {"key": "pkA"}, "voting_power": "100"},
                {"address": "valconsB", "pub_key": {}, "voting_power": "50"},
                {"pub_key": {"key": "pkC"}, "voting_power": 10},
                {"address": "valconsD", "pub_key": {"key": "pkD"}, "voting_power": 25}
            ]
        });
        let entries = parse_validator_set(&reply);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].consensus_address, "valconsA");
        assert_eq!(entries[0].voting_power, 100);
        assert_eq!(entries[1].consensus_address, "valconsD");
        assert_eq!(entries[1].voting_power, 25);
    }

    #[test]
    fn staking_monikers_skip_blank_names() {
        let reply = json!({
            "validators": [
                {"description": {"moniker": "  "}, "consensus_pubkey": {"value": "pkA"}},
                {"description": {"moniker": "good one"}, "consensus_pubkey": {"value": "pkB"}},
                {"description": {"moniker": "orphan"}}
            ]
        });
        let records = parse_staking_monikers(&reply);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].moniker, "good one");
        assert_eq!(records[0].pubkey_b64, "pkB");
    }
}
