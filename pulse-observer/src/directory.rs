//! Validator identity resolution.
//!
//! Two lookups turn a consensus address into a display label: the
//! validator set at a recent height (address → public key, refreshed on
//! a block cadence) and the staking validator descriptors (public key →
//! moniker, loaded once at startup). Both are best-effort; when either
//! is unavailable the label degrades to the bare address and the
//! session keeps running.

use std::collections::HashMap;

use pulse_chain::{ChainSource, ValidatorSetEntry};

/// Label used when a proposer address could not be computed at all.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Address-indexed snapshot of the validator set plus the read-mostly
/// moniker index.
///
/// The snapshot is replaced wholesale on every successful refresh —
/// stale entries are discarded, never merged — so readers always see
/// one consistent validator set.
pub struct ValidatorDirectory {
    entries: HashMap<String, ValidatorSetEntry>,
    monikers: HashMap<String, String>,
    last_refresh_height: Option<u64>,
    refresh_interval: u64,
}

impl ValidatorDirectory {
    pub fn new(refresh_interval: u64) -> Self {
        Self {
            entries: HashMap::new(),
            monikers: HashMap::new(),
            last_refresh_height: None,
            refresh_interval,
        }
    }

    /// Build the pubkey → moniker index from the staking snapshot.
    ///
    /// First occurrence wins on duplicate keys. On failure the index
    /// stays empty and labels fall back to bare consensus addresses for
    /// the whole session.
    pub async fn load_monikers(&mut self, source: &dyn ChainSource) {
        match source.staking_validators().await {
            Ok(records) => {
                let mut index = HashMap::with_capacity(records.len());
                for record in records {
                    index.entry(record.pubkey_b64).or_insert(record.moniker);
                }
                log::info!("loaded {} validator monikers", index.len());
                self.monikers = index;
            }
            Err(e) => {
                log::warn!("staking validators unavailable, labels degrade to addresses: {e}");
            }
        }
    }

    /// True when the validator set has never been fetched or has aged
    /// past the refresh interval.
    pub fn needs_refresh(&self, height: u64) -> bool {
        match self.last_refresh_height {
            None => true,
            Some(last) => height.saturating_sub(last) >= self.refresh_interval,
        }
    }

    /// Fetch the validator set at `height` and swap the snapshot in.
    ///
    /// A failed fetch keeps the previous snapshot (stale but available)
    /// and leaves the refresh height untouched so the next tick retries.
    pub async fn refresh(&mut self, source: &dyn ChainSource, height: u64) {
        match source.validator_set(height).await {
            Ok(validators) => {
                let table: HashMap<String, ValidatorSetEntry> = validators
                    .into_iter()
                    .map(|entry| (entry.consensus_address.clone(), entry))
                    .collect();
                log::debug!("validator set refreshed at height {height}: {} entries", table.len());
                self.entries = table;
                self.last_refresh_height = Some(height);
            }
            Err(e) => {
                log::warn!("validator set refresh at height {height} failed: {e}");
            }
        }
    }

    /// Resolve a consensus address to `"<moniker> (<address>)"`, the
    /// bare address when the moniker is unknown, or the unknown label
    /// verbatim when the address itself could not be computed.
    pub fn resolve_label(&self, consensus_address: &str) -> String {
        if consensus_address == UNKNOWN_LABEL {
            return UNKNOWN_LABEL.to_string();
        }
        let moniker = self
            .entries
            .get(consensus_address)
            .and_then(|entry| self.monikers.get(&entry.pubkey_b64));
        match moniker {
            Some(moniker) => format!("{moniker} ({consensus_address})"),
            None => consensus_address.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_refresh_height(&self) -> Option<u64> {
        self.last_refresh_height
    }
}
