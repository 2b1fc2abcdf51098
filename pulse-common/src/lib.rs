//! Shared utilities for blockpulse.
//!
//! This crate holds the pure, I/O-free pieces the monitor depends on:
//! the bech32 consensus-address codec and block-timestamp parsing.

pub mod bech32;
pub mod block_time;

pub use bech32::{encode_consensus_address, AddressError, CONSENSUS_ADDRESS_LEN};
pub use block_time::{parse_block_time, BlockTimeError};
