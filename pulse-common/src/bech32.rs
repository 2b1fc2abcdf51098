//! Bech32 encoding of validator consensus addresses.
//!
//! Tendermint-style chains identify a block proposer by a 20-byte
//! public-key hash; everywhere humans see it, that hash is rendered as a
//! checksummed base-32 string under a chain-specific prefix (BIP-0173
//! bech32). The encoding here must match the chain's own rendering bit
//! for bit — a divergent checksum silently attributes blocks to a
//! validator that does not exist.

use thiserror::Error;

/// Raw length of a consensus address.
pub const CONSENSUS_ADDRESS_LEN: usize = 20;

/// Separator between the human-readable prefix and the data part.
const SEPARATOR: char = '1';

const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

const GENERATOR: [u32; 5] = [0x3b6a_57b2, 0x2650_8e6d, 0x1ea1_19fa, 0x3d42_33dd, 0x2a14_62b3];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("consensus address must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid bech32 character {0:?}")]
    InvalidCharacter(char),

    #[error("missing bech32 separator")]
    MissingSeparator,

    #[error("bech32 checksum mismatch")]
    ChecksumMismatch,

    #[error("invalid bech32 padding")]
    InvalidPadding,
}

fn polymod(values: &[u8]) -> u32 {
    let mut chk: u32 = 1;
    for &value in values {
        let top = (chk >> 25) as u8;
        chk = ((chk & 0x01ff_ffff) << 5) ^ u32::from(value);
        for (i, generator) in GENERATOR.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                chk ^= generator;
            }
        }
    }
    chk
}

fn hrp_expand(hrp: &str) -> Vec<u8> {
    let mut expanded = Vec::with_capacity(hrp.len() * 2 + 1);
    for byte in hrp.bytes() {
        expanded.push(byte >> 5);
    }
    expanded.push(0);
    for byte in hrp.bytes() {
        expanded.push(byte & 31);
    }
    expanded
}

fn create_checksum(hrp: &str, data: &[u8]) -> [u8; 6] {
    let mut values = hrp_expand(hrp);
    values.extend_from_slice(data);
    values.extend_from_slice(&[0u8; 6]);
    let residue = polymod(&values) ^ 1;
    let mut checksum = [0u8; 6];
    for (i, slot) in checksum.iter_mut().enumerate() {
        *slot = ((residue >> (5 * (5 - i))) & 31) as u8;
    }
    checksum
}

/// Regroup `data` from `from_bits`-wide groups into `to_bits`-wide groups.
///
/// When `pad` is set, a trailing partial group is left-padded with zero
/// bits; when it is not, leftover bits must be zero and too-short to form
/// a group, or the input is rejected. Returns `None` on any out-of-range
/// input value or bad padding.
fn convert_bits(data: &[u8], from_bits: u32, to_bits: u32, pad: bool) -> Option<Vec<u8>> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let maxv: u32 = (1 << to_bits) - 1;
    let mut ret = Vec::with_capacity(data.len() * from_bits as usize / to_bits as usize + 1);
    for &value in data {
        let value = u32::from(value);
        if value >> from_bits != 0 {
            return None;
        }
        acc = (acc << from_bits) | value;
        bits += from_bits;
        while bits >= to_bits {
            bits -= to_bits;
            ret.push(((acc >> bits) & maxv) as u8);
        }
    }
    if pad {
        if bits > 0 {
            ret.push(((acc << (to_bits - bits)) & maxv) as u8);
        }
    } else if bits >= from_bits || ((acc << (to_bits - bits)) & maxv) != 0 {
        return None;
    }
    Some(ret)
}

/// Encode a raw 20-byte consensus address under the given prefix.
///
/// Deterministic and pure. Anything other than exactly 20 bytes is
/// rejected; callers are expected to fall back to an "unknown" label
/// rather than treat that as fatal.
pub fn encode_consensus_address(hrp: &str, raw: &[u8]) -> Result<String, AddressError> {
    if raw.len() != CONSENSUS_ADDRESS_LEN {
        return Err(AddressError::InvalidLength {
            expected: CONSENSUS_ADDRESS_LEN,
            actual: raw.len(),
        });
    }
    let data = convert_bits(raw, 8, 5, true).ok_or(AddressError::InvalidPadding)?;
    Ok(encode(hrp, &data))
}

fn encode(hrp: &str, data: &[u8]) -> String {
    let checksum = create_checksum(hrp, data);
    let mut out = String::with_capacity(hrp.len() + 1 + data.len() + 6);
    out.push_str(hrp);
    out.push(SEPARATOR);
    for &d in data.iter().chain(checksum.iter()) {
        out.push(CHARSET[d as usize] as char);
    }
    out
}

/// Decode a bech32 string back into its prefix and raw payload bytes,
/// verifying the checksum. The monitor itself only encodes; decoding
/// exists for tests and ad-hoc tooling.
pub fn decode(encoded: &str) -> Result<(String, Vec<u8>), AddressError> {
    let separator = encoded.rfind(SEPARATOR).ok_or(AddressError::MissingSeparator)?;
    let (hrp, data_part) = encoded.split_at(separator);
    let data_part = &data_part[1..];
    if hrp.is_empty() || data_part.len() < 6 {
        return Err(AddressError::MissingSeparator);
    }

    let mut data = Vec::with_capacity(data_part.len());
    for ch in data_part.chars() {
        let position = CHARSET
            .iter()
            .position(|&c| c as char == ch)
            .ok_or(AddressError::InvalidCharacter(ch))?;
        data.push(position as u8);
    }

    let mut values = hrp_expand(hrp);
    values.extend_from_slice(&data);
    if polymod(&values) != 1 {
        return Err(AddressError::ChecksumMismatch);
    }

    let payload = convert_bits(&data[..data.len() - 6], 5, 8, false)
        .ok_or(AddressError::InvalidPadding)?;
    Ok((hrp.to_string(), payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn known_valid_strings_pass_checksum_verification() {
        // Reference vectors from the bech32 specification.
        for valid in [
            "a12uel5l",
            "abcdef1qpzry9x8gf2tvdw0s3jn54khce6mua7lmqqqxw",
            "split1checkupstagehandshakeupstreamerranterredcaperred2y9e3w",
        ] {
            assert!(decode(valid).is_ok(), "expected {valid} to verify");
        }
    }

    #[test]
    fn corrupting_one_character_breaks_the_checksum() {
        let encoded = encode_consensus_address("testvalcons", &[0x5a; 20]).unwrap();
        let mut corrupted = encoded.clone().into_bytes();
        let last = corrupted.len() - 1;
        corrupted[last] = if corrupted[last] == b'q' { b'p' } else { b'q' };
        let corrupted = String::from_utf8(corrupted).unwrap();
        assert_eq!(decode(&corrupted), Err(AddressError::ChecksumMismatch));
    }

    #[test]
    fn encode_is_deterministic_and_round_trips() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..64 {
            let mut raw = [0u8; 20];
            rng.fill(&mut raw);
            let first = encode_consensus_address("testvalcons", &raw).unwrap();
            let second = encode_consensus_address("testvalcons", &raw).unwrap();
            assert_eq!(first, second);

            let (hrp, payload) = decode(&first).unwrap();
            assert_eq!(hrp, "testvalcons");
            assert_eq!(payload, raw);
        }
    }

    #[test]
    fn encoded_length_is_fixed_for_20_byte_input() {
        // 20 bytes regroup into 32 five-bit groups, plus 6 checksum chars.
        let encoded = encode_consensus_address("testvalcons", &[0u8; 20]).unwrap();
        assert_eq!(encoded.len(), "testvalcons".len() + 1 + 32 + 6);
    }

    #[test]
    fn rejects_wrong_length_input() {
        assert_eq!(
            encode_consensus_address("testvalcons", &[0u8; 19]),
            Err(AddressError::InvalidLength { expected: 20, actual: 19 })
        );
        assert_eq!(
            encode_consensus_address("testvalcons", &[0u8; 32]),
            Err(AddressError::InvalidLength { expected: 20, actual: 32 })
        );
        assert_eq!(
            encode_consensus_address("testvalcons", &[]),
            Err(AddressError::InvalidLength { expected: 20, actual: 0 })
        );
    }

    #[test]
    fn partial_final_group_is_left_padded_with_zero_bits() {
        // 20 bytes = 160 bits = exactly 32 groups, so the padding branch
        // only fires for non-address lengths; exercise it directly.
        let groups = convert_bits(&[0xff], 8, 5, true).unwrap();
        assert_eq!(groups, vec![0b11111, 0b11100]);
    }

    #[test]
    fn strict_regroup_rejects_nonzero_padding() {
        // 0b00001 carries a nonzero bit into the discarded padding.
        assert_eq!(convert_bits(&[31, 1], 5, 8, false), None);
        assert!(convert_bits(&[31, 0], 5, 8, false).is_some());
    }
}
