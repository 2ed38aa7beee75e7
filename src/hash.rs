//! Hash & codec primitives (C1): SHA-256, RIPEMD-160, HASH160/HASH256,
//! Keccak-256, Base58Check with leading-zero preservation, Bech32, and
//! Monero's block-wise Base58.
//!
//! These are pure functions over byte buffers; nothing here reads global
//! state or a protocol record.

use crate::error::{CoinError, CoinResult};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use tiny_keccak::{Hasher, Keccak};

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// `hash160(x) := ripemd160(sha256(x))`
pub fn hash160(data: &[u8]) -> [u8; 20] {
    ripemd160(&sha256(data))
}

/// `hash256(x) := sha256(sha256(x))`
pub fn hash256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

/// `base58_check_encode(x)`: leading zero bytes of `x` become leading `'1'`s;
/// the payload `x ∥ hash256(x)[0..4]` is encoded as an unsigned big-endian
/// base58 integer.
pub fn base58_check_encode(data: &[u8]) -> String {
    let checksum = hash256(data);
    let mut payload = Vec::with_capacity(data.len() + 4);
    payload.extend_from_slice(data);
    payload.extend_from_slice(&checksum[..4]);
    bs58::encode(payload).into_string()
}

/// `base58_check_decode(s)`: reverses `base58_check_encode`, failing with
/// `bad_checksum` if the trailing 4 bytes don't match `hash256` of the body.
pub fn base58_check_decode(s: &str) -> CoinResult<Vec<u8>> {
    let raw = bs58::decode(s)
        .into_vec()
        .map_err(|e| CoinError::parse_error(format!("base58 decode: {e}")))?;
    if raw.len() < 4 {
        return Err(CoinError::bad_checksum("base58 payload shorter than checksum"));
    }
    let (body, checksum) = raw.split_at(raw.len() - 4);
    let expect = hash256(body);
    if &expect[..4] != checksum {
        return Err(CoinError::bad_checksum("base58 checksum mismatch"));
    }
    Ok(body.to_vec())
}

/// BIP-173 Bech32 encode. `data` is raw (pre-regrouping) bytes; this
/// performs the 8→5 bit regrouping and prefixes the witness version.
pub fn bech32_encode(hrp: &str, witness_version: u8, data: &[u8]) -> CoinResult<String> {
    use bech32::{u5, ToBase32, Variant};
    let mut words = vec![u5::try_from_u8(witness_version)
        .map_err(|_| CoinError::bad_witness_version("witness version must be 0-16"))?];
    words.extend(data.to_base32());
    bech32::encode(hrp, words, Variant::Bech32)
        .map_err(|e| CoinError::parse_error(format!("bech32 encode: {e}")))
}

/// BIP-173 Bech32 decode, returning `(witness_version, regrouped_data)`.
pub fn bech32_decode(s: &str) -> CoinResult<(String, u8, Vec<u8>)> {
    use bech32::FromBase32;
    let (hrp, words, _variant) = bech32::decode(s)?;
    let (version_word, data_words) = words
        .split_first()
        .ok_or_else(|| CoinError::parse_error("empty bech32 data"))?;
    let data = Vec::<u8>::from_base32(data_words)
        .map_err(|e| CoinError::parse_error(format!("bech32 regroup: {e}")))?;
    Ok((hrp, version_word.to_u8(), data))
}

const MONERO_BASE58_ALPHABET: &[u8; 58] =
    b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
/// encoded length for a raw block of `i` bytes, `i` in 0..=8.
const MONERO_BLOCK_ENCODED_LENGTH: [usize; 9] = [0, 2, 3, 5, 6, 7, 9, 10, 11];
const MONERO_FULL_BLOCK_SIZE: usize = 8;
const MONERO_FULL_ENCODED_BLOCK_SIZE: usize = 11;

fn monero_alphabet_index(c: u8) -> CoinResult<usize> {
    MONERO_BASE58_ALPHABET
        .iter()
        .position(|&a| a == c)
        .ok_or_else(|| CoinError::parse_error("invalid monero base58 character"))
}

fn encode_monero_block(block: &[u8]) -> String {
    let mut value: u64 = 0;
    for byte in block {
        value = (value << 8) | (*byte as u64);
    }
    let encoded_len = MONERO_BLOCK_ENCODED_LENGTH[block.len()];
    let mut chars = vec![b'1'; encoded_len];
    let mut i = encoded_len;
    while value > 0 && i > 0 {
        i -= 1;
        chars[i] = MONERO_BASE58_ALPHABET[(value % 58) as usize];
        value /= 58;
    }
    String::from_utf8(chars).expect("alphabet is ASCII")
}

fn decode_monero_block(block: &str, raw_len: usize) -> CoinResult<Vec<u8>> {
    if block.len() != MONERO_BLOCK_ENCODED_LENGTH[raw_len] {
        return Err(CoinError::parse_error("monero base58 block has wrong length"));
    }
    let mut value: u128 = 0;
    for c in block.bytes() {
        value = value * 58 + monero_alphabet_index(c)? as u128;
    }
    if value > (u64::MAX as u128) && raw_len < 8 {
        return Err(CoinError::parse_error("monero base58 block overflow"));
    }
    let full = (value as u64).to_be_bytes();
    Ok(full[8 - raw_len..].to_vec())
}

/// Monero's block-wise Base58: groups of 8 raw bytes become 11 ASCII chars;
/// a final partial block of `n` bytes becomes `MONERO_BLOCK_ENCODED_LENGTH[n]`
/// chars. Values are big-endian within each block.
pub fn monero_base58_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() / 8 + 1) * MONERO_FULL_ENCODED_BLOCK_SIZE);
    let mut chunks = data.chunks(MONERO_FULL_BLOCK_SIZE).peekable();
    while let Some(chunk) = chunks.next() {
        out.push_str(&encode_monero_block(chunk));
    }
    out
}

/// Reverses [`monero_base58_encode`].
pub fn monero_base58_decode(s: &str) -> CoinResult<Vec<u8>> {
    let bytes = s.as_bytes();
    let full_blocks = bytes.len() / MONERO_FULL_ENCODED_BLOCK_SIZE;
    let remainder_len = bytes.len() % MONERO_FULL_ENCODED_BLOCK_SIZE;
    let remainder_raw_len = MONERO_BLOCK_ENCODED_LENGTH
        .iter()
        .position(|&l| l == remainder_len)
        .ok_or_else(|| CoinError::parse_error("monero base58 string has invalid length"))?;

    let mut out = Vec::with_capacity(full_blocks * 8 + remainder_raw_len);
    for i in 0..full_blocks {
        let start = i * MONERO_FULL_ENCODED_BLOCK_SIZE;
        let block = std::str::from_utf8(&bytes[start..start + MONERO_FULL_ENCODED_BLOCK_SIZE])
            .map_err(|_| CoinError::parse_error("monero base58 is not ASCII"))?;
        out.extend(decode_monero_block(block, MONERO_FULL_BLOCK_SIZE)?);
    }
    if remainder_len > 0 {
        let start = full_blocks * MONERO_FULL_ENCODED_BLOCK_SIZE;
        let block = std::str::from_utf8(&bytes[start..])
            .map_err(|_| CoinError::parse_error("monero base58 is not ASCII"))?;
        out.extend(decode_monero_block(block, remainder_raw_len)?);
    }
    Ok(out)
}

/// Convert raw bytes to a checksummed (EIP-55) Ethereum address string.
/// Not used by `parse_address` (spec.md §9: lowercase-only is current
/// behavior), but exposed for callers that want to render one.
pub fn to_checksum_address(address: &[u8; 20]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());
    let mut result = String::from("0x");
    for (i, ch) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 { hash[i / 2] >> 4 } else { hash[i / 2] & 0x0f };
        if ch.is_ascii_digit() || nibble < 8 {
            result.push(ch);
        } else {
            result.push(ch.to_ascii_uppercase());
        }
    }
    result
}
