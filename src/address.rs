//! Address pipeline (C5): public-key-hash → address across three families
//! (Base58Check, Bech32/SegWit, hex/Keccak), and address → parsed form.

use crate::error::{CoinError, CoinResult};
use crate::hash::{bech32_decode, bech32_encode, hash160, keccak256, monero_base58_decode, monero_base58_encode};
use crate::registry::{AddressFormat, CoinFamily, ProtocolRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAddress {
    pub body: Vec<u8>,
    pub format: AddressFormat,
}

/// `pubhash_to_address(pubkey_hash, is_p2sh)`.
///
/// Ethereum returns the lowercased hex hash directly, with no version
/// prefix and no checksum (spec.md §9 open question: EIP-55 is a deliberate
/// extension, not default behavior). Zcash shielded addresses (64-byte
/// body) can't be derived from a pubkey hash.
pub fn pubhash_to_address(
    pubkey_hash: &[u8],
    is_p2sh: bool,
    family: CoinFamily,
    record: &ProtocolRecord,
) -> CoinResult<String> {
    if family == CoinFamily::Ethereum || family == CoinFamily::EthereumClassic {
        if is_p2sh {
            return Err(CoinError::invalid_input("Ethereum has no P2SH address format"));
        }
        if pubkey_hash.len() != 20 {
            return Err(CoinError::bad_address_length(format!(
                "{}: invalid length for pubkey hash",
                pubkey_hash.len()
            )));
        }
        return Ok(hex::encode(pubkey_hash));
    }

    if pubkey_hash.len() != 20 {
        return Err(CoinError::bad_address_length(format!(
            "{}: invalid length for pubkey hash",
            pubkey_hash.len()
        )));
    }

    let format = if is_p2sh { AddressFormat::P2sh } else { AddressFormat::P2pkh };
    let prefix = record
        .addr_version_for(format)
        .ok_or_else(|| CoinError::unknown_address_format("coin declares no version byte for this format"))?;
    let mut payload = Vec::with_capacity(prefix.len() + 20);
    payload.extend_from_slice(prefix);
    payload.extend_from_slice(pubkey_hash);
    Ok(crate::hash::base58_check_encode(&payload))
}

/// `00 14 ∥ hash160(pubkey)` — the always-22-byte P2SH redeem script for
/// SegWit-via-P2SH.
pub fn pubkey_to_redeem_script(pubkey: &[u8]) -> Vec<u8> {
    let mut script = Vec::with_capacity(22);
    script.push(0x00);
    script.push(0x14);
    script.extend_from_slice(&hash160(pubkey));
    script
}

pub fn pubkey_to_segwit_p2sh_address(
    pubkey: &[u8],
    family: CoinFamily,
    record: &ProtocolRecord,
) -> CoinResult<String> {
    let redeem_script = pubkey_to_redeem_script(pubkey);
    pubhash_to_address(&hash160(&redeem_script), true, family, record)
}

/// BIP-173 encode with the record's HRP and witness version 0.
pub fn pubhash_to_bech32_address(pubhash: &[u8], record: &ProtocolRecord) -> CoinResult<String> {
    let hrp = record
        .bech32_hrp
        .as_deref()
        .ok_or_else(|| CoinError::unknown_address_format("coin has no bech32 HRP"))?;
    bech32_encode(hrp, 0, pubhash)
}

/// `parse_address(str) -> parsed_addr | invalid`, dispatched in the order
/// spec.md §4.5 specifies: bech32, then Ethereum-hex, then Monero, then
/// Base58Check version-prefix matching.
pub fn parse_address(s: &str, family: CoinFamily, record: &ProtocolRecord) -> CoinResult<ParsedAddress> {
    if let Some(hrp) = &record.bech32_hrp {
        if s.starts_with(hrp.as_str()) {
            let (_hrp, version, data) = bech32_decode(s)?;
            if version != 0 {
                return Err(CoinError::bad_witness_version(format!(
                    "expected witness version 0, got {version}"
                )));
            }
            return Ok(ParsedAddress { body: data, format: AddressFormat::Bech32 });
        }
    }

    if family == CoinFamily::Ethereum || family == CoinFamily::EthereumClassic {
        if s.len() == 40 && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)) {
            let body = hex::decode(s)?;
            return Ok(ParsedAddress { body, format: AddressFormat::Ethereum });
        }
        return Err(CoinError::unknown_address_format("invalid lowercase-hex Ethereum address"));
    }

    if family == CoinFamily::Monero {
        return parse_monero_address(s, record);
    }

    let decoded = crate::hash::base58_check_decode(s)?;
    for entry in &record.address_version_map {
        if let Some(body) = decoded.strip_prefix(entry.prefix.as_slice()) {
            if body.len() == entry.format.body_length() {
                return Ok(ParsedAddress { body: body.to_vec(), format: entry.format });
            }
        }
    }
    Err(CoinError::unknown_address_format(format!("{s}: no matching version prefix")))
}

fn parse_monero_address(s: &str, record: &ProtocolRecord) -> CoinResult<ParsedAddress> {
    let decoded = monero_base58_decode(s)?;
    if decoded.len() < 4 {
        return Err(CoinError::bad_checksum("monero address too short for checksum"));
    }
    let (body_with_prefix, checksum) = decoded.split_at(decoded.len() - 4);
    let expect = keccak256(body_with_prefix);
    if &expect[..4] != checksum {
        return Err(CoinError::bad_checksum(format!(
            "{}: incorrect checksum",
            hex::encode(checksum)
        )));
    }
    for entry in &record.address_version_map {
        if let Some(body) = body_with_prefix.strip_prefix(entry.prefix.as_slice()) {
            if body.len() == entry.format.body_length() {
                return Ok(ParsedAddress { body: body.to_vec(), format: entry.format });
            }
        }
    }
    Err(CoinError::unknown_address_format("no matching monero version prefix"))
}

/// Renders a Monero address from a version prefix and a 64-byte body
/// (public spend key || public view key), for symmetry with
/// [`parse_monero_address`]. Not named directly in spec.md §4.5's
/// operation list, but needed to exercise round-trips (§8 item 3's
/// Monero analogue).
pub fn monero_body_to_address(body: &[u8], format: AddressFormat, record: &ProtocolRecord) -> CoinResult<String> {
    let prefix = record
        .addr_version_for(format)
        .ok_or_else(|| CoinError::unknown_address_format("no version byte for monero format"))?;
    let mut payload = Vec::with_capacity(prefix.len() + body.len() + 4);
    payload.extend_from_slice(prefix);
    payload.extend_from_slice(body);
    let checksum = keccak256(&payload);
    payload.extend_from_slice(&checksum[..4]);
    Ok(monero_base58_encode(&payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Network;
    use crate::registry::Registry;

    fn btc_mainnet() -> ProtocolRecord {
        Registry::new().get("btc", Network::Mainnet).unwrap()
    }

    #[test]
    fn s2_zero_pubhash_address() {
        let rec = btc_mainnet();
        let addr = pubhash_to_address(&[0u8; 20], false, CoinFamily::Bitcoin, &rec).unwrap();
        assert_eq!(addr, "1111111111111111111114oLvT2");
    }

    #[test]
    fn p2pkh_round_trip() {
        let rec = btc_mainnet();
        let hash = [7u8; 20];
        let addr = pubhash_to_address(&hash, false, CoinFamily::Bitcoin, &rec).unwrap();
        let parsed = parse_address(&addr, CoinFamily::Bitcoin, &rec).unwrap();
        assert_eq!(parsed.body, hash);
        assert_eq!(parsed.format, AddressFormat::P2pkh);
    }

    #[test]
    fn bech32_round_trip() {
        let rec = btc_mainnet();
        let hash = [3u8; 20];
        let addr = pubhash_to_bech32_address(&hash, &rec).unwrap();
        let parsed = parse_address(&addr, CoinFamily::Bitcoin, &rec).unwrap();
        assert_eq!(parsed.body, hash);
        assert_eq!(parsed.format, AddressFormat::Bech32);
    }

    #[test]
    fn s3_litecoin_legacy_p2sh_resolves() {
        let rec = Registry::new().get("ltc", Network::Mainnet).unwrap();
        let hash = [9u8; 20];
        // Force the legacy 0x05 prefix directly, simulating an address that
        // predates the 0x32 migration.
        let mut payload = vec![0x05];
        payload.extend_from_slice(&hash);
        let addr = crate::hash::base58_check_encode(&payload);
        let parsed = parse_address(&addr, CoinFamily::Litecoin, &rec).unwrap();
        assert_eq!(parsed.format, AddressFormat::P2sh);
        assert_eq!(parsed.body, hash);
    }

    #[test]
    fn ethereum_address_is_raw_lowercase_hex() {
        let rec = Registry::new().get("eth", Network::Mainnet).unwrap();
        let hash = [0xabu8; 20];
        let addr = pubhash_to_address(&hash, false, CoinFamily::Ethereum, &rec).unwrap();
        assert_eq!(addr, "ab".repeat(20));
        let parsed = parse_address(&addr, CoinFamily::Ethereum, &rec).unwrap();
        assert_eq!(parsed.body, hash);
    }

    #[test]
    fn ethereum_rejects_uppercase_hex() {
        let rec = Registry::new().get("eth", Network::Mainnet).unwrap();
        let mixed_case = "AB".repeat(20);
        assert!(parse_address(&mixed_case, CoinFamily::Ethereum, &rec).is_err());
    }

    #[test]
    fn mixed_network_rejection() {
        let mainnet = btc_mainnet();
        let testnet = Registry::new().get("btc", Network::Testnet).unwrap();
        let addr = pubhash_to_address(&[1u8; 20], false, CoinFamily::Bitcoin, &mainnet).unwrap();
        let err = parse_address(&addr, CoinFamily::Bitcoin, &testnet).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::UnknownAddressFormat);
    }

    #[test]
    fn monero_address_round_trip() {
        let rec = Registry::new().get("xmr", Network::Mainnet).unwrap();
        let body = [5u8; 64];
        let addr = monero_body_to_address(&body, AddressFormat::Monero, &rec).unwrap();
        let parsed = parse_monero_address(&addr, &rec).unwrap();
        assert_eq!(parsed.body, body);
        assert_eq!(parsed.format, AddressFormat::Monero);
    }
}
