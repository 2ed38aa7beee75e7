//! Key pipeline (C4): scalar canonicalization, secret-export (WIF) encoding,
//! compressed-key flag handling.
//!
//! Every function takes the protocol record explicitly (no global "active
//! protocol" state, per spec.md §9) and zeroizes intermediate secret buffers
//! (teacher's `wallet/keygen.rs` zeroize pattern) before they go out of
//! scope.

use crate::error::{CoinError, CoinResult, ErrorKind};
use crate::hash::base58_check_encode;
use crate::registry::{CoinFamily, KeyVariant, ProtocolRecord};
use zeroize::Zeroizing;

pub struct ParsedWif {
    pub scalar: Zeroizing<[u8; 32]>,
    pub variant: KeyVariant,
    pub compressed: bool,
}

/// Big-endian 256-bit comparison: `a >= b`.
fn be_ge(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a >= b
}

/// `a - b` for 256-bit big-endian integers, assuming `a >= b`.
fn be_sub(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut borrow: i16 = 0;
    for i in (0..32).rev() {
        let diff = a[i] as i16 - b[i] as i16 - borrow;
        if diff < 0 {
            out[i] = (diff + 256) as u8;
            borrow = 1;
        } else {
            out[i] = diff as u8;
            borrow = 0;
        }
    }
    out
}

fn is_zero(a: &[u8; 32]) -> bool {
    a.iter().all(|&b| b == 0)
}

/// `canonicalize(s, variant)` per spec.md §4.4.
///
/// Bitcoin-family coins (including Ethereum/EthereumClassic, which inherit
/// the same curve-order precondition in the original source) reduce a
/// secret greater than the curve order by a single subtraction — any
/// 32-byte integer is strictly less than `2 * curve_order`, since
/// `curve_order` is within `2^129` of `2^256`, so one subtraction always
/// suffices. Zero or exactly the curve order are fatal.
pub fn canonicalize(
    secret: &[u8; 32],
    family: CoinFamily,
    variant: KeyVariant,
    record: &ProtocolRecord,
) -> CoinResult<Zeroizing<[u8; 32]>> {
    match (family, variant) {
        (_, KeyVariant::ZcashZ) => {
            // Clear the top 4 bits of the first byte; no curve-order check.
            let mut out = *secret;
            out[0] &= 0x0f;
            Ok(Zeroizing::new(out))
        }
        (CoinFamily::Monero, _) => Ok(Zeroizing::new(reduce_mod_ed25519_order(secret))),
        _ => {
            let order = record
                .secp256k1_curve_order
                .ok_or_else(|| CoinError::internal("missing curve order for bitcoin-family coin"))?;
            if is_zero(secret) {
                return Err(CoinError::private_key_zero());
            }
            if secret == &order {
                return Err(CoinError::private_key_equal_order());
            }
            if be_ge(secret, &order) {
                Ok(Zeroizing::new(be_sub(secret, &order)))
            } else {
                Ok(Zeroizing::new(*secret))
            }
        }
    }
}

fn reduce_mod_ed25519_order(secret_le: &[u8; 32]) -> [u8; 32] {
    use curve25519_dalek::scalar::Scalar;
    Scalar::from_bytes_mod_order(*secret_le).to_bytes()
}

fn is_dummy_wif_family(family: CoinFamily) -> bool {
    matches!(family, CoinFamily::Ethereum | CoinFamily::EthereumClassic | CoinFamily::Monero)
}

/// `encode_secret(s, variant, compressed)`.
///
/// Ethereum/EthereumClassic/Monero are "dummy WIF" families (spec.md §2):
/// the export is the raw hex of the canonicalized scalar, `compressed` must
/// be false, and `variant` must be the coin's one declared variant.
pub fn encode_secret(
    secret: &[u8; 32],
    family: CoinFamily,
    variant: KeyVariant,
    compressed: bool,
    record: &ProtocolRecord,
) -> CoinResult<String> {
    if is_dummy_wif_family(family) {
        let expected = if family == CoinFamily::Monero { KeyVariant::Monero } else { KeyVariant::Std };
        if variant != expected {
            return Err(CoinError::bad_wif("invalid pubkey_type for dummy-WIF coin"));
        }
        if compressed {
            return Err(CoinError::bad_wif("dummy-WIF coin does not support compressed pubkeys"));
        }
        return Ok(hex::encode(secret));
    }

    let prefix = record
        .secret_version_for(variant)
        .ok_or_else(|| CoinError::bad_wif("no secret version byte declared for this variant"))?
        .to_vec();
    let mut payload = Zeroizing::new(Vec::with_capacity(prefix.len() + 33));
    payload.extend_from_slice(&prefix);
    payload.extend_from_slice(secret);
    if compressed {
        payload.push(0x01);
    }
    Ok(base58_check_encode(&payload))
}

/// `decode_secret(str)`. Strips the longest matching declared prefix
/// (recovering the variant), then requires the remaining body to be
/// exactly `secret_length` (uncompressed) or `secret_length + 1` bytes with
/// a trailing `0x01` (compressed); otherwise fails with `bad_wif`.
pub fn decode_secret(s: &str, family: CoinFamily, record: &ProtocolRecord) -> CoinResult<ParsedWif> {
    if is_dummy_wif_family(family) {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(CoinError::bad_wif("dummy-WIF body must be 32 bytes"));
        }
        let mut scalar = [0u8; 32];
        scalar.copy_from_slice(&bytes);
        let variant = if family == CoinFamily::Monero { KeyVariant::Monero } else { KeyVariant::Std };
        return Ok(ParsedWif { scalar: Zeroizing::new(scalar), variant, compressed: false });
    }

    let raw = crate::hash::base58_check_decode(s)?;

    let mut candidates: Vec<(KeyVariant, &[u8])> =
        record.secret_version_map.iter().map(|(v, p)| (*v, p.as_slice())).collect();
    candidates.sort_by_key(|(_, p)| std::cmp::Reverse(p.len()));

    let (variant, body) = candidates
        .into_iter()
        .find_map(|(variant, prefix)| {
            raw.strip_prefix(prefix).map(|body| (variant, body))
        })
        .ok_or_else(|| CoinError::new(ErrorKind::BadWif, "invalid WIF version number"))?;

    let (scalar_bytes, compressed) = match body.len() {
        33 if body[32] == 0x01 => (&body[..32], true),
        32 => (body, false),
        n => {
            return Err(CoinError::new(ErrorKind::BadWif, format!("{n}: invalid key length")));
        }
    };
    let mut scalar = [0u8; 32];
    scalar.copy_from_slice(scalar_bytes);
    Ok(ParsedWif { scalar: Zeroizing::new(scalar), variant, compressed })
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
    fn canonicalize_curve_order_plus_one() {
        let rec = btc_mainnet();
        let mut s = rec.secp256k1_curve_order.unwrap();
        // s = curve_order + 1
        let mut carry = 1u16;
        for i in (0..32).rev() {
            let sum = s[i] as u16 + carry;
            s[i] = (sum & 0xff) as u8;
            carry = sum >> 8;
        }
        let reduced = canonicalize(&s, CoinFamily::Bitcoin, KeyVariant::Std, &rec).unwrap();
        let mut expect = [0u8; 32];
        expect[31] = 1;
        assert_eq!(*reduced, expect);
    }

    #[test]
    fn canonicalize_zero_is_fatal() {
        let rec = btc_mainnet();
        let err = canonicalize(&[0u8; 32], CoinFamily::Bitcoin, KeyVariant::Std, &rec).unwrap_err();
        assert_eq!(err.kind, ErrorKind::PrivateKeyZero);
    }

    #[test]
    fn canonicalize_equal_order_is_fatal() {
        let rec = btc_mainnet();
        let order = rec.secp256k1_curve_order.unwrap();
        let err = canonicalize(&order, CoinFamily::Bitcoin, KeyVariant::Std, &rec).unwrap_err();
        assert_eq!(err.kind, ErrorKind::PrivateKeyEqualOrder);
    }

    #[test]
    fn zcash_z_clears_top_nibble() {
        let rec = Registry::new().get("zec", Network::Mainnet).unwrap();
        let mut secret = [0xffu8; 32];
        let out = canonicalize(&secret, CoinFamily::Zcash, KeyVariant::ZcashZ, &rec).unwrap();
        assert_eq!(out[0] & 0xf0, 0);
        secret[0] = 0x0f;
        assert_eq!(out[0], secret[0]);
    }

    #[test]
    fn s1_btc_wif_scenario() {
        let rec = btc_mainnet();
        let mut secret = [0u8; 32];
        secret[31] = 1;
        let encoded =
            encode_secret(&secret, CoinFamily::Bitcoin, KeyVariant::Std, true, &rec).unwrap();
        assert_eq!(encoded, "KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgd9M7rFU73sVHnoWn");
        let parsed = decode_secret(&encoded, CoinFamily::Bitcoin, &rec).unwrap();
        assert_eq!(*parsed.scalar, secret);
        assert!(parsed.compressed);
    }

    #[test]
    fn s5_bitcoin_wif_corner_case_uncompressed() {
        let rec = btc_mainnet();
        let parsed = decode_secret(
            "5JbQQTs3cnoYN9vDYaGY6nhQ1DggVsY4FJNBUfEfpSQqrEp3srk",
            CoinFamily::Bitcoin,
            &rec,
        )
        .unwrap();
        assert!(!parsed.compressed);
    }

    #[test]
    fn litecoin_wif_uses_declared_prefix() {
        let rec = Registry::new().get("ltc", Network::Mainnet).unwrap();
        let secret = [7u8; 32];
        let encoded =
            encode_secret(&secret, CoinFamily::Litecoin, KeyVariant::Std, true, &rec).unwrap();
        let parsed = decode_secret(&encoded, CoinFamily::Litecoin, &rec).unwrap();
        assert_eq!(*parsed.scalar, secret);
    }

    #[test]
    fn ethereum_dummy_wif_rejects_compressed() {
        let rec = Registry::new().get("eth", Network::Mainnet).unwrap();
        let secret = [9u8; 32];
        let err =
            encode_secret(&secret, CoinFamily::Ethereum, KeyVariant::Std, true, &rec).unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadWif);
    }

    #[test]
    fn ethereum_dummy_wif_round_trip() {
        let rec = Registry::new().get("eth", Network::Mainnet).unwrap();
        let secret = [9u8; 32];
        let encoded =
            encode_secret(&secret, CoinFamily::Ethereum, KeyVariant::Std, false, &rec).unwrap();
        let parsed = decode_secret(&encoded, CoinFamily::Ethereum, &rec).unwrap();
        assert_eq!(*parsed.scalar, secret);
        assert!(!parsed.compressed);
    }

    #[test]
    fn monero_canonicalize_reduces_mod_l() {
        let rec = Registry::new().get("xmr", Network::Mainnet).unwrap();
        let mut secret = [0xffu8; 32]; // far larger than ell
        let out = canonicalize(&secret, CoinFamily::Monero, KeyVariant::Monero, &rec).unwrap();
        // Reducing twice should be a no-op: the output is already canonical.
        let out2 = canonicalize(&out, CoinFamily::Monero, KeyVariant::Monero, &rec).unwrap();
        assert_eq!(*out, *out2);
        secret.fill(0); // silence unused-assignment warnings on some toolchains
        let _ = secret;
    }
}
