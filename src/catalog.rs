//! Altcoin catalog expansion (§4.9, a C3 extension).
//!
//! The source builds Python source text naming a new protocol class and
//! `eval()`s it into existence (`make_init_genonly_altcoins_str`). This is
//! reimplemented as a pure constructor: given a catalog entry, produce a
//! `ProtocolRecord` inheriting Bitcoin-family semantics with only the
//! version bytes and the SegWit capability bit overridden. No code
//! generation, no `eval`.

use crate::registry::{
    AddressFormat, AddressType, Capability, CoinFamily, DaemonFamily, ProtocolRecord, Registry,
    SigningMode, VersionEntry,
};
use crate::amount::CoinAmount;
use crate::error::{CoinError, CoinResult};

/// One entry of the external lower-trust-coin catalog.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub symbol: &'static str,
    pub p2pkh_byte: u8,
    pub p2sh_byte: Option<u8>,
    pub wif_byte: u8,
    pub has_segwit: bool,
    /// `-1..=5`; `-1` disables the coin (spec.md GLOSSARY "Trust level").
    pub trust_level: i8,
}

/// Synthesizes a Bitcoin-family `ProtocolRecord` from a catalog entry.
/// Fails with `disabled_coin` if the entry's trust level is `-1`.
pub fn synthesize(entry: &CatalogEntry, testnet: bool) -> CoinResult<ProtocolRecord> {
    if entry.trust_level == -1 {
        return Err(CoinError::disabled_coin(entry.symbol));
    }

    let mut address_version_map = vec![VersionEntry {
        prefix: vec![entry.p2pkh_byte],
        format: AddressFormat::P2pkh,
    }];
    if let Some(p2sh) = entry.p2sh_byte {
        address_version_map.push(VersionEntry { prefix: vec![p2sh], format: AddressFormat::P2sh });
    }

    let mut supported_address_types = vec![AddressType::Legacy, AddressType::Compressed];
    if entry.has_segwit {
        supported_address_types.push(AddressType::SegwitP2sh);
    }

    Ok(ProtocolRecord {
        symbol: entry.symbol.to_lowercase(),
        name: entry.name,
        base_coin_symbol: "",
        is_testnet: testnet,
        family: CoinFamily::Bitcoin,
        address_version_map,
        secret_version_map: vec![(crate::registry::KeyVariant::Std, vec![entry.wif_byte])],
        supported_address_types,
        default_address_type: AddressType::Legacy,
        bech32_hrp: None,
        bech32_hrps: None,
        secp256k1_curve_order: None,
        secret_length: 32,
        decimals: 8,
        max_fee: CoinAmount::from_units(0, 8),
        seconds_per_block: 600,
        capabilities: if entry.has_segwit { vec![Capability::Segwit] } else { vec![] },
        signing_mode: SigningMode::Daemon,
        daemon_family: Some(DaemonFamily::Bitcoind),
        fork_history: vec![],
        chain_id: None,
    })
}

/// Registers a catalog entry's synthesized record into `registry`, unless
/// `symbol` is already a core coin — in which case the core coin shadows
/// the catalog entry and the registry is left unchanged.
pub fn register_if_not_core(
    registry: &mut Registry,
    entry: &CatalogEntry,
    testnet: bool,
) -> CoinResult<()> {
    if registry.list_coins().iter().any(|c| c.eq_ignore_ascii_case(entry.symbol)) {
        return Ok(());
    }
    let rec = synthesize(entry, testnet)?;
    registry.register_generated(rec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Network;

    fn sample_entry(trust: i8) -> CatalogEntry {
        CatalogEntry {
            name: "dogecoin",
            symbol: "doge",
            p2pkh_byte: 0x1e,
            p2sh_byte: Some(0x16),
            wif_byte: 0x9e,
            has_segwit: false,
            trust_level: trust,
        }
    }

    #[test]
    fn disabled_coin_is_refused() {
        let entry = sample_entry(-1);
        assert_eq!(synthesize(&entry, false).unwrap_err().kind, crate::error::ErrorKind::DisabledCoin);
    }

    #[test]
    fn synthesizes_bitcoin_family_record() {
        let entry = sample_entry(2);
        let rec = synthesize(&entry, false).unwrap();
        assert_eq!(rec.symbol, "doge");
        assert_eq!(rec.addr_version_for(AddressFormat::P2pkh), Some(&[0x1e][..]));
        assert_eq!(rec.addr_version_for(AddressFormat::P2sh), Some(&[0x16][..]));
    }

    #[test]
    fn core_coin_shadows_catalog_entry() {
        let mut registry = Registry::new();
        let entry = CatalogEntry {
            name: "bitcoin-altlist-entry",
            symbol: "btc",
            p2pkh_byte: 0xff,
            p2sh_byte: None,
            wif_byte: 0xff,
            has_segwit: false,
            trust_level: 2,
        };
        register_if_not_core(&mut registry, &entry, false).unwrap();
        // Still the real Bitcoin record, not the bogus 0xff catalog one.
        let rec = registry.get("btc", Network::Mainnet).unwrap();
        assert_eq!(rec.addr_version_for(AddressFormat::P2pkh), Some(&[0x00][..]));
    }
}
