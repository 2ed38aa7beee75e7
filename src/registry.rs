//! Protocol descriptor registry (C3): an immutable table of per-coin
//! parameters, keyed by `(symbol, network)`.
//!
//! Protocols are organized as tagged records dispatched by [`CoinFamily`]
//! rather than a class hierarchy — the source's `BitcoinProtocol` →
//! `LitecoinProtocol` → ... inheritance chain becomes one record type with a
//! family tag; differences that were method overrides in the source become
//! fields here, or family-matched branches in `key.rs`/`address.rs`.

use crate::amount::CoinAmount;
use crate::context::Network;
use crate::error::{CoinError, CoinResult};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoinFamily {
    Bitcoin,
    BitcoinCash,
    Litecoin,
    Ethereum,
    EthereumClassic,
    Zcash,
    Monero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFormat {
    P2pkh,
    P2sh,
    Bech32,
    Ethereum,
    ZcashZ,
    ZcashViewkey,
    Monero,
    MoneroSub,
}

impl AddressFormat {
    /// Body length in bytes once the version prefix has been stripped.
    pub fn body_length(self) -> usize {
        match self {
            AddressFormat::ZcashZ | AddressFormat::ZcashViewkey => 64,
            AddressFormat::Monero | AddressFormat::MoneroSub => 64,
            _ => 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyVariant {
    Std,
    ZcashZ,
    Monero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressType {
    Legacy,
    Compressed,
    SegwitP2sh,
    Bech32,
    Ethereum,
    ZcashZ,
    Monero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Rbf,
    Segwit,
    Token,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningMode {
    Daemon,
    Standalone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonFamily {
    Bitcoind,
    Parity,
}

/// One entry of the ordered address-version map. Order matters: the first
/// entry with a given format tag is canonical for encode; decode tries all
/// entries in insertion order, first-match-wins.
#[derive(Debug, Clone)]
pub struct VersionEntry {
    pub prefix: Vec<u8>,
    pub format: AddressFormat,
}

/// `(height, block_hash, alt_coin_tag, replayable)`.
#[derive(Debug, Clone)]
pub struct ForkEntry {
    pub height: Option<u32>,
    pub block_hash: &'static str,
    pub alt_coin_tag: &'static str,
    pub replayable: bool,
}

#[derive(Debug, Clone)]
pub struct ProtocolRecord {
    pub symbol: String,
    pub name: &'static str,
    pub base_coin_symbol: &'static str,
    pub is_testnet: bool,
    pub family: CoinFamily,
    pub address_version_map: Vec<VersionEntry>,
    /// Prefix for each key variant. Usually 1 byte (`std`), but Zcash's
    /// `zcash_z` variant uses a 2-byte prefix (`ab36`/`ac08`) — the map
    /// stores raw bytes rather than assuming a fixed width.
    pub secret_version_map: Vec<(KeyVariant, Vec<u8>)>,
    pub supported_address_types: Vec<AddressType>,
    pub default_address_type: AddressType,
    pub bech32_hrp: Option<String>,
    /// Per-network HRPs, resolved into `bech32_hrp` at `Registry::get` time
    /// (spec.md §4.3: "resolves bech32_hrp from the active network tag").
    pub bech32_hrps: Option<(&'static str, &'static str)>, // (testnet, regtest)
    pub secp256k1_curve_order: Option<[u8; 32]>,
    pub secret_length: usize,
    pub decimals: u8,
    pub max_fee: CoinAmount,
    pub seconds_per_block: u32,
    pub capabilities: Vec<Capability>,
    pub signing_mode: SigningMode,
    pub daemon_family: Option<DaemonFamily>,
    pub fork_history: Vec<ForkEntry>,
    /// EIP-155 chain id, Ethereum family only.
    pub chain_id: Option<u64>,
}

impl ProtocolRecord {
    pub fn addr_version_for(&self, format: AddressFormat) -> Option<&[u8]> {
        self.address_version_map
            .iter()
            .find(|e| e.format == format)
            .map(|e| e.prefix.as_slice())
    }

    pub fn secret_version_for(&self, variant: KeyVariant) -> Option<&[u8]> {
        self.secret_version_map
            .iter()
            .find(|(v, _)| *v == variant)
            .map(|(_, b)| b.as_slice())
    }
}

const SECP256K1_ORDER: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe,
    0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36, 0x41, 0x41,
];

fn v(bytes: &[u8]) -> Vec<u8> {
    bytes.to_vec()
}

pub struct Registry {
    records: HashMap<(String, bool), ProtocolRecord>,
    order: Vec<String>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Seeds the registry with the core coins (spec.md §2: btc, bch, ltc,
    /// eth, etc, zec, xmr), each with a mainnet and testnet record.
    pub fn new() -> Self {
        let mut reg = Self { records: HashMap::new(), order: Vec::new() };
        for rec in core_coin_records() {
            reg.insert_unchecked(rec);
        }
        reg
    }

    fn insert_unchecked(&mut self, rec: ProtocolRecord) {
        let key = (rec.symbol.clone(), rec.is_testnet);
        if !self.order.contains(&rec.symbol) {
            self.order.push(rec.symbol.clone());
        }
        self.records.insert(key, rec);
    }

    /// `get(symbol, testnet) -> ProtocolRecord` — fails with `unknown_coin`
    /// if absent. Resolves per-network bech32 HRPs against `network`.
    pub fn get(&self, symbol: &str, network: Network) -> CoinResult<ProtocolRecord> {
        let symbol = symbol.to_lowercase();
        let testnet = network != Network::Mainnet;
        let mut rec = self
            .records
            .get(&(symbol.clone(), testnet))
            .cloned()
            .ok_or_else(|| CoinError::unknown_coin(&symbol))?;
        if let Some((testnet_hrp, regtest_hrp)) = rec.bech32_hrps {
            rec.bech32_hrp = Some(match network {
                Network::Regtest => regtest_hrp.to_string(),
                _ => testnet_hrp.to_string(),
            });
        }
        Ok(rec)
    }

    pub fn list_coins(&self) -> Vec<String> {
        self.order.iter().map(|s| s.to_uppercase()).collect()
    }

    /// Used by the altcoin-catalog expansion path (§4.9). A core coin
    /// shadows any catalog entry — registering a symbol that's already a
    /// core coin for the same network fails with `already_registered`.
    pub fn register_generated(&mut self, rec: ProtocolRecord) -> CoinResult<()> {
        let key = (rec.symbol.clone(), rec.is_testnet);
        if self.records.contains_key(&key) {
            return Err(CoinError::already_registered(&rec.symbol));
        }
        self.insert_unchecked(rec);
        Ok(())
    }
}

fn core_coin_records() -> Vec<ProtocolRecord> {
    vec![
        bitcoin_mainnet(),
        bitcoin_testnet(),
        bitcoin_cash_mainnet(),
        bitcoin_cash_testnet(),
        litecoin_mainnet(),
        litecoin_testnet(),
        ethereum_mainnet(),
        ethereum_testnet(),
        ethereum_classic_mainnet(),
        ethereum_classic_testnet(),
        zcash_mainnet(),
        zcash_testnet(),
        monero_mainnet(),
        monero_testnet(),
    ]
}

fn bitcoin_mainnet() -> ProtocolRecord {
    ProtocolRecord {
        symbol: "btc".into(),
        name: "bitcoin",
        base_coin_symbol: "BTC",
        is_testnet: false,
        family: CoinFamily::Bitcoin,
        address_version_map: vec![
            VersionEntry { prefix: v(&[0x00]), format: AddressFormat::P2pkh },
            VersionEntry { prefix: v(&[0x05]), format: AddressFormat::P2sh },
        ],
        secret_version_map: vec![(KeyVariant::Std, v(&[0x80]))],
        supported_address_types: vec![
            AddressType::Legacy,
            AddressType::Compressed,
            AddressType::SegwitP2sh,
            AddressType::Bech32,
        ],
        default_address_type: AddressType::Legacy,
        bech32_hrp: Some("bc".into()),
        bech32_hrps: None,
        secp256k1_curve_order: Some(SECP256K1_ORDER),
        secret_length: 32,
        decimals: 8,
        max_fee: CoinAmount::from_units(300_000, 8), // 0.003 BTC
        seconds_per_block: 600,
        capabilities: vec![Capability::Rbf, Capability::Segwit],
        signing_mode: SigningMode::Daemon,
        daemon_family: Some(DaemonFamily::Bitcoind),
        fork_history: vec![
            ForkEntry {
                height: Some(478_559),
                block_hash: "00000000000000000019f112ec0a9982926f1258cdcc558dd7c3b7e5dc7fa148",
                alt_coin_tag: "bch",
                replayable: false,
            },
            // B2X never activated; kept only as history, not a registrable coin.
            ForkEntry { height: None, block_hash: "", alt_coin_tag: "b2x", replayable: true },
        ],
        chain_id: None,
    }
}

fn bitcoin_testnet() -> ProtocolRecord {
    ProtocolRecord {
        symbol: "btc".into(),
        is_testnet: true,
        address_version_map: vec![
            VersionEntry { prefix: v(&[0x6f]), format: AddressFormat::P2pkh },
            VersionEntry { prefix: v(&[0xc4]), format: AddressFormat::P2sh },
        ],
        secret_version_map: vec![(KeyVariant::Std, v(&[0xef]))],
        bech32_hrp: None,
        bech32_hrps: Some(("tb", "bcrt")),
        fork_history: vec![],
        ..bitcoin_mainnet()
    }
}

fn bitcoin_cash_mainnet() -> ProtocolRecord {
    ProtocolRecord {
        symbol: "bch".into(),
        name: "bitcoinCash",
        base_coin_symbol: "BCH",
        family: CoinFamily::BitcoinCash,
        // BCH inherits Bitcoin's mainnet version bytes.
        address_version_map: vec![
            VersionEntry { prefix: v(&[0x00]), format: AddressFormat::P2pkh },
            VersionEntry { prefix: v(&[0x05]), format: AddressFormat::P2sh },
        ],
        supported_address_types: vec![AddressType::Legacy, AddressType::Compressed],
        capabilities: vec![],
        max_fee: CoinAmount::from_units(10_000_000, 8), // 0.1 BCH
        fork_history: vec![ForkEntry {
            height: Some(478_559),
            block_hash: "000000000000000000651ef99cb9fcbe0dadde1d424bd9f15ff20136191a5eec",
            alt_coin_tag: "btc",
            replayable: false,
        }],
        bech32_hrp: None,
        bech32_hrps: None,
        ..bitcoin_mainnet()
    }
}

fn bitcoin_cash_testnet() -> ProtocolRecord {
    ProtocolRecord {
        is_testnet: true,
        address_version_map: vec![
            VersionEntry { prefix: v(&[0x6f]), format: AddressFormat::P2pkh },
            VersionEntry { prefix: v(&[0xc4]), format: AddressFormat::P2sh },
        ],
        secret_version_map: vec![(KeyVariant::Std, v(&[0xef]))],
        fork_history: vec![],
        ..bitcoin_cash_mainnet()
    }
}

fn litecoin_mainnet() -> ProtocolRecord {
    ProtocolRecord {
        symbol: "ltc".into(),
        name: "litecoin",
        base_coin_symbol: "LTC",
        family: CoinFamily::Litecoin,
        // New p2sh version (0x32) must come first; legacy (0x05) kept for
        // historical decode (spec.md §3, S3).
        address_version_map: vec![
            VersionEntry { prefix: v(&[0x30]), format: AddressFormat::P2pkh },
            VersionEntry { prefix: v(&[0x32]), format: AddressFormat::P2sh },
            VersionEntry { prefix: v(&[0x05]), format: AddressFormat::P2sh },
        ],
        secret_version_map: vec![(KeyVariant::Std, v(&[0xb0]))],
        bech32_hrp: Some("ltc".into()),
        bech32_hrps: None,
        max_fee: CoinAmount::from_units(30_000_000, 8), // 0.3 LTC
        seconds_per_block: 150,
        fork_history: vec![],
        ..bitcoin_mainnet()
    }
}

fn litecoin_testnet() -> ProtocolRecord {
    ProtocolRecord {
        symbol: "ltc".into(),
        is_testnet: true,
        family: CoinFamily::Litecoin,
        name: "litecoin",
        base_coin_symbol: "LTC",
        address_version_map: vec![
            VersionEntry { prefix: v(&[0x6f]), format: AddressFormat::P2pkh },
            VersionEntry { prefix: v(&[0x3a]), format: AddressFormat::P2sh },
            // Overlaps Bitcoin testnet p2sh — preserved as-is (spec.md §9
            // open question; not resolved here, just not guessed away).
            VersionEntry { prefix: v(&[0xc4]), format: AddressFormat::P2sh },
        ],
        secret_version_map: vec![(KeyVariant::Std, v(&[0xef]))],
        bech32_hrp: None,
        bech32_hrps: Some(("tltc", "rltc")),
        max_fee: CoinAmount::from_units(30_000_000, 8),
        seconds_per_block: 150,
        fork_history: vec![],
        ..bitcoin_mainnet()
    }
}

fn ethereum_mainnet() -> ProtocolRecord {
    ProtocolRecord {
        symbol: "eth".into(),
        name: "ethereum",
        base_coin_symbol: "ETH",
        is_testnet: false,
        family: CoinFamily::Ethereum,
        address_version_map: vec![VersionEntry { prefix: vec![], format: AddressFormat::Ethereum }],
        secret_version_map: vec![],
        supported_address_types: vec![AddressType::Ethereum],
        default_address_type: AddressType::Ethereum,
        bech32_hrp: None,
        bech32_hrps: None,
        secp256k1_curve_order: Some(SECP256K1_ORDER),
        secret_length: 32,
        decimals: 18,
        max_fee: CoinAmount::from_units(5_000_000_000_000_000, 18), // 0.005 ETH
        seconds_per_block: 15,
        capabilities: vec![Capability::Token],
        signing_mode: SigningMode::Standalone,
        daemon_family: Some(DaemonFamily::Parity),
        fork_history: vec![],
        chain_id: Some(1),
    }
}

fn ethereum_testnet() -> ProtocolRecord {
    ProtocolRecord { is_testnet: true, chain_id: Some(42), ..ethereum_mainnet() } // kovan
}

fn ethereum_classic_mainnet() -> ProtocolRecord {
    ProtocolRecord {
        symbol: "etc".into(),
        name: "ethereumClassic",
        family: CoinFamily::EthereumClassic,
        chain_id: Some(61),
        ..ethereum_mainnet()
    }
}

fn ethereum_classic_testnet() -> ProtocolRecord {
    ProtocolRecord {
        is_testnet: true,
        chain_id: Some(62), // aka Morden
        ..ethereum_classic_mainnet()
    }
}

fn zcash_mainnet() -> ProtocolRecord {
    ProtocolRecord {
        symbol: "zec".into(),
        name: "zcash",
        base_coin_symbol: "ZEC",
        is_testnet: false,
        family: CoinFamily::Zcash,
        address_version_map: vec![
            VersionEntry { prefix: v(&[0x1c, 0xb8]), format: AddressFormat::P2pkh },
            VersionEntry { prefix: v(&[0x1c, 0xbd]), format: AddressFormat::P2sh },
            VersionEntry { prefix: v(&[0x16, 0x9a]), format: AddressFormat::ZcashZ },
            VersionEntry { prefix: v(&[0xa8, 0xab, 0xd3]), format: AddressFormat::ZcashViewkey },
        ],
        secret_version_map: vec![(KeyVariant::Std, v(&[0x80])), (KeyVariant::ZcashZ, v(&[0xab, 0x36]))],
        supported_address_types: vec![AddressType::Legacy, AddressType::Compressed, AddressType::ZcashZ],
        default_address_type: AddressType::Legacy,
        bech32_hrp: None,
        bech32_hrps: None,
        secp256k1_curve_order: Some(SECP256K1_ORDER),
        secret_length: 32,
        decimals: 8,
        max_fee: CoinAmount::from_units(300_000, 8),
        seconds_per_block: 150,
        capabilities: vec![],
        signing_mode: SigningMode::Daemon,
        daemon_family: Some(DaemonFamily::Bitcoind),
        fork_history: vec![],
        chain_id: None,
    }
}

fn zcash_testnet() -> ProtocolRecord {
    ProtocolRecord {
        is_testnet: true,
        address_version_map: vec![
            VersionEntry { prefix: v(&[0x1d, 0x25]), format: AddressFormat::P2pkh },
            VersionEntry { prefix: v(&[0x1c, 0xba]), format: AddressFormat::P2sh },
            VersionEntry { prefix: v(&[0x16, 0xb6]), format: AddressFormat::ZcashZ },
            VersionEntry { prefix: v(&[0xa8, 0xac, 0x0c]), format: AddressFormat::ZcashViewkey },
        ],
        secret_version_map: vec![(KeyVariant::Std, v(&[0xef])), (KeyVariant::ZcashZ, v(&[0xac, 0x08]))],
        ..zcash_mainnet()
    }
}

fn monero_mainnet() -> ProtocolRecord {
    ProtocolRecord {
        symbol: "xmr".into(),
        name: "monero",
        base_coin_symbol: "XMR",
        is_testnet: false,
        family: CoinFamily::Monero,
        address_version_map: vec![
            VersionEntry { prefix: v(&[0x12]), format: AddressFormat::Monero },
            VersionEntry { prefix: v(&[0x2a]), format: AddressFormat::MoneroSub },
        ],
        secret_version_map: vec![],
        supported_address_types: vec![AddressType::Monero],
        default_address_type: AddressType::Monero,
        bech32_hrp: None,
        bech32_hrps: None,
        secp256k1_curve_order: None,
        secret_length: 32,
        decimals: 12,
        max_fee: CoinAmount::from_units(0, 12), // no tx support; placeholder cap
        seconds_per_block: 120,
        capabilities: vec![],
        signing_mode: SigningMode::Standalone,
        daemon_family: None,
        fork_history: vec![],
        chain_id: None,
    }
}

fn monero_testnet() -> ProtocolRecord {
    ProtocolRecord {
        is_testnet: true,
        address_version_map: vec![
            VersionEntry { prefix: v(&[0x35]), format: AddressFormat::Monero },
            VersionEntry { prefix: v(&[0x3f]), format: AddressFormat::MoneroSub },
        ],
        ..monero_mainnet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_core_coins() {
        let reg = Registry::new();
        let coins = reg.list_coins();
        assert!(coins.contains(&"BTC".to_string()));
        assert!(coins.contains(&"XMR".to_string()));
        assert_eq!(coins.len(), 7);
    }

    #[test]
    fn unknown_coin_fails() {
        let reg = Registry::new();
        let err = reg.get("dogecoin", Network::Mainnet).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::UnknownCoin);
    }

    #[test]
    fn litecoin_p2sh_order_preserved() {
        let reg = Registry::new();
        let rec = reg.get("ltc", Network::Mainnet).unwrap();
        let p2sh_prefixes: Vec<&[u8]> = rec
            .address_version_map
            .iter()
            .filter(|e| e.format == AddressFormat::P2sh)
            .map(|e| e.prefix.as_slice())
            .collect();
        assert_eq!(p2sh_prefixes, vec![&[0x32][..], &[0x05][..]]);
    }

    #[test]
    fn testnet_bech32_hrp_resolves_regtest() {
        let reg = Registry::new();
        let rec = reg.get("btc", Network::Regtest).unwrap();
        assert_eq!(rec.bech32_hrp.as_deref(), Some("bcrt"));
        let rec = reg.get("btc", Network::Testnet).unwrap();
        assert_eq!(rec.bech32_hrp.as_deref(), Some("tb"));
    }

    #[test]
    fn register_generated_rejects_core_coin_symbol() {
        let mut reg = Registry::new();
        let dup = bitcoin_mainnet();
        assert!(reg.register_generated(dup).is_err());
    }

    #[test]
    fn ethereum_classic_chain_ids() {
        let reg = Registry::new();
        assert_eq!(reg.get("etc", Network::Mainnet).unwrap().chain_id, Some(61));
        assert_eq!(reg.get("etc", Network::Testnet).unwrap().chain_id, Some(62));
    }
}
