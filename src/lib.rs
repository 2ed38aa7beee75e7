//! Coin protocol core
//!
//! A multi-coin, daemon-agnostic library covering the Bitcoin-family,
//! Ethereum-family, and Monero protocol parameters, key/address codecs,
//! and the transaction construction/signing workflow for a cold-storage
//! wallet tool.
//!
//! # Architecture
//!
//! - **hash**: SHA-256/RIPEMD-160/Keccak-256, Base58Check, Bech32, Monero base58
//! - **amount**: fixed-precision per-coin decimal amounts
//! - **registry** / **catalog**: per-coin protocol parameter records
//! - **key**: scalar canonicalization and secret (WIF) encoding
//! - **address**: public-key-hash ↔ address across three address families
//! - **addrfile**: the persisted address-file format
//! - **tx**: transaction building, signing, and the RPC collaborator trait
//! - **persist**: atomic artifact persistence
//! - **context**: explicit network/daemon configuration (no global state)
//! - **utils::logging**: structured logging with secret redaction
//!
//! # Security
//!
//! Every buffer holding a private scalar is `zeroize::Zeroizing`-wrapped
//! and cleared on drop. No secret material is ever written to a log line.

pub mod address;
pub mod addrfile;
pub mod amount;
pub mod catalog;
pub mod context;
pub mod error;
pub mod hash;
pub mod key;
pub mod persist;
pub mod registry;
pub mod tx;
pub mod utils;

pub use error::{CoinError, CoinResult, ErrorKind};
pub use registry::{CoinFamily, ProtocolRecord, Registry};
