//! Unified error type for the coin protocol core.
//!
//! All fallible operations in this crate return `CoinResult<T>`; every
//! failure mode named in the specification's error-kind list has exactly one
//! `ErrorKind` variant.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Option<String>,
}

impl CoinError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), details: None }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn unknown_coin(symbol: &str) -> Self {
        Self::new(ErrorKind::UnknownCoin, format!("unknown coin: {symbol}"))
    }

    pub fn disabled_coin(symbol: &str) -> Self {
        Self::new(ErrorKind::DisabledCoin, format!("coin disabled: {symbol}"))
    }

    pub fn already_registered(symbol: &str) -> Self {
        Self::new(ErrorKind::AlreadyRegistered, format!("already registered: {symbol}"))
    }

    pub fn bad_wif(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadWif, msg)
    }

    pub fn bad_checksum(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadChecksum, msg)
    }

    pub fn bad_witness_version(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadWitnessVersion, msg)
    }

    pub fn unknown_address_format(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownAddressFormat, msg)
    }

    pub fn bad_address_length(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadAddressLength, msg)
    }

    pub fn private_key_zero() -> Self {
        Self::new(ErrorKind::PrivateKeyZero, "private key scalar is zero")
    }

    pub fn private_key_equal_order() -> Self {
        Self::new(ErrorKind::PrivateKeyEqualOrder, "private key scalar equals the curve order")
    }

    pub fn insufficient_funds(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InsufficientFunds, msg)
    }

    pub fn throwaway_change_refused() -> Self {
        Self::new(
            ErrorKind::ThrowawayChangeRefused,
            "change would be produced with no destination address given",
        )
    }

    pub fn duplicate_input(txid: &str, vout: u32) -> Self {
        Self::new(ErrorKind::DuplicateInput, format!("duplicate input {txid}:{vout}"))
    }

    pub fn fee_exceeds_cap(fee: u64, cap: u64) -> Self {
        Self::new(ErrorKind::FeeExceedsCap, format!("fee {fee} exceeds cap {cap}"))
    }

    pub fn daemon_unreachable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::DaemonUnreachable, msg)
    }

    pub fn rpc_invalid_key(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::RpcInvalidKey, msg)
    }

    pub fn wallet_passphrase_incorrect() -> Self {
        Self::new(ErrorKind::WalletPassphraseIncorrect, "wallet passphrase incorrect")
    }

    pub fn mapping_mismatch(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::MappingMismatch, msg)
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseError, msg)
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, msg)
    }
}

impl fmt::Display for CoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({details})")?;
        }
        Ok(())
    }
}

impl std::error::Error for CoinError {}

/// Error kinds, one per failure mode named in the error-handling design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownCoin,
    DisabledCoin,
    AlreadyRegistered,

    BadWif,
    BadChecksum,
    BadWitnessVersion,
    UnknownAddressFormat,
    BadAddressLength,

    // Fatal cryptographic preconditions, never retried.
    PrivateKeyZero,
    PrivateKeyEqualOrder,

    InsufficientFunds,
    ThrowawayChangeRefused,
    DuplicateInput,
    FeeExceedsCap,

    DaemonUnreachable,
    RpcInvalidKey,
    WalletPassphraseIncorrect,

    MappingMismatch,

    ParseError,
    InvalidInput,
    Internal,
}

impl ErrorKind {
    /// Cryptographic precondition failures are always fatal, never retried.
    pub fn is_fatal(self) -> bool {
        matches!(self, ErrorKind::PrivateKeyZero | ErrorKind::PrivateKeyEqualOrder)
    }
}

pub type CoinResult<T> = Result<T, CoinError>;

impl From<hex::FromHexError> for CoinError {
    fn from(e: hex::FromHexError) -> Self {
        CoinError::new(ErrorKind::ParseError, e.to_string())
    }
}

impl From<std::io::Error> for CoinError {
    fn from(e: std::io::Error) -> Self {
        CoinError::new(ErrorKind::Internal, e.to_string())
    }
}

impl From<bech32::Error> for CoinError {
    fn from(e: bech32::Error) -> Self {
        CoinError::new(ErrorKind::ParseError, format!("bech32 error: {e}"))
    }
}

impl From<secp256k1::Error> for CoinError {
    fn from(e: secp256k1::Error) -> Self {
        CoinError::new(ErrorKind::Internal, format!("secp256k1 error: {e}"))
    }
}
