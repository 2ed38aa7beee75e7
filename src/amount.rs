//! Coin-amount value type (C2): fixed-precision decimal, no floats.
//!
//! Amounts are stored as an integer count of the coin's smallest unit
//! (satoshi, wei, piconero, ...) alongside the number of decimal places the
//! coin declares, so arithmetic never touches `f64` and can't drift.

use crate::error::{CoinError, CoinResult};
use std::fmt;

/// A coin amount: `units` of `10^-decimals` of the named coin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CoinAmount {
    units: u64,
    decimals: u8,
}

impl CoinAmount {
    pub fn from_units(units: u64, decimals: u8) -> Self {
        Self { units, decimals }
    }

    pub fn units(self) -> u64 {
        self.units
    }

    pub fn decimals(self) -> u8 {
        self.decimals
    }

    /// Parse a decimal string like `"0.5"` or `"12"` for a coin that permits
    /// `decimals` fractional digits. Rejects NaN-shaped input (by virtue of
    /// only accepting `[0-9]+(.[0-9]+)?`), negative signs, and zero (sends
    /// must be positive — this is the "zero-for-send" ban from §4.2).
    pub fn parse(s: &str, decimals: u8) -> CoinResult<Self> {
        let s = s.trim();
        if s.is_empty() || s.starts_with('-') {
            return Err(CoinError::invalid_input("amount must be a non-negative decimal"));
        }
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoinError::invalid_input(format!("invalid amount: {s}")));
        }
        if !frac_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoinError::invalid_input(format!("invalid amount: {s}")));
        }
        if frac_part.len() > decimals as usize {
            return Err(CoinError::invalid_input(format!(
                "{s} has more than {decimals} fractional digits"
            )));
        }
        let int_units: u64 = int_part
            .parse()
            .map_err(|_| CoinError::invalid_input(format!("amount overflow: {s}")))?;
        let scale = 10u64.pow(decimals as u32);
        let mut frac_units: u64 = if frac_part.is_empty() {
            0
        } else {
            frac_part
                .parse()
                .map_err(|_| CoinError::invalid_input(format!("amount overflow: {s}")))?
        };
        // Right-pad the fractional part out to `decimals` digits of scale.
        for _ in frac_part.len()..decimals as usize {
            frac_units = frac_units.checked_mul(10).ok_or_else(|| {
                CoinError::invalid_input(format!("amount overflow: {s}"))
            })?;
        }
        let units = int_units
            .checked_mul(scale)
            .and_then(|v| v.checked_add(frac_units))
            .ok_or_else(|| CoinError::invalid_input(format!("amount overflow: {s}")))?;
        if units == 0 {
            return Err(CoinError::invalid_input("send amount must not be zero"));
        }
        Ok(Self { units, decimals })
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        if self.decimals != other.decimals {
            return None;
        }
        self.units.checked_add(other.units).map(|units| Self { units, ..self })
    }

    /// Returns `None` if `other` exceeds `self` (amounts are unsigned).
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        if self.decimals != other.decimals {
            return None;
        }
        self.units.checked_sub(other.units).map(|units| Self { units, ..self })
    }

    /// The fee cap this coin enforces (§4.2): any constructed fee exceeding
    /// this amount is rejected with `fee_exceeds_cap`.
    pub fn check_against_cap(self, cap: Self) -> CoinResult<()> {
        if self.decimals != cap.decimals {
            return Err(CoinError::internal("fee and cap decimals mismatch"));
        }
        if self.units > cap.units {
            return Err(CoinError::fee_exceeds_cap(self.units, cap.units));
        }
        Ok(())
    }
}

impl fmt::Display for CoinAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = 10u64.pow(self.decimals as u32);
        let int_part = self.units / scale;
        let frac_part = self.units % scale;
        if self.decimals == 0 {
            write!(f, "{int_part}")
        } else {
            write!(f, "{int_part}.{frac_part:0width$}", width = self.decimals as usize)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_btc_amount() {
        let a = CoinAmount::parse("0.5", 8).unwrap();
        assert_eq!(a.units(), 50_000_000);
    }

    #[test]
    fn parses_eth_amount_18dp() {
        let a = CoinAmount::parse("1.000000000000000001", 18).unwrap();
        assert_eq!(a.units(), 1_000_000_000_000_000_001);
    }

    #[test]
    fn rejects_zero_send() {
        assert!(CoinAmount::parse("0", 8).is_err());
        assert!(CoinAmount::parse("0.00000000", 8).is_err());
    }

    #[test]
    fn rejects_negative() {
        assert!(CoinAmount::parse("-1", 8).is_err());
    }

    #[test]
    fn rejects_too_many_fractional_digits() {
        assert!(CoinAmount::parse("0.123456789", 8).is_err());
    }

    #[test]
    fn fee_cap_enforced() {
        let fee = CoinAmount::from_units(100, 8);
        let cap = CoinAmount::from_units(50, 8);
        assert!(fee.check_against_cap(cap).is_err());
        assert!(CoinAmount::from_units(10, 8).check_against_cap(cap).is_ok());
    }

    #[test]
    fn display_round_trip() {
        let a = CoinAmount::parse("0.5", 8).unwrap();
        assert_eq!(a.to_string(), "0.50000000");
    }
}
