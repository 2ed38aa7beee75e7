//! Transaction builder (C7): selection → draft → serialized-raw, and the
//! standalone Ethereum-family construction path.
//!
//! UTXO-model coins (Bitcoin, Bitcoin Cash, Litecoin, Zcash transparent)
//! go through [`build`]; Ethereum/EthereumClassic have no UTXO set and go
//! through [`build_ethereum`] instead (spec.md §4.7: "via the in-process
//! standalone encoder (Ethereum)").

use crate::address::parse_address;
use crate::amount::CoinAmount;
use crate::error::{CoinError, CoinResult};
use crate::hash::hash256;
use crate::registry::{AddressFormat, CoinFamily, ProtocolRecord};
use crate::tx::rlp;
use crate::tx::select::UnspentOutput;
use crate::tx::wire;

#[derive(Debug, Clone)]
pub struct TxInput {
    pub txid: String,
    pub vout: u32,
    pub address: String,
    pub amount: CoinAmount,
    pub confirmations: u32,
    pub wallet_label: Option<String>,
}

impl From<UnspentOutput> for TxInput {
    fn from(u: UnspentOutput) -> Self {
        TxInput { txid: u.txid, vout: u.vout, address: u.address, amount: u.amount, confirmations: u.confirmations, wallet_label: u.wallet_label }
    }
}

#[derive(Debug, Clone)]
pub struct TxOutput {
    pub address: String,
    pub amount: CoinAmount,
}

#[derive(Debug, Clone)]
pub struct TransactionDraft {
    pub coin_symbol: String,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub fee: CoinAmount,
    pub raw_hex: String,
    /// Uppercase hex of the first 6 bytes of `hash256(raw_bytes)`
    /// (spec.md §3/§4.7), used as the artifact filename's `<TXID6>`.
    pub tx_id6: String,
    pub has_external_inputs: bool,
    pub zero_conf_inputs: Vec<(String, u32)>,
}

/// The minimum `sum_in` must clear beyond the send amount for the
/// transaction to be constructible at all: spec.md §4.7 names this
/// `required_change_threshold` without defining it; since any `sum_in`
/// between `send` and `send + fee` can't actually pay the fee, the
/// threshold is the fee itself (documented in DESIGN.md).
fn required_change_threshold(fee: CoinAmount) -> CoinAmount {
    fee
}

fn check_duplicate_inputs(inputs: &[TxInput]) -> CoinResult<()> {
    let mut seen = std::collections::HashSet::new();
    for input in inputs {
        if !seen.insert((input.txid.clone(), input.vout)) {
            return Err(CoinError::duplicate_input(&input.txid, input.vout));
        }
    }
    Ok(())
}

fn output_script(address: &str, family: CoinFamily, record: &ProtocolRecord) -> CoinResult<Vec<u8>> {
    let parsed = parse_address(address, family, record)?;
    match parsed.format {
        AddressFormat::P2pkh => Ok(wire::p2pkh_script(&parsed.body)),
        AddressFormat::P2sh => Ok(wire::p2sh_script(&parsed.body)),
        AddressFormat::Bech32 => Ok(wire::segwit_v0_script(&parsed.body)),
        other => Err(CoinError::unknown_address_format(format!("{other:?}: not a spendable output format"))),
    }
}

/// Builds, serializes, and checksums an unsigned UTXO-model transaction.
/// `selected` must already be duplicate-free at the call site's discretion;
/// [`build`] re-checks regardless (spec.md §4.7 edge case).
pub fn build(
    selected: &[UnspentOutput],
    send_to: &str,
    send_amount: CoinAmount,
    change_address: Option<&str>,
    fee: CoinAmount,
    family: CoinFamily,
    record: &ProtocolRecord,
) -> CoinResult<TransactionDraft> {
    if family == CoinFamily::Ethereum || family == CoinFamily::EthereumClassic {
        return Err(CoinError::invalid_input("Ethereum-family coins build via build_ethereum, not build"));
    }

    let inputs: Vec<TxInput> = selected.iter().cloned().map(TxInput::from).collect();
    check_duplicate_inputs(&inputs)?;
    parse_address(send_to, family, record)?;

    fee.check_against_cap(record.max_fee)?;

    let sum_in = inputs
        .iter()
        .try_fold(CoinAmount::from_units(0, send_amount.decimals()), |acc, i| acc.checked_add(i.amount))
        .ok_or_else(|| CoinError::internal("input sum overflow"))?;

    let threshold = required_change_threshold(fee);
    let required = send_amount
        .checked_add(threshold)
        .ok_or_else(|| CoinError::internal("send+threshold overflow"))?;
    if sum_in.units() < required.units() {
        return Err(CoinError::insufficient_funds(format!(
            "have {sum_in}, need at least {required}"
        )));
    }

    let send_plus_fee =
        send_amount.checked_add(fee).ok_or_else(|| CoinError::internal("send+fee overflow"))?;

    let mut outputs = vec![TxOutput { address: send_to.to_string(), amount: send_amount }];
    if sum_in.units() > send_plus_fee.units() {
        match change_address {
            None => return Err(CoinError::throwaway_change_refused()),
            Some(change_addr) => {
                parse_address(change_addr, family, record)?;
                let change = sum_in
                    .checked_sub(send_plus_fee)
                    .ok_or_else(|| CoinError::internal("change underflow"))?;
                outputs.push(TxOutput { address: change_addr.to_string(), amount: change });
            }
        }
    }

    let raw_inputs: Vec<wire::RawInput> = inputs
        .iter()
        .map(|i| {
            Ok(wire::RawInput {
                prev_txid: wire::txid_to_internal_bytes(&i.txid)?,
                vout: i.vout,
                script_sig: Vec::new(),
                sequence: 0xffff_ffff,
            })
        })
        .collect::<CoinResult<_>>()?;
    let raw_outputs: Vec<wire::RawOutput> = outputs
        .iter()
        .map(|o| Ok(wire::RawOutput { value: o.amount.units(), script_pubkey: output_script(&o.address, family, record)? }))
        .collect::<CoinResult<_>>()?;

    let raw_bytes = wire::serialize_tx(2, &raw_inputs, &raw_outputs, 0);
    let raw_hex = hex::encode(&raw_bytes);
    let digest = hash256(&raw_bytes);
    let tx_id6 = hex::encode_upper(&digest[..6]);

    let zero_conf_inputs =
        inputs.iter().filter(|i| i.confirmations == 0).map(|i| (i.txid.clone(), i.vout)).collect();
    let has_external_inputs = inputs.iter().any(|i| i.wallet_label.is_none());

    Ok(TransactionDraft {
        coin_symbol: record.symbol.clone(),
        inputs,
        outputs,
        fee,
        raw_hex,
        tx_id6,
        has_external_inputs,
        zero_conf_inputs,
    })
}

/// Ethereum-family draft: no UTXO set, so nonce/gas parameters stand in for
/// input selection.
#[derive(Debug, Clone)]
pub struct EthereumDraft {
    pub nonce: u64,
    pub gas_price_wei: u64,
    pub gas_limit: u64,
    pub to: [u8; 20],
    pub value_wei: u128,
    pub data: Vec<u8>,
    pub chain_id: u64,
    /// RLP-encoded `[nonce, gasPrice, gasLimit, to, value, data, chainId, 0, 0]`
    /// pre-image (EIP-155), ready for `keccak256` + signing.
    pub unsigned_rlp: Vec<u8>,
    pub tx_id6: String,
}

pub fn build_ethereum(
    nonce: u64,
    gas_price_wei: u64,
    gas_limit: u64,
    to: [u8; 20],
    value_wei: u128,
    data: Vec<u8>,
    fee_cap: CoinAmount,
    chain_id: u64,
) -> CoinResult<EthereumDraft> {
    let fee_units = (gas_price_wei as u128) * (gas_limit as u128);
    let fee = CoinAmount::from_units(fee_units.min(u64::MAX as u128) as u64, fee_cap.decimals());
    fee.check_against_cap(fee_cap)?;

    let fields = vec![
        rlp::encode_u64(nonce),
        rlp::encode_u64(gas_price_wei),
        rlp::encode_u64(gas_limit),
        rlp::encode_bytes(&to),
        rlp::encode_int_bytes(&value_wei.to_be_bytes()),
        rlp::encode_bytes(&data),
        rlp::encode_u64(chain_id),
        rlp::encode_int_bytes(&[]),
        rlp::encode_int_bytes(&[]),
    ];
    let unsigned_rlp = rlp::encode_list(&fields);
    let digest = hash256(&unsigned_rlp);
    let tx_id6 = hex::encode_upper(&digest[..6]);

    Ok(EthereumDraft { nonce, gas_price_wei, gas_limit, to, value_wei, data, chain_id, unsigned_rlp, tx_id6 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Network;
    use crate::registry::Registry;

    fn btc() -> ProtocolRecord {
        Registry::new().get("btc", Network::Mainnet).unwrap()
    }

    fn utxo(txid: &str, vout: u32, amount_units: u64, address: &str, internal: bool) -> UnspentOutput {
        UnspentOutput {
            txid: txid.into(),
            vout,
            address: address.into(),
            amount: CoinAmount::from_units(amount_units, 8),
            confirmations: 6,
            wallet_label: if internal { Some("ABCD1234:1".into()) } else { None },
        }
    }

    fn addr(hash: [u8; 20]) -> String {
        let rec = btc();
        crate::address::pubhash_to_address(&hash, false, CoinFamily::Bitcoin, &rec).unwrap()
    }

    #[test]
    fn s4_throwaway_change_refused() {
        let rec = btc();
        let recipient = addr([1u8; 20]);
        let source = addr([2u8; 20]);
        let selected = vec![utxo("a".repeat(64).as_str(), 0, 50_000_000, &source, true)];
        let send = CoinAmount::parse("0.3", 8).unwrap();
        let fee = CoinAmount::from_units(10_000, 8);
        let err = build(&selected, &recipient, send, None, fee, CoinFamily::Bitcoin, &rec).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::ThrowawayChangeRefused);
    }

    #[test]
    fn produces_change_when_address_given() {
        let rec = btc();
        let recipient = addr([1u8; 20]);
        let source = addr([2u8; 20]);
        let change_addr = addr([3u8; 20]);
        let selected = vec![utxo("b".repeat(64).as_str(), 0, 50_000_000, &source, true)];
        let send = CoinAmount::parse("0.3", 8).unwrap();
        let fee = CoinAmount::from_units(10_000, 8);
        let draft = build(&selected, &recipient, send, Some(&change_addr), fee, CoinFamily::Bitcoin, &rec).unwrap();
        assert_eq!(draft.outputs.len(), 2);
        assert_eq!(draft.outputs[1].amount.units(), 50_000_000 - 30_000_000 - 10_000);
    }

    #[test]
    fn insufficient_funds_when_sum_in_too_low() {
        let rec = btc();
        let recipient = addr([1u8; 20]);
        let source = addr([2u8; 20]);
        let selected = vec![utxo("c".repeat(64).as_str(), 0, 1_000, &source, true)];
        let send = CoinAmount::parse("0.3", 8).unwrap();
        let fee = CoinAmount::from_units(10, 8);
        let err = build(&selected, &recipient, send, None, fee, CoinFamily::Bitcoin, &rec).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::InsufficientFunds);
    }

    #[test]
    fn rejects_duplicate_inputs() {
        let rec = btc();
        let recipient = addr([1u8; 20]);
        let source = addr([2u8; 20]);
        let txid = "d".repeat(64);
        let selected = vec![utxo(&txid, 0, 50_000_000, &source, true), utxo(&txid, 0, 50_000_000, &source, true)];
        let send = CoinAmount::parse("0.3", 8).unwrap();
        let fee = CoinAmount::from_units(10_000, 8);
        let err = build(&selected, &recipient, send, None, fee, CoinFamily::Bitcoin, &rec).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::DuplicateInput);
    }

    #[test]
    fn fee_above_cap_rejected() {
        let rec = btc();
        let recipient = addr([1u8; 20]);
        let source = addr([2u8; 20]);
        let selected = vec![utxo("e".repeat(64).as_str(), 0, 50_000_000, &source, true)];
        let send = CoinAmount::parse("0.3", 8).unwrap();
        let huge_fee = CoinAmount::from_units(1_000_000_000, 8);
        let err = build(&selected, &recipient, send, None, huge_fee, CoinFamily::Bitcoin, &rec).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::FeeExceedsCap);
    }

    #[test]
    fn reports_zero_conf_and_external_inputs_without_failing() {
        let rec = btc();
        let recipient = addr([1u8; 20]);
        let source = addr([2u8; 20]);
        let mut selected = vec![utxo("f".repeat(64).as_str(), 0, 60_000_000, &source, false)];
        selected[0].confirmations = 0;
        let send = CoinAmount::parse("0.3", 8).unwrap();
        let change_addr = addr([3u8; 20]);
        let fee = CoinAmount::from_units(10_000, 8);
        let draft = build(&selected, &recipient, send, Some(&change_addr), fee, CoinFamily::Bitcoin, &rec).unwrap();
        assert!(draft.has_external_inputs);
        assert_eq!(draft.zero_conf_inputs.len(), 1);
    }

    #[test]
    fn ethereum_draft_checksums_and_caps_fee() {
        let fee_cap = CoinAmount::from_units(5_000_000_000_000_000, 18);
        let draft = build_ethereum(0, 20_000_000_000, 21_000, [0x11u8; 20], 1_000_000_000_000_000_000, vec![], fee_cap, 61).unwrap();
        assert_eq!(draft.tx_id6.len(), 12);
        assert!(draft.tx_id6.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}
