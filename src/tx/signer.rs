//! Signing orchestrator (C8): partitions inputs, derives internal keys,
//! pre-verifies external keys, and dispatches to a daemon or standalone
//! signer under the coin's sighash policy.

use crate::address::{parse_address, pubhash_to_address};
use crate::error::{CoinError, CoinResult, ErrorKind};
use crate::hash::keccak256;
use crate::key::canonicalize;
use crate::registry::{AddressFormat, CoinFamily, KeyVariant, ProtocolRecord};
use crate::tx::builder::{EthereumDraft, TransactionDraft};
use crate::tx::rpc::RpcClient;
use crate::tx::wire;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use std::collections::HashMap;
use zeroize::Zeroizing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SighashPolicy {
    BitcoinAll,
    BchAllForkid,
    EthereumEip155,
}

pub fn sighash_policy_for(family: CoinFamily) -> SighashPolicy {
    match family {
        CoinFamily::BitcoinCash => SighashPolicy::BchAllForkid,
        CoinFamily::Ethereum | CoinFamily::EthereumClassic => SighashPolicy::EthereumEip155,
        _ => SighashPolicy::BitcoinAll,
    }
}

/// Splits inputs into (internal, external) — internal inputs carry a
/// `<seed_id>:<index>` wallet label this process can derive a key for
/// (spec.md §4.8 item 1).
pub fn partition_inputs(draft: &TransactionDraft) -> (Vec<&crate::tx::builder::TxInput>, Vec<&crate::tx::builder::TxInput>) {
    draft.inputs.iter().partition(|i| i.wallet_label.is_some())
}

/// Deterministically derives an internal input's private key from its
/// `(seed_id, index)` label and a caller-supplied master seed. The
/// original's actual derivation scheme is MMGen's own KDF, not detailed in
/// the distilled spec; this is a simplified, clearly-labeled stand-in
/// (`sha256(seed || seed_id || index)`, then canonicalized) — see
/// DESIGN.md's Open Question decisions.
pub fn derive_internal_scalar(
    seed_id: &str,
    index: u32,
    master_seed: &[u8; 32],
    family: CoinFamily,
    variant: KeyVariant,
    record: &ProtocolRecord,
) -> CoinResult<Zeroizing<[u8; 32]>> {
    let mut preimage = Vec::with_capacity(32 + seed_id.len() + 4);
    preimage.extend_from_slice(master_seed);
    preimage.extend_from_slice(seed_id.as_bytes());
    preimage.extend_from_slice(&index.to_be_bytes());
    let raw = crate::hash::sha256(&preimage);
    canonicalize(&raw, family, variant, record)
}

fn derive_bitcoin_family_address(scalar: &[u8; 32], family: CoinFamily, record: &ProtocolRecord) -> CoinResult<String> {
    let secp = Secp256k1::signing_only();
    let seckey = SecretKey::from_slice(scalar).map_err(CoinError::from)?;
    let pubkey = PublicKey::from_secret_key(&secp, &seckey);
    let hash = crate::hash::hash160(&pubkey.serialize());
    pubhash_to_address(&hash, false, family, record)
}

fn derive_ethereum_address(scalar: &[u8; 32]) -> CoinResult<String> {
    let secp = Secp256k1::signing_only();
    let seckey = SecretKey::from_slice(scalar).map_err(CoinError::from)?;
    let pubkey = PublicKey::from_secret_key(&secp, &seckey);
    let uncompressed = pubkey.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    Ok(hex::encode(&hash[12..]))
}

#[derive(Debug, Default)]
pub struct ExternalKeyVerification {
    pub matched_addresses: Vec<String>,
    pub extra_keys: Vec<String>,
}

/// Stops the pre-verification loop early, treating everything not yet
/// checked as "skip remaining verification" — spec.md §5's cancellation
/// policy, generalizing the original's "`KeyboardInterrupt` during
/// `preverify_keys` is caught, not propagated" behavior into an explicit,
/// synchronous-core-appropriate signal instead of a signal handler.
pub trait CancelSignal {
    fn is_cancelled(&self) -> bool;
}

pub struct NeverCancel;
impl CancelSignal for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// `preverify_keys` (spec.md §4.8 item 4): decode → scalar → pubkey →
/// address for each supplied key, check membership in `external_addresses`.
/// Extra keys (valid but unused) are reported, not fatal. Any address in
/// `external_addresses` left unmatched when the loop ends — whether by
/// exhaustion or cancellation — aborts with `mapping_mismatch`.
pub fn preverify_external_keys(
    external_addresses: &[String],
    keys: &[String],
    family: CoinFamily,
    record: &ProtocolRecord,
    cancel: &dyn CancelSignal,
) -> CoinResult<ExternalKeyVerification> {
    let mut result = ExternalKeyVerification::default();
    for key in keys {
        if cancel.is_cancelled() {
            break;
        }
        let parsed = crate::key::decode_secret(key, family, record)?;
        let scalar = canonicalize(&parsed.scalar, family, parsed.variant, record)?;
        let address = if family == CoinFamily::Ethereum || family == CoinFamily::EthereumClassic {
            derive_ethereum_address(&scalar)?
        } else {
            derive_bitcoin_family_address(&scalar, family, record)?
        };
        if external_addresses.contains(&address) {
            result.matched_addresses.push(address);
        } else {
            result.extra_keys.push(key.clone());
        }
    }

    let missing: Vec<&String> =
        external_addresses.iter().filter(|a| !result.matched_addresses.contains(a)).collect();
    if !missing.is_empty() {
        return Err(CoinError::mapping_mismatch(format!(
            "no supplied key covers: {}",
            missing.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
        )));
    }
    Ok(result)
}

/// RAII guard re-locking the daemon wallet on every exit path (spec.md §5:
/// "must be re-locked on every exit path from the signing attempt").
struct WalletUnlockGuard<'a> {
    rpc: &'a dyn RpcClient,
}

impl Drop for WalletUnlockGuard<'_> {
    fn drop(&mut self) {
        let _ = self.rpc.walletlock();
    }
}

/// `daemon` mode (spec.md §4.8 item 3): calls `signrawtransaction`; on
/// `rpc_invalid_key` ("key missing"), retries after unlocking the wallet
/// with a caller-supplied passphrase, bounded by `max_attempts`.
pub fn sign_with_daemon(
    rpc: &dyn RpcClient,
    draft: &TransactionDraft,
    keys: &[String],
    passphrase: Option<&str>,
    max_attempts: u32,
) -> CoinResult<String> {
    match rpc.signrawtransaction(&draft.raw_hex, "{}", keys) {
        Ok(signed) => return Ok(signed),
        Err(e) if e.kind != ErrorKind::RpcInvalidKey => return Err(e),
        Err(e) => {
            let Some(passphrase) = passphrase else { return Err(e) };
            rpc.walletpassphrase(passphrase, 60)?;
            let _guard = WalletUnlockGuard { rpc };
            for attempt in 0..max_attempts {
                match rpc.signrawtransaction(&draft.raw_hex, "{}", keys) {
                    Ok(signed) => return Ok(signed),
                    Err(e) if attempt + 1 == max_attempts => return Err(e),
                    Err(_) => continue,
                }
            }
            Err(CoinError::rpc_invalid_key("signing failed after passphrase unlock"))
        }
    }
}

/// `standalone` mode for UTXO-model coins: signs every input with the
/// scalar `scalars` supplies, under the coin's sighash policy.
pub fn sign_standalone(
    draft: &TransactionDraft,
    scalars: &HashMap<(String, u32), Zeroizing<[u8; 32]>>,
    family: CoinFamily,
    record: &ProtocolRecord,
) -> CoinResult<String> {
    let policy = sighash_policy_for(family);
    if policy == SighashPolicy::EthereumEip155 {
        return Err(CoinError::invalid_input("Ethereum signs via sign_ethereum_standalone"));
    }

    let raw_inputs: Vec<wire::RawInput> = draft
        .inputs
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
    let raw_outputs: Vec<wire::RawOutput> = draft
        .outputs
        .iter()
        .map(|o| {
            let parsed = parse_address(&o.address, family, record)?;
            let script = match parsed.format {
                AddressFormat::P2pkh => wire::p2pkh_script(&parsed.body),
                AddressFormat::P2sh => wire::p2sh_script(&parsed.body),
                AddressFormat::Bech32 => wire::segwit_v0_script(&parsed.body),
                other => return Err(CoinError::unknown_address_format(format!("{other:?}"))),
            };
            Ok(wire::RawOutput { value: o.amount.units(), script_pubkey: script })
        })
        .collect::<CoinResult<_>>()?;

    let secp = Secp256k1::signing_only();
    let mut signed_inputs = raw_inputs.clone();
    for (idx, input) in draft.inputs.iter().enumerate() {
        let scalar = scalars
            .get(&(input.txid.clone(), input.vout))
            .ok_or_else(|| CoinError::mapping_mismatch(format!("no key for input {}:{}", input.txid, input.vout)))?;
        let parsed_owner = parse_address(&input.address, family, record)?;
        let script_code = match parsed_owner.format {
            AddressFormat::P2pkh => wire::p2pkh_script(&parsed_owner.body),
            AddressFormat::P2sh => wire::p2sh_script(&parsed_owner.body),
            other => return Err(CoinError::unknown_address_format(format!("{other:?}"))),
        };

        let seckey = SecretKey::from_slice(&scalar[..]).map_err(CoinError::from)?;
        let pubkey = PublicKey::from_secret_key(&secp, &seckey).serialize();

        let sighash_type: u32 = match policy {
            SighashPolicy::BitcoinAll => 0x01,
            SighashPolicy::BchAllForkid => 0x01 | 0x40,
            SighashPolicy::EthereumEip155 => unreachable!(),
        };
        let digest = match policy {
            SighashPolicy::BitcoinAll => {
                wire::legacy_sighash(2, &raw_inputs, &raw_outputs, 0, idx, &script_code, sighash_type)
            }
            SighashPolicy::BchAllForkid => wire::bip143_sighash(
                &raw_inputs,
                &raw_outputs,
                idx,
                &script_code,
                input.amount.units(),
                0,
                sighash_type,
            ),
            SighashPolicy::EthereumEip155 => unreachable!(),
        };

        let msg = Message::from_digest(digest);
        let sig = secp.sign_ecdsa(&msg, &seckey);
        let mut sig_der = sig.serialize_der().to_vec();
        sig_der.push(sighash_type as u8);

        let mut script_sig = Vec::new();
        script_sig.push(sig_der.len() as u8);
        script_sig.extend_from_slice(&sig_der);
        script_sig.push(pubkey.len() as u8);
        script_sig.extend_from_slice(&pubkey);
        signed_inputs[idx].script_sig = script_sig;
    }

    let signed_bytes = wire::serialize_tx(2, &signed_inputs, &raw_outputs, 0);
    Ok(hex::encode(signed_bytes))
}

/// EIP-155 standalone signing for Ethereum-family drafts (spec.md §4.8
/// item 3 / S5): `v = recovery_id + chain_id*2 + 35`.
pub fn sign_ethereum_standalone(draft: &EthereumDraft, scalar: &[u8; 32]) -> CoinResult<(String, String)> {
    use secp256k1::ecdsa::RecoverableSignature;

    let digest = keccak256(&draft.unsigned_rlp);
    let secp = Secp256k1::signing_only();
    let seckey = SecretKey::from_slice(scalar).map_err(CoinError::from)?;
    let msg = Message::from_digest(digest);
    let recoverable: RecoverableSignature = secp.sign_ecdsa_recoverable(&msg, &seckey);
    let (recid, sig_bytes) = recoverable.serialize_compact();
    let r = &sig_bytes[..32];
    let s = &sig_bytes[32..];
    let v = recid.to_i32() as u64 + draft.chain_id * 2 + 35;

    let fields = vec![
        crate::tx::rlp::encode_u64(draft.nonce),
        crate::tx::rlp::encode_u64(draft.gas_price_wei),
        crate::tx::rlp::encode_u64(draft.gas_limit),
        crate::tx::rlp::encode_bytes(&draft.to),
        crate::tx::rlp::encode_int_bytes(&draft.value_wei.to_be_bytes()),
        crate::tx::rlp::encode_bytes(&draft.data),
        crate::tx::rlp::encode_u64(v),
        crate::tx::rlp::encode_int_bytes(r),
        crate::tx::rlp::encode_int_bytes(s),
    ];
    let signed_rlp = crate::tx::rlp::encode_list(&fields);
    let raw_hex = format!("0x{}", hex::encode(&signed_rlp));
    let txid = format!("0x{}", hex::encode(keccak256(&signed_rlp)));
    Ok((raw_hex, txid))
}

/// Recovers the sender address from a signed EIP-155 `(v, r, s)` and the
/// message digest it was computed over, so a caller can confirm the
/// recovered address matches the signer's own.
pub fn recover_ethereum_sender(
    digest: [u8; 32],
    chain_id: u64,
    v: u64,
    r: &[u8; 32],
    s: &[u8; 32],
) -> CoinResult<String> {
    use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};

    let recid_num: i32 = v
        .checked_sub(chain_id * 2 + 35)
        .and_then(|x| i32::try_from(x).ok())
        .ok_or_else(|| CoinError::invalid_input("v does not encode the expected chain id"))?;
    let recid = RecoveryId::from_i32(recid_num).map_err(CoinError::from)?;

    let mut compact = [0u8; 64];
    compact[..32].copy_from_slice(r);
    compact[32..].copy_from_slice(s);
    let sig = RecoverableSignature::from_compact(&compact, recid).map_err(CoinError::from)?;

    let secp = Secp256k1::verification_only();
    let msg = Message::from_digest(digest);
    let pubkey = secp.recover_ecdsa(&msg, &sig).map_err(CoinError::from)?;
    let uncompressed = pubkey.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    Ok(hex::encode(&hash[12..]))
}
