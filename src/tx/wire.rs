//! Legacy Bitcoin-family wire serialization and sighash digests.
//!
//! This is hand-rolled rather than built on a Bitcoin-specific transaction
//! library: the coin set here spans several version-byte dialects of the
//! same wire format (Bitcoin, Bitcoin Cash, Litecoin, Zcash transparent),
//! and `registry.rs` already owns the per-coin parameter differences. The
//! wire format itself (varints, little-endian fields, legacy/BIP143
//! sighash) is public and stable, so reimplementing the few hundred bytes
//! of serialization logic needed here is simpler than adapting a
//! general-purpose chain library to a multi-coin model it wasn't shaped
//! for.

use crate::error::{CoinError, CoinResult};
use crate::hash::hash256;

pub(crate) fn encode_varint(n: u64) -> Vec<u8> {
    if n < 0xfd {
        vec![n as u8]
    } else if n <= 0xffff {
        let mut v = vec![0xfd];
        v.extend_from_slice(&(n as u16).to_le_bytes());
        v
    } else if n <= 0xffff_ffff {
        let mut v = vec![0xfe];
        v.extend_from_slice(&(n as u32).to_le_bytes());
        v
    } else {
        let mut v = vec![0xff];
        v.extend_from_slice(&n.to_le_bytes());
        v
    }
}

fn push_script(out: &mut Vec<u8>, script: &[u8]) {
    out.extend_from_slice(&encode_varint(script.len() as u64));
    out.extend_from_slice(script);
}

/// Txids are displayed reversed (big-endian hex) from their internal wire
/// byte order; this un-reverses a display-hex txid into wire order.
pub(crate) fn txid_to_internal_bytes(txid_hex: &str) -> CoinResult<[u8; 32]> {
    let bytes = hex::decode(txid_hex)?;
    if bytes.len() != 32 {
        return Err(CoinError::parse_error("txid must be 32 bytes"));
    }
    let mut internal = [0u8; 32];
    for (i, b) in bytes.iter().rev().enumerate() {
        internal[i] = *b;
    }
    Ok(internal)
}

#[derive(Debug, Clone)]
pub(crate) struct RawInput {
    pub prev_txid: [u8; 32],
    pub vout: u32,
    pub script_sig: Vec<u8>,
    pub sequence: u32,
}

#[derive(Debug, Clone)]
pub(crate) struct RawOutput {
    pub value: u64,
    pub script_pubkey: Vec<u8>,
}

pub(crate) fn serialize_tx(version: i32, inputs: &[RawInput], outputs: &[RawOutput], locktime: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&version.to_le_bytes());
    out.extend_from_slice(&encode_varint(inputs.len() as u64));
    for input in inputs {
        out.extend_from_slice(&input.prev_txid);
        out.extend_from_slice(&input.vout.to_le_bytes());
        push_script(&mut out, &input.script_sig);
        out.extend_from_slice(&input.sequence.to_le_bytes());
    }
    out.extend_from_slice(&encode_varint(outputs.len() as u64));
    for output in outputs {
        out.extend_from_slice(&output.value.to_le_bytes());
        push_script(&mut out, &output.script_pubkey);
    }
    out.extend_from_slice(&locktime.to_le_bytes());
    out
}

pub(crate) fn p2pkh_script(pubkey_hash: &[u8]) -> Vec<u8> {
    let mut s = Vec::with_capacity(25);
    s.push(0x76); // OP_DUP
    s.push(0xa9); // OP_HASH160
    s.push(0x14); // push 20
    s.extend_from_slice(pubkey_hash);
    s.push(0x88); // OP_EQUALVERIFY
    s.push(0xac); // OP_CHECKSIG
    s
}

pub(crate) fn p2sh_script(script_hash: &[u8]) -> Vec<u8> {
    let mut s = Vec::with_capacity(23);
    s.push(0xa9); // OP_HASH160
    s.push(0x14);
    s.extend_from_slice(script_hash);
    s.push(0x87); // OP_EQUAL
    s
}

pub(crate) fn segwit_v0_script(program: &[u8]) -> Vec<u8> {
    let mut s = Vec::with_capacity(2 + program.len());
    s.push(0x00); // witness version 0
    s.push(program.len() as u8);
    s.extend_from_slice(program);
    s
}

/// Classic (pre-BIP143) sighash: blank every scriptSig except the input
/// being signed (set to `script_code`), append the sighash type as a
/// little-endian u32, and double-SHA256 the result.
pub(crate) fn legacy_sighash(
    version: i32,
    inputs: &[RawInput],
    outputs: &[RawOutput],
    locktime: u32,
    signing_index: usize,
    script_code: &[u8],
    sighash_type: u32,
) -> [u8; 32] {
    let blanked: Vec<RawInput> = inputs
        .iter()
        .enumerate()
        .map(|(i, inp)| RawInput {
            prev_txid: inp.prev_txid,
            vout: inp.vout,
            script_sig: if i == signing_index { script_code.to_vec() } else { Vec::new() },
            sequence: inp.sequence,
        })
        .collect();
    let mut preimage = serialize_tx(version, &blanked, outputs, locktime);
    preimage.extend_from_slice(&sighash_type.to_le_bytes());
    hash256(&preimage)
}

/// BIP143 digest, reused verbatim by Bitcoin Cash's `ALL|FORKID` sighash
/// (the fork id is folded into the high bits of `sighash_type`, not into
/// the digest algorithm itself).
#[allow(clippy::too_many_arguments)]
pub(crate) fn bip143_sighash(
    inputs: &[RawInput],
    outputs: &[RawOutput],
    signing_index: usize,
    script_code: &[u8],
    value: u64,
    locktime: u32,
    sighash_type: u32,
) -> [u8; 32] {
    let mut prevouts = Vec::new();
    for inp in inputs {
        prevouts.extend_from_slice(&inp.prev_txid);
        prevouts.extend_from_slice(&inp.vout.to_le_bytes());
    }
    let hash_prevouts = hash256(&prevouts);

    let mut sequences = Vec::new();
    for inp in inputs {
        sequences.extend_from_slice(&inp.sequence.to_le_bytes());
    }
    let hash_sequence = hash256(&sequences);

    let mut outs = Vec::new();
    for out in outputs {
        outs.extend_from_slice(&out.value.to_le_bytes());
        outs.extend_from_slice(&encode_varint(out.script_pubkey.len() as u64));
        outs.extend_from_slice(&out.script_pubkey);
    }
    let hash_outputs = hash256(&outs);

    let input = &inputs[signing_index];
    let mut preimage = Vec::new();
    preimage.extend_from_slice(&hash_prevouts);
    preimage.extend_from_slice(&hash_sequence);
    preimage.extend_from_slice(&input.prev_txid);
    preimage.extend_from_slice(&input.vout.to_le_bytes());
    preimage.extend_from_slice(&encode_varint(script_code.len() as u64));
    preimage.extend_from_slice(script_code);
    preimage.extend_from_slice(&value.to_le_bytes());
    preimage.extend_from_slice(&input.sequence.to_le_bytes());
    preimage.extend_from_slice(&hash_outputs);
    preimage.extend_from_slice(&locktime.to_le_bytes());
    preimage.extend_from_slice(&sighash_type.to_le_bytes());
    hash256(&preimage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_boundaries() {
        assert_eq!(encode_varint(0xfc), vec![0xfc]);
        assert_eq!(encode_varint(0xfd), vec![0xfd, 0xfd, 0x00]);
        assert_eq!(encode_varint(0x1_0000), vec![0xfe, 0x00, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn txid_roundtrips_through_internal_order() {
        let hex_txid = "00".repeat(31) + "01";
        let internal = txid_to_internal_bytes(&hex_txid).unwrap();
        assert_eq!(internal[0], 0x01);
        assert_eq!(internal[31], 0x00);
    }

    #[test]
    fn p2pkh_script_shape() {
        let script = p2pkh_script(&[0u8; 20]);
        assert_eq!(script.len(), 25);
        assert_eq!(script[0], 0x76);
        assert_eq!(script[24], 0xac);
    }
}
