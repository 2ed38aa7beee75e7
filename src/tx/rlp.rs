//! Minimal RLP encoder: just enough to build and sign Ethereum-family
//! transactions (`[nonce, gasPrice, gasLimit, to, value, data, v, r, s]`),
//! not a general-purpose RLP implementation.

fn encode_length(len: usize, offset: u8) -> Vec<u8> {
    if len < 56 {
        vec![offset + len as u8]
    } else {
        let len_bytes = len.to_be_bytes();
        let trimmed: Vec<u8> = len_bytes.iter().copied().skip_while(|&b| b == 0).collect();
        let mut out = vec![offset + 55 + trimmed.len() as u8];
        out.extend_from_slice(&trimmed);
        out
    }
}

/// A byte string, RLP-encoded verbatim — no leading-zero stripping. This is
/// the rule for genuine byte strings (`to`, `data`): a `to` address with a
/// leading `0x00` byte or an all-zero `data` payload must round-trip intact.
pub(crate) fn encode_bytes(data: &[u8]) -> Vec<u8> {
    if data.len() == 1 && data[0] < 0x80 {
        return data.to_vec();
    }
    let mut out = encode_length(data.len(), 0x80);
    out.extend_from_slice(data);
    out
}

/// A byte string representing an unsigned integer, RLP-encoded with leading
/// zero bytes stripped (RLP integers have no canonical width). Use this for
/// `nonce`/`gasPrice`/`gasLimit`/`value`/`v`/`r`/`s` — never for `to`/`data`.
pub(crate) fn encode_int_bytes(data: &[u8]) -> Vec<u8> {
    let mut start = 0;
    while start < data.len() && data[start] == 0 {
        start += 1;
    }
    encode_bytes(&data[start..])
}

pub(crate) fn encode_u64(n: u64) -> Vec<u8> {
    encode_int_bytes(&n.to_be_bytes())
}

pub(crate) fn encode_list(items: &[Vec<u8>]) -> Vec<u8> {
    let body: Vec<u8> = items.concat();
    let mut out = encode_length(body.len(), 0xc0);
    out.extend_from_slice(&body);
    out
}
