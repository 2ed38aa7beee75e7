//! Address-file codec (C6): the persisted
//! `<seed_id> { <index> <address> [<label>] ... }` format.
//!
//! Grammar grounded on `examples/original_source/mmgen/tx.py::parse_addrs_file`
//! (seed-id line, brace-delimited body, comment/blank-line stripping),
//! generalized to validate addresses via `address::parse_address` under
//! whichever protocol record the caller supplies.

use crate::address::parse_address;
use crate::error::{CoinError, CoinResult};
use crate::registry::{CoinFamily, ProtocolRecord};

/// Maximum label length in bytes (spec.md §4.6: "bounded in length").
pub const MAX_LABEL_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddrEntry {
    pub index: u32,
    pub address: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddrFile {
    pub seed_id: String,
    pub entries: Vec<AddrEntry>,
}

fn is_seed_id(s: &str) -> bool {
    s.len() == 8 && s.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_lowercase())
}

/// A positive decimal with no leading zero.
fn is_mmgen_num(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| b.is_ascii_digit())
        && !(s.len() > 1 && s.starts_with('0'))
        && s != "0"
}

fn check_label(label: &str) -> CoinResult<()> {
    if label.len() > MAX_LABEL_LEN {
        return Err(CoinError::invalid_input(format!(
            "label exceeds {MAX_LABEL_LEN} bytes"
        )));
    }
    if !label.bytes().all(|b| (0x20..=0x7e).contains(&b)) {
        return Err(CoinError::invalid_input("label must be printable ASCII"));
    }
    Ok(())
}

/// Strips full-line `#` comments and blank lines, the way
/// `get_lines_from_file(..., remove_comments=True)` does in the original.
fn strip_comments(content: &str) -> Vec<&str> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty())
        .collect()
}

pub fn parse(content: &str, family: CoinFamily, record: &ProtocolRecord) -> CoinResult<AddrFile> {
    let lines = strip_comments(content);
    let first = lines.first().ok_or_else(|| CoinError::parse_error("empty address file"))?;
    let mut header = first.split_whitespace();
    let seed_id = header
        .next()
        .ok_or_else(|| CoinError::parse_error(format!("invalid first line: {first}")))?;
    let obrace = header.next().unwrap_or("");
    if obrace != "{" {
        return Err(CoinError::parse_error(format!("{first}: invalid first line")));
    }
    if !is_seed_id(seed_id) {
        return Err(CoinError::parse_error(format!("{seed_id}: invalid seed ID")));
    }
    let last = lines.last().ok_or_else(|| CoinError::parse_error("missing closing brace"))?;
    if *last != "}" {
        return Err(CoinError::parse_error(format!("{last}: invalid last line")));
    }

    let mut entries = Vec::new();
    for line in &lines[1..lines.len() - 1] {
        let mut parts = line.splitn(3, char::is_whitespace);
        let index_str = parts.next().unwrap_or("");
        let rest = line[index_str.len()..].trim_start();
        let mut rest_parts = rest.splitn(2, char::is_whitespace);
        let address = rest_parts.next().unwrap_or("");
        let label = rest_parts.next().map(str::trim).filter(|s| !s.is_empty());

        if !is_mmgen_num(index_str) {
            return Err(CoinError::parse_error(format!("{index_str}: invalid address index")));
        }
        let index: u32 = index_str
            .parse()
            .map_err(|_| CoinError::parse_error(format!("{index_str}: index overflow")))?;
        parse_address(address, family, record)?;
        if let Some(label) = label {
            check_label(label)?;
        }
        entries.push(AddrEntry { index, address: address.to_string(), label: label.map(str::to_string) });
    }

    Ok(AddrFile { seed_id: seed_id.to_string(), entries })
}

/// Writes are deterministic: entries are sorted by index regardless of
/// insertion order.
pub fn write(file: &AddrFile) -> String {
    let mut entries = file.entries.clone();
    entries.sort_by_key(|e| e.index);

    let mut out = format!("{} {{\n", file.seed_id);
    for entry in &entries {
        match &entry.label {
            Some(label) => out.push_str(&format!("  {} {} {}\n", entry.index, entry.address, label)),
            None => out.push_str(&format!("  {} {}\n", entry.index, entry.address)),
        }
    }
    out.push_str("}\n");
    out
}
