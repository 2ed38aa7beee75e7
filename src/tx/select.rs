//! Unspent-output sorting, filtering, and index-based selection (the pure
//! half of C7). The original's `sort_and_view` /
//! `format_unspent_outputs_for_printing` couple this to a terminal pager;
//! here the sortable/filterable/selectable data model is separated from
//! rendering, which is left to an external collaborator.

use crate::amount::CoinAmount;
use crate::error::{CoinError, CoinResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnspentOutput {
    pub txid: String,
    pub vout: u32,
    pub address: String,
    pub amount: CoinAmount,
    pub confirmations: u32,
    /// `Some("<seed_id>:<index>")` for outputs this process can derive a
    /// key for; `None` for outputs requiring an external key file.
    pub wallet_label: Option<String>,
}

impl UnspentOutput {
    pub fn is_internal(&self) -> bool {
        self.wallet_label.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Amount,
    Confirmations,
    Txid,
}

/// Sorts a copy of `outputs`; does not mutate the caller's slice.
pub fn sort_unspent(outputs: &[UnspentOutput], key: SortKey, descending: bool) -> Vec<UnspentOutput> {
    let mut sorted = outputs.to_vec();
    sorted.sort_by(|a, b| {
        let ord = match key {
            SortKey::Amount => a.amount.cmp(&b.amount),
            SortKey::Confirmations => a.confirmations.cmp(&b.confirmations),
            SortKey::Txid => a.txid.cmp(&b.txid),
        };
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
    sorted
}

/// Keeps only outputs with at least `min_confirmations`. Zero-confirmation
/// outputs are not an error (spec.md §4.7: "permitted but reported"); this
/// is purely an opt-in display/selection filter.
pub fn filter_by_confirmations(outputs: &[UnspentOutput], min_confirmations: u32) -> Vec<UnspentOutput> {
    outputs.iter().filter(|o| o.confirmations >= min_confirmations).cloned().collect()
}

/// Resolves 1-based indices (as shown to the user) against `outputs`,
/// preserving the order the indices were given in.
pub fn select_by_indices(outputs: &[UnspentOutput], indices: &[usize]) -> CoinResult<Vec<UnspentOutput>> {
    indices
        .iter()
        .map(|&i| {
            if i == 0 || i > outputs.len() {
                return Err(CoinError::invalid_input(format!("{i}: index out of range")));
            }
            Ok(outputs[i - 1].clone())
        })
        .collect()
}
