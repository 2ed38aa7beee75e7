//! RPC collaborator (C8): the bitcoind-family methods this crate calls
//! into, as a trait with no transport implementation. HTTP/JSON-RPC
//! framing, connection pooling, and daemon process supervision are out of
//! scope (spec.md §1/§6) — callers supply a concrete implementation that
//! talks to an actual daemon.

use crate::error::CoinResult;

/// One row of `listunspent`'s output, before it's turned into an
/// [`crate::tx::select::UnspentOutput`].
#[derive(Debug, Clone)]
pub struct RpcUnspentEntry {
    pub txid: String,
    pub vout: u32,
    pub address: String,
    pub amount: String,
    pub confirmations: u32,
}

/// The bitcoind-family RPC surface named in spec.md §6. Every method is a
/// blocking synchronous call (spec.md §5: "RPC calls ... are blocking
/// synchronous calls; their latency is the dominant wall-clock cost").
pub trait RpcClient {
    fn decoderawtransaction(&self, raw_hex: &str) -> CoinResult<String>;
    fn createrawtransaction(&self, inputs_json: &str, outputs_json: &str) -> CoinResult<String>;
    fn signrawtransaction(&self, raw_hex: &str, sig_data_json: &str, keys: &[String]) -> CoinResult<String>;
    fn sendrawtransaction(&self, signed_hex: &str) -> CoinResult<String>;
    fn listunspent(&self, min_confirmations: u32) -> CoinResult<Vec<RpcUnspentEntry>>;
    fn listaccounts(&self) -> CoinResult<Vec<String>>;
    fn getaddressesbyaccount(&self, account: &str) -> CoinResult<Vec<String>>;
    fn walletpassphrase(&self, passphrase: &str, timeout_secs: u32) -> CoinResult<()>;
    fn walletlock(&self) -> CoinResult<()>;
}
