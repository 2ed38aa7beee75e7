//! Explicit process context, replacing the source's global `(coin, network,
//! protocol)` singleton (spec.md §9 "Global process state").
//!
//! Every operation that needs to know which coin or network it's running
//! against takes a `Network` (and, where relevant, a symbol) as an explicit
//! argument rather than reading thread-local or global state. Construction
//! happens once, at the top of a CLI invocation, the same way the source's
//! `init_coin` is called once at startup — but the result is a value passed
//! down, not a process-wide singleton reassigned by later calls.

/// Which chain tip a protocol record is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
}

impl Network {
    pub fn is_testnet(self) -> bool {
        !matches!(self, Network::Mainnet)
    }
}

/// Locates a coin daemon's config/data directory, following the `HOME`
/// (POSIX) / `APPDATA` (Windows) resolution rule from spec.md §6. This is a
/// pure value type: no filesystem access happens here, since RPC transport
/// and daemon process management are out of scope (spec.md §1).
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub coin_data_subdir: &'static str,
    pub network: Network,
    pub testnet_subdir: Option<&'static str>,
}

impl DaemonConfig {
    pub fn new(coin_data_subdir: &'static str, network: Network, testnet_subdir: Option<&'static str>) -> Self {
        Self { coin_data_subdir, network, testnet_subdir }
    }

    /// The path segment appended to `HOME`/`APPDATA` to reach the daemon's
    /// data directory, e.g. `.bitcoin/testnet3` on POSIX testnet.
    pub fn data_path_suffix(&self) -> String {
        match (self.network.is_testnet(), self.testnet_subdir) {
            (true, Some(sub)) => format!("{}/{}", self.coin_data_subdir, sub),
            _ => self.coin_data_subdir.to_string(),
        }
    }

    /// Resolves the base directory the daemon config lives under, given the
    /// platform's home-directory environment variables. Returns `None` if
    /// neither variable is set — the caller (CLI front-end, out of scope)
    /// decides how to surface that.
    pub fn base_dir(home: Option<&str>, appdata: Option<&str>) -> Option<String> {
        appdata.map(str::to_string).or_else(|| home.map(str::to_string))
    }
}
