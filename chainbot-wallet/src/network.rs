//! Known EVM networks

use chainbot_error::{Error, Result};
use std::fmt;

/// The network used when none is configured
pub const DEFAULT_NETWORK_ID: &str = "base-sepolia";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub id: String,
    pub chain_id: u64,
    pub rpc_url: String,
    pub native_symbol: &'static str,
}

const KNOWN: &[(&str, u64, &str, &str)] = &[
    ("base-sepolia", 84532, "https://sepolia.base.org", "ETH"),
    ("base-mainnet", 8453, "https://mainnet.base.org", "ETH"),
    ("ethereum-mainnet", 1, "https://eth.llamarpc.com", "ETH"),
    ("ethereum-sepolia", 11155111, "https://rpc.sepolia.org", "ETH"),
    ("arbitrum-mainnet", 42161, "https://arb1.arbitrum.io/rpc", "ETH"),
    ("polygon-mainnet", 137, "https://polygon-rpc.com", "POL"),
];

impl Network {
    /// Look up a network by id, e.g. `base-sepolia`
    pub fn from_id(id: &str) -> Result<Self> {
        let id = id.trim();
        KNOWN
            .iter()
            .find(|(known, ..)| known.eq_ignore_ascii_case(id))
            .map(|&(id, chain_id, rpc_url, native_symbol)| Network {
                id: id.to_string(),
                chain_id,
                rpc_url: rpc_url.to_string(),
                native_symbol,
            })
            .ok_or_else(|| {
                Error::config_invalid(format!(
                    "unknown network '{}'; expected one of {}",
                    id,
                    Self::known_ids().join(", ")
                ))
            })
    }

    pub fn known_ids() -> Vec<&'static str> {
        KNOWN.iter().map(|(id, ..)| *id).collect()
    }

    /// Point at a different JSON-RPC endpoint
    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }

    pub fn is_base(&self) -> bool {
        self.id == "base-sepolia" || self.id == "base-mainnet"
    }
}

impl Default for Network {
    fn default() -> Self {
        Network {
            id: DEFAULT_NETWORK_ID.to_string(),
            chain_id: 84532,
            rpc_url: "https://sepolia.base.org".to_string(),
            native_symbol: "ETH",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (chain {})", self.id, self.chain_id)
    }
}
