//! # chainbot Wallet
//!
//! Everything on the chain side of chainbot.
//!
//! ## Core Concepts
//! - **WalletStore**: where the exported wallet blob is persisted between runs
//! - **WalletProvider**: one signing key on one network, reached through an alloy provider
//! - **ActionProvider**: a family of on-chain actions (ERC-20, WETH, faucet, ...)
//! - **AgentKit**: the wallet plus its action providers, turned into model tools

pub mod action;
pub mod agentkit;
pub mod cdp;
pub mod contracts;
pub mod network;
pub mod provider;
pub mod store;
pub mod units;

pub use action::{
    ActionProvider, ActionSpec, ActionTool, CdpApiActionProvider, CdpWalletActionProvider,
    Erc20ActionProvider, PythActionProvider, WalletActionProvider, WethActionProvider,
};
pub use agentkit::{get_tools, AgentKit};
pub use cdp::{CdpClient, CdpCredentials, FaucetAsset};
pub use contracts::{parse_address, WETH_ADDRESS};
pub use network::{Network, DEFAULT_NETWORK_ID};
pub use provider::{
    EvmWalletProvider, TransactionReceipt, WalletData, WalletProvider, WalletProviderConfig,
};
pub use store::{FileWalletStore, MemoryWalletStore, WalletStore, DEFAULT_WALLET_DATA_FILE};
