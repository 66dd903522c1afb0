//! # Action Providers
//!
//! An action provider groups related on-chain actions. Each action is exposed
//! to the model as a tool named `<ProviderName>_<action>`.
//!
//! Failures inside an action are reported back to the model as text; they
//! never abort the session.

pub mod cdp_api;
pub mod cdp_wallet;
pub mod erc20;
pub mod pyth;
pub mod wallet;
pub mod weth;

pub use cdp_api::CdpApiActionProvider;
pub use cdp_wallet::CdpWalletActionProvider;
pub use erc20::Erc20ActionProvider;
pub use pyth::PythActionProvider;
pub use wallet::WalletActionProvider;
pub use weth::WethActionProvider;

use crate::network::Network;
use crate::provider::WalletProvider;
use async_trait::async_trait;
use chainbot_error::{Error, Result};
use chainbot_llm::{Tool, ToolDefinition};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

/// Name, description and argument schema of one action
#[derive(Debug, Clone)]
pub struct ActionSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: serde_json::Value,
}

#[async_trait]
pub trait ActionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the actions can run on `network`
    fn supports_network(&self, _network: &Network) -> bool {
        true
    }

    fn actions(&self) -> Vec<ActionSpec>;

    /// Run `action` with already-parsed JSON arguments
    async fn invoke(
        &self,
        action: &str,
        wallet: &dyn WalletProvider,
        args: serde_json::Value,
    ) -> Result<String>;
}

/// Deserialize action arguments into their typed form
pub(crate) fn parse_args<T: DeserializeOwned>(action: &str, args: serde_json::Value) -> Result<T> {
    serde_json::from_value(args)
        .map_err(|e| Error::invalid_argument(format!("invalid arguments for {}: {}", action, e)))
}

pub(crate) fn unknown_action(provider: &str, action: &str) -> Error {
    Error::tool_not_found(format!("{}_{}", provider, action))
}

/// One action bound to a wallet, usable as a model tool
pub struct ActionTool {
    provider: Arc<dyn ActionProvider>,
    wallet: Arc<dyn WalletProvider>,
    spec: ActionSpec,
}

impl ActionTool {
    pub fn new(
        provider: Arc<dyn ActionProvider>,
        wallet: Arc<dyn WalletProvider>,
        spec: ActionSpec,
    ) -> Self {
        Self {
            provider,
            wallet,
            spec,
        }
    }

    fn tool_name(&self) -> String {
        format!("{}_{}", self.provider.name(), self.spec.name)
    }
}

#[async_trait]
impl Tool for ActionTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.tool_name(), self.spec.description)
            .with_parameters(self.spec.parameters.clone())
    }

    fn name(&self) -> String {
        self.tool_name()
    }

    async fn call(&self, arguments: &str) -> Result<String> {
        let name = self.tool_name();
        let args = if arguments.trim().is_empty() {
            serde_json::json!({})
        } else {
            match serde_json::from_str(arguments) {
                Ok(args) => args,
                Err(e) => {
                    warn!(tool = %name, error = %e, "tool arguments are not JSON");
                    return Ok(format!("Error executing {}: arguments are not valid JSON: {}", name, e));
                }
            }
        };

        debug!(tool = %name, "invoking action");
        match self
            .provider
            .invoke(self.spec.name, self.wallet.as_ref(), args)
            .await
        {
            Ok(output) => Ok(output),
            Err(e) => {
                warn!(tool = %name, error = %e, "action failed");
                Ok(format!("Error executing {}: {}", name, e.message()))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A scripted wallet for action tests

    use super::*;
    use crate::provider::TransactionReceipt;
    use alloy::primitives::{Address, Bytes, Signature, TxHash, U256};
    use alloy::rpc::types::TransactionRequest;
    use alloy::signers::local::PrivateKeySigner;
    use alloy::signers::Signer;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    pub(crate) struct MockWallet {
        pub network: Network,
        pub signer: PrivateKeySigner,
        pub balance: U256,
        pub call_results: Mutex<VecDeque<Bytes>>,
        pub calls: Mutex<Vec<TransactionRequest>>,
        pub sent: Mutex<Vec<TransactionRequest>>,
        pub receipt_success: bool,
        pub contract_address: Option<Address>,
    }

    impl MockWallet {
        pub(crate) fn new(network_id: &str) -> Self {
            Self {
                network: Network::from_id(network_id).unwrap(),
                signer: TEST_KEY.parse().unwrap(),
                balance: U256::ZERO,
                call_results: Mutex::new(VecDeque::new()),
                calls: Mutex::new(Vec::new()),
                sent: Mutex::new(Vec::new()),
                receipt_success: true,
                contract_address: None,
            }
        }

        /// Queue one ABI-encoded `uint256` return word
        pub(crate) fn push_uint(&self, value: U256) {
            let word = Bytes::from(value.to_be_bytes::<32>().to_vec());
            self.call_results.lock().unwrap().push_back(word);
        }

        pub(crate) fn sent(&self) -> Vec<TransactionRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    /// Calldata of a recorded request
    pub(crate) fn input(tx: &TransactionRequest) -> Bytes {
        tx.input.input().cloned().unwrap_or_default()
    }

    #[async_trait]
    impl WalletProvider for MockWallet {
        fn name(&self) -> &str {
            "mock_wallet"
        }

        fn address(&self) -> Address {
            self.signer.address()
        }

        fn network(&self) -> &Network {
            &self.network
        }

        fn export(&self) -> Result<String> {
            Ok("{}".into())
        }

        async fn balance(&self) -> Result<U256> {
            Ok(self.balance)
        }

        async fn call(&self, tx: TransactionRequest) -> Result<Bytes> {
            self.calls.lock().unwrap().push(tx);
            self.call_results
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| Error::rpc_failed("eth_call", "execution reverted"))
        }

        async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
            let mut sent = self.sent.lock().unwrap();
            sent.push(tx);
            Ok(TxHash::with_last_byte(sent.len() as u8))
        }

        async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TransactionReceipt> {
            Ok(TransactionReceipt {
                transaction_hash: tx_hash,
                success: self.receipt_success,
                block_number: Some(1),
                contract_address: self.contract_address,
            })
        }

        async fn sign_message(&self, message: &str) -> Result<Signature> {
            self.signer
                .sign_message(message.as_bytes())
                .await
                .map_err(|e| Error::unexpected(e.to_string()))
        }
    }
}
