//! Wrap ETH into WETH on Base

use super::{parse_args, unknown_action, ActionProvider, ActionSpec};
use crate::contracts::{IWETH, WETH_ADDRESS};
use crate::network::Network;
use crate::provider::WalletProvider;
use alloy::network::TransactionBuilder;
use alloy::primitives::U256;
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use chainbot_error::{Error, Result};
use serde::Deserialize;

#[derive(Debug, Default)]
pub struct WethActionProvider;

impl WethActionProvider {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Deserialize)]
struct WrapEthArgs {
    amount_to_wrap: String,
}

async fn wrap_eth(wallet: &dyn WalletProvider, args: WrapEthArgs) -> Result<String> {
    let amount = U256::from_str_radix(args.amount_to_wrap.trim(), 10).map_err(|_| {
        Error::invalid_argument(format!(
            "amount_to_wrap '{}' must be a whole number of wei",
            args.amount_to_wrap
        ))
    })?;
    if amount.is_zero() {
        return Err(Error::invalid_argument("amount_to_wrap must be greater than 0"));
    }

    let request = TransactionRequest::default()
        .with_to(WETH_ADDRESS)
        .with_value(amount)
        .with_input(IWETH::depositCall {}.abi_encode());
    let hash = wallet.send_transaction(request).await?;
    let receipt = wallet.wait_for_receipt(hash).await?;
    if !receipt.success {
        return Ok(format!("Wrapping {} wei reverted. Transaction hash: {}", amount, hash));
    }
    Ok(format!("Wrapped {} wei of ETH into WETH.\nTransaction hash: {}", amount, hash))
}

#[async_trait]
impl ActionProvider for WethActionProvider {
    fn name(&self) -> &'static str {
        "WethActionProvider"
    }

    fn supports_network(&self, network: &Network) -> bool {
        network.is_base()
    }

    fn actions(&self) -> Vec<ActionSpec> {
        vec![ActionSpec {
            name: "wrap_eth",
            description: "Wrap ETH into WETH. `amount_to_wrap` is in wei \
                          (1 ETH = 1000000000000000000 wei).",
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "amount_to_wrap": { "type": "string", "description": "Amount of ETH to wrap, in wei" }
                },
                "required": ["amount_to_wrap"]
            }),
        }]
    }

    async fn invoke(
        &self,
        action: &str,
        wallet: &dyn WalletProvider,
        args: serde_json::Value,
    ) -> Result<String> {
        match action {
            "wrap_eth" => wrap_eth(wallet, parse_args(action, args)?).await,
            other => Err(unknown_action(self.name(), other)),
        }
    }
}
