//! Wallet details and native-currency transfers

use super::{parse_args, unknown_action, ActionProvider, ActionSpec};
use crate::contracts::parse_address;
use crate::provider::WalletProvider;
use crate::units::{format_amount, parse_amount};
use alloy::network::TransactionBuilder;
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use chainbot_error::Result;
use serde::Deserialize;

#[derive(Debug, Default)]
pub struct WalletActionProvider;

impl WalletActionProvider {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Deserialize)]
struct NativeTransferArgs {
    to: String,
    value: String,
}

async fn wallet_details(wallet: &dyn WalletProvider) -> Result<String> {
    let network = wallet.network();
    let balance = wallet.balance().await?;
    Ok(format!(
        "Wallet Details:\n\
         - Provider: {}\n\
         - Address: {}\n\
         - Network:\n  \
         * Network ID: {}\n  \
         * Chain ID: {}\n\
         - Native Balance: {} {}",
        wallet.name(),
        wallet.address(),
        network.id,
        network.chain_id,
        format_amount(balance, 18)?,
        network.native_symbol,
    ))
}

async fn native_transfer(wallet: &dyn WalletProvider, args: NativeTransferArgs) -> Result<String> {
    let to = parse_address(&args.to)?;
    let value = parse_amount(&args.value, 18)?;

    let request = TransactionRequest::default().with_to(to).with_value(value);
    let hash = wallet.send_transaction(request).await?;
    let receipt = wallet.wait_for_receipt(hash).await?;
    if !receipt.success {
        return Ok(format!(
            "Transfer of {} {} to {} reverted. Transaction hash: {}",
            args.value,
            wallet.network().native_symbol,
            to,
            hash
        ));
    }
    Ok(format!(
        "Transferred {} {} to {}.\nTransaction hash: {}",
        args.value,
        wallet.network().native_symbol,
        to,
        hash
    ))
}

#[async_trait]
impl ActionProvider for WalletActionProvider {
    fn name(&self) -> &'static str {
        "WalletActionProvider"
    }

    fn actions(&self) -> Vec<ActionSpec> {
        vec![
            ActionSpec {
                name: "get_wallet_details",
                description: "Get details about the wallet: provider, address, network and native balance.",
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {},
                    "required": []
                }),
            },
            ActionSpec {
                name: "native_transfer",
                description: "Transfer the network's native currency to another address. \
                              `value` is in whole units, e.g. 0.01 for 0.01 ETH.",
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "to": { "type": "string", "description": "Destination address (0x...)" },
                        "value": { "type": "string", "description": "Amount in whole units, e.g. \"0.01\"" }
                    },
                    "required": ["to", "value"]
                }),
            },
        ]
    }

    async fn invoke(
        &self,
        action: &str,
        wallet: &dyn WalletProvider,
        args: serde_json::Value,
    ) -> Result<String> {
        match action {
            "get_wallet_details" => wallet_details(wallet).await,
            "native_transfer" => native_transfer(wallet, parse_args(action, args)?).await,
            other => Err(unknown_action(self.name(), other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::testing::{input, MockWallet};
    use alloy::primitives::{TxKind, U256};

    #[tokio::test]
    async fn test_wallet_details() {
        let mut wallet = MockWallet::new("base-sepolia");
        wallet.balance = U256::from(1_250_000_000_000_000_000u128);

        let output = WalletActionProvider::new()
            .invoke("get_wallet_details", &wallet, serde_json::json!({}))
            .await
            .unwrap();

        assert!(output.contains("Network ID: base-sepolia"));
        assert!(output.contains("Chain ID: 84532"));
        assert!(output.contains("Native Balance: 1.25 ETH"));
    }

    #[tokio::test]
    async fn test_native_transfer_scales_value() {
        let wallet = MockWallet::new("base-sepolia");
        let output = WalletActionProvider::new()
            .invoke(
                "native_transfer",
                &wallet,
                serde_json::json!({
                    "to": "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
                    "value": "0.01"
                }),
            )
            .await
            .unwrap();

        let sent = wallet.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].value, Some(U256::from(10_000_000_000_000_000u64)));
        assert_eq!(
            sent[0].to,
            Some(TxKind::Call(parse_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap()))
        );
        assert!(input(&sent[0]).is_empty());
        assert!(output.starts_with("Transferred 0.01 ETH to 0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"));
    }

    #[tokio::test]
    async fn test_unknown_action() {
        let wallet = MockWallet::new("base-sepolia");
        let err = WalletActionProvider::new()
            .invoke("fly", &wallet, serde_json::json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), chainbot_error::ErrorKind::ToolNotFound);
    }
}
