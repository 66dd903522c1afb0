//! ERC-20 balances and transfers

use super::{parse_args, unknown_action, ActionProvider, ActionSpec};
use crate::contracts::{parse_address, IERC20};
use crate::provider::WalletProvider;
use crate::units::{format_amount, parse_amount};
use alloy::network::TransactionBuilder;
use alloy::primitives::Address;
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use chainbot_error::{Error, Result};
use serde::Deserialize;

#[derive(Debug, Default)]
pub struct Erc20ActionProvider;

impl Erc20ActionProvider {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Deserialize)]
struct GetBalanceArgs {
    contract_address: String,
}

#[derive(Deserialize)]
struct TransferArgs {
    amount: String,
    contract_address: String,
    destination: String,
}

/// `eth_call` a view function on `token` and decode its return value
async fn view<C: SolCall>(
    wallet: &dyn WalletProvider,
    token: Address,
    call: C,
) -> Result<C::Return> {
    let request = TransactionRequest::default()
        .with_to(token)
        .with_input(call.abi_encode());
    let output = wallet.call(request).await?;
    C::abi_decode_returns(&output).map_err(|e| {
        Error::parse_failed(format!("unexpected {} output from {}: {}", C::SIGNATURE, token, e))
    })
}

async fn get_balance(wallet: &dyn WalletProvider, args: GetBalanceArgs) -> Result<String> {
    let token = parse_address(&args.contract_address)?;
    let owner = wallet.address();
    let balance = view(wallet, token, IERC20::balanceOfCall { owner }).await?;
    let decimals = view(wallet, token, IERC20::decimalsCall {}).await?;

    Ok(format!(
        "Balance of {} is {}",
        token,
        format_amount(balance, decimals)?
    ))
}

async fn transfer(wallet: &dyn WalletProvider, args: TransferArgs) -> Result<String> {
    let token = parse_address(&args.contract_address)?;
    let destination = parse_address(&args.destination)?;
    let decimals = view(wallet, token, IERC20::decimalsCall {}).await?;
    let amount = parse_amount(&args.amount, decimals)?;

    let request = TransactionRequest::default().with_to(token).with_input(
        IERC20::transferCall {
            to: destination,
            amount,
        }
        .abi_encode(),
    );
    let hash = wallet.send_transaction(request).await?;
    let receipt = wallet.wait_for_receipt(hash).await?;
    if !receipt.success {
        return Ok(format!(
            "Transfer of {} of {} to {} reverted. Transaction hash: {}",
            args.amount, token, destination, hash
        ));
    }

    Ok(format!(
        "Transferred {} of {} to {}.\nTransaction hash for the transfer: {}",
        args.amount, token, destination, hash
    ))
}

#[async_trait]
impl ActionProvider for Erc20ActionProvider {
    fn name(&self) -> &'static str {
        "Erc20ActionProvider"
    }

    fn actions(&self) -> Vec<ActionSpec> {
        vec![
            ActionSpec {
                name: "get_balance",
                description: "Get the wallet's balance of an ERC-20 token, in whole units.",
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "contract_address": { "type": "string", "description": "The ERC-20 token contract address" }
                    },
                    "required": ["contract_address"]
                }),
            },
            ActionSpec {
                name: "transfer",
                description: "Transfer an amount of an ERC-20 token to a destination address. \
                              `amount` is in whole units; it is scaled by the token's decimals.",
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "amount": { "type": "string", "description": "Amount in whole units, e.g. \"10.5\"" },
                        "contract_address": { "type": "string", "description": "The ERC-20 token contract address" },
                        "destination": { "type": "string", "description": "Recipient address (0x...)" }
                    },
                    "required": ["amount", "contract_address", "destination"]
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
            "get_balance" => get_balance(wallet, parse_args(action, args)?).await,
            "transfer" => transfer(wallet, parse_args(action, args)?).await,
            other => Err(unknown_action(self.name(), other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::testing::{input, MockWallet};
    use alloy::primitives::{TxKind, U256};

    const USDC: &str = "0x036CbD53842c5426634e7929541eC2318f3dCF7e";

    #[tokio::test]
    async fn test_get_balance_formats_with_decimals() {
        let wallet = MockWallet::new("base-sepolia");
        wallet.push_uint(U256::from(2_500_000u32));
        wallet.push_uint(U256::from(6u8));

        let output = Erc20ActionProvider::new()
            .invoke("get_balance", &wallet, serde_json::json!({ "contract_address": USDC }))
            .await
            .unwrap();
        let usdc = parse_address(USDC).unwrap();
        assert_eq!(output, format!("Balance of {} is 2.5", usdc));

        let calls = wallet.calls.lock().unwrap();
        assert_eq!(&input(&calls[0])[..4], IERC20::balanceOfCall::SELECTOR.as_slice());
        assert_eq!(&input(&calls[1])[..4], IERC20::decimalsCall::SELECTOR.as_slice());
    }

    #[tokio::test]
    async fn test_get_balance_above_u128() {
        let wallet = MockWallet::new("base-sepolia");
        wallet.push_uint(U256::from(2u8).pow(U256::from(128u8)));
        wallet.push_uint(U256::from(18u8));

        let output = Erc20ActionProvider::new()
            .invoke("get_balance", &wallet, serde_json::json!({ "contract_address": USDC }))
            .await
            .unwrap();
        assert_eq!(
            output,
            format!(
                "Balance of {} is 340282366920938463463.374607431768211456",
                parse_address(USDC).unwrap()
            )
        );
    }

    #[tokio::test]
    async fn test_transfer_encodes_scaled_amount() {
        let wallet = MockWallet::new("base-sepolia");
        wallet.push_uint(U256::from(6u8));
        let destination = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

        let output = Erc20ActionProvider::new()
            .invoke(
                "transfer",
                &wallet,
                serde_json::json!({
                    "amount": "1.5",
                    "contract_address": USDC,
                    "destination": destination
                }),
            )
            .await
            .unwrap();

        let sent = wallet.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, Some(TxKind::Call(parse_address(USDC).unwrap())));
        let call = IERC20::transferCall::abi_decode(&input(&sent[0])).unwrap();
        assert_eq!(call.to, parse_address(destination).unwrap());
        assert_eq!(call.amount, U256::from(1_500_000u32));
        assert!(output.contains("Transaction hash for the transfer"));
    }

    #[tokio::test]
    async fn test_reverted_call_is_an_error() {
        let wallet = MockWallet::new("base-sepolia");
        let result = Erc20ActionProvider::new()
            .invoke("get_balance", &wallet, serde_json::json!({ "contract_address": USDC }))
            .await;
        assert!(result.is_err());
    }
}
