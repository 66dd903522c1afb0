//! Contract deployment and message signing with the wallet's key

use super::{parse_args, unknown_action, ActionProvider, ActionSpec};
use crate::provider::WalletProvider;
use alloy::network::TransactionBuilder;
use alloy::primitives::hex;
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use chainbot_error::{Error, Result};
use serde::Deserialize;

#[derive(Debug, Default)]
pub struct CdpWalletActionProvider;

impl CdpWalletActionProvider {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Deserialize)]
struct DeployContractArgs {
    bytecode: String,
    #[serde(default)]
    constructor_args: Option<String>,
}

#[derive(Deserialize)]
struct SignMessageArgs {
    message: String,
}

fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>> {
    hex::decode(value.trim())
        .map_err(|e| Error::invalid_argument(format!("{} is not valid hex: {}", field, e)))
}

async fn deploy_contract(wallet: &dyn WalletProvider, args: DeployContractArgs) -> Result<String> {
    let mut init_code = decode_hex("bytecode", &args.bytecode)?;
    if init_code.is_empty() {
        return Err(Error::invalid_argument("bytecode is empty"));
    }
    if let Some(ctor) = args.constructor_args.as_deref().filter(|s| !s.trim().is_empty()) {
        init_code.extend_from_slice(&decode_hex("constructor_args", ctor)?);
    }

    let request = TransactionRequest::default().with_deploy_code(init_code);
    let hash = wallet.send_transaction(request).await?;
    let receipt = wallet.wait_for_receipt(hash).await?;

    match receipt.contract_address {
        Some(address) if receipt.success => Ok(format!(
            "Deployed contract at {} on {}.\nTransaction hash: {}",
            address,
            wallet.network().id,
            hash
        )),
        _ => Ok(format!(
            "Contract deployment failed. Transaction hash: {}",
            hash
        )),
    }
}

#[async_trait]
impl ActionProvider for CdpWalletActionProvider {
    fn name(&self) -> &'static str {
        "CdpWalletActionProvider"
    }

    fn actions(&self) -> Vec<ActionSpec> {
        vec![
            ActionSpec {
                name: "deploy_contract",
                description: "Deploy a compiled smart contract. `bytecode` is the hex creation code; \
                              `constructor_args` is optional ABI-encoded hex appended to it.",
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "bytecode": { "type": "string", "description": "Contract creation bytecode (0x...)" },
                        "constructor_args": { "type": "string", "description": "ABI-encoded constructor arguments (0x...)" }
                    },
                    "required": ["bytecode"]
                }),
            },
            ActionSpec {
                name: "sign_message",
                description: "Sign a message with the wallet's key (EIP-191 personal_sign) and return the signature.",
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "message": { "type": "string", "description": "The message to sign" }
                    },
                    "required": ["message"]
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
            "deploy_contract" => deploy_contract(wallet, parse_args(action, args)?).await,
            "sign_message" => {
                let args: SignMessageArgs = parse_args(action, args)?;
                let signature = wallet.sign_message(&args.message).await?;
                Ok(format!(
                    "The payload signature is {}",
                    hex::encode_prefixed(signature.as_bytes())
                ))
            }
            other => Err(unknown_action(self.name(), other)),
        }
    }
}
