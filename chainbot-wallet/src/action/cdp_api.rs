//! Actions backed by the CDP REST API

use super::{parse_args, unknown_action, ActionProvider, ActionSpec};
use crate::cdp::{CdpClient, FaucetAsset};
use crate::network::Network;
use crate::provider::WalletProvider;
use async_trait::async_trait;
use chainbot_error::{Error, Result};
use serde::Deserialize;

pub struct CdpApiActionProvider {
    client: CdpClient,
}

impl CdpApiActionProvider {
    pub fn new(client: CdpClient) -> Self {
        Self { client }
    }
}

#[derive(Deserialize)]
struct FaucetArgs {
    #[serde(default)]
    asset_id: Option<String>,
}

#[async_trait]
impl ActionProvider for CdpApiActionProvider {
    fn name(&self) -> &'static str {
        "CdpApiActionProvider"
    }

    fn supports_network(&self, network: &Network) -> bool {
        network.id == "base-sepolia"
    }

    fn actions(&self) -> Vec<ActionSpec> {
        vec![ActionSpec {
            name: "request_faucet_funds",
            description: "Request test tokens from the faucet for the wallet's address. \
                          Only available on base-sepolia. Defaults to ETH; `asset_id` may be eth or usdc.",
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "asset_id": {
                        "type": "string",
                        "enum": ["eth", "usdc"],
                        "description": "The asset to request, eth by default"
                    }
                },
                "required": []
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
            "request_faucet_funds" => {
                let args: FaucetArgs = parse_args(action, args)?;
                let asset = match args.asset_id.as_deref() {
                    Some(id) => FaucetAsset::parse(id)?,
                    None => FaucetAsset::Eth,
                };

                let network = wallet.network();
                if !self.supports_network(network) {
                    return Err(Error::unsupported(format!(
                        "faucet is only available on base-sepolia, wallet is on {}",
                        network.id
                    )));
                }

                let address = wallet.address().to_string();
                let hash = self
                    .client
                    .request_faucet(&network.id, &address, asset)
                    .await?;
                Ok(format!(
                    "Received {} from the faucet. Transaction hash: {}",
                    asset.as_str(),
                    hash
                ))
            }
            other => Err(unknown_action(self.name(), other)),
        }
    }
}
