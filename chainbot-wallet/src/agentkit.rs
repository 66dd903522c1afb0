//! The capability registry: one wallet plus the action providers bound to it.

use crate::action::{ActionProvider, ActionTool};
use crate::provider::WalletProvider;
use chainbot_llm::Tool;
use std::sync::Arc;
use tracing::debug;

pub struct AgentKit {
    wallet: Arc<dyn WalletProvider>,
    providers: Vec<Arc<dyn ActionProvider>>,
}

impl AgentKit {
    pub fn new(wallet: Arc<dyn WalletProvider>) -> Self {
        Self {
            wallet,
            providers: Vec::new(),
        }
    }

    pub fn with_provider(mut self, provider: impl ActionProvider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }
}

/// Every action the wallet's network supports, as model tools
pub fn get_tools(kit: &AgentKit) -> Vec<Arc<dyn Tool>> {
    let network = kit.wallet.network();
    let mut tools: Vec<Arc<dyn Tool>> = Vec::new();

    for provider in &kit.providers {
        if !provider.supports_network(network) {
            debug!(provider = provider.name(), network = %network.id, "skipping unsupported provider");
            continue;
        }
        for spec in provider.actions() {
            tools.push(Arc::new(ActionTool::new(
                provider.clone(),
                kit.wallet.clone(),
                spec,
            )));
        }
    }
    tools
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::testing::MockWallet;
    use crate::action::{
        CdpApiActionProvider, CdpWalletActionProvider, Erc20ActionProvider, PythActionProvider,
        WalletActionProvider, WethActionProvider,
    };
    use crate::cdp::tests::test_credentials;
    use crate::cdp::CdpClient;

    fn kit(network_id: &str) -> AgentKit {
        AgentKit::new(Arc::new(MockWallet::new(network_id)))
            .with_provider(CdpApiActionProvider::new(
                CdpClient::new(&test_credentials()).unwrap(),
            ))
            .with_provider(CdpWalletActionProvider::new())
            .with_provider(Erc20ActionProvider::new())
            .with_provider(PythActionProvider::new().unwrap())
            .with_provider(WalletActionProvider::new())
            .with_provider(WethActionProvider::new())
    }

    fn names(kit: &AgentKit) -> Vec<String> {
        get_tools(kit).iter().map(|t| t.name()).collect()
    }

    #[test]
    fn test_all_tools_on_base_sepolia() {
        let names = names(&kit("base-sepolia"));
        assert_eq!(
            names,
            vec![
                "CdpApiActionProvider_request_faucet_funds",
                "CdpWalletActionProvider_deploy_contract",
                "CdpWalletActionProvider_sign_message",
                "Erc20ActionProvider_get_balance",
                "Erc20ActionProvider_transfer",
                "PythActionProvider_fetch_price_feed_id",
                "PythActionProvider_fetch_price",
                "WalletActionProvider_get_wallet_details",
                "WalletActionProvider_native_transfer",
                "WethActionProvider_wrap_eth",
            ]
        );
    }

    #[test]
    fn test_unsupported_providers_are_dropped() {
        let names = names(&kit("ethereum-mainnet"));
        assert!(!names.iter().any(|n| n.starts_with("CdpApiActionProvider")));
        assert!(!names.iter().any(|n| n.starts_with("WethActionProvider")));
        assert!(names.contains(&"WalletActionProvider_get_wallet_details".to_string()));
        // ten tools minus the faucet and wrap_eth
        assert_eq!(names.len(), 8);
    }

    #[test]
    fn test_tool_definitions_carry_schemas() {
        for tool in get_tools(&kit("base-sepolia")) {
            let def = tool.definition();
            assert_eq!(def.parameters["type"], "object");
            assert!(!def.description.is_empty());
        }
    }
}
