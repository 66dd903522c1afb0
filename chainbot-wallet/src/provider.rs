//! # Wallet Provider
//!
//! A [`WalletProvider`] owns the signing key for one address on one network
//! and exposes the chain operations the action providers need.
//! [`EvmWalletProvider`] keeps a local secp256k1 key and reaches the chain
//! through an alloy provider whose fillers supply nonce, gas, fees and chain
//! id before signing.

use crate::cdp::{CdpClient, CdpCredentials};
use crate::contracts::parse_address;
use crate::network::Network;
use alloy::network::{EthereumWallet, ReceiptResponse};
use alloy::primitives::{Address, Bytes, Signature, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use async_trait::async_trait;
use chainbot_error::{Error, ErrorKind, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const RECEIPT_POLL_ATTEMPTS: u32 = 60;

/// Exported wallet state. Serialized as JSON into the wallet data file.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletData {
    pub wallet_id: String,
    /// Hex-encoded secp256k1 private key
    pub seed: String,
    pub network_id: String,
    pub default_address_id: String,
}

impl WalletData {
    pub fn from_json(blob: &str) -> Result<Self> {
        serde_json::from_str(blob).map_err(|e| {
            Error::wallet_invalid(format!("wallet data is not valid JSON: {}", e))
                .with_operation("WalletData::from_json")
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            Error::serialization_failed(format!("failed to serialize wallet data: {}", e))
        })
    }
}

impl std::fmt::Debug for WalletData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletData")
            .field("wallet_id", &self.wallet_id)
            .field("seed", &"[REDACTED]")
            .field("network_id", &self.network_id)
            .field("default_address_id", &self.default_address_id)
            .finish()
    }
}

/// Everything needed to construct a wallet provider
#[derive(Debug, Clone)]
pub struct WalletProviderConfig {
    pub credentials: CdpCredentials,
    pub network: Network,
    /// Previously exported blob; `None` mints a new wallet
    pub wallet_data: Option<String>,
}

/// The parts of a mined transaction the actions report on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub transaction_hash: TxHash,
    pub success: bool,
    pub block_number: Option<u64>,
    pub contract_address: Option<Address>,
}

impl TransactionReceipt {
    pub fn from_response(receipt: &impl ReceiptResponse) -> Self {
        Self {
            transaction_hash: receipt.transaction_hash(),
            success: receipt.status(),
            block_number: receipt.block_number(),
            contract_address: receipt.contract_address(),
        }
    }
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Provider name reported in wallet details
    fn name(&self) -> &str;

    fn address(&self) -> Address;

    fn network(&self) -> &Network;

    /// Serialize the wallet so it can be restored on the next start
    fn export(&self) -> Result<String>;

    /// Native balance in wei
    async fn balance(&self) -> Result<U256>;

    /// Read-only call at the latest block, sent from the wallet's address
    async fn call(&self, tx: TransactionRequest) -> Result<Bytes>;

    /// Sign and broadcast; returns the transaction hash
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash>;

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TransactionReceipt>;

    /// EIP-191 personal-sign
    async fn sign_message(&self, message: &str) -> Result<Signature>;
}

fn rpc_error<E>(method: &'static str, err: E) -> Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    Error::rpc_failed(method, err.to_string()).set_source(err)
}

fn mint_key() -> PrivateKeySigner {
    loop {
        // Zero and values above the curve order are rejected; retry
        if let Ok(signer) = PrivateKeySigner::from_slice(&rand::random::<[u8; 32]>()) {
            return signer;
        }
    }
}

pub struct EvmWalletProvider {
    wallet_id: String,
    signer: PrivateKeySigner,
    network: Network,
    provider: DynProvider,
    cdp: CdpClient,
}

impl std::fmt::Debug for EvmWalletProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmWalletProvider")
            .field("wallet_id", &self.wallet_id)
            .field("address", &self.signer.address())
            .field("network", &self.network.id)
            .finish_non_exhaustive()
    }
}

impl EvmWalletProvider {
    /// Restore the wallet from `config.wallet_data`, or mint a new one.
    pub fn new(config: WalletProviderConfig) -> Result<Self> {
        let cdp = CdpClient::new(&config.credentials)?;

        let (wallet_id, signer) = match config.wallet_data.as_deref() {
            Some(blob) => {
                let data = WalletData::from_json(blob)?;
                let signer = Self::restore_key(&data, &config.network)?;
                info!(wallet_id = %data.wallet_id, network = %config.network.id, "restored wallet");
                (data.wallet_id, signer)
            }
            None => {
                let wallet_id = uuid::Uuid::new_v4().to_string();
                info!(wallet_id = %wallet_id, network = %config.network.id, "created new wallet");
                (wallet_id, mint_key())
            }
        };

        let rpc_url: reqwest::Url = config.network.rpc_url.parse().map_err(|e| {
            Error::config_invalid(format!(
                "invalid RPC URL '{}': {}",
                config.network.rpc_url, e
            ))
            .with_operation("EvmWalletProvider::new")
        })?;
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer.clone()))
            .connect_http(rpc_url)
            .erased();
        debug!(address = %signer.address(), rpc = %config.network.rpc_url, "wallet provider ready");

        Ok(Self {
            wallet_id,
            signer,
            network: config.network,
            provider,
            cdp,
        })
    }

    fn restore_key(data: &WalletData, network: &Network) -> Result<PrivateKeySigner> {
        if data.network_id != network.id {
            return Err(Error::wallet_invalid(format!(
                "wallet data belongs to network '{}' but '{}' is configured",
                data.network_id, network.id
            ))
            .with_operation("EvmWalletProvider::new"));
        }

        let signer: PrivateKeySigner = data
            .seed
            .parse()
            .map_err(|_| Error::wallet_invalid("wallet seed is not a valid secp256k1 key"))?;

        if !data.default_address_id.is_empty() {
            let expected = parse_address(&data.default_address_id)
                .map_err(|_| Error::wallet_invalid("wallet default address is malformed"))?;
            if signer.address() != expected {
                return Err(Error::wallet_invalid(
                    "wallet seed does not match the stored default address",
                ));
            }
        }
        Ok(signer)
    }

    /// The CDP client built from this wallet's credentials
    pub fn cdp_client(&self) -> &CdpClient {
        &self.cdp
    }

    pub fn wallet_id(&self) -> &str {
        &self.wallet_id
    }
}

#[async_trait]
impl WalletProvider for EvmWalletProvider {
    fn name(&self) -> &str {
        "evm_wallet_provider"
    }

    fn address(&self) -> Address {
        self.signer.address()
    }

    fn network(&self) -> &Network {
        &self.network
    }

    fn export(&self) -> Result<String> {
        WalletData {
            wallet_id: self.wallet_id.clone(),
            seed: alloy::primitives::hex::encode(self.signer.to_bytes()),
            network_id: self.network.id.clone(),
            default_address_id: self.signer.address().to_string(),
        }
        .to_json()
    }

    async fn balance(&self) -> Result<U256> {
        self.provider
            .get_balance(self.signer.address())
            .await
            .map_err(|e| rpc_error("eth_getBalance", e))
    }

    async fn call(&self, tx: TransactionRequest) -> Result<Bytes> {
        self.provider
            .call(tx.from(self.signer.address()))
            .await
            .map_err(|e| rpc_error("eth_call", e))
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        let pending = self
            .provider
            .send_transaction(tx.from(self.signer.address()))
            .await
            .map_err(|e| rpc_error("eth_sendRawTransaction", e))?;
        let hash = *pending.tx_hash();
        info!(tx = %hash, network = %self.network.id, "transaction broadcast");
        Ok(hash)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TransactionReceipt> {
        for attempt in 1..=RECEIPT_POLL_ATTEMPTS {
            let receipt = self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(|e| rpc_error("eth_getTransactionReceipt", e))?;
            if let Some(receipt) = receipt {
                debug!(tx = %tx_hash, attempt, "receipt found");
                return Ok(TransactionReceipt::from_response(&receipt));
            }
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }

        Err(Error::new(
            ErrorKind::TransactionFailed,
            format!(
                "transaction {} not mined after {} attempts",
                tx_hash, RECEIPT_POLL_ATTEMPTS
            ),
        )
        .with_operation("EvmWalletProvider::wait_for_receipt"))
    }

    async fn sign_message(&self, message: &str) -> Result<Signature> {
        self.signer
            .sign_message(message.as_bytes())
            .await
            .map_err(|e| {
                Error::new(ErrorKind::SigningFailed, format!("signing failed: {}", e))
                    .set_source(e)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdp::tests::test_credentials;

    const HARDHAT_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const HARDHAT_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn config(wallet_data: Option<String>) -> WalletProviderConfig {
        WalletProviderConfig {
            credentials: test_credentials(),
            network: Network::default(),
            wallet_data,
        }
    }

    fn hardhat_blob(network_id: &str) -> String {
        WalletData {
            wallet_id: "wallet-1".into(),
            seed: HARDHAT_KEY.into(),
            network_id: network_id.into(),
            default_address_id: HARDHAT_ADDRESS.into(),
        }
        .to_json()
        .unwrap()
    }

    #[test]
    fn test_mints_new_wallet() {
        let provider = EvmWalletProvider::new(config(None)).unwrap();
        let data = WalletData::from_json(&provider.export().unwrap()).unwrap();

        assert_eq!(data.network_id, "base-sepolia");
        assert_eq!(data.seed.len(), 64);
        assert_eq!(data.default_address_id, provider.address().to_string());
        assert!(uuid::Uuid::parse_str(&data.wallet_id).is_ok());
    }

    #[test]
    fn test_restores_existing_wallet() {
        let provider = EvmWalletProvider::new(config(Some(hardhat_blob("base-sepolia")))).unwrap();
        assert_eq!(provider.address().to_string(), HARDHAT_ADDRESS);
        assert_eq!(provider.wallet_id(), "wallet-1");

        // export of a restored wallet round-trips to the same blob
        assert_eq!(provider.export().unwrap(), hardhat_blob("base-sepolia"));
    }

    #[test]
    fn test_rejects_wallet_for_other_network() {
        let err = EvmWalletProvider::new(config(Some(hardhat_blob("base-mainnet")))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WalletInvalid);
    }

    #[test]
    fn test_rejects_corrupt_wallet_data() {
        let err = EvmWalletProvider::new(config(Some("not json".into()))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WalletInvalid);

        let mut data = WalletData::from_json(&hardhat_blob("base-sepolia")).unwrap();
        data.default_address_id = "0x0000000000000000000000000000000000000001".into();
        let err = EvmWalletProvider::new(config(Some(data.to_json().unwrap()))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WalletInvalid);

        let mut data = WalletData::from_json(&hardhat_blob("base-sepolia")).unwrap();
        data.seed = "not hex".into();
        let err = EvmWalletProvider::new(config(Some(data.to_json().unwrap()))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WalletInvalid);
    }

    #[test]
    fn test_bad_rpc_url() {
        let mut config = config(None);
        config.network = config.network.with_rpc_url("not a url");
        let err = EvmWalletProvider::new(config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_wallet_data_debug_hides_seed() {
        let data = WalletData::from_json(&hardhat_blob("base-sepolia")).unwrap();
        assert!(!format!("{:?}", data).contains(HARDHAT_KEY));
    }

    #[tokio::test]
    async fn test_sign_message_recovers_address() {
        let provider = EvmWalletProvider::new(config(Some(hardhat_blob("base-sepolia")))).unwrap();
        let signature = provider.sign_message("hello chainbot").await.unwrap();

        let bytes = signature.as_bytes();
        assert!(bytes[64] == 27 || bytes[64] == 28);

        let recovered = signature.recover_address_from_msg("hello chainbot").unwrap();
        assert_eq!(recovered.to_string(), HARDHAT_ADDRESS);
    }
}
