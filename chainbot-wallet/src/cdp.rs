//! # CDP API client
//!
//! Talks to the Coinbase Developer Platform REST API. Each request carries a
//! short-lived ES256 JWT signed with the API key's P-256 private key.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chainbot_error::{Error, ErrorKind, Result};
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use p256::pkcs8::DecodePrivateKey;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

pub const CDP_API_HOST: &str = "api.cdp.coinbase.com";

const JWT_LIFETIME_SECS: u64 = 120;

/// The CDP API key pair
#[derive(Clone)]
pub struct CdpCredentials {
    pub key_name: String,
    pub private_key: String,
}

impl CdpCredentials {
    pub fn new(key_name: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            key_name: key_name.into(),
            private_key: private_key.into(),
        }
    }
}

impl std::fmt::Debug for CdpCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdpCredentials")
            .field("key_name", &self.key_name)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// Faucet asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaucetAsset {
    Eth,
    Usdc,
}

impl FaucetAsset {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaucetAsset::Eth => "eth",
            FaucetAsset::Usdc => "usdc",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "eth" => Ok(FaucetAsset::Eth),
            "usdc" => Ok(FaucetAsset::Usdc),
            other => Err(Error::invalid_argument(format!(
                "unsupported faucet asset '{}'; expected eth or usdc",
                other
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FaucetResponse {
    transaction_hash: String,
}

#[derive(Clone)]
pub struct CdpClient {
    key_name: String,
    signing_key: Arc<SigningKey>,
    http: Client,
    base_url: String,
}

impl std::fmt::Debug for CdpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdpClient")
            .field("key_name", &self.key_name)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Parse an EC P-256 private key from SEC1 (`EC PRIVATE KEY`) or PKCS#8 PEM.
/// Keys pasted into `.env` files often carry literal `\n` sequences.
fn parse_signing_key(pem: &str) -> Result<SigningKey> {
    let pem = pem.trim().replace("\\n", "\n");

    if let Ok(secret_key) = p256::SecretKey::from_sec1_pem(&pem) {
        return Ok(SigningKey::from(secret_key));
    }
    if let Ok(secret_key) = p256::SecretKey::from_pkcs8_pem(&pem) {
        return Ok(SigningKey::from(secret_key));
    }

    Err(Error::credentials_invalid(
        "CDP_API_KEY_PRIVATE_KEY is not an EC P-256 private key in SEC1 or PKCS#8 PEM format",
    )
    .with_operation("CdpClient::new"))
}

impl CdpClient {
    pub fn new(credentials: &CdpCredentials) -> Result<Self> {
        if credentials.key_name.trim().is_empty() {
            return Err(Error::credentials_missing("CDP_API_KEY_NAME"));
        }
        if credentials.private_key.trim().is_empty() {
            return Err(Error::credentials_missing("CDP_API_KEY_PRIVATE_KEY"));
        }

        let signing_key = parse_signing_key(&credentials.private_key)?;
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| {
                Error::new(ErrorKind::ConfigInvalid, "failed to create HTTP client")
                    .with_operation("CdpClient::new")
                    .set_source(e)
            })?;

        debug!(key_name = %credentials.key_name, "CDP API key loaded");
        Ok(Self {
            key_name: credentials.key_name.trim().to_string(),
            signing_key: Arc::new(signing_key),
            http,
            base_url: format!("https://{}", CDP_API_HOST),
        })
    }

    /// Send requests somewhere other than the public API host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    /// Build the bearer token for one request. `path` excludes the query string.
    pub fn build_jwt(&self, method: &str, path: &str) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| Error::unexpected(format!("system clock before UNIX epoch: {}", e)))?
            .as_secs();
        let nonce = alloy::primitives::hex::encode(rand::random::<[u8; 16]>());

        let header = serde_json::json!({
            "alg": "ES256",
            "kid": self.key_name,
            "typ": "JWT",
            "nonce": nonce,
        });
        let claims = serde_json::json!({
            "sub": self.key_name,
            "iss": "cdp",
            "nbf": now,
            "exp": now + JWT_LIFETIME_SECS,
            "uri": format!("{} {}{}", method, CDP_API_HOST, path),
        });

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header.to_string()),
            URL_SAFE_NO_PAD.encode(claims.to_string())
        );
        let signature: Signature = self.signing_key.sign(signing_input.as_bytes());

        Ok(format!(
            "{}.{}",
            signing_input,
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        ))
    }

    /// Ask the testnet faucet to fund `address`; returns the transaction hash.
    pub async fn request_faucet(
        &self,
        network_id: &str,
        address: &str,
        asset: FaucetAsset,
    ) -> Result<String> {
        let path = format!(
            "/platform/v1/networks/{}/addresses/{}/faucet",
            network_id, address
        );
        let token = self.build_jwt("POST", &path)?;

        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .query(&[("asset_id", asset.as_str())])
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                Error::new(ErrorKind::NetworkFailed, format!("CDP request failed: {}", e))
                    .with_operation("CdpClient::request_faucet")
                    .set_source(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let kind = if status.is_server_error() {
                ErrorKind::ProviderUnavailable
            } else {
                ErrorKind::Unexpected
            };
            return Err(Error::new(
                kind,
                format!("CDP API error ({}): {}", status.as_u16(), body),
            )
            .with_operation("CdpClient::request_faucet")
            .with_context("network", network_id));
        }

        let body: FaucetResponse = response.json().await.map_err(|e| {
            Error::parse_failed(format!("unexpected faucet response: {}", e))
                .with_operation("CdpClient::request_faucet")
        })?;

        info!(network = network_id, asset = asset.as_str(), tx = %body.transaction_hash, "faucet funds requested");
        Ok(body.transaction_hash)
    }
}
