//! Command-line and environment configuration

use chainbot_agent::RunMode;
use chainbot_llm::ProviderType;
use chainbot_wallet::{DEFAULT_NETWORK_ID, DEFAULT_WALLET_DATA_FILE};
use clap::{Parser, ValueHint};
use std::path::PathBuf;
use std::time::Duration;

/// A credential read from the command line or environment.
///
/// `Debug` and `Display` never show the value.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString(<redacted>)")
    }
}

impl std::fmt::Display for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<redacted>")
    }
}

fn parse_provider(s: &str) -> Result<ProviderType, String> {
    s.parse().map_err(|e: chainbot_error::Error| e.message().to_string())
}

fn parse_mode(s: &str) -> Result<RunMode, String> {
    s.parse().map_err(|e: chainbot_error::Error| e.message().to_string())
}

#[derive(Parser, Debug, Clone)]
#[command(name = "chainbot")]
#[command(author, version, about = "chainbot - an LLM agent with an EVM wallet")]
pub struct Config {
    /// Where the wallet is persisted between runs (overwritten on every start)
    #[arg(
        long,
        env = "WALLET_DATA_FILE",
        value_hint = ValueHint::FilePath,
        default_value = DEFAULT_WALLET_DATA_FILE
    )]
    pub wallet_data_file: PathBuf,

    /// LLM backend (groq | openai | custom)
    #[arg(
        long,
        env = "LLM_PROVIDER",
        value_parser = parse_provider,
        default_value = "groq"
    )]
    pub llm: ProviderType,

    /// Model id; defaults to the backend's default model
    #[arg(long, env = "LLM_MODEL")]
    pub model: Option<String>,

    /// Base URL of an OpenAI-compatible endpoint, for `--llm custom`
    #[arg(long, env = "LLM_BASE_URL")]
    pub llm_base_url: Option<String>,

    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub groq_api_key: Option<SecretString>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<SecretString>,

    /// CDP API key name (`organizations/.../apiKeys/...`)
    #[arg(long, env = "CDP_API_KEY_NAME")]
    pub cdp_api_key_name: Option<String>,

    /// CDP API private key (PEM)
    #[arg(long, env = "CDP_API_KEY_PRIVATE_KEY", hide_env_values = true)]
    pub cdp_api_key_private_key: Option<SecretString>,

    /// Network the wallet operates on
    #[arg(long, env = "NETWORK_ID", default_value = DEFAULT_NETWORK_ID)]
    pub network: String,

    /// Override the network's public JSON-RPC endpoint
    #[arg(long, env = "RPC_URL")]
    pub rpc_url: Option<String>,

    /// Skip the menu and start in this mode (chat | auto)
    #[arg(long, env = "CHAINBOT_MODE", value_parser = parse_mode)]
    pub mode: Option<RunMode>,

    /// Seconds between autonomous cycles (at least 1)
    #[arg(
        long,
        env = "AUTONOMOUS_INTERVAL",
        value_parser = clap::value_parser!(u64).range(1..),
        default_value_t = 10
    )]
    pub interval: u64,

    /// Path to environment file
    #[arg(long, value_hint = ValueHint::FilePath, default_value = ".env")]
    pub env_file: PathBuf,
}

impl Config {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }
}
