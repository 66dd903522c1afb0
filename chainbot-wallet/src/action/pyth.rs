//! Price data from the Pyth Hermes API

use super::{parse_args, unknown_action, ActionProvider, ActionSpec};
use crate::provider::WalletProvider;
use crate::units::format_scaled;
use async_trait::async_trait;
use chainbot_error::{Error, ErrorKind, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const HERMES_URL: &str = "https://hermes.pyth.network";

pub struct PythActionProvider {
    http: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct FeedIdArgs {
    token_symbol: String,
}

#[derive(Deserialize)]
struct PriceArgs {
    price_feed_id: String,
}

#[derive(Debug, Deserialize)]
struct PriceFeed {
    id: String,
    #[serde(default)]
    attributes: FeedAttributes,
}

#[derive(Debug, Default, Deserialize)]
struct FeedAttributes {
    #[serde(default)]
    base: String,
    #[serde(default)]
    quote_currency: String,
}

#[derive(Debug, Deserialize)]
struct LatestPrices {
    parsed: Vec<ParsedPrice>,
}

#[derive(Debug, Deserialize)]
struct ParsedPrice {
    price: PriceValue,
}

#[derive(Debug, Deserialize)]
struct PriceValue {
    price: String,
    expo: i32,
}

impl PythActionProvider {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                Error::new(ErrorKind::ConfigInvalid, "failed to create HTTP client")
                    .with_operation("PythActionProvider::new")
                    .set_source(e)
            })?;
        Ok(Self {
            http,
            base_url: HERMES_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<String> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await
            .map_err(|e| {
                Error::new(ErrorKind::NetworkFailed, format!("Hermes request failed: {}", e))
                    .set_source(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            Error::new(ErrorKind::NetworkFailed, format!("Hermes response unreadable: {}", e))
        })?;
        if !status.is_success() {
            return Err(Error::new(
                if status.is_server_error() {
                    ErrorKind::ProviderUnavailable
                } else {
                    ErrorKind::Unexpected
                },
                format!("Hermes API error ({}): {}", status.as_u16(), body),
            ));
        }
        debug!(path, bytes = body.len(), "hermes response");
        Ok(body)
    }

    async fn fetch_price_feed_id(&self, symbol: &str) -> Result<String> {
        let symbol = symbol.trim().to_ascii_uppercase();
        let body = self
            .get(
                "/v2/price_feeds",
                &[("query", symbol.as_str()), ("asset_type", "crypto")],
            )
            .await?;
        select_usd_feed(&body, &symbol)
    }

    async fn fetch_price(&self, feed_id: &str) -> Result<String> {
        let body = self
            .get("/v2/updates/price/latest", &[("ids[]", feed_id.trim())])
            .await?;
        parse_latest_price(&body)
    }
}

/// Pick the USD-quoted feed whose base matches `symbol`
fn select_usd_feed(body: &str, symbol: &str) -> Result<String> {
    let feeds: Vec<PriceFeed> = serde_json::from_str(body)
        .map_err(|e| Error::parse_failed(format!("unexpected price_feeds response: {}", e)))?;
    feeds
        .into_iter()
        .find(|feed| {
            feed.attributes.base.eq_ignore_ascii_case(symbol)
                && feed.attributes.quote_currency.eq_ignore_ascii_case("USD")
        })
        .map(|feed| feed.id)
        .ok_or_else(|| Error::invalid_argument(format!("No price feed found for {}", symbol)))
}

fn parse_latest_price(body: &str) -> Result<String> {
    let latest: LatestPrices = serde_json::from_str(body)
        .map_err(|e| Error::parse_failed(format!("unexpected price response: {}", e)))?;
    let parsed = latest
        .parsed
        .into_iter()
        .next()
        .ok_or_else(|| Error::invalid_argument("No price data found for the given feed id"))?;
    format_scaled(&parsed.price.price, parsed.price.expo)
}

#[async_trait]
impl ActionProvider for PythActionProvider {
    fn name(&self) -> &'static str {
        "PythActionProvider"
    }

    fn actions(&self) -> Vec<ActionSpec> {
        vec![
            ActionSpec {
                name: "fetch_price_feed_id",
                description: "Fetch the Pyth price feed ID for a token symbol, e.g. BTC or ETH. \
                              Use the ID with fetch_price.",
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "token_symbol": { "type": "string", "description": "Token symbol, e.g. BTC" }
                    },
                    "required": ["token_symbol"]
                }),
            },
            ActionSpec {
                name: "fetch_price",
                description: "Fetch the latest USD price for a Pyth price feed ID.",
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "price_feed_id": { "type": "string", "description": "Price feed ID from fetch_price_feed_id" }
                    },
                    "required": ["price_feed_id"]
                }),
            },
        ]
    }

    async fn invoke(
        &self,
        action: &str,
        _wallet: &dyn WalletProvider,
        args: serde_json::Value,
    ) -> Result<String> {
        match action {
            "fetch_price_feed_id" => {
                let args: FeedIdArgs = parse_args(action, args)?;
                self.fetch_price_feed_id(&args.token_symbol).await
            }
            "fetch_price" => {
                let args: PriceArgs = parse_args(action, args)?;
                self.fetch_price(&args.price_feed_id).await
            }
            other => Err(unknown_action(self.name(), other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEEDS: &str = r#"[
        {"id": "aaaa", "attributes": {"base": "BTC", "quote_currency": "EUR", "symbol": "Crypto.BTC/EUR"}},
        {"id": "e62df6c8b4a85fe1a67db44dc12de5db330f7ac66b72dc658afedf0f4a415b43",
         "attributes": {"base": "BTC", "quote_currency": "USD", "symbol": "Crypto.BTC/USD"}},
        {"id": "bbbb", "attributes": {"base": "WBTC", "quote_currency": "USD"}}
    ]"#;

    #[test]
    fn test_selects_usd_feed_for_symbol() {
        let id = select_usd_feed(FEEDS, "BTC").unwrap();
        assert_eq!(
            id,
            "e62df6c8b4a85fe1a67db44dc12de5db330f7ac66b72dc658afedf0f4a415b43"
        );
        assert_eq!(select_usd_feed(FEEDS, "WBTC").unwrap(), "bbbb");
    }

    #[test]
    fn test_missing_feed() {
        let err = select_usd_feed(FEEDS, "DOGE").unwrap_err();
        assert!(err.message().contains("No price feed found for DOGE"));
        assert!(select_usd_feed("[]", "BTC").is_err());
    }

    #[test]
    fn test_parse_latest_price() {
        let body = r#"{
            "binary": {"encoding": "hex", "data": []},
            "parsed": [{
                "id": "e62d",
                "price": {"price": "6712345678901", "conf": "1000", "expo": -8, "publish_time": 1700000000},
                "ema_price": {"price": "6700000000000", "conf": "1000", "expo": -8, "publish_time": 1700000000}
            }]
        }"#;
        assert_eq!(parse_latest_price(body).unwrap(), "67123.45678901");
        assert!(parse_latest_price(r#"{"parsed": []}"#).is_err());
    }
}
