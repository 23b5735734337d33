use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{GameError, GameResult};

/// Read-only source of the current BTC/USD price
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn current_price(&self) -> GameResult<Decimal>;
}

#[derive(Debug, Deserialize)]
struct PriceResponse {
    bitcoin: CoinPrice,
}

#[derive(Debug, Deserialize)]
struct CoinPrice {
    usd: Decimal,
}

/// Extracts `bitcoin.usd` from a `{ "bitcoin": { "usd": <number> } }` body.
pub(crate) fn parse_price(body: &str) -> GameResult<Decimal> {
    let parsed: PriceResponse = serde_json::from_str(body)
        .map_err(|e| GameError::Price(format!("unexpected price response: {e}")))?;
    if parsed.bitcoin.usd.is_sign_negative() {
        return Err(GameError::Price(format!("negative price {}", parsed.bitcoin.usd)));
    }
    Ok(parsed.bitcoin.usd)
}

/// Price endpoint with a CoinGecko `simple/price` shaped response
#[derive(Debug, Clone)]
pub struct HttpPriceSource {
    http_client: reqwest::Client,
    url: String,
}

impl HttpPriceSource {
    pub fn new(http_client: reqwest::Client, url: impl Into<String>) -> Self {
        Self { http_client, url: url.into() }
    }
}

#[async_trait]
impl PriceSource for HttpPriceSource {
    async fn current_price(&self) -> GameResult<Decimal> {
        let resp = self
            .http_client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| GameError::Price(format!("price request failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| GameError::Price(format!("price response unreadable: {e}")))?;

        if !status.is_success() {
            tracing::warn!(status = %status, body, "price API HTTP error");
            return Err(GameError::Price(format!("price API returned {status}")));
        }

        let price = parse_price(&body)?;
        tracing::debug!(price = %price, "price fetched");
        Ok(price)
    }
}
