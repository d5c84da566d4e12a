use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::latency::{LatencyStats, Upstream};
use crate::config::{Config, DEFAULT_PRICE};
use crate::types::{DexTokenResponse, JupiterPriceEntry, PriceResult, PriceSource};

/// Why a single price source was skipped. Logged, never returned to the browser.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("status {0}")]
    Status(u16),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no usable price: {0}")]
    NoPrice(&'static str),
}

/// Resolves the landing page token's USD price: Jupiter, then DexScreener,
/// then [`DEFAULT_PRICE`]. Never fails.
pub struct PriceResolver {
    client: reqwest::Client,
    jupiter_api_url: String,
    dexscreener_api_url: String,
    token_address: String,
    latency: Arc<LatencyStats>,
}

impl PriceResolver {
    pub fn new(client: reqwest::Client, cfg: &Config, latency: Arc<LatencyStats>) -> Self {
        Self {
            client,
            jupiter_api_url: cfg.jupiter_api_url.clone(),
            dexscreener_api_url: cfg.dexscreener_api_url.clone(),
            token_address: cfg.token_address.clone(),
            latency,
        }
    }

    pub async fn resolve(&self) -> (PriceResult, PriceSource) {
        match self.fetch_jupiter().await {
            Ok(price) => {
                debug!("Jupiter price for {}: ${}", self.token_address, price.price);
                return (price, PriceSource::Jupiter);
            }
            Err(e) => warn!("Jupiter price unavailable for {}: {e}", self.token_address),
        }

        match self.fetch_dexscreener().await {
            Ok(price) => {
                debug!("DexScreener price for {}: ${}", self.token_address, price.price);
                return (price, PriceSource::DexScreener);
            }
            Err(e) => warn!("DexScreener price unavailable for {}: {e}", self.token_address),
        }

        info!("Both price sources failed, serving default price {DEFAULT_PRICE}");
        let fallback = PriceResult {
            price: DEFAULT_PRICE.to_string(),
            price_change_24h: None,
        };
        (fallback, PriceSource::Fallback)
    }

    async fn fetch_jupiter(&self) -> Result<PriceResult, SourceError> {
        let url = format!("{}/price/v3?ids={}", self.jupiter_api_url, self.token_address);
        let body = self.get_body(&url).await?;
        parse_jupiter_price(&body, &self.token_address)
    }

    async fn fetch_dexscreener(&self) -> Result<PriceResult, SourceError> {
        let url = format!(
            "{}/latest/dex/tokens/{}",
            self.dexscreener_api_url, self.token_address
        );
        let body = self.get_body(&url).await?;
        parse_dexscreener_price(&body)
    }

    async fn get_body(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        let started = Instant::now();
        let result = self.client.get(url).send().await;
        self.latency.record(Upstream::PriceSource, started.elapsed());

        let resp = result?;
        if !resp.status().is_success() {
            return Err(SourceError::Status(resp.status().as_u16()));
        }
        Ok(resp.bytes().await?.to_vec())
    }
}

/// Jupiter v3 returns `{ "<mint>": { "usdPrice": 1.23, "priceChange24h": -4.5, ... } }`.
pub fn parse_jupiter_price(body: &[u8], token: &str) -> Result<PriceResult, SourceError> {
    let mut entries: HashMap<String, Value> = serde_json::from_slice(body)?;
    let entry = entries
        .remove(token)
        .ok_or(SourceError::NoPrice("token not listed"))?;
    let entry: JupiterPriceEntry = serde_json::from_value(entry)?;

    match entry.usd_price {
        Some(usd) if usd.is_finite() && usd > 0.0 => {
            Ok(PriceResult::from_usd(
                usd,
                entry.price_change_24h.as_ref().and_then(Value::as_f64),
            ))
        }
        _ => Err(SourceError::NoPrice("usdPrice missing or not positive")),
    }
}

/// DexScreener lists pairs most-liquid first; only the first one is read.
pub fn parse_dexscreener_price(body: &[u8]) -> Result<PriceResult, SourceError> {
    let resp: DexTokenResponse = serde_json::from_slice(body)?;
    let pair = resp
        .pairs
        .and_then(|pairs| pairs.into_iter().next())
        .ok_or(SourceError::NoPrice("no pairs"))?;

    // usually a decimal string, occasionally a bare number
    let usd = match pair.get("priceUsd").cloned() {
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Number(n)) => n.as_f64(),
        _ => None,
    };

    match usd {
        Some(usd) if usd.is_finite() && usd > 0.0 => Ok(PriceResult::from_usd(usd, None)),
        _ => Err(SourceError::NoPrice("priceUsd missing or not positive")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINT: &str = "FmQ7v2QUqXVVtAXkngBh3Mwx7s3mKT55nQ5Z673dURYS";

    #[test]
    fn jupiter_price_with_change() {
        let body = format!(r#"{{"{MINT}":{{"usdPrice":1.23456,"priceChange24h":-2.5,"decimals":6}}}}"#);
        let price = parse_jupiter_price(body.as_bytes(), MINT).unwrap();
        assert_eq!(price.price, "1.23");
        assert_eq!(price.price_change_24h, Some(-2.5));
    }

    #[test]
    fn jupiter_price_without_change() {
        let body = format!(r#"{{"{MINT}":{{"usdPrice":0.5}}}}"#);
        let price = parse_jupiter_price(body.as_bytes(), MINT).unwrap();
        assert_eq!(price.price, "0.50");
        assert!(price.price_change_24h.is_none());
    }

    #[test]
    fn jupiter_mistyped_change_keeps_price() {
        for change in [r#""3.2""#, "null", r#"{"pct":1}"#] {
            let body = format!(r#"{{"{MINT}":{{"usdPrice":1.5,"priceChange24h":{change}}}}}"#);
            let price = parse_jupiter_price(body.as_bytes(), MINT).unwrap();
            assert_eq!(price.price, "1.50");
            assert!(price.price_change_24h.is_none());
        }
    }

    #[test]
    fn jupiter_rejects_zero_and_missing() {
        let zero = format!(r#"{{"{MINT}":{{"usdPrice":0}}}}"#);
        assert!(matches!(
            parse_jupiter_price(zero.as_bytes(), MINT),
            Err(SourceError::NoPrice(_))
        ));

        let other_token = r#"{"So11111111111111111111111111111111111111112":{"usdPrice":150.0}}"#;
        assert!(matches!(
            parse_jupiter_price(other_token.as_bytes(), MINT),
            Err(SourceError::NoPrice(_))
        ));

        assert!(matches!(
            parse_jupiter_price(b"{}", MINT),
            Err(SourceError::NoPrice(_))
        ));
    }

    #[test]
    fn jupiter_malformed_json() {
        assert!(matches!(
            parse_jupiter_price(b"<html>", MINT),
            Err(SourceError::Json(_))
        ));
    }

    #[test]
    fn dexscreener_first_pair_wins() {
        let body = br#"{"schemaVersion":"1.0.0","pairs":[{"priceUsd":"0.8761"},{"priceUsd":"9.99"}]}"#;
        let price = parse_dexscreener_price(body).unwrap();
        assert_eq!(price.price, "0.88");
        assert!(price.price_change_24h.is_none());
    }

    #[test]
    fn dexscreener_numeric_price() {
        let body = br#"{"pairs":[{"priceUsd":3.1}]}"#;
        assert_eq!(parse_dexscreener_price(body).unwrap().price, "3.10");
    }

    #[test]
    fn dexscreener_ignores_malformed_later_pairs() {
        let body = br#"{"pairs":[{"priceUsd":"1.25"},7,"junk"]}"#;
        assert_eq!(parse_dexscreener_price(body).unwrap().price, "1.25");
    }

    #[test]
    fn dexscreener_no_pairs() {
        assert!(parse_dexscreener_price(br#"{"pairs":null}"#).is_err());
        assert!(parse_dexscreener_price(br#"{"pairs":[]}"#).is_err());
        assert!(parse_dexscreener_price(br#"{"pairs":[{}]}"#).is_err());
        assert!(parse_dexscreener_price(br#"{"pairs":[{"priceUsd":"abc"}]}"#).is_err());
        assert!(parse_dexscreener_price(br#"{"pairs":[{"priceUsd":"0"}]}"#).is_err());
        assert!(parse_dexscreener_price(b"oops").is_err());
    }
}
