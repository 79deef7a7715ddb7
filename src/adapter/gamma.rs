//! Gamma REST catalog adapter.
//!
//! Market discovery uses the Gamma API (richer metadata: volume, liquidity,
//! outcome prices); spot prices for individual tokens come from the CLOB
//! price endpoint. Gamma encodes token ids and outcome prices as JSON strings
//! inside JSON, and records are parsed leniently: a malformed field gets a
//! neutral default instead of failing the record.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client as HttpClient;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::domain::{ConditionId, Market, MarketId, TokenId};
use crate::error::{CatalogError, Result};
use crate::port::MarketCatalog;

const RETRY_MAX_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF_MS: u64 = 500;

/// HTTP client for the Gamma and CLOB price APIs.
pub struct GammaCatalog {
    http: HttpClient,
    gamma_url: String,
    clob_url: String,
}

/// Raw Gamma market record. Every field the API might omit is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GammaMarketDto {
    #[serde(default)]
    id: String,
    question: Option<String>,
    slug: Option<String>,
    condition_id: Option<String>,
    /// JSON string holding an array of token ids.
    clob_token_ids: Option<String>,
    /// JSON string holding an array of decimal strings.
    outcome_prices: Option<String>,
    volume: Option<serde_json::Value>,
    volume24hr: Option<serde_json::Value>,
    liquidity: Option<serde_json::Value>,
    end_date: Option<String>,
    active: Option<bool>,
    closed: Option<bool>,
    resolved: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    events: Vec<SearchEvent>,
}

#[derive(Debug, Deserialize)]
struct SearchEvent {
    #[serde(default)]
    markets: Vec<GammaMarketDto>,
}

/// Parse a numeric field that may arrive as a number, a string, or garbage.
fn lenient_decimal(value: Option<&serde_json::Value>, default: Decimal) -> Decimal {
    match value {
        Some(serde_json::Value::Number(n)) => n
            .to_string()
            .parse()
            .unwrap_or(default),
        Some(serde_json::Value::String(s)) => s.parse().unwrap_or(default),
        _ => default,
    }
}

/// Parse a JSON-string-encoded array of strings.
fn nested_string_array(raw: Option<&str>) -> Vec<String> {
    raw.and_then(|s| serde_json::from_str::<Vec<String>>(s).ok())
        .unwrap_or_default()
}

impl GammaMarketDto {
    fn into_market(self) -> Market {
        let tokens = nested_string_array(self.clob_token_ids.as_deref());
        let prices: Vec<Decimal> = nested_string_array(self.outcome_prices.as_deref())
            .iter()
            .map(|p| p.parse().unwrap_or(dec!(0.5)))
            .collect();

        Market {
            id: MarketId::new(self.id),
            question: self.question.unwrap_or_default(),
            slug: self.slug.unwrap_or_default(),
            condition_id: ConditionId::new(self.condition_id.unwrap_or_default()),
            yes_token: TokenId::new(tokens.first().cloned().unwrap_or_default()),
            no_token: TokenId::new(tokens.get(1).cloned().unwrap_or_default()),
            yes_price: prices.first().copied().unwrap_or(dec!(0.5)),
            no_price: prices.get(1).copied().unwrap_or(dec!(0.5)),
            volume: lenient_decimal(self.volume.as_ref(), Decimal::ZERO),
            volume_24h: lenient_decimal(self.volume24hr.as_ref(), Decimal::ZERO),
            liquidity: lenient_decimal(self.liquidity.as_ref(), Decimal::ZERO),
            end_date: self
                .end_date
                .as_deref()
                .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
                .map(|d| d.with_timezone(&Utc)),
            active: self.active.unwrap_or(true),
            closed: self.closed.unwrap_or(false),
            resolved: self.resolved.unwrap_or(false),
        }
    }
}

impl GammaCatalog {
    pub fn new(gamma_url: impl Into<String>, clob_url: impl Into<String>) -> Self {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "failed to build HTTP client, using defaults");
                HttpClient::new()
            });
        Self {
            http,
            gamma_url: gamma_url.into(),
            clob_url: clob_url.into(),
        }
    }

    async fn get_with_retry<T>(&self, url: &str, query: &[(&str, String)]) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let response = match self.http.get(url).query(query).send().await {
                Ok(response) => response,
                Err(err) => {
                    if attempt >= RETRY_MAX_ATTEMPTS || !Self::should_retry(&err) {
                        return Err(CatalogError::Http(err).into());
                    }
                    self.backoff(attempt, &err).await;
                    continue;
                }
            };

            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Err(CatalogError::NotFound { id: url.into() }.into());
            }
            let response = match response.error_for_status() {
                Ok(response) => response,
                Err(err) => return Err(CatalogError::Http(err).into()),
            };

            match response.json::<T>().await {
                Ok(parsed) => return Ok(parsed),
                Err(err) => {
                    if attempt >= RETRY_MAX_ATTEMPTS || !Self::should_retry(&err) {
                        return Err(CatalogError::Http(err).into());
                    }
                    self.backoff(attempt, &err).await;
                }
            }
        }
    }

    fn should_retry(err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect()
    }

    async fn backoff(&self, attempt: u32, err: &reqwest::Error) {
        warn!(attempt, error = %err, "catalog request failed, retrying");
        sleep(Duration::from_millis(RETRY_BACKOFF_MS)).await;
    }
}

#[async_trait]
impl MarketCatalog for GammaCatalog {
    async fn get_market(&self, id: &MarketId) -> Result<Market> {
        let url = format!("{}/markets/{}", self.gamma_url, id);
        let dto: GammaMarketDto = self.get_with_retry(&url, &[]).await?;
        debug!(market = %id, "fetched market");
        Ok(dto.into_market())
    }

    async fn get_market_by_slug(&self, slug: &str) -> Result<Market> {
        let url = format!("{}/markets", self.gamma_url);
        let dtos: Vec<GammaMarketDto> = self
            .get_with_retry(&url, &[("slug", slug.to_string())])
            .await?;
        let dto = dtos.into_iter().next().ok_or(CatalogError::NotFound {
            id: slug.to_string(),
        })?;
        Ok(dto.into_market())
    }

    async fn get_trending_markets(&self, limit: usize) -> Result<Vec<Market>> {
        let url = format!("{}/markets", self.gamma_url);
        let dtos: Vec<GammaMarketDto> = self
            .get_with_retry(
                &url,
                &[
                    ("closed", "false".into()),
                    ("limit", limit.to_string()),
                    ("order", "volume24hr".into()),
                    ("ascending", "false".into()),
                ],
            )
            .await?;
        debug!(count = dtos.len(), "fetched trending markets");
        Ok(dtos.into_iter().map(GammaMarketDto::into_market).collect())
    }

    async fn search_markets(&self, query: &str, limit: usize) -> Result<Vec<Market>> {
        let url = format!("{}/public-search", self.gamma_url);
        let response: SearchResponse = self
            .get_with_retry(
                &url,
                &[
                    ("q", query.to_string()),
                    ("limit_per_type", limit.to_string()),
                    ("search_tags", "true".into()),
                    ("search_profiles", "false".into()),
                ],
            )
            .await?;
        let markets: Vec<Market> = response
            .events
            .into_iter()
            .flat_map(|e| e.markets)
            .map(GammaMarketDto::into_market)
            .take(limit)
            .collect();
        debug!(query, count = markets.len(), "search complete");
        Ok(markets)
    }

    async fn get_prices(&self, token_ids: &[TokenId]) -> Result<HashMap<TokenId, Decimal>> {
        if token_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let joined = token_ids
            .iter()
            .map(TokenId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/prices", self.clob_url);
        let raw: HashMap<String, Decimal> = self
            .get_with_retry(&url, &[("token_ids", joined)])
            .await?;
        Ok(raw
            .into_iter()
            .map(|(token, price)| (TokenId::new(token), price))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_complete_record() {
        let dto: GammaMarketDto = serde_json::from_str(
            r#"{
                "id": "123",
                "question": "Will X happen?",
                "slug": "will-x-happen",
                "conditionId": "0xabc",
                "clobTokenIds": "[\"tok-yes\", \"tok-no\"]",
                "outcomePrices": "[\"0.72\", \"0.28\"]",
                "volume": "150000.5",
                "volume24hr": 2000,
                "liquidity": "9000",
                "endDate": "2026-11-03T00:00:00Z",
                "active": true,
                "closed": false,
                "resolved": false
            }"#,
        )
        .unwrap();
        let market = dto.into_market();
        assert_eq!(market.id.as_str(), "123");
        assert_eq!(market.yes_token.as_str(), "tok-yes");
        assert_eq!(market.yes_price, dec!(0.72));
        assert_eq!(market.no_price, dec!(0.28));
        assert_eq!(market.volume, dec!(150000.5));
        assert_eq!(market.volume_24h, dec!(2000));
        assert!(market.end_date.is_some());
        assert!(market.is_tradable());
    }

    #[test]
    fn missing_fields_get_neutral_defaults() {
        let dto: GammaMarketDto = serde_json::from_str(r#"{"id": "9"}"#).unwrap();
        let market = dto.into_market();
        assert_eq!(market.yes_price, dec!(0.5));
        assert_eq!(market.no_price, dec!(0.5));
        assert_eq!(market.volume, dec!(0));
        assert!(market.active);
        assert!(!market.closed);
        assert!(market.end_date.is_none());
    }

    #[test]
    fn malformed_nested_json_defaults_per_field() {
        let dto: GammaMarketDto = serde_json::from_str(
            r#"{
                "id": "9",
                "clobTokenIds": "not json",
                "outcomePrices": "[broken",
                "volume": "not-a-number"
            }"#,
        )
        .unwrap();
        let market = dto.into_market();
        assert_eq!(market.yes_token.as_str(), "");
        assert_eq!(market.yes_price, dec!(0.5));
        assert_eq!(market.volume, dec!(0));
    }

    #[test]
    fn price_strings_parse_individually() {
        let dto: GammaMarketDto = serde_json::from_str(
            r#"{"id": "9", "outcomePrices": "[\"0.9\", \"bogus\"]"}"#,
        )
        .unwrap();
        let market = dto.into_market();
        assert_eq!(market.yes_price, dec!(0.9));
        assert_eq!(market.no_price, dec!(0.5));
    }
}
