//! Market catalog port.
//!
//! Read-only discovery and pricing surface over the exchange's market
//! metadata API. Implementations return fresh snapshots on every call.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{Market, MarketId, TokenId};
use crate::error::Result;

/// Catalog of markets and their current prices.
#[async_trait]
pub trait MarketCatalog: Send + Sync {
    /// Fetch one market by catalog id.
    async fn get_market(&self, id: &MarketId) -> Result<Market>;

    /// Fetch one market by URL slug.
    async fn get_market_by_slug(&self, slug: &str) -> Result<Market>;

    /// Fetch up to `limit` markets ordered by recent volume.
    async fn get_trending_markets(&self, limit: usize) -> Result<Vec<Market>>;

    /// Full-text search over market questions.
    async fn search_markets(&self, query: &str, limit: usize) -> Result<Vec<Market>>;

    /// Current midpoint prices for a set of outcome tokens.
    async fn get_prices(&self, token_ids: &[TokenId]) -> Result<HashMap<TokenId, Decimal>>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::error::CatalogError;

    /// Mock catalog backed by a fixed market list.
    pub struct MockCatalog {
        markets: Vec<Market>,
    }

    impl MockCatalog {
        pub fn new(markets: Vec<Market>) -> Self {
            Self { markets }
        }
    }

    #[async_trait]
    impl MarketCatalog for MockCatalog {
        async fn get_market(&self, id: &MarketId) -> Result<Market> {
            self.markets
                .iter()
                .find(|m| m.id == *id)
                .cloned()
                .ok_or_else(|| {
                    CatalogError::NotFound {
                        id: id.to_string(),
                    }
                    .into()
                })
        }

        async fn get_market_by_slug(&self, slug: &str) -> Result<Market> {
            self.markets
                .iter()
                .find(|m| m.slug == slug)
                .cloned()
                .ok_or_else(|| {
                    CatalogError::NotFound {
                        id: slug.to_string(),
                    }
                    .into()
                })
        }

        async fn get_trending_markets(&self, limit: usize) -> Result<Vec<Market>> {
            Ok(self.markets.iter().take(limit).cloned().collect())
        }

        async fn search_markets(&self, query: &str, limit: usize) -> Result<Vec<Market>> {
            let wanted = query.to_lowercase();
            Ok(self
                .markets
                .iter()
                .filter(|m| m.question.to_lowercase().contains(&wanted))
                .take(limit)
                .cloned()
                .collect())
        }

        async fn get_prices(&self, token_ids: &[TokenId]) -> Result<HashMap<TokenId, Decimal>> {
            let mut prices = HashMap::new();
            for market in &self.markets {
                for (token, price) in [
                    (&market.yes_token, market.yes_price),
                    (&market.no_token, market.no_price),
                ] {
                    if token_ids.contains(token) {
                        prices.insert(token.clone(), price);
                    }
                }
            }
            Ok(prices)
        }
    }
}
