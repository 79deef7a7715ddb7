//! Arbitrage scanning over explicit market groupings.
//!
//! Catalog metadata prices go stale quickly, so detection always runs on
//! fresh per-token prices fetched immediately before the basket is judged.
//! A token whose fresh price is missing is assumed to cost a full dollar,
//! which can only hide an edge, never invent one. Execution re-runs the
//! same detection so a spread that has disappeared aborts before any
//! capital moves.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::domain::arbitrage::{negrisk_arbitrage, split_arbitrage, ArbitragePortfolio};
use crate::domain::{Market, MarketId, TokenId};
use crate::error::Result;
use crate::port::MarketCatalog;

/// Detects arbitrage baskets at fresh prices.
pub struct ArbScanner {
    catalog: Arc<dyn MarketCatalog>,
}

impl ArbScanner {
    pub fn new(catalog: Arc<dyn MarketCatalog>) -> Self {
        Self { catalog }
    }

    /// Check a hierarchical split grouping: aggregate NO plus component YES.
    pub async fn split_opportunity(
        &self,
        aggregate_id: &str,
        component_ids: &[String],
    ) -> Result<Option<ArbitragePortfolio>> {
        let mut markets = vec![self.catalog.get_market(&MarketId::new(aggregate_id)).await?];
        for id in component_ids {
            markets.push(self.catalog.get_market(&MarketId::new(id.as_str())).await?);
        }
        self.refresh_prices(&mut markets).await?;

        let aggregate = markets.remove(0);
        let opportunity = split_arbitrage(&aggregate, &markets);
        if let Some(arb) = &opportunity {
            info!(cost = %arb.total_cost, margin = %arb.profit_margin, "split edge found");
        } else {
            debug!(aggregate = aggregate_id, "no split edge at fresh prices");
        }
        Ok(opportunity)
    }

    /// Check a negative-risk grouping: YES across exclusive outcomes.
    pub async fn negrisk_opportunity(
        &self,
        outcome_ids: &[String],
    ) -> Result<Option<ArbitragePortfolio>> {
        let mut markets = Vec::with_capacity(outcome_ids.len());
        for id in outcome_ids {
            markets.push(self.catalog.get_market(&MarketId::new(id.as_str())).await?);
        }
        self.refresh_prices(&mut markets).await?;

        let opportunity = negrisk_arbitrage(&markets);
        if let Some(arb) = &opportunity {
            info!(cost = %arb.total_cost, margin = %arb.profit_margin, "neg-risk edge found");
        } else {
            debug!(outcomes = outcome_ids.len(), "no neg-risk edge at fresh prices");
        }
        Ok(opportunity)
    }

    /// Overwrite metadata prices with fresh per-token quotes. A queried token
    /// with no quote is priced at $1.
    async fn refresh_prices(&self, markets: &mut [Market]) -> Result<()> {
        let tokens: Vec<TokenId> = markets
            .iter()
            .flat_map(|m| [m.yes_token.clone(), m.no_token.clone()])
            .collect();
        let prices = self.catalog.get_prices(&tokens).await?;

        for market in markets {
            market.yes_price = prices
                .get(&market.yes_token)
                .copied()
                .unwrap_or(Decimal::ONE);
            market.no_price = prices
                .get(&market.no_token)
                .copied()
                .unwrap_or(Decimal::ONE);
        }
        Ok(())
    }
}
