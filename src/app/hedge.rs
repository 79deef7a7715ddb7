//! Hedge discovery over related markets.
//!
//! A scan fetches a market set, asks the oracle for necessary implications
//! one target at a time, and turns surviving claims into scored portfolios.
//! Oracle failures and rejected candidates are logged and skipped; the scan
//! itself only fails when the catalog does.

use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::domain::coverage::{
    build_portfolio, filter_by_coverage, filter_by_tier, sort_portfolios, Portfolio, Tier,
};
use crate::domain::relation::{match_claim, to_cover};
use crate::domain::{Market, MarketId};
use crate::error::Result;
use crate::port::MarketCatalog;

use super::extractor::ImplicationExtractor;

/// Parameters for a hedge scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Search query; `None` scans trending markets instead.
    pub query: Option<String>,
    /// How many markets to pull into the candidate set.
    pub limit: usize,
    pub min_coverage: Decimal,
    pub max_tier: Tier,
}

/// Discovers covering portfolios across related markets.
pub struct HedgeScanner {
    catalog: Arc<dyn MarketCatalog>,
    extractor: ImplicationExtractor,
}

impl HedgeScanner {
    pub fn new(catalog: Arc<dyn MarketCatalog>, extractor: ImplicationExtractor) -> Self {
        Self { catalog, extractor }
    }

    /// Scan a market set for covering portfolios.
    pub async fn scan(&self, options: &ScanOptions) -> Result<Vec<Portfolio>> {
        let markets = match &options.query {
            Some(query) => self.catalog.search_markets(query, options.limit).await?,
            None => self.catalog.get_trending_markets(options.limit).await?,
        };
        info!(fetched = markets.len(), "markets fetched");

        // Settled and effectively-decided markets cannot hedge anything.
        let markets: Vec<Market> = markets.into_iter().filter(Market::is_tradable).collect();
        if markets.len() < 2 {
            warn!(tradable = markets.len(), "not enough tradable markets to pair");
            return Ok(Vec::new());
        }

        let mut portfolios = Vec::new();
        for target in &markets {
            let claims = match self.extractor.extract(target, &markets).await {
                Ok(claims) => claims,
                Err(err) => {
                    warn!(target = %target.id, error = %err, "extraction failed, skipping target");
                    continue;
                }
            };

            for claim in &claims {
                let Some(matched) = match_claim(claim, &target.id, &markets) else {
                    debug!(target = %target.id, reference = %claim.market_id, "claim did not match a market");
                    continue;
                };
                let cover = to_cover(claim, matched);
                match build_portfolio(
                    target,
                    cover.target_position,
                    &cover.cover,
                    cover.cover_position,
                    cover.relationship.clone(),
                    cover.cover_probability,
                ) {
                    Ok(portfolio) => portfolios.push(portfolio),
                    Err(rejection) => {
                        debug!(target = %target.id, cover = %matched.id, %rejection, "candidate rejected");
                    }
                }
            }
        }

        Ok(finalize(portfolios, options))
    }

    /// Analyze one specific pair in both directions.
    pub async fn analyze(
        &self,
        first_id: &str,
        second_id: &str,
        min_coverage: Decimal,
    ) -> Result<Vec<Portfolio>> {
        let first = self.catalog.get_market(&MarketId::new(first_id)).await?;
        let second = self.catalog.get_market(&MarketId::new(second_id)).await?;

        let mut portfolios = Vec::new();
        for (target, other) in [(&first, &second), (&second, &first)] {
            let candidates = std::slice::from_ref(other);
            let claims = self.extractor.extract(target, candidates).await?;
            for claim in &claims {
                let Some(matched) = match_claim(claim, &target.id, candidates) else {
                    continue;
                };
                let cover = to_cover(claim, matched);
                if let Ok(portfolio) = build_portfolio(
                    target,
                    cover.target_position,
                    &cover.cover,
                    cover.cover_position,
                    cover.relationship.clone(),
                    cover.cover_probability,
                ) {
                    portfolios.push(portfolio);
                }
            }
        }

        let mut portfolios = filter_by_coverage(portfolios, min_coverage);
        sort_portfolios(&mut portfolios);
        Ok(portfolios)
    }
}

/// Filter, deduplicate symmetric pairs, and sort.
fn finalize(portfolios: Vec<Portfolio>, options: &ScanOptions) -> Vec<Portfolio> {
    let portfolios = filter_by_coverage(portfolios, options.min_coverage);
    let portfolios = filter_by_tier(portfolios, options.max_tier);

    // A hedges B and B hedges A describe the same trade; keep the first seen.
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut unique = Vec::with_capacity(portfolios.len());
    for portfolio in portfolios {
        let mut pair = (
            portfolio.target_id.as_str().to_string(),
            portfolio.cover_id.as_str().to_string(),
        );
        if pair.0 > pair.1 {
            std::mem::swap(&mut pair.0, &mut pair.1);
        }
        if seen.insert(pair) {
            unique.push(portfolio);
        }
    }

    sort_portfolios(&mut unique);
    unique
}
