//! Coverage math for hedged two-market positions.
//!
//! A hedge buys one outcome of a target market and the covering outcome of a
//! related market. Given target price `p` and the probability `q` that the
//! cover pays when the target loses:
//!
//! - coverage            = p + (1 - p) * q
//! - loss probability    = (1 - p) * (1 - q)
//! - expected profit     = coverage - total_cost
//!
//! All math runs at full `Decimal` precision; rounding happens only at the
//! output boundary.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::ids::MarketId;
use super::market::{Market, Position};

/// Probability assigned to a cover backed by a claimed necessary
/// relationship. Never taken from oracle confidence language.
pub const NECESSARY_PROBABILITY: Decimal = dec!(0.98);

/// Minimum acceptable coverage for a portfolio.
pub const MIN_COVERAGE: Decimal = dec!(0.85);

/// Combined cost above which a pair cannot be a sane hedge.
pub const MAX_TOTAL_COST: Decimal = dec!(2.0);

/// Sanity filter: claimed near-certain covers whose price-implied conditional
/// probability upper bound falls below this floor are rejected. A tuning
/// heuristic, not a derived law.
pub const SANITY_CONDITIONAL_FLOOR: Decimal = dec!(0.5);

/// Cover probability at and above which the sanity filter applies.
const SANITY_CLAIM_THRESHOLD: Decimal = dec!(0.95);

/// Risk tier for a hedged portfolio. Lower is safer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    High = 1,
    Good = 2,
    Moderate = 3,
    Low = 4,
}

impl Tier {
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Tier for a configured rank; ranks past the scale clamp to the lowest.
    pub fn from_rank(rank: u8) -> Self {
        match rank {
            1 => Tier::High,
            2 => Tier::Good,
            3 => Tier::Moderate,
            _ => Tier::Low,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::High => "HIGH",
            Tier::Good => "GOOD",
            Tier::Moderate => "MODERATE",
            Tier::Low => "LOW",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.rank(), self.label())
    }
}

/// Derived risk metrics for a (target price, cover probability) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageMetrics {
    pub coverage: Decimal,
    pub loss_probability: Decimal,
    pub expected_profit: Decimal,
}

/// A validated hedged position over a target market and a covering market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    pub target_id: MarketId,
    pub target_question: String,
    pub target_slug: String,
    pub target_position: Position,
    pub target_price: Decimal,
    pub cover_id: MarketId,
    pub cover_question: String,
    pub cover_slug: String,
    pub cover_position: Position,
    pub cover_price: Decimal,
    pub cover_probability: Decimal,
    pub relationship: String,
    pub total_cost: Decimal,
    pub profit: Decimal,
    pub profit_pct: Decimal,
    pub coverage: Decimal,
    pub loss_probability: Decimal,
    pub expected_profit: Decimal,
    pub tier: Tier,
}

/// Why a candidate pair did not become a portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    CostOutOfRange,
    SanityFilter,
    CoverageBelowMinimum,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::CostOutOfRange => f.write_str("total cost out of range"),
            Rejection::SanityFilter => f.write_str("implied cover probability implausible"),
            Rejection::CoverageBelowMinimum => f.write_str("coverage below minimum"),
        }
    }
}

/// Compute coverage metrics from target price, cover probability, and cost.
pub fn coverage_metrics(
    target_price: Decimal,
    cover_probability: Decimal,
    total_cost: Decimal,
) -> CoverageMetrics {
    let miss = Decimal::ONE - target_price;
    let coverage = target_price + miss * cover_probability;
    CoverageMetrics {
        coverage,
        loss_probability: miss * (Decimal::ONE - cover_probability),
        expected_profit: coverage - total_cost,
    }
}

/// Classify a portfolio into a risk tier.
///
/// A pair that costs a full dollar or more cannot profit in any outcome, so
/// it lands in the lowest tier regardless of coverage.
pub fn classify_tier(coverage: Decimal, total_cost: Decimal) -> Tier {
    if total_cost >= Decimal::ONE {
        return Tier::Low;
    }
    if coverage >= dec!(0.95) {
        Tier::High
    } else if coverage >= dec!(0.90) {
        Tier::Good
    } else if coverage >= MIN_COVERAGE {
        Tier::Moderate
    } else {
        Tier::Low
    }
}

/// Upper bound on P(cover pays | target loses) implied by current prices.
fn implied_conditional_bound(target_price: Decimal, cover_price: Decimal) -> Decimal {
    if target_price >= Decimal::ONE {
        return Decimal::ONE;
    }
    cover_price / (Decimal::ONE - target_price)
}

/// Validate a candidate pair and assemble the full portfolio record.
pub fn build_portfolio(
    target: &Market,
    target_position: Position,
    cover: &Market,
    cover_position: Position,
    relationship: impl Into<String>,
    cover_probability: Decimal,
) -> Result<Portfolio, Rejection> {
    let target_price = target.price_for(target_position);
    let cover_price = cover.price_for(cover_position);
    let total_cost = target_price + cover_price;

    if total_cost <= Decimal::ZERO || total_cost > MAX_TOTAL_COST {
        return Err(Rejection::CostOutOfRange);
    }

    // Near-certain claims must survive a price-implied plausibility bound.
    if cover_probability >= SANITY_CLAIM_THRESHOLD
        && implied_conditional_bound(target_price, cover_price) < SANITY_CONDITIONAL_FLOOR
    {
        return Err(Rejection::SanityFilter);
    }

    let metrics = coverage_metrics(target_price, cover_probability, total_cost);
    if metrics.coverage < MIN_COVERAGE {
        return Err(Rejection::CoverageBelowMinimum);
    }

    let profit = Decimal::ONE - total_cost;
    Ok(Portfolio {
        target_id: target.id.clone(),
        target_question: target.question.clone(),
        target_slug: target.slug.clone(),
        target_position,
        target_price,
        cover_id: cover.id.clone(),
        cover_question: cover.question.clone(),
        cover_slug: cover.slug.clone(),
        cover_position,
        cover_price,
        cover_probability,
        relationship: relationship.into(),
        total_cost,
        profit,
        profit_pct: profit / total_cost * dec!(100),
        coverage: metrics.coverage,
        loss_probability: metrics.loss_probability,
        expected_profit: metrics.expected_profit,
        tier: classify_tier(metrics.coverage, total_cost),
    })
}

/// Keep portfolios at or below the given tier rank.
pub fn filter_by_tier(portfolios: Vec<Portfolio>, max_tier: Tier) -> Vec<Portfolio> {
    portfolios
        .into_iter()
        .filter(|p| p.tier <= max_tier)
        .collect()
}

/// Keep portfolios with coverage at or above the given floor.
pub fn filter_by_coverage(portfolios: Vec<Portfolio>, min_coverage: Decimal) -> Vec<Portfolio> {
    portfolios
        .into_iter()
        .filter(|p| p.coverage >= min_coverage)
        .collect()
}

/// Order portfolios by tier ascending, then coverage descending.
///
/// The sort is stable; ties beyond (tier, coverage) keep discovery order.
pub fn sort_portfolios(portfolios: &mut [Portfolio]) {
    portfolios.sort_by(|a, b| a.tier.cmp(&b.tier).then(b.coverage.cmp(&a.coverage)));
}
