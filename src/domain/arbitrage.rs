//! Price-only arbitrage detection across related markets.
//!
//! Two structures are recognized:
//!
//! - hierarchical split: an aggregate market's NO plus YES on every component
//!   market pays out $1 whichever way the condition resolves;
//! - negative risk: YES across a mutually exclusive, jointly exhaustive
//!   outcome set pays out exactly $1.
//!
//! Either basket is an arbitrage when its combined price is under a dollar.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::{MarketId, TokenId};
use super::market::{Market, Position};

/// Which arbitrage structure produced a basket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArbKind {
    Split,
    NegRisk,
}

impl std::fmt::Display for ArbKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArbKind::Split => f.write_str("split"),
            ArbKind::NegRisk => f.write_str("neg-risk"),
        }
    }
}

/// One leg of an arbitrage basket. All legs are buys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbLeg {
    pub token_id: TokenId,
    pub market_id: MarketId,
    pub question: String,
    pub position: Position,
    pub price: Decimal,
}

/// Capital assigned to one leg.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionStep {
    pub token_id: TokenId,
    pub market_id: MarketId,
    pub question: String,
    pub position: Position,
    pub price: Decimal,
    pub amount: Decimal,
}

/// A priced arbitrage basket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitragePortfolio {
    pub kind: ArbKind,
    pub legs: Vec<ArbLeg>,
    pub total_cost: Decimal,
    pub profit_margin: Decimal,
    pub description: String,
}

impl ArbitragePortfolio {
    fn from_legs(kind: ArbKind, legs: Vec<ArbLeg>, description: String) -> Option<Self> {
        let total_cost: Decimal = legs.iter().map(|l| l.price).sum();
        if total_cost >= Decimal::ONE {
            return None;
        }
        Some(Self {
            kind,
            legs,
            total_cost,
            profit_margin: Decimal::ONE - total_cost,
            description,
        })
    }

    /// Allocate `total_capital` across legs in proportion to leg price, which
    /// preserves the basket's blended cost basis.
    pub fn execution_steps(&self, total_capital: Decimal) -> Vec<ExecutionStep> {
        self.legs
            .iter()
            .map(|leg| ExecutionStep {
                token_id: leg.token_id.clone(),
                market_id: leg.market_id.clone(),
                question: leg.question.clone(),
                position: leg.position,
                price: leg.price,
                amount: total_capital * leg.price / self.total_cost,
            })
            .collect()
    }
}

fn leg(market: &Market, position: Position) -> ArbLeg {
    ArbLeg {
        token_id: market.token_for(position).clone(),
        market_id: market.id.clone(),
        question: market.question.clone(),
        position,
        price: market.price_for(position),
    }
}

/// Detect a hierarchical-split arbitrage: aggregate NO plus YES on every
/// component. Returns `None` when the components are empty or the basket is
/// not under a dollar.
pub fn split_arbitrage(aggregate: &Market, components: &[Market]) -> Option<ArbitragePortfolio> {
    if components.is_empty() {
        return None;
    }
    let mut legs = vec![leg(aggregate, Position::No)];
    legs.extend(components.iter().map(|m| leg(m, Position::Yes)));
    ArbitragePortfolio::from_legs(
        ArbKind::Split,
        legs,
        format!(
            "NO on \"{}\" + YES on {} component(s)",
            aggregate.question,
            components.len()
        ),
    )
}

/// Detect a negative-risk arbitrage: YES across a mutually exclusive,
/// jointly exhaustive outcome set priced under a dollar.
pub fn negrisk_arbitrage(outcomes: &[Market]) -> Option<ArbitragePortfolio> {
    if outcomes.len() < 2 {
        return None;
    }
    let legs: Vec<ArbLeg> = outcomes.iter().map(|m| leg(m, Position::Yes)).collect();
    ArbitragePortfolio::from_legs(
        ArbKind::NegRisk,
        legs,
        format!("YES across {} exclusive outcomes", outcomes.len()),
    )
}
