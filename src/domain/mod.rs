//! Exchange-agnostic domain types and math.

pub mod arbitrage;
pub mod book;
pub mod coverage;
pub mod ids;
pub mod market;
pub mod relation;

pub use arbitrage::{ArbKind, ArbLeg, ArbitragePortfolio, ExecutionStep};
pub use book::{OrderBook, OrderSide, PriceLevel};
pub use coverage::{Portfolio, Tier};
pub use ids::{ConditionId, MarketId, TokenId};
pub use market::{Market, Position};
pub use relation::{CoverRelationship, Direction, ImplicationClaim};
