//! Market snapshots and outcome positions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::ids::{ConditionId, MarketId, TokenId};

/// Price above which an outcome is effectively decided and the market is no
/// longer worth trading.
pub const DECIDED_PRICE: Decimal = dec!(0.99);

/// Which side of a binary market a position is taken on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Position {
    Yes,
    No,
}

impl Position {
    pub fn opposite(self) -> Self {
        match self {
            Position::Yes => Position::No,
            Position::No => Position::Yes,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Position::Yes => "YES",
            Position::No => "NO",
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time snapshot of a binary market.
///
/// Snapshots are fetched fresh for every operation that prices a decision;
/// they are never cached across calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub id: MarketId,
    pub question: String,
    pub slug: String,
    pub condition_id: ConditionId,
    pub yes_token: TokenId,
    pub no_token: TokenId,
    pub yes_price: Decimal,
    pub no_price: Decimal,
    pub volume: Decimal,
    pub volume_24h: Decimal,
    pub liquidity: Decimal,
    pub end_date: Option<DateTime<Utc>>,
    pub active: bool,
    pub closed: bool,
    pub resolved: bool,
}

impl Market {
    /// Whether the market still admits a meaningful position.
    ///
    /// A market fails the guard once it is closed or resolved, or once either
    /// outcome trades at [`DECIDED_PRICE`] or above.
    pub fn is_tradable(&self) -> bool {
        !self.closed
            && !self.resolved
            && self.yes_price < DECIDED_PRICE
            && self.no_price < DECIDED_PRICE
    }

    /// Price of the given outcome.
    pub fn price_for(&self, position: Position) -> Decimal {
        match position {
            Position::Yes => self.yes_price,
            Position::No => self.no_price,
        }
    }

    /// Token that pays out when the given outcome occurs.
    pub fn token_for(&self, position: Position) -> &TokenId {
        match position {
            Position::Yes => &self.yes_token,
            Position::No => &self.no_token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(yes: Decimal, no: Decimal) -> Market {
        Market {
            id: MarketId::new("1"),
            question: "Will it happen?".into(),
            slug: "will-it-happen".into(),
            condition_id: ConditionId::new("0x01"),
            yes_token: TokenId::new("yes-1"),
            no_token: TokenId::new("no-1"),
            yes_price: yes,
            no_price: no,
            volume: dec!(1000),
            volume_24h: dec!(100),
            liquidity: dec!(500),
            end_date: None,
            active: true,
            closed: false,
            resolved: false,
        }
    }

    #[test]
    fn open_market_is_tradable() {
        assert!(snapshot(dec!(0.60), dec!(0.40)).is_tradable());
    }

    #[test]
    fn closed_market_is_not_tradable() {
        let mut market = snapshot(dec!(0.60), dec!(0.40));
        market.closed = true;
        assert!(!market.is_tradable());
    }

    #[test]
    fn resolved_market_is_not_tradable() {
        let mut market = snapshot(dec!(0.60), dec!(0.40));
        market.resolved = true;
        assert!(!market.is_tradable());
    }

    #[test]
    fn effectively_decided_market_is_not_tradable() {
        assert!(!snapshot(dec!(0.99), dec!(0.01)).is_tradable());
        assert!(!snapshot(dec!(0.005), dec!(0.995)).is_tradable());
    }

    #[test]
    fn position_accessors() {
        let market = snapshot(dec!(0.70), dec!(0.30));
        assert_eq!(market.price_for(Position::Yes), dec!(0.70));
        assert_eq!(market.price_for(Position::No), dec!(0.30));
        assert_eq!(market.token_for(Position::No).as_str(), "no-1");
        assert_eq!(Position::Yes.opposite(), Position::No);
    }
}
