//! Order book snapshots and depth math.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::TokenId;

/// Order direction against the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => f.write_str("BUY"),
            OrderSide::Sell => f.write_str("SELL"),
        }
    }
}

/// A single price level with aggregate size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    price: Decimal,
    size: Decimal,
}

impl PriceLevel {
    pub fn new(price: Decimal, size: Decimal) -> Self {
        Self { price, size }
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn size(&self) -> Decimal {
        self.size
    }
}

/// Snapshot of one token's book. Bids and asks are best-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBook {
    token_id: TokenId,
    bids: Vec<PriceLevel>,
    asks: Vec<PriceLevel>,
}

impl OrderBook {
    pub fn with_levels(token_id: TokenId, bids: Vec<PriceLevel>, asks: Vec<PriceLevel>) -> Self {
        Self {
            token_id,
            bids,
            asks,
        }
    }

    pub fn token_id(&self) -> &TokenId {
        &self.token_id
    }

    pub fn bids(&self) -> &[PriceLevel] {
        &self.bids
    }

    pub fn asks(&self) -> &[PriceLevel] {
        &self.asks
    }

    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.first()
    }

    /// Size fillable at or better than `limit` for an order on `side`.
    ///
    /// Walks the opposing levels best-first and accumulates size while each
    /// level satisfies the limit; the first failing level terminates the walk
    /// even if deeper levels would satisfy it again.
    pub fn fillable_at(&self, side: OrderSide, limit: Decimal) -> Decimal {
        let levels = match side {
            OrderSide::Sell => &self.bids,
            OrderSide::Buy => &self.asks,
        };
        let mut fillable = Decimal::ZERO;
        for level in levels {
            let acceptable = match side {
                OrderSide::Sell => level.price >= limit,
                OrderSide::Buy => level.price <= limit,
            };
            if !acceptable {
                break;
            }
            fillable += level.size;
        }
        fillable
    }

    /// Whether `amount` can be filled on `side` without crossing `limit`.
    pub fn has_depth(&self, side: OrderSide, limit: Decimal, amount: Decimal) -> bool {
        self.fillable_at(side, limit) >= amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn book(bids: Vec<(Decimal, Decimal)>, asks: Vec<(Decimal, Decimal)>) -> OrderBook {
        OrderBook::with_levels(
            TokenId::new("tok"),
            bids.into_iter()
                .map(|(p, s)| PriceLevel::new(p, s))
                .collect(),
            asks.into_iter()
                .map(|(p, s)| PriceLevel::new(p, s))
                .collect(),
        )
    }

    #[test]
    fn sell_walk_accumulates_until_floor() {
        let book = book(
            vec![
                (dec!(0.30), dec!(40)),
                (dec!(0.20), dec!(30)),
                (dec!(0.04), dec!(500)),
            ],
            vec![],
        );
        assert_eq!(book.fillable_at(OrderSide::Sell, dec!(0.05)), dec!(70));
        assert!(book.has_depth(OrderSide::Sell, dec!(0.05), dec!(70)));
        assert!(!book.has_depth(OrderSide::Sell, dec!(0.05), dec!(71)));
    }

    #[test]
    fn buy_walk_stops_at_first_failing_level() {
        let book = book(
            vec![],
            vec![(dec!(0.50), dec!(10)), (dec!(0.55), dec!(20))],
        );
        assert_eq!(book.fillable_at(OrderSide::Buy, dec!(0.52)), dec!(10));
        assert!(!book.has_depth(OrderSide::Buy, dec!(0.52), dec!(15)));
    }

    #[test]
    fn walk_does_not_resume_past_a_gap() {
        // A deeper level back inside the limit must not count.
        let book = book(
            vec![
                (dec!(0.30), dec!(40)),
                (dec!(0.04), dec!(10)),
                (dec!(0.20), dec!(30)),
            ],
            vec![],
        );
        assert_eq!(book.fillable_at(OrderSide::Sell, dec!(0.05)), dec!(40));
    }

    #[test]
    fn empty_book_fills_nothing() {
        let book = book(vec![], vec![]);
        assert_eq!(book.fillable_at(OrderSide::Sell, dec!(0.05)), dec!(0));
        assert!(!book.has_depth(OrderSide::Buy, dec!(0.99), dec!(1)));
    }

    #[test]
    fn best_levels() {
        let book = book(
            vec![(dec!(0.45), dec!(100))],
            vec![(dec!(0.50), dec!(100))],
        );
        assert_eq!(book.best_bid().map(|l| l.price()), Some(dec!(0.45)));
        assert_eq!(book.best_ask().map(|l| l.price()), Some(dec!(0.50)));
    }
}
