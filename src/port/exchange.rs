//! Order gateway port for the exchange CLOB.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{OrderBook, OrderSide, TokenId};
use crate::error::Result;

/// Order lifetime on the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeInForce {
    /// Fill completely and immediately or cancel.
    Fok,
    /// Rest on the book until filled or cancelled.
    Gtc,
}

/// A limit order to submit.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub token_id: TokenId,
    pub side: OrderSide,
    pub price: Decimal,
    pub size: Decimal,
    pub tif: TimeInForce,
}

/// An accepted order. FOK acceptance implies a complete fill; GTC acceptance
/// only means the order is resting.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order_id: String,
}

/// A live order on the book.
#[derive(Debug, Clone)]
pub struct OpenOrder {
    pub id: String,
    pub token_id: TokenId,
    pub side: OrderSide,
    pub price: Decimal,
    pub original_size: Decimal,
    pub size_matched: Decimal,
}

/// Exchange order operations. Callers submit sequentially through `&self`;
/// no concurrent submission API is exposed.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Fetch a fresh book snapshot for one token.
    async fn get_order_book(&self, token_id: &TokenId) -> Result<OrderBook>;

    /// Submit a limit order.
    async fn place_order(&self, request: &OrderRequest) -> Result<PlacedOrder>;

    /// Cancel a resting order.
    async fn cancel(&self, order_id: &str) -> Result<()>;

    /// List the account's open orders.
    async fn open_orders(&self) -> Result<Vec<OpenOrder>>;

    /// Fetch the account's collateral balance on the exchange.
    async fn collateral_balance(&self) -> Result<Decimal>;
}

/// Re-establishes the gateway's network path.
///
/// When the exchange edge blocks a request, retrying through the same
/// connection pool re-presents the same egress address and fails the same
/// way. A provisioner tears the pool down so the next request leaves through
/// a different path.
#[async_trait]
pub trait ConnectionProvisioner: Send + Sync {
    /// Whether reconnecting can actually change the egress address.
    fn has_alternate_egress(&self) -> bool;

    /// Tear down and rebuild the gateway's connection.
    async fn reprovision(&self) -> Result<()>;
}

#[cfg(test)]
pub mod tests {
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Mock gateway with scripted order outcomes and fixed books.
    pub struct MockGateway {
        books: HashMap<TokenId, OrderBook>,
        place_results: Mutex<VecDeque<Result<PlacedOrder>>>,
        pub placed: Mutex<Vec<OrderRequest>>,
    }

    impl MockGateway {
        pub fn new() -> Self {
            Self {
                books: HashMap::new(),
                place_results: Mutex::new(VecDeque::new()),
                placed: Mutex::new(Vec::new()),
            }
        }

        pub fn with_book(mut self, book: OrderBook) -> Self {
            self.books.insert(book.token_id().clone(), book);
            self
        }

        /// Queue the outcome for the next `place_order` call. Unqueued calls
        /// succeed.
        pub fn queue_place(self, result: Result<PlacedOrder>) -> Self {
            self.place_results.lock().unwrap().push_back(result);
            self
        }

        pub fn placed_count(&self) -> usize {
            self.placed.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl OrderGateway for MockGateway {
        async fn get_order_book(&self, token_id: &TokenId) -> Result<OrderBook> {
            Ok(self
                .books
                .get(token_id)
                .cloned()
                .unwrap_or_else(|| OrderBook::with_levels(token_id.clone(), vec![], vec![])))
        }

        async fn place_order(&self, request: &OrderRequest) -> Result<PlacedOrder> {
            self.placed.lock().unwrap().push(request.clone());
            self.place_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    Ok(PlacedOrder {
                        order_id: "mock-order".into(),
                    })
                })
        }

        async fn cancel(&self, _order_id: &str) -> Result<()> {
            Ok(())
        }

        async fn open_orders(&self) -> Result<Vec<OpenOrder>> {
            Ok(vec![])
        }

        async fn collateral_balance(&self) -> Result<Decimal> {
            Ok(Decimal::ZERO)
        }
    }

    /// Mock provisioner counting reconnects.
    pub struct MockProvisioner {
        alternate: bool,
        pub reconnects: AtomicU32,
    }

    impl MockProvisioner {
        pub fn new(alternate: bool) -> Self {
            Self {
                alternate,
                reconnects: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ConnectionProvisioner for MockProvisioner {
        fn has_alternate_egress(&self) -> bool {
            self.alternate
        }

        async fn reprovision(&self) -> Result<()> {
            self.reconnects.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}
