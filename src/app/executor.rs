//! Split-and-sell execution engine.
//!
//! Entering a position goes through three stages: a liquidity check on the
//! unwanted side, an on-chain split minting both outcome tokens, and a sell
//! of the unwanted token. Capital only moves after the liquidity check
//! passes, and a successful split is always reported even when the sell
//! fails — the tokens exist on chain regardless of what the CLOB does.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::domain::arbitrage::{ArbitragePortfolio, ExecutionStep};
use crate::domain::{MarketId, OrderSide, Position, TokenId};
use crate::error::{Error, ExecutionError, LiquidityError, Result};
use crate::port::exchange::{OrderRequest, PlacedOrder, TimeInForce};
use crate::port::{ChainGateway, ConnectionProvisioner, MarketCatalog, OrderGateway};

/// FOK sells undercut the quoted price by this factor to cross the spread.
const FOK_UNDERCUT: Decimal = dec!(0.90);
const FOK_MIN_PRICE: Decimal = dec!(0.01);

/// GTC fallback sells tolerate a deeper slip.
const GTC_UNDERCUT: Decimal = dec!(0.80);
const GTC_MIN_PRICE: Decimal = dec!(0.02);

const RETRY_PAUSE: Duration = Duration::from_secs(1);

/// How the unwanted-side sell ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SellOutcome {
    /// FOK accepted; the full size is filled.
    Filled { order_id: String },
    /// GTC accepted; the order rests and may fill later.
    Placed { order_id: String },
    /// Sell was requested but could not be completed; tokens are held.
    Manual { reason: String },
    /// Caller asked to keep both sides.
    Skipped,
}

/// Result of one split-and-sell request.
#[derive(Debug, Clone)]
pub struct TradeReport {
    pub split_tx: String,
    pub wanted_token: TokenId,
    pub entry_price: Decimal,
    pub sell: SellOutcome,
}

pub struct ExecutionEngine {
    catalog: Arc<dyn MarketCatalog>,
    gateway: Arc<dyn OrderGateway>,
    provisioner: Arc<dyn ConnectionProvisioner>,
    chain: Arc<dyn ChainGateway>,
    /// Bounded attempts for network-block retries.
    retry_attempts: u32,
    /// Lowest bid price counted toward sellable depth.
    liquidity_floor: Decimal,
}

impl ExecutionEngine {
    pub fn new(
        catalog: Arc<dyn MarketCatalog>,
        gateway: Arc<dyn OrderGateway>,
        provisioner: Arc<dyn ConnectionProvisioner>,
        chain: Arc<dyn ChainGateway>,
        retry_attempts: u32,
        liquidity_floor: Decimal,
    ) -> Self {
        Self {
            catalog,
            gateway,
            provisioner,
            chain,
            retry_attempts,
            liquidity_floor,
        }
    }

    /// Enter `position` on `market_id` for `amount` dollars by splitting
    /// collateral and selling the unwanted side.
    pub async fn split_and_sell(
        &self,
        market_id: &MarketId,
        position: Position,
        amount: Decimal,
        skip_sell: bool,
    ) -> Result<TradeReport> {
        let market = self.catalog.get_market(market_id).await?;
        let unwanted = position.opposite();
        let unwanted_token = market.token_for(unwanted).clone();
        let unwanted_price = market.price_for(unwanted);

        if !skip_sell {
            self.check_sell_depth(&unwanted_token, amount).await?;
        }

        info!(
            market = %market.id,
            %position,
            %amount,
            "splitting collateral"
        );
        let split_tx = self
            .chain
            .split_position(&market.condition_id, amount)
            .await?;

        let sell = if skip_sell {
            SellOutcome::Skipped
        } else {
            self.sell_robust(&unwanted_token, amount, unwanted_price)
                .await
        };

        Ok(TradeReport {
            split_tx,
            wanted_token: market.token_for(position).clone(),
            entry_price: market.price_for(position),
            sell,
        })
    }

    /// Execute every leg of an arbitrage basket sequentially. The first
    /// failing leg aborts the remainder; completed legs stay reported.
    pub async fn execute_arbitrage(
        &self,
        portfolio: &ArbitragePortfolio,
        total_capital: Decimal,
    ) -> Result<Vec<(ExecutionStep, TradeReport)>> {
        let steps = portfolio.execution_steps(total_capital);
        let mut reports = Vec::with_capacity(steps.len());

        for step in steps {
            info!(
                market = %step.market_id,
                position = %step.position,
                amount = %step.amount,
                "executing arbitrage leg"
            );
            let report = self
                .split_and_sell(&step.market_id, step.position, step.amount, false)
                .await?;
            reports.push((step, report));
        }
        Ok(reports)
    }

    /// Abort before committing capital if the book cannot absorb the sell.
    async fn check_sell_depth(&self, token: &TokenId, amount: Decimal) -> Result<()> {
        let book = self.gateway.get_order_book(token).await?;
        let fillable = book.fillable_at(OrderSide::Sell, self.liquidity_floor);
        if fillable < amount {
            return Err(LiquidityError {
                token: token.as_str().to_string(),
                requested: amount,
                fillable,
            }
            .into());
        }
        Ok(())
    }

    /// Sell with fallbacks: FOK at an aggressive price, then a liquidity
    /// re-check, then a resting GTC that crosses the spread.
    async fn sell_robust(&self, token: &TokenId, amount: Decimal, price: Decimal) -> SellOutcome {
        let fok_price = (price * FOK_UNDERCUT).max(FOK_MIN_PRICE).round_dp(2);
        let fok = OrderRequest {
            token_id: token.clone(),
            side: OrderSide::Sell,
            price: fok_price,
            size: amount,
            tif: TimeInForce::Fok,
        };
        let fok_error = match self.place_with_retry(&fok).await {
            Ok(placed) => {
                return SellOutcome::Filled {
                    order_id: placed.order_id,
                }
            }
            Err(err) => err,
        };
        warn!(token = %token, error = %fok_error, "FOK sell failed, trying GTC fallback");

        // The book may have thinned since the pre-split check.
        match self.check_sell_depth(token, amount).await {
            Ok(()) => {}
            Err(err) => {
                return SellOutcome::Manual {
                    reason: format!("{err}; FOK error: {fok_error}"),
                }
            }
        }

        let gtc_price = (price * GTC_UNDERCUT).max(GTC_MIN_PRICE).round_dp(2);
        let gtc = OrderRequest {
            token_id: token.clone(),
            side: OrderSide::Sell,
            price: gtc_price,
            size: amount,
            tif: TimeInForce::Gtc,
        };
        match self.place_with_retry(&gtc).await {
            Ok(placed) => SellOutcome::Placed {
                order_id: placed.order_id,
            },
            Err(err) => SellOutcome::Manual {
                reason: manual_reason(&err),
            },
        }
    }

    /// Submit an order, retrying only edge-blocked requests and only when a
    /// different egress path actually exists.
    async fn place_with_retry(&self, request: &OrderRequest) -> Result<PlacedOrder> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.gateway.place_order(request).await {
                Ok(placed) => return Ok(placed),
                Err(Error::Execution(ExecutionError::NetworkBlock(message))) => {
                    if !self.provisioner.has_alternate_egress() || attempt >= self.retry_attempts {
                        return Err(ExecutionError::NetworkBlock(message).into());
                    }
                    warn!(attempt, "request blocked at the edge, rotating egress");
                    self.provisioner.reprovision().await?;
                    sleep(RETRY_PAUSE).await;
                }
                Err(other) => return Err(other),
            }
        }
    }
}

fn manual_reason(err: &Error) -> String {
    match err {
        Error::Execution(ExecutionError::NetworkBlock(_)) => {
            "egress blocked; the split succeeded and the tokens are held, sell manually".into()
        }
        other => other.to_string(),
    }
}
