//! Exchange CLOB adapter built on the official client SDK.
//!
//! Holds one authenticated client behind a `RwLock`. Reprovisioning replaces
//! the whole client, which drops the old connection pool; with a rotating
//! egress proxy configured, the replacement pool leaves through a different
//! address. Book levels are normalized best-first at this boundary so the
//! domain depth walk can rely on the ordering.

use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use polymarket_client_sdk::auth::state::Authenticated;
use polymarket_client_sdk::auth::{Normal, Signer};
use polymarket_client_sdk::clob::types::request::{
    BalanceAllowanceRequest, OrderBookSummaryRequest, OrdersRequest,
};
use polymarket_client_sdk::clob::types::{
    AssetType, OrderType as SdkOrderType, Side as SdkSide, SignatureType,
};
use polymarket_client_sdk::clob::{Client, Config as ClobConfig};
use polymarket_client_sdk::types::U256;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::domain::{OrderBook, OrderSide, PriceLevel, TokenId};
use crate::error::{ExecutionError, Result};
use crate::port::exchange::{
    ConnectionProvisioner, OpenOrder, OrderGateway, OrderRequest, PlacedOrder, TimeInForce,
};

type AuthenticatedClient = Client<Authenticated<Normal>>;

/// Authenticated gateway to the exchange CLOB.
pub struct ClobGateway {
    base_url: String,
    signer: Arc<PrivateKeySigner>,
    funder: Option<Address>,
    egress_proxy: Option<String>,
    client: RwLock<Arc<AuthenticatedClient>>,
}

impl ClobGateway {
    /// Authenticate against the CLOB and return a ready gateway.
    pub async fn connect(
        base_url: impl Into<String>,
        private_key: &str,
        chain_id: u64,
        funder: Option<&str>,
        egress_proxy: Option<String>,
    ) -> Result<Self> {
        let signer = PrivateKeySigner::from_str(private_key.trim_start_matches("0x"))
            .map_err(|e| ExecutionError::AuthFailed(format!("invalid signing key: {e}")))?
            .with_chain_id(Some(chain_id));

        let funder = funder
            .map(Address::from_str)
            .transpose()
            .map_err(|e| ExecutionError::AuthFailed(format!("invalid funder address: {e}")))?;

        let base_url = base_url.into();
        let client = Self::authenticate(&base_url, &signer, funder).await?;
        info!(address = %signer.address(), funder = ?funder, "CLOB client authenticated");

        Ok(Self {
            base_url,
            signer: Arc::new(signer),
            funder,
            egress_proxy,
            client: RwLock::new(Arc::new(client)),
        })
    }

    async fn authenticate(
        base_url: &str,
        signer: &PrivateKeySigner,
        funder: Option<Address>,
    ) -> Result<AuthenticatedClient> {
        let client = Client::new(base_url, ClobConfig::default())
            .map_err(|e| ExecutionError::AuthFailed(format!("failed to create client: {e}")))?;

        let authenticated = match funder {
            // Funds held by a proxy wallet; orders settle against it.
            Some(funder) => client
                .authentication_builder(signer)
                .funder(funder)
                .signature_type(SignatureType::Proxy)
                .authenticate()
                .await,
            None => client.authentication_builder(signer).authenticate().await,
        }
        .map_err(|e| ExecutionError::AuthFailed(e.to_string()))?;

        Ok(authenticated)
    }

    async fn client(&self) -> Arc<AuthenticatedClient> {
        self.client.read().await.clone()
    }

    /// Classify a submission failure. Edge interception (the request never
    /// reached the exchange) is retryable through a different egress path;
    /// everything else is not.
    fn classify_submission(err: &polymarket_client_sdk::error::Error) -> ExecutionError {
        let text = err.to_string();
        if is_edge_block(&text) {
            ExecutionError::NetworkBlock(text)
        } else {
            ExecutionError::SubmissionFailed(text)
        }
    }
}

// A plain 403 can come from the exchange itself; only a 403 carrying an
// interstitial marker means the edge intercepted the request.
fn is_edge_block(text: &str) -> bool {
    let lowered = text.to_lowercase();
    lowered.contains("403")
        && (lowered.contains("cloudflare")
            || lowered.contains("blocked")
            || lowered.contains("just a moment"))
}

fn parse_token(token_id: &TokenId) -> Result<U256> {
    U256::from_str(token_id.as_str()).map_err(|e| {
        ExecutionError::InvalidTokenId {
            token_id: token_id.as_str().to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

// `Side` is non-exhaustive upstream; unknown variants read as buys.
fn to_domain_side(side: SdkSide) -> OrderSide {
    match side {
        SdkSide::Sell => OrderSide::Sell,
        _ => OrderSide::Buy,
    }
}

fn to_level(price: String, size: String) -> PriceLevel {
    PriceLevel::new(
        price.parse().unwrap_or(Decimal::ZERO),
        size.parse().unwrap_or(Decimal::ZERO),
    )
}

#[async_trait]
impl OrderGateway for ClobGateway {
    async fn get_order_book(&self, token_id: &TokenId) -> Result<OrderBook> {
        let client = self.client().await;
        let request = OrderBookSummaryRequest::builder()
            .token_id(parse_token(token_id)?)
            .build();
        let response = client.order_book(&request).await?;

        let mut bids: Vec<PriceLevel> = response
            .bids
            .into_iter()
            .map(|l| to_level(l.price.to_string(), l.size.to_string()))
            .collect();
        let mut asks: Vec<PriceLevel> = response
            .asks
            .into_iter()
            .map(|l| to_level(l.price.to_string(), l.size.to_string()))
            .collect();
        // The API does not promise level ordering; the domain walk does.
        bids.sort_by(|a, b| b.price().cmp(&a.price()));
        asks.sort_by(|a, b| a.price().cmp(&b.price()));

        debug!(token = %token_id, bids = bids.len(), asks = asks.len(), "fetched order book");
        Ok(OrderBook::with_levels(token_id.clone(), bids, asks))
    }

    async fn place_order(&self, request: &OrderRequest) -> Result<PlacedOrder> {
        let client = self.client().await;

        let token_id = parse_token(&request.token_id)?;
        let side = match request.side {
            OrderSide::Buy => SdkSide::Buy,
            OrderSide::Sell => SdkSide::Sell,
        };
        let order_type = match request.tif {
            TimeInForce::Fok => SdkOrderType::FOK,
            TimeInForce::Gtc => SdkOrderType::GTC,
        };

        let order = client
            .limit_order()
            .token_id(token_id)
            .side(side)
            .price(request.price)
            .size(request.size)
            .order_type(order_type)
            .build()
            .await
            .map_err(|e| ExecutionError::OrderBuildFailed(e.to_string()))?;

        let signed = client
            .sign(self.signer.as_ref(), order)
            .await
            .map_err(|e| ExecutionError::SigningFailed(e.to_string()))?;

        let response = client
            .post_order(signed)
            .await
            .map_err(|e| Self::classify_submission(&e))?;

        info!(
            order_id = %response.order_id,
            token = %request.token_id,
            side = %request.side,
            price = %request.price,
            size = %request.size,
            tif = ?request.tif,
            "order accepted"
        );
        Ok(PlacedOrder {
            order_id: response.order_id,
        })
    }

    async fn cancel(&self, order_id: &str) -> Result<()> {
        let client = self.client().await;
        let response = client
            .cancel_order(order_id)
            .await
            .map_err(|e| ExecutionError::SubmissionFailed(format!("cancel failed: {e}")))?;

        if let Some(reason) = response.not_canceled.get(order_id) {
            return Err(ExecutionError::OrderRejected(format!(
                "order {order_id} not cancelled: {reason}"
            ))
            .into());
        }
        info!(order_id, "order cancelled");
        Ok(())
    }

    async fn open_orders(&self) -> Result<Vec<OpenOrder>> {
        let client = self.client().await;
        let request = OrdersRequest::builder().build();
        let page = client.orders(&request, None).await?;

        Ok(page
            .data
            .into_iter()
            .map(|o| OpenOrder {
                id: o.id,
                token_id: TokenId::new(o.asset_id.to_string()),
                side: to_domain_side(o.side),
                price: o.price.to_string().parse().unwrap_or(Decimal::ZERO),
                original_size: o.original_size.to_string().parse().unwrap_or(Decimal::ZERO),
                size_matched: o.size_matched.to_string().parse().unwrap_or(Decimal::ZERO),
            })
            .collect())
    }

    async fn collateral_balance(&self) -> Result<Decimal> {
        let client = self.client().await;
        let request = BalanceAllowanceRequest::builder()
            .asset_type(AssetType::Collateral)
            .build();
        let response = client.balance_allowance(request).await?;
        response
            .balance
            .to_string()
            .parse()
            .map_err(|e| ExecutionError::SubmissionFailed(format!("unparseable balance: {e}")).into())
    }
}

#[async_trait]
impl ConnectionProvisioner for ClobGateway {
    fn has_alternate_egress(&self) -> bool {
        self.egress_proxy.is_some()
    }

    async fn reprovision(&self) -> Result<()> {
        warn!("reprovisioning CLOB connection");
        let fresh = Self::authenticate(&self.base_url, &self.signer, self.funder).await?;
        *self.client.write().await = Arc::new(fresh);
        Ok(())
    }
}
