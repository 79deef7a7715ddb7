//! Open-order listing.

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli::output;
use crate::config::Config;
use crate::error::Result;
use crate::port::exchange::OpenOrder;
use crate::port::OrderGateway;

#[derive(Tabled)]
struct OrderRow {
    #[tabled(rename = "Order")]
    id: String,
    #[tabled(rename = "Token")]
    token: String,
    #[tabled(rename = "Side")]
    side: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Matched")]
    matched: String,
}

impl From<&OpenOrder> for OrderRow {
    fn from(order: &OpenOrder) -> Self {
        Self {
            id: output::truncate(&order.id, 16),
            token: output::truncate(order.token_id.as_str(), 16),
            side: order.side.to_string(),
            price: format!("${}", order.price),
            size: order.original_size.to_string(),
            matched: order.size_matched.to_string(),
        }
    }
}

pub async fn execute(config: &Config) -> Result<()> {
    let gateway = super::connect_gateway(config).await?;
    let orders = gateway.open_orders().await?;

    if output::is_json() {
        let payload: Vec<serde_json::Value> = orders
            .iter()
            .map(|o| {
                serde_json::json!({
                    "id": o.id,
                    "token_id": o.token_id,
                    "side": o.side,
                    "price": o.price,
                    "original_size": o.original_size,
                    "size_matched": o.size_matched,
                })
            })
            .collect();
        output::json_output(serde_json::Value::Array(payload));
        return Ok(());
    }

    output::section("Open Orders");
    if orders.is_empty() {
        output::note("no open orders");
        return Ok(());
    }
    let rows: Vec<OrderRow> = orders.iter().map(OrderRow::from).collect();
    output::table(&Table::new(rows).with(Style::sharp()).to_string());
    Ok(())
}
