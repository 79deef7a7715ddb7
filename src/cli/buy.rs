//! Position entry through split-and-sell.

use serde_json::json;

use crate::cli::arb::{describe_sell, sell_json};
use crate::cli::{output, BuyArgs};
use crate::config::Config;
use crate::domain::{MarketId, Position};
use crate::error::Result;

pub async fn execute(args: BuyArgs, config: &Config) -> Result<()> {
    let engine = super::trading_engine(config).await?;
    let position: Position = args.position.into();
    let report = engine
        .split_and_sell(
            &MarketId::new(args.market.as_str()),
            position,
            args.amount,
            args.skip_sell,
        )
        .await?;

    if output::is_json() {
        output::json_output(json!({
            "market_id": args.market,
            "position": position,
            "amount": args.amount,
            "split_tx": report.split_tx,
            "wanted_token": report.wanted_token,
            "entry_price": report.entry_price,
            "sell": sell_json(&report.sell),
        }));
        return Ok(());
    }

    output::section("Position entered");
    output::field("Market", &args.market);
    output::field("Side", position);
    output::field("Amount", format!("${}", args.amount));
    output::field("Split tx", &report.split_tx);
    output::field("Holding", &report.wanted_token);
    output::field("Entry price", format!("${}", report.entry_price));
    describe_sell(&report.sell);
    Ok(())
}
