//! Market catalog browsing.

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::adapter::GammaCatalog;
use crate::cli::output;
use crate::cli::{MarketsCommand, MarketIdArg, SearchArgs, LimitArg};
use crate::config::Config;
use crate::domain::{Market, MarketId};
use crate::error::Result;
use crate::port::MarketCatalog;

#[derive(Tabled)]
struct MarketRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Question")]
    question: String,
    #[tabled(rename = "YES")]
    yes: String,
    #[tabled(rename = "NO")]
    no: String,
    #[tabled(rename = "24h Vol")]
    volume_24h: String,
}

impl From<&Market> for MarketRow {
    fn from(market: &Market) -> Self {
        Self {
            id: market.id.to_string(),
            question: output::truncate(&market.question, 48),
            yes: format!("${}", market.yes_price.round_dp(3)),
            no: format!("${}", market.no_price.round_dp(3)),
            volume_24h: format!("${}", market.volume_24h.round_dp(0)),
        }
    }
}

pub async fn execute(command: MarketsCommand, config: &Config) -> Result<()> {
    let catalog = GammaCatalog::new(&config.network.gamma_url, &config.network.clob_url);
    match command {
        MarketsCommand::Trending(LimitArg { limit }) => {
            let markets = catalog.get_trending_markets(limit).await?;
            render_list("Trending markets", &markets)
        }
        MarketsCommand::Search(SearchArgs { query, limit }) => {
            let markets = catalog.search_markets(&query, limit).await?;
            render_list(&format!("Markets matching \"{query}\""), &markets)
        }
        MarketsCommand::Show(MarketIdArg { id }) => {
            // Catalog IDs are numeric; anything else is treated as a slug.
            let market = if id.chars().all(|c| c.is_ascii_digit()) {
                catalog.get_market(&MarketId::new(id)).await?
            } else {
                catalog.get_market_by_slug(&id).await?
            };
            render_one(&market)
        }
    }
}

fn render_list(title: &str, markets: &[Market]) -> Result<()> {
    if output::is_json() {
        output::json_output(serde_json::to_value(markets)?);
        return Ok(());
    }

    output::section(title);
    if markets.is_empty() {
        output::note("no markets found");
        return Ok(());
    }
    let rows: Vec<MarketRow> = markets.iter().map(MarketRow::from).collect();
    let table = Table::new(rows).with(Style::sharp()).to_string();
    output::table(&table);
    Ok(())
}

fn render_one(market: &Market) -> Result<()> {
    if output::is_json() {
        output::json_output(serde_json::to_value(market)?);
        return Ok(());
    }

    output::section(&market.question);
    output::field("ID", &market.id);
    output::field("Slug", &market.slug);
    output::field("Condition", &market.condition_id);
    output::field("YES price", format!("${}", market.yes_price));
    output::field("NO price", format!("${}", market.no_price));
    output::field("YES token", &market.yes_token);
    output::field("NO token", &market.no_token);
    output::field("Volume", format!("${}", market.volume));
    output::field("24h volume", format!("${}", market.volume_24h));
    output::field("Liquidity", format!("${}", market.liquidity));
    if let Some(end) = market.end_date {
        output::field("Ends", end.to_rfc3339());
    }
    if market.is_tradable() {
        output::success("tradable");
    } else {
        output::warning("not tradable (closed, resolved, or effectively decided)");
    }
    Ok(())
}
