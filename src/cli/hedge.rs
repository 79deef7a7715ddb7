//! Hedge discovery commands.

use std::sync::Arc;

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::adapter::{GammaCatalog, OpenRouterOracle};
use crate::app::{HedgeScanner, ImplicationExtractor, ScanOptions};
use crate::cli::{output, AnalyzeArgs, HedgeCommand, HedgeScanArgs};
use crate::config::Config;
use crate::domain::coverage::{Portfolio, Tier};
use crate::error::Result;

pub async fn execute(command: HedgeCommand, config: &Config) -> Result<()> {
    let scanner = build_scanner(config)?;
    match command {
        HedgeCommand::Scan(args) => scan(scanner, args, config).await,
        HedgeCommand::Analyze(args) => analyze(scanner, args, config).await,
    }
}

fn build_scanner(config: &Config) -> Result<HedgeScanner> {
    let catalog = Arc::new(GammaCatalog::new(
        config.network.gamma_url.as_str(),
        config.network.clob_url.as_str(),
    ));
    let oracle = Arc::new(OpenRouterOracle::new(
        config.oracle.base_url.as_str(),
        config.require_oracle_key()?,
        config.oracle.model.as_str(),
    ));
    Ok(HedgeScanner::new(catalog, ImplicationExtractor::new(oracle)))
}

async fn scan(scanner: HedgeScanner, args: HedgeScanArgs, config: &Config) -> Result<()> {
    let options = ScanOptions {
        query: args.query,
        limit: args.limit,
        min_coverage: args.min_coverage.unwrap_or(config.trading.min_coverage),
        max_tier: Tier::from_rank(args.max_tier.unwrap_or(config.trading.max_tier)),
    };
    let portfolios = scanner.scan(&options).await?;
    render(&portfolios)
}

async fn analyze(scanner: HedgeScanner, args: AnalyzeArgs, config: &Config) -> Result<()> {
    let min_coverage = args.min_coverage.unwrap_or(config.trading.min_coverage);
    let portfolios = scanner
        .analyze(&args.first, &args.second, min_coverage)
        .await?;
    render(&portfolios)
}

#[derive(Tabled)]
struct PortfolioRow {
    #[tabled(rename = "Tier")]
    tier: String,
    #[tabled(rename = "Coverage")]
    coverage: String,
    #[tabled(rename = "Cost")]
    cost: String,
    #[tabled(rename = "Profit")]
    profit: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Cover")]
    cover: String,
}

impl From<&Portfolio> for PortfolioRow {
    fn from(p: &Portfolio) -> Self {
        Self {
            tier: p.tier.label().to_string(),
            coverage: format!("{}%", (p.coverage * rust_decimal_macros::dec!(100)).round_dp(2)),
            cost: format!("${}", p.total_cost.round_dp(3)),
            profit: format!("{}%", p.profit_pct.round_dp(1)),
            target: format!(
                "{} {}",
                p.target_position,
                output::truncate(&p.target_question, 36)
            ),
            cover: format!(
                "{} {}",
                p.cover_position,
                output::truncate(&p.cover_question, 36)
            ),
        }
    }
}

fn render(portfolios: &[Portfolio]) -> Result<()> {
    if output::is_json() {
        output::json_output(serde_json::to_value(portfolios)?);
        return Ok(());
    }

    output::section("Hedged portfolios");
    if portfolios.is_empty() {
        output::note("no covering portfolios found");
        return Ok(());
    }
    let rows: Vec<PortfolioRow> = portfolios.iter().map(PortfolioRow::from).collect();
    output::table(&Table::new(rows).with(Style::sharp()).to_string());

    for p in portfolios {
        output::note(&format!(
            "{} / {}: {}",
            p.target_id, p.cover_id, p.relationship
        ));
    }
    Ok(())
}
