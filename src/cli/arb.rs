//! Arbitrage scanning and execution.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::adapter::GammaCatalog;
use crate::app::{ArbScanner, SellOutcome, TradeReport};
use crate::cli::{output, ArbCommand, ArbExecuteArgs, ArbScanArgs};
use crate::config::Config;
use crate::domain::arbitrage::{ArbitragePortfolio, ExecutionStep};
use crate::error::{ConfigError, Result};

pub async fn execute(command: ArbCommand, config: &Config) -> Result<()> {
    match command {
        ArbCommand::Scan(args) => scan(args, config).await,
        ArbCommand::Execute(args) => run_basket(args, config).await,
    }
}

async fn detect(args: &ArbScanArgs, config: &Config) -> Result<Option<ArbitragePortfolio>> {
    let catalog = Arc::new(GammaCatalog::new(
        config.network.gamma_url.as_str(),
        config.network.clob_url.as_str(),
    ));
    let scanner = ArbScanner::new(catalog);

    if let Some(aggregate) = &args.aggregate {
        return scanner.split_opportunity(aggregate, &args.component).await;
    }
    if args.outcome.len() >= 2 {
        return scanner.negrisk_opportunity(&args.outcome).await;
    }
    Err(ConfigError::InvalidValue {
        field: "grouping",
        reason: "pass --aggregate with --component, or at least two --outcome".into(),
    }
    .into())
}

async fn scan(args: ArbScanArgs, config: &Config) -> Result<()> {
    match detect(&args, config).await? {
        Some(portfolio) => render_portfolio(&portfolio),
        None => {
            if output::is_json() {
                output::json_output(json!({ "opportunity": null }));
            } else {
                output::note("no edge at fresh prices");
            }
            Ok(())
        }
    }
}

async fn run_basket(args: ArbExecuteArgs, config: &Config) -> Result<()> {
    // Detection runs again right before execution; a spread that has
    // disappeared aborts here with no capital committed.
    let Some(portfolio) = detect(&args.grouping, config).await? else {
        if output::is_json() {
            output::json_output(json!({ "opportunity": null, "executed": false }));
        } else {
            output::note("no edge at fresh prices, nothing to execute");
        }
        return Ok(());
    };

    render_portfolio(&portfolio)?;
    if !args.yes && !confirm(&format!("Commit ${} across these legs?", args.amount))? {
        output::note("aborted");
        return Ok(());
    }

    let engine = super::trading_engine(config).await?;
    let reports = engine.execute_arbitrage(&portfolio, args.amount).await?;
    render_reports(&reports)
}

fn render_portfolio(portfolio: &ArbitragePortfolio) -> Result<()> {
    if output::is_json() {
        output::json_output(json!({ "opportunity": portfolio }));
        return Ok(());
    }

    #[derive(Tabled)]
    struct LegRow {
        #[tabled(rename = "Market")]
        market: String,
        #[tabled(rename = "Side")]
        side: String,
        #[tabled(rename = "Price")]
        price: String,
    }

    output::section(&format!("{} arbitrage", portfolio.kind));
    output::note(&portfolio.description);
    let rows: Vec<LegRow> = portfolio
        .legs
        .iter()
        .map(|leg| LegRow {
            market: output::truncate(&leg.question, 48),
            side: leg.position.to_string(),
            price: format!("${}", leg.price),
        })
        .collect();
    output::table(&Table::new(rows).with(Style::sharp()).to_string());
    output::field("Total cost", format!("${}", portfolio.total_cost));
    output::field(
        "Margin",
        output::positive(format!("${} per $1 basket", portfolio.profit_margin)),
    );
    Ok(())
}

fn render_reports(reports: &[(ExecutionStep, TradeReport)]) -> Result<()> {
    if output::is_json() {
        let payload: Vec<serde_json::Value> = reports
            .iter()
            .map(|(step, report)| {
                json!({
                    "market_id": step.market_id,
                    "position": step.position,
                    "amount": step.amount,
                    "split_tx": report.split_tx,
                    "sell": sell_json(&report.sell),
                })
            })
            .collect();
        output::json_output(json!({ "executed": true, "legs": payload }));
        return Ok(());
    }

    output::section("Execution");
    for (step, report) in reports {
        output::field(
            "Leg",
            format!("{} {} ${}", step.market_id, step.position, step.amount),
        );
        output::field("Split tx", &report.split_tx);
        describe_sell(&report.sell);
    }
    Ok(())
}

pub(crate) fn sell_json(sell: &SellOutcome) -> serde_json::Value {
    match sell {
        SellOutcome::Filled { order_id } => json!({ "status": "filled", "order_id": order_id }),
        SellOutcome::Placed { order_id } => json!({ "status": "placed", "order_id": order_id }),
        SellOutcome::Manual { reason } => json!({ "status": "manual", "reason": reason }),
        SellOutcome::Skipped => json!({ "status": "skipped" }),
    }
}

pub(crate) fn describe_sell(sell: &SellOutcome) {
    match sell {
        SellOutcome::Filled { order_id } => {
            output::success(&format!("unwanted side sold, order {order_id}"));
        }
        SellOutcome::Placed { order_id } => {
            output::success(&format!("sell resting on the book, order {order_id}"));
        }
        SellOutcome::Manual { reason } => {
            output::warning(&format!("sell needs manual follow-up: {reason}"));
        }
        SellOutcome::Skipped => {
            output::note("sell skipped, both outcome tokens held");
        }
    }
}

/// Interactive yes/no prompt. Defaults to no.
fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
