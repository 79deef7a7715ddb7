//! Command-line interface definitions.

pub mod arb;
pub mod buy;
pub mod hedge;
pub mod markets;
pub mod output;
pub mod positions;
pub mod wallet;

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

use crate::config::{Config, DEFAULT_CONFIG_PATH};
use crate::domain::Position;
use crate::error::Result;

/// Hedgelock - hedged-position and arbitrage tooling for binary prediction markets.
#[derive(Parser, Debug)]
#[command(name = "hedgelock")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Emit machine-readable JSON output
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Browse the market catalog
    #[command(subcommand)]
    Markets(MarketsCommand),

    /// Wallet balance and identity
    #[command(subcommand)]
    Wallet(WalletCommand),

    /// Check and execute arbitrage baskets
    #[command(subcommand)]
    Arb(ArbCommand),

    /// Discover hedged positions across related markets
    #[command(subcommand)]
    Hedge(HedgeCommand),

    /// Enter a position: split collateral, sell the unwanted side
    Buy(BuyArgs),

    /// Show open orders on the exchange
    Positions,
}

/// Subcommands for `hedgelock markets`
#[derive(Subcommand, Debug)]
pub enum MarketsCommand {
    /// List trending markets by 24h volume
    Trending(LimitArg),
    /// Search markets by text query
    Search(SearchArgs),
    /// Show one market in full
    Show(MarketIdArg),
}

/// Subcommands for `hedgelock wallet`
#[derive(Subcommand, Debug)]
pub enum WalletCommand {
    /// Show wallet address and exchange collateral balance
    Status,
}

/// Subcommands for `hedgelock arb`
#[derive(Subcommand, Debug)]
pub enum ArbCommand {
    /// Check an explicit market grouping for an edge at fresh prices
    Scan(ArbScanArgs),
    /// Execute a detected basket leg by leg
    Execute(ArbExecuteArgs),
}

/// Subcommands for `hedgelock hedge`
#[derive(Subcommand, Debug)]
pub enum HedgeCommand {
    /// Scan trending or searched markets for covering portfolios
    Scan(HedgeScanArgs),
    /// Analyze one specific market pair in both directions
    Analyze(AnalyzeArgs),
}

#[derive(Parser, Debug)]
pub struct LimitArg {
    /// Maximum number of markets to fetch
    #[arg(short, long, default_value = "20")]
    pub limit: usize,
}

#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Text query matched against market questions
    pub query: String,

    /// Maximum number of markets to fetch
    #[arg(short, long, default_value = "20")]
    pub limit: usize,
}

#[derive(Parser, Debug)]
pub struct MarketIdArg {
    /// Market ID or URL slug
    pub id: String,
}

/// Grouping arguments shared by `arb scan` and `arb execute`. Exactly one
/// structure applies: an aggregate with components, or an exclusive outcome
/// set.
#[derive(Parser, Debug)]
pub struct ArbScanArgs {
    /// Aggregate market ID for a hierarchical split check
    #[arg(long, requires = "component")]
    pub aggregate: Option<String>,

    /// Component market ID (repeatable, with --aggregate)
    #[arg(long, conflicts_with = "outcome")]
    pub component: Vec<String>,

    /// Mutually exclusive outcome market ID (repeatable)
    #[arg(long, conflicts_with = "aggregate")]
    pub outcome: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct ArbExecuteArgs {
    #[command(flatten)]
    pub grouping: ArbScanArgs,

    /// Total capital to commit, in dollars
    #[arg(long)]
    pub amount: Decimal,

    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

#[derive(Parser, Debug)]
pub struct HedgeScanArgs {
    /// Search query; omit to scan trending markets
    #[arg(short, long)]
    pub query: Option<String>,

    /// Maximum number of markets to fetch
    #[arg(short, long, default_value = "20")]
    pub limit: usize,

    /// Minimum coverage, overriding the configured default
    #[arg(long)]
    pub min_coverage: Option<Decimal>,

    /// Worst acceptable tier rank (1 safest .. 4)
    #[arg(long)]
    pub max_tier: Option<u8>,
}

#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// First market ID
    pub first: String,

    /// Second market ID
    pub second: String,

    /// Minimum coverage, overriding the configured default
    #[arg(long)]
    pub min_coverage: Option<Decimal>,
}

/// CLI spelling of a market side.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum PositionArg {
    Yes,
    No,
}

impl From<PositionArg> for Position {
    fn from(value: PositionArg) -> Self {
        match value {
            PositionArg::Yes => Position::Yes,
            PositionArg::No => Position::No,
        }
    }
}

#[derive(Parser, Debug)]
pub struct BuyArgs {
    /// Market ID
    pub market: String,

    /// Side to hold
    #[arg(value_enum)]
    pub position: PositionArg,

    /// Collateral to split, in dollars
    #[arg(long)]
    pub amount: Decimal,

    /// Keep both outcome tokens instead of selling the unwanted side
    #[arg(long)]
    pub skip_sell: bool,
}

/// Route a parsed command to its handler.
pub async fn dispatch(cli: Cli, config: &Config) -> Result<()> {
    match cli.command {
        Commands::Markets(cmd) => markets::execute(cmd, config).await,
        Commands::Wallet(cmd) => wallet::execute(cmd, config).await,
        Commands::Arb(cmd) => arb::execute(cmd, config).await,
        Commands::Hedge(cmd) => hedge::execute(cmd, config).await,
        Commands::Buy(args) => buy::execute(args, config).await,
        Commands::Positions => positions::execute(config).await,
    }
}

/// Connect an authenticated exchange gateway from configuration.
pub(crate) async fn connect_gateway(config: &Config) -> Result<crate::adapter::ClobGateway> {
    crate::adapter::ClobGateway::connect(
        config.network.clob_url.as_str(),
        config.require_private_key()?,
        config.network.chain_id,
        config.wallet.funder.as_deref(),
        config.wallet.egress_proxy_url.clone(),
    )
    .await
}

/// Wire the full execution engine: catalog, gateway, and settlement chain.
pub(crate) async fn trading_engine(config: &Config) -> Result<crate::app::ExecutionEngine> {
    use std::sync::Arc;

    let catalog = Arc::new(crate::adapter::GammaCatalog::new(
        config.network.gamma_url.as_str(),
        config.network.clob_url.as_str(),
    ));
    let gateway = Arc::new(connect_gateway(config).await?);
    let chain = Arc::new(crate::adapter::CtfChain::new(
        &config.network.rpc_url,
        config.require_private_key()?,
        config.network.chain_id,
    )?);
    Ok(crate::app::ExecutionEngine::new(
        catalog,
        gateway.clone(),
        gateway,
        chain,
        config.trading.sell_retry_attempts,
        config.trading.liquidity_floor,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hedge_scan_with_query() {
        let cli = Cli::parse_from([
            "hedgelock", "hedge", "scan", "--query", "election", "--limit", "50",
        ]);
        match cli.command {
            Commands::Hedge(HedgeCommand::Scan(args)) => {
                assert_eq!(args.query.as_deref(), Some("election"));
                assert_eq!(args.limit, 50);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_arb_scan_outcome_grouping() {
        let cli = Cli::parse_from([
            "hedgelock", "arb", "scan", "--outcome", "1", "--outcome", "2",
        ]);
        match cli.command {
            Commands::Arb(ArbCommand::Scan(args)) => {
                assert_eq!(args.outcome, vec!["1", "2"]);
                assert!(args.aggregate.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn aggregate_and_outcome_conflict() {
        let parsed = Cli::try_parse_from([
            "hedgelock",
            "arb",
            "scan",
            "--aggregate",
            "1",
            "--component",
            "2",
            "--outcome",
            "3",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn parses_buy_with_position() {
        let cli = Cli::parse_from([
            "hedgelock", "buy", "123", "yes", "--amount", "25", "--skip-sell",
        ]);
        match cli.command {
            Commands::Buy(args) => {
                assert_eq!(args.market, "123");
                assert!(matches!(args.position, PositionArg::Yes));
                assert!(args.skip_sell);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn json_flag_is_global() {
        let cli = Cli::parse_from(["hedgelock", "positions", "--json"]);
        assert!(cli.json);
    }
}
