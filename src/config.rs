//! Application configuration loading and validation.
//!
//! Configuration is loaded from a TOML file with environment variable
//! overrides for sensitive values: `WALLET_PRIVATE_KEY`, `ORACLE_API_KEY`,
//! and the optional `EGRESS_PROXY_URL`. Secrets never live in the file.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{ConfigError, Result};

/// Default config file name looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "hedgelock.toml";

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub trading: TradingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_gamma_url")]
    pub gamma_url: String,
    #[serde(default = "default_clob_url")]
    pub clob_url: String,
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// 137 is Polygon mainnet, where the exchange settles.
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
}

fn default_gamma_url() -> String {
    "https://gamma-api.polymarket.com".into()
}

fn default_clob_url() -> String {
    "https://clob.polymarket.com".into()
}

fn default_rpc_url() -> String {
    "https://polygon-rpc.com".into()
}

const fn default_chain_id() -> u64 {
    137
}

#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    #[serde(default = "default_oracle_url")]
    pub base_url: String,
    #[serde(default = "default_oracle_model")]
    pub model: String,
    /// API key loaded from `ORACLE_API_KEY` at runtime, never from the file.
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_oracle_url() -> String {
    "https://openrouter.ai/api/v1".into()
}

fn default_oracle_model() -> String {
    "anthropic/claude-sonnet-4".into()
}

/// Wallet configuration for signing orders and chain transactions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletConfig {
    /// Private key loaded from `WALLET_PRIVATE_KEY` at runtime.
    #[serde(skip)]
    pub private_key: Option<String>,
    /// Proxy wallet (funder) address, for accounts trading through one.
    #[serde(default)]
    pub funder: Option<String>,
    /// Rotating egress proxy URL loaded from `EGRESS_PROXY_URL` at runtime.
    /// Absent means no alternate egress path exists.
    #[serde(skip)]
    pub egress_proxy_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradingConfig {
    #[serde(default = "default_min_coverage")]
    pub min_coverage: Decimal,
    /// Worst acceptable tier rank (1 safest .. 4).
    #[serde(default = "default_max_tier")]
    pub max_tier: u8,
    #[serde(default = "default_sell_retry_attempts")]
    pub sell_retry_attempts: u32,
    /// Lowest bid price counted when sizing up book depth.
    #[serde(default = "default_liquidity_floor")]
    pub liquidity_floor: Decimal,
}

fn default_min_coverage() -> Decimal {
    dec!(0.85)
}

const fn default_max_tier() -> u8 {
    3
}

const fn default_sell_retry_attempts() -> u32 {
    5
}

fn default_liquidity_floor() -> Decimal {
    dec!(0.05)
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            gamma_url: default_gamma_url(),
            clob_url: default_clob_url(),
            rpc_url: default_rpc_url(),
            chain_id: default_chain_id(),
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: default_oracle_url(),
            model: default_oracle_model(),
            api_key: None,
        }
    }
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            min_coverage: default_min_coverage(),
            max_tier: default_max_tier(),
            sell_retry_attempts: default_sell_retry_attempts(),
            liquidity_floor: default_liquidity_floor(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            oracle: OracleConfig::default(),
            wallet: WalletConfig::default(),
            trading: TradingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist. Secrets come from the environment either way.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config: Self = if path.as_ref().exists() {
            let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        } else {
            Self::default()
        };

        config.wallet.private_key = std::env::var("WALLET_PRIVATE_KEY").ok();
        config.wallet.egress_proxy_url = std::env::var("EGRESS_PROXY_URL").ok();
        config.oracle.api_key = std::env::var("ORACLE_API_KEY").ok();

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.network.gamma_url.is_empty() {
            return Err(ConfigError::MissingField { field: "gamma_url" }.into());
        }
        if self.network.clob_url.is_empty() {
            return Err(ConfigError::MissingField { field: "clob_url" }.into());
        }
        if self.network.rpc_url.is_empty() {
            return Err(ConfigError::MissingField { field: "rpc_url" }.into());
        }
        if self.trading.max_tier < 1 || self.trading.max_tier > 4 {
            return Err(ConfigError::InvalidValue {
                field: "max_tier",
                reason: format!("{} is not in 1..=4", self.trading.max_tier),
            }
            .into());
        }
        if self.trading.min_coverage <= Decimal::ZERO || self.trading.min_coverage > Decimal::ONE {
            return Err(ConfigError::InvalidValue {
                field: "min_coverage",
                reason: format!("{} is not in (0, 1]", self.trading.min_coverage),
            }
            .into());
        }
        Ok(())
    }

    /// Export the egress proxy so HTTP clients route through it. `reqwest`
    /// reads proxy settings from the environment when a client is built, so
    /// every connection pool created after this call (the CLOB client
    /// included, and each pool a reprovision replaces it with) leaves
    /// through the proxy.
    pub fn apply_egress_proxy(&self) {
        if let Some(url) = &self.wallet.egress_proxy_url {
            std::env::set_var("HTTPS_PROXY", url);
        }
    }

    /// The signing key, required for any operation that moves capital.
    pub fn require_private_key(&self) -> Result<&str> {
        self.wallet
            .private_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnv("WALLET_PRIVATE_KEY").into())
    }

    /// The oracle key, required for relationship extraction.
    pub fn require_oracle_key(&self) -> Result<&str> {
        self.oracle
            .api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnv("ORACLE_API_KEY").into())
    }

    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.logging.level));

        match self.logging.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.network.chain_id, 137);
        assert_eq!(config.trading.sell_retry_attempts, 5);
        assert_eq!(config.trading.liquidity_floor, dec!(0.05));
    }

    #[test]
    fn parses_partial_file() {
        let config: Config = toml::from_str(
            r#"
            [trading]
            min_coverage = 0.90
            max_tier = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.trading.min_coverage, dec!(0.90));
        assert_eq!(config.trading.max_tier, 2);
        assert_eq!(config.network.clob_url, "https://clob.polymarket.com");
    }

    #[test]
    fn rejects_bad_tier() {
        let config: Config = toml::from_str(
            r#"
            [trading]
            max_tier = 7
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn egress_proxy_exports_to_environment() {
        std::env::remove_var("HTTPS_PROXY");
        let mut config = Config::default();
        config.apply_egress_proxy();
        assert!(std::env::var("HTTPS_PROXY").is_err());

        config.wallet.egress_proxy_url = Some("http://rotating.example:8080".into());
        config.apply_egress_proxy();
        assert_eq!(
            std::env::var("HTTPS_PROXY").unwrap(),
            "http://rotating.example:8080"
        );
        std::env::remove_var("HTTPS_PROXY");
    }

    #[test]
    fn load_falls_back_to_defaults_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.logging.level, "info");
    }
}
