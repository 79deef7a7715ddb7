use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Market catalog errors. Scan loops skip past these per market.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("market not found: {id}")]
    NotFound { id: String },

    #[error("malformed market record {id}: {reason}")]
    Malformed { id: String, reason: String },

    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Reasoning-oracle errors. Unparseable completions are not errors; the
/// extractor treats them as an empty claim set.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("oracle rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("oracle API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("oracle returned no completion choices")]
    EmptyCompletion,

    #[error("oracle request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Order-book depth insufficient for a requested fill.
#[derive(Error, Debug)]
#[error("insufficient liquidity for token {token}: requested {requested}, fillable {fillable}")]
pub struct LiquidityError {
    pub token: String,
    pub requested: rust_decimal::Decimal,
    pub fillable: rust_decimal::Decimal,
}

/// Exchange execution errors with structured variants.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("invalid token ID '{token_id}': {reason}")]
    InvalidTokenId { token_id: String, reason: String },

    #[error("order rejected: {0}")]
    OrderRejected(String),

    #[error("failed to build order: {0}")]
    OrderBuildFailed(String),

    #[error("failed to sign order: {0}")]
    SigningFailed(String),

    #[error("failed to submit order: {0}")]
    SubmissionFailed(String),

    /// The request was intercepted at the network edge before reaching the
    /// exchange. Retryable only through an alternate egress path.
    #[error("request blocked at the network edge: {0}")]
    NetworkBlock(String),
}

/// On-chain conditional-token errors. Fatal for the trade they occur in.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("transaction {tx_hash} reverted on chain")]
    Reverted { tx_hash: String },

    #[error("transaction {tx_hash} unconfirmed after {timeout_secs}s")]
    ConfirmationTimeout { tx_hash: String, timeout_secs: u64 },

    #[error("invalid condition ID '{condition_id}': {reason}")]
    InvalidConditionId {
        condition_id: String,
        reason: String,
    },

    #[error("invalid signer key: {0}")]
    InvalidKey(String),

    #[error("RPC error: {0}")]
    Rpc(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Liquidity(#[from] LiquidityError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Polymarket SDK error: {0}")]
    Polymarket(#[from] polymarket_client_sdk::error::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
