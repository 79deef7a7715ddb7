//! Trait definitions (hexagonal ports). Depend only on domain.

pub mod catalog;
pub mod chain;
pub mod exchange;
pub mod oracle;

pub use catalog::MarketCatalog;
pub use chain::ChainGateway;
pub use exchange::{ConnectionProvisioner, OrderGateway};
pub use oracle::Oracle;
