//! Application layer - scanners and the execution engine.

pub mod arbitrage;
pub mod executor;
pub mod extractor;
pub mod hedge;

pub use arbitrage::ArbScanner;
pub use executor::{ExecutionEngine, SellOutcome, TradeReport};
pub use extractor::ImplicationExtractor;
pub use hedge::{HedgeScanner, ScanOptions};
