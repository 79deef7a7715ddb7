//! Hedgelock - hedged-position and arbitrage tooling for binary prediction markets.
//!
//! The crate discovers and executes two kinds of structured positions on
//! Polymarket-style binary markets:
//!
//! - **hedges**: buy a target outcome plus the covering outcome of a related
//!   market whose relationship to the target is logically necessary, so the
//!   pair pays out in nearly every world;
//! - **arbitrage baskets**: hierarchical splits and negative-risk outcome
//!   sets whose combined price is under the $1 payout.
//!
//! # Modules
//!
//! - [`config`] - TOML configuration with environment-variable secrets
//! - [`domain`] - pure types and math: markets, order books, coverage, arbitrage
//! - [`port`] - async trait seams: catalog, oracle, exchange, chain
//! - [`adapter`] - implementations against Gamma, OpenRouter, the CLOB, and
//!   the conditional-token contract
//! - [`app`] - scanners and the split-and-sell execution engine
//! - [`cli`] - clap commands and operator-facing output
//! - [`error`] - structured error types

pub mod adapter;
pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;
