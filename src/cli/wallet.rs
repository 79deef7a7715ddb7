//! Wallet identity and balance.

use serde_json::json;

use crate::adapter::CtfChain;
use crate::cli::{output, WalletCommand};
use crate::config::Config;
use crate::error::Result;
use crate::port::OrderGateway;

pub async fn execute(command: WalletCommand, config: &Config) -> Result<()> {
    match command {
        WalletCommand::Status => status(config).await,
    }
}

async fn status(config: &Config) -> Result<()> {
    let chain = CtfChain::new(
        &config.network.rpc_url,
        config.require_private_key()?,
        config.network.chain_id,
    )?;
    let gateway = super::connect_gateway(config).await?;
    let balance = gateway.collateral_balance().await?;

    if output::is_json() {
        output::json_output(json!({
            "address": format!("{}", chain.wallet_address()),
            "funder": config.wallet.funder,
            "chain_id": config.network.chain_id,
            "collateral_balance": balance,
        }));
        return Ok(());
    }

    output::section("Wallet Status");
    output::field("Address", chain.wallet_address());
    if let Some(funder) = &config.wallet.funder {
        output::field("Funder", funder);
    }
    output::field("Chain", config.network.chain_id);
    output::field("Collateral", format!("${balance}"));
    Ok(())
}
