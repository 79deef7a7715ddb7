//! Conditional-token contract adapter.
//!
//! Splits, merges, and redeems outcome-token pairs against the conditional
//! tokens framework contract on Polygon. Collateral is bridged USDC (6
//! decimals). Confirmation waits are bounded; a timed-out transaction still
//! reports its hash so the caller can check it later.

use std::str::FromStr;
use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use alloy_provider::network::{Ethereum, EthereumWallet};
use alloy_provider::{PendingTransactionBuilder, ProviderBuilder};
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::sol;
use async_trait::async_trait;
use polymarket_client_sdk::auth::Signer as _;
use rust_decimal::Decimal;
use tracing::info;

use crate::domain::ConditionId;
use crate::error::{ChainError, Result};
use crate::port::ChainGateway;

/// Conditional tokens framework contract on Polygon mainnet.
const CTF_ADDRESS: &str = "0x4D97DCd97eC945f40cF65F87097ACe5EA0476045";

/// Bridged USDC on Polygon, the collateral the framework settles in.
const COLLATERAL_ADDRESS: &str = "0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174";

const USDC_DECIMALS: u32 = 6;

/// Gas limit for split/merge/redeem calls.
const GAS_LIMIT: u64 = 300_000;

/// Seconds to wait for a transaction receipt before giving up.
const CONFIRMATION_TIMEOUT_SECS: u64 = 120;

sol! {
    #[sol(rpc)]
    contract IConditionalTokens {
        function splitPosition(
            address collateralToken,
            bytes32 parentCollectionId,
            bytes32 conditionId,
            uint256[] partition,
            uint256 amount
        ) external;
        function mergePositions(
            address collateralToken,
            bytes32 parentCollectionId,
            bytes32 conditionId,
            uint256[] partition,
            uint256 amount
        ) external;
        function redeemPositions(
            address collateralToken,
            bytes32 parentCollectionId,
            bytes32 conditionId,
            uint256[] indexSets
        ) external;
    }
}

/// Chain gateway backed by the conditional tokens contract.
pub struct CtfChain {
    signer: PrivateKeySigner,
    rpc_url: url::Url,
}

impl CtfChain {
    pub fn new(rpc_url: &str, private_key: &str, chain_id: u64) -> Result<Self> {
        let signer = PrivateKeySigner::from_str(private_key.trim_start_matches("0x"))
            .map_err(|e| ChainError::InvalidKey(e.to_string()))?
            .with_chain_id(Some(chain_id));
        let rpc_url = rpc_url.parse()?;
        Ok(Self { signer, rpc_url })
    }

    pub fn wallet_address(&self) -> Address {
        self.signer.address()
    }

    fn condition_bytes(condition_id: &ConditionId) -> Result<B256> {
        B256::from_str(condition_id.as_str()).map_err(|e| {
            ChainError::InvalidConditionId {
                condition_id: condition_id.as_str().to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn collateral() -> Result<Address> {
        Address::from_str(COLLATERAL_ADDRESS)
            .map_err(|e| ChainError::Rpc(format!("bad collateral address: {e}")).into())
    }

    fn contract_address() -> Result<Address> {
        Address::from_str(CTF_ADDRESS)
            .map_err(|e| ChainError::Rpc(format!("bad contract address: {e}")).into())
    }

    /// Convert decimal dollars to 6-decimal USDC base units.
    fn to_collateral_units(amount: Decimal) -> U256 {
        let scaled = amount * Decimal::from(10u64.pow(USDC_DECIMALS));
        let int_amount = scaled.trunc().to_string().parse::<u128>().unwrap_or(0);
        U256::from(int_amount)
    }

    fn provider(&self) -> impl alloy_provider::Provider + Clone {
        let wallet = EthereumWallet::from(self.signer.clone());
        ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(self.rpc_url.clone())
    }

    /// Wait for a sent transaction to confirm, bounded by the receipt
    /// timeout. A timed-out or reverted transaction surfaces its hash.
    async fn confirm(pending: PendingTransactionBuilder<Ethereum>, action: &str) -> Result<String> {
        let tx_hash = format!("{:?}", *pending.tx_hash());
        let receipt = tokio::time::timeout(
            Duration::from_secs(CONFIRMATION_TIMEOUT_SECS),
            pending.get_receipt(),
        )
        .await
        .map_err(|_| ChainError::ConfirmationTimeout {
            tx_hash: tx_hash.clone(),
            timeout_secs: CONFIRMATION_TIMEOUT_SECS,
        })?
        .map_err(|e| ChainError::Rpc(format!("{action} receipt fetch failed: {e}")))?;

        if !receipt.status() {
            return Err(ChainError::Reverted { tx_hash }.into());
        }
        Ok(tx_hash)
    }
}

#[async_trait]
impl ChainGateway for CtfChain {
    async fn split_position(&self, condition_id: &ConditionId, amount: Decimal) -> Result<String> {
        let provider = self.provider();
        let ctf = IConditionalTokens::new(Self::contract_address()?, &provider);

        let pending = ctf
            .splitPosition(
                Self::collateral()?,
                B256::ZERO,
                Self::condition_bytes(condition_id)?,
                vec![U256::from(1), U256::from(2)],
                Self::to_collateral_units(amount),
            )
            .gas(GAS_LIMIT)
            .send()
            .await
            .map_err(|e| ChainError::Rpc(format!("split submission failed: {e}")))?;

        let tx_hash = Self::confirm(pending, "split").await?;
        info!(tx_hash = %tx_hash, amount = %amount, "split confirmed");
        Ok(tx_hash)
    }

    async fn merge_positions(&self, condition_id: &ConditionId, amount: Decimal) -> Result<String> {
        let provider = self.provider();
        let ctf = IConditionalTokens::new(Self::contract_address()?, &provider);

        let pending = ctf
            .mergePositions(
                Self::collateral()?,
                B256::ZERO,
                Self::condition_bytes(condition_id)?,
                vec![U256::from(1), U256::from(2)],
                Self::to_collateral_units(amount),
            )
            .gas(GAS_LIMIT)
            .send()
            .await
            .map_err(|e| ChainError::Rpc(format!("merge submission failed: {e}")))?;

        let tx_hash = Self::confirm(pending, "merge").await?;
        info!(tx_hash = %tx_hash, amount = %amount, "merge confirmed");
        Ok(tx_hash)
    }

    async fn redeem_positions(&self, condition_id: &ConditionId) -> Result<String> {
        let provider = self.provider();
        let ctf = IConditionalTokens::new(Self::contract_address()?, &provider);

        let pending = ctf
            .redeemPositions(
                Self::collateral()?,
                B256::ZERO,
                Self::condition_bytes(condition_id)?,
                vec![U256::from(1), U256::from(2)],
            )
            .gas(GAS_LIMIT)
            .send()
            .await
            .map_err(|e| ChainError::Rpc(format!("redeem submission failed: {e}")))?;

        let tx_hash = Self::confirm(pending, "redeem").await?;
        info!(tx_hash = %tx_hash, "redeem confirmed");
        Ok(tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn dollars_scale_to_base_units() {
        assert_eq!(CtfChain::to_collateral_units(dec!(1)), U256::from(1_000_000u64));
        assert_eq!(CtfChain::to_collateral_units(dec!(0.5)), U256::from(500_000u64));
        assert_eq!(CtfChain::to_collateral_units(dec!(12.345678)), U256::from(12_345_678u64));
        // Sub-unit dust truncates.
        assert_eq!(CtfChain::to_collateral_units(dec!(0.0000001)), U256::ZERO);
    }

    #[test]
    fn condition_ids_must_be_32_bytes() {
        let good = ConditionId::new(
            "0x0000000000000000000000000000000000000000000000000000000000000abc",
        );
        assert!(CtfChain::condition_bytes(&good).is_ok());

        let bad = ConditionId::new("0x1234");
        assert!(CtfChain::condition_bytes(&bad).is_err());
    }
}
