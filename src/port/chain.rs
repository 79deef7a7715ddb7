//! On-chain conditional-token port.
//!
//! Splitting collateral mints a full YES/NO token pair; merging burns a pair
//! back into collateral; redeeming pays out a resolved position. All three
//! return the confirmed transaction hash.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::ConditionId;
use crate::error::Result;

/// Conditional-token operations against the settlement chain.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Split `amount` of collateral into a full outcome-token pair.
    async fn split_position(&self, condition_id: &ConditionId, amount: Decimal) -> Result<String>;

    /// Merge `amount` of a full outcome-token pair back into collateral.
    async fn merge_positions(&self, condition_id: &ConditionId, amount: Decimal) -> Result<String>;

    /// Redeem resolved positions for collateral. Takes no amount; the
    /// contract pays the wallet's settled balance.
    async fn redeem_positions(&self, condition_id: &ConditionId) -> Result<String>;
}

#[cfg(test)]
pub mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::{ChainError, Error};

    /// What a scripted mock chain call should do.
    pub enum ChainScript {
        Confirm(String),
        Revert(String),
    }

    /// Mock chain gateway with scripted outcomes and a call log.
    pub struct MockChain {
        scripts: Mutex<Vec<ChainScript>>,
        pub calls: Mutex<Vec<(String, ConditionId, Option<Decimal>)>>,
    }

    impl MockChain {
        pub fn confirming(tx_hash: impl Into<String>) -> Self {
            Self {
                scripts: Mutex::new(vec![ChainScript::Confirm(tx_hash.into())]),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn reverting(tx_hash: impl Into<String>) -> Self {
            Self {
                scripts: Mutex::new(vec![ChainScript::Revert(tx_hash.into())]),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn run(&self, op: &str, condition_id: &ConditionId, amount: Option<Decimal>) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((op.to_string(), condition_id.clone(), amount));
            let mut scripts = self.scripts.lock().unwrap();
            match if scripts.is_empty() {
                ChainScript::Confirm("0xdefault".into())
            } else {
                scripts.remove(0)
            } {
                ChainScript::Confirm(hash) => Ok(hash),
                ChainScript::Revert(hash) => {
                    Err(Error::Chain(ChainError::Reverted { tx_hash: hash }))
                }
            }
        }
    }

    #[async_trait]
    impl ChainGateway for MockChain {
        async fn split_position(
            &self,
            condition_id: &ConditionId,
            amount: Decimal,
        ) -> Result<String> {
            self.run("split", condition_id, Some(amount))
        }

        async fn merge_positions(
            &self,
            condition_id: &ConditionId,
            amount: Decimal,
        ) -> Result<String> {
            self.run("merge", condition_id, Some(amount))
        }

        async fn redeem_positions(&self, condition_id: &ConditionId) -> Result<String> {
            self.run("redeem", condition_id, None)
        }
    }
}
