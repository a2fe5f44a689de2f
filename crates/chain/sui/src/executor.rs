//! Sponsored transaction submission.
//!
//! The sponsor wallet is both sender and gas owner: its gas coin funds the
//! purchase price and royalty through `SplitCoins(GasCoin, ..)`, so coin
//! selection must cover the payment plus the gas budget.
//!
//! Submissions from one sponsor go through a single lane: coin selection
//! reads the sponsor's current coin versions, so two purchases selected
//! concurrently would lock the same objects and one would fail.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use gate_core::{
    Address, ChainError, ExecutionOutcome, ExecutionStatus, PurchaseTransaction,
    TransactionExecutor, TxDigest,
};
use shared_crypto::intent::{Intent, IntentMessage};
use sui_keys::keystore::{AccountKeystore, FileBasedKeystore};
use sui_sdk::SuiClient;
use sui_sdk::rpc_types::{
    SuiExecutionStatus, SuiTransactionBlockEffectsAPI, SuiTransactionBlockResponseOptions,
};
use sui_types::base_types::SuiAddress;
use sui_types::transaction::{Transaction, TransactionData};
use tokio::sync::Mutex;

use crate::config::SuiConfig;
use crate::convert::{from_sui_address, object_change, to_sui_address};
use crate::error::{Result, SuiError};
use crate::lowering::lower_purchase;

/// Signs purchases with the sponsor key from a file keystore.
pub struct SuiTransactionExecutor {
    sui_client: SuiClient,
    keystore: Arc<FileBasedKeystore>,
    sponsor: SuiAddress,
    gas_budget: u64,
    lane: SubmissionLane,
}

/// Runs sponsor submissions one at a time, from coin selection until the
/// chain has answered.
#[derive(Debug, Default)]
pub(crate) struct SubmissionLane {
    lock: Mutex<()>,
}

impl SubmissionLane {
    pub(crate) async fn run<F: Future>(&self, work: F) -> F::Output {
        let _turn = self.lock.lock().await;
        work.await
    }
}

impl SuiTransactionExecutor {
    pub fn new(
        sui_client: SuiClient,
        keystore: FileBasedKeystore,
        sponsor: SuiAddress,
        gas_budget: u64,
    ) -> Result<Self> {
        if !keystore.addresses().contains(&sponsor) {
            return Err(SuiError::Keystore(format!(
                "sponsor {sponsor} is not in the keystore"
            )));
        }

        Ok(Self {
            sui_client,
            keystore: Arc::new(keystore),
            sponsor,
            gas_budget,
            lane: SubmissionLane::default(),
        })
    }

    /// Executor using the keystore and sponsor from `config`.
    ///
    /// Without an explicit sponsor address the keystore's first address
    /// pays.
    pub fn from_config(sui_client: SuiClient, config: &SuiConfig) -> Result<Self> {
        let keystore = load_keystore(&config.keystore_path)?;

        let sponsor = match &config.sponsor_address {
            Some(address) => to_sui_address(address),
            None => keystore.addresses().first().copied().ok_or_else(|| {
                SuiError::Keystore(format!(
                    "no addresses in keystore {}",
                    config.keystore_path.display()
                ))
            })?,
        };

        tracing::info!(%sponsor, gas_budget = config.gas_budget, "Sponsor wallet loaded");
        Self::new(sui_client, keystore, sponsor, config.gas_budget)
    }

    pub fn gas_budget(&self) -> u64 {
        self.gas_budget
    }

    async fn balance(&self) -> Result<u64> {
        let balance = self
            .sui_client
            .coin_read_api()
            .get_balance(self.sponsor, None)
            .await?;
        Ok(u64::try_from(balance.total_balance).unwrap_or(u64::MAX))
    }

    async fn execute(&self, transaction: PurchaseTransaction) -> Result<ExecutionOutcome> {
        self.lane.run(self.submit(transaction)).await
    }

    async fn submit(&self, transaction: PurchaseTransaction) -> Result<ExecutionOutcome> {
        let required = transaction.total_payment().saturating_add(self.gas_budget);
        let available = self.balance().await?;
        if available < required {
            tracing::error!(
                sponsor = %self.sponsor,
                required,
                available,
                "Sponsor wallet cannot cover purchase"
            );
            return Err(SuiError::InsufficientGas {
                required,
                available,
            });
        }

        let pt = lower_purchase(&transaction)?;

        let gas_price = self
            .sui_client
            .read_api()
            .get_reference_gas_price()
            .await
            .context("Failed to get reference gas price")?;

        let gas_coins = self
            .sui_client
            .coin_read_api()
            .select_coins(self.sponsor, None, u128::from(required), vec![])
            .await
            .context("Failed to select gas coins")?;
        let gas_refs = gas_coins.iter().map(|coin| coin.object_ref()).collect();

        let tx_data =
            TransactionData::new_programmable(self.sponsor, gas_refs, pt, self.gas_budget, gas_price);

        let keypair = self
            .keystore
            .export(&self.sponsor)
            .map_err(|e| SuiError::Keystore(format!("failed to export sponsor key: {e}")))?;
        let signature = sui_types::crypto::Signature::new_secure(
            &IntentMessage::new(Intent::sui_transaction(), &tx_data),
            keypair,
        );

        tracing::debug!(nft_id = %transaction.nft_id, "Executing purchase transaction");
        let response = self
            .sui_client
            .quorum_driver_api()
            .execute_transaction_block(
                Transaction::from_data(tx_data, vec![signature]),
                SuiTransactionBlockResponseOptions::new()
                    .with_effects()
                    .with_object_changes(),
                None,
            )
            .await?;

        let digest = TxDigest::new(response.digest.to_string());
        let effects = response.effects.as_ref().ok_or_else(|| {
            SuiError::InvalidResponse(format!("no effects in response for {digest}"))
        })?;

        let status = match effects.status() {
            SuiExecutionStatus::Success => ExecutionStatus::Success,
            SuiExecutionStatus::Failure { error } => ExecutionStatus::Failure {
                error: error.clone(),
            },
        };

        let object_changes = response
            .object_changes
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(object_change)
            .collect();

        Ok(ExecutionOutcome {
            digest,
            status,
            object_changes,
        })
    }
}

/// Open a file keystore, failing if it does not exist.
pub fn load_keystore(path: &Path) -> Result<FileBasedKeystore> {
    if !path.exists() {
        return Err(SuiError::Keystore(format!(
            "keystore not found at {}",
            path.display()
        )));
    }
    FileBasedKeystore::load_or_create(&path.to_path_buf())
        .map_err(|e| SuiError::Keystore(format!("failed to load {}: {e}", path.display())))
}

#[async_trait]
impl TransactionExecutor for SuiTransactionExecutor {
    async fn execute_purchase(
        &self,
        transaction: PurchaseTransaction,
    ) -> std::result::Result<ExecutionOutcome, ChainError> {
        Ok(self.execute(transaction).await?)
    }

    fn sponsor_address(&self) -> Address {
        from_sui_address(self.sponsor)
    }

    async fn sponsor_balance(&self) -> std::result::Result<u64, ChainError> {
        Ok(self.balance().await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn lane_never_overlaps_submissions() {
        let lane = Arc::new(SubmissionLane::default());
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let lane = Arc::clone(&lane);
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                tokio::spawn(async move {
                    lane.run(async {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        for _ in 0..4 {
                            tokio::task::yield_now().await;
                        }
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn lane_returns_the_work_output() {
        let lane = SubmissionLane::default();
        assert_eq!(lane.run(async { 42 }).await, 42);
    }
}
