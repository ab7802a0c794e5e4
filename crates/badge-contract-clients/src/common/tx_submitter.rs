use super::errors::{ContractCallError, CustomErrorReason};
use alloy::{
    contract::{CallBuilder, CallDecoder},
    network::Ethereum,
    primitives::B256,
    providers::{PendingTransactionBuilder, Provider},
    sol_types::SolInterface,
};
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub(crate) struct TransactionSubmitter<S> {
    tx_lock: Arc<Mutex<()>>,
    _decoder: PhantomData<S>,
}

impl<S: SolInterface + CustomErrorReason + Clone> TransactionSubmitter<S> {
    pub(crate) fn new(tx_lock: Arc<Mutex<()>>) -> Self {
        Self {
            tx_lock,
            _decoder: PhantomData,
        }
    }

    /// Simulates and sends `call`, returning as soon as the node accepted it.
    pub(crate) async fn submit<P, D>(
        &self,
        method: &'static str,
        call: CallBuilder<P, D>,
    ) -> Result<PendingSubmission, ContractCallError>
    where
        P: Provider + Clone,
        D: CallDecoder + Clone,
    {
        // Pre-simulate to catch reverts with proper error messages
        if let Err(e) = call.call().await {
            return Err(self.decode_error(method, e));
        }

        let _guard = self.tx_lock.lock().await;
        let pending = call
            .send()
            .await
            .map_err(|e| self.decode_error(method, e))?;

        debug!(method, tx_hash = ?pending.tx_hash(), "transaction submitted");
        Ok(PendingSubmission { method, pending })
    }

    fn decode_error(&self, method: &'static str, error: alloy::contract::Error) -> ContractCallError {
        match error.try_decode_into_interface_error::<S>() {
            Ok(error) => ContractCallError::Reverted {
                method,
                reason: Some(error.reason()),
            },
            Err(error) => ContractCallError::from_contract_error(method, error),
        }
    }
}

/// A transaction accepted by the node but not yet mined.
pub struct PendingSubmission {
    method: &'static str,
    pending: PendingTransactionBuilder<Ethereum>,
}

impl PendingSubmission {
    pub fn tx_hash(&self) -> B256 {
        *self.pending.tx_hash()
    }

    /// Waits for the receipt and checks the execution status.
    pub async fn confirm(self) -> Result<B256, ContractCallError> {
        let method = self.method;
        let receipt = self
            .pending
            .get_receipt()
            .await
            .map_err(|e| ContractCallError::Rpc {
                method,
                message: e.to_string(),
            })?;
        let tx_hash = receipt.transaction_hash;

        if !receipt.status() {
            warn!(method, tx_hash = ?tx_hash, gas_used = receipt.gas_used, "transaction reverted on-chain");
            return Err(ContractCallError::Reverted {
                method,
                reason: None,
            });
        }

        info!(
            method,
            tx_hash = ?tx_hash,
            gas_used = receipt.gas_used,
            effective_gas_price = receipt.effective_gas_price,
            "transaction confirmed"
        );
        Ok(tx_hash)
    }
}
