use alloy::primitives::{Address, B256};
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

use crate::directory::ContractInfo;
use crate::error::DappError;
use crate::types::{BadgeRecord, RegistrationRequest};

/// A transaction accepted by the network whose confirmation is still outstanding.
pub struct SubmittedTransaction {
    hash: B256,
    confirmation: BoxFuture<'static, Result<B256, DappError>>,
}

impl SubmittedTransaction {
    pub fn new<F>(hash: B256, confirmation: F) -> Self
    where
        F: Future<Output = Result<B256, DappError>> + Send + 'static,
    {
        Self {
            hash,
            confirmation: Box::pin(confirmation),
        }
    }

    pub fn hash(&self) -> B256 {
        self.hash
    }

    /// Waits until the transaction is mined and succeeded.
    pub async fn confirmed(self) -> Result<B256, DappError> {
        self.confirmation.await
    }
}

/// Handle on the badge registry contract, either read-only or able to sign.
#[async_trait]
pub trait BadgeContract: Send + Sync {
    async fn owner(&self) -> Result<Address, DappError>;

    async fn titles(&self, holder: Address) -> Result<Vec<String>, DappError>;

    async fn badge_by_title(&self, holder: Address, title: &str) -> Result<BadgeRecord, DappError>;

    /// Sends the registration without waiting for it to be mined.
    async fn register_badge(
        &self,
        request: &RegistrationRequest,
    ) -> Result<SubmittedTransaction, DappError>;
}

/// Wallet capability made available by the host environment.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Asks the user to grant account access.
    async fn request_accounts(&self) -> Result<Vec<Address>, DappError>;

    /// Contract handle that signs transactions as `account`.
    async fn signing_contract(
        &self,
        contract: &ContractInfo,
        account: Address,
    ) -> Result<Arc<dyn BadgeContract>, DappError>;

    /// Contract handle backed by the provider alone, good for reads only.
    async fn read_contract(&self, contract: &ContractInfo)
    -> Result<Arc<dyn BadgeContract>, DappError>;
}
