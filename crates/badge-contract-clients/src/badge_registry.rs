use crate::common::errors::{ContractCallError, CustomErrorReason};
use crate::common::tx_submitter::{PendingSubmission, TransactionSubmitter};
use alloy::{
    primitives::{Address, U256},
    providers::Provider,
    sol,
};
use std::sync::Arc;
use tokio::sync::Mutex;

sol!(
    #[sol(rpc)]
    #[derive(Debug)]
    contract BadgeRegistry {
        struct Badge {
            string title;
            string description;
            string issuer;
            uint8 badgeType;
            uint256 issuedAt;
            uint256 expiresAt;
            string evidenceUrl;
        }

        error OwnableUnauthorizedAccount(address account);
        error OwnableInvalidOwner(address owner);

        event BadgeRegistered(address indexed recipient, string title, uint8 badgeType);

        function owner() external view returns (address);
        function registerBadge(
            address recipient,
            string calldata title,
            string calldata description,
            string calldata issuer,
            uint256 expiresAt,
            string calldata evidenceUrl,
            uint8 badgeType
        ) external;
        function getTitles(address holder) external view returns (string[] memory);
        function getBadgeByTitle(address holder, string calldata title) external view returns (Badge memory);
    }
);

use BadgeRegistry::{BadgeRegistryErrors, BadgeRegistryInstance};

impl CustomErrorReason for BadgeRegistryErrors {
    fn reason(&self) -> String {
        match self {
            BadgeRegistryErrors::OwnableUnauthorizedAccount(e) => {
                format!("OwnableUnauthorizedAccount({})", e.account)
            }
            BadgeRegistryErrors::OwnableInvalidOwner(e) => {
                format!("OwnableInvalidOwner({})", e.owner)
            }
        }
    }
}

/// Arguments of a `registerBadge` call, already validated by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeRegistration {
    pub recipient: Address,
    pub title: String,
    pub description: String,
    pub issuer: String,
    /// Unix seconds, `0` means the badge never expires.
    pub expires_at: u64,
    pub evidence_url: String,
    pub badge_type: u8,
}

/// Client for interacting with the BadgeRegistry contract
#[derive(Clone)]
pub struct BadgeRegistryClient<P: Provider + Clone> {
    contract: BadgeRegistryInstance<P>,
    submitter: TransactionSubmitter<BadgeRegistryErrors>,
}

impl<P: Provider + Clone> BadgeRegistryClient<P> {
    /// Create a new BadgeRegistryClient
    pub fn new(provider: P, contract_address: Address, tx_lock: Arc<Mutex<()>>) -> Self {
        let contract = BadgeRegistryInstance::new(contract_address, provider);
        let submitter = TransactionSubmitter::new(tx_lock);
        Self {
            contract,
            submitter,
        }
    }

    /// Get the contract address
    pub fn address(&self) -> Address {
        *self.contract.address()
    }

    // ------------------------------------------------------------------------
    // View Functions
    // ------------------------------------------------------------------------

    /// Returns the address allowed to issue badges
    pub async fn owner(&self) -> Result<Address, ContractCallError> {
        self.contract
            .owner()
            .call()
            .await
            .map_err(|e| ContractCallError::from_contract_error("owner", e))
    }

    /// Returns the titles of every badge held by `holder`, in contract order
    pub async fn titles(&self, holder: Address) -> Result<Vec<String>, ContractCallError> {
        self.contract
            .getTitles(holder)
            .call()
            .await
            .map_err(|e| ContractCallError::from_contract_error("getTitles", e))
    }

    /// Returns the badge `holder` holds under `title`
    pub async fn badge_by_title(
        &self,
        holder: Address,
        title: String,
    ) -> Result<BadgeRegistry::Badge, ContractCallError> {
        self.contract
            .getBadgeByTitle(holder, title)
            .call()
            .await
            .map_err(|e| ContractCallError::from_contract_error("getBadgeByTitle", e))
    }

    // ------------------------------------------------------------------------
    // Admin Functions (owner only)
    // ------------------------------------------------------------------------

    /// Sends a `registerBadge` transaction; the returned submission still has
    /// to be confirmed by the caller.
    pub async fn register_badge(
        &self,
        registration: BadgeRegistration,
    ) -> Result<PendingSubmission, ContractCallError> {
        let call = self.contract.registerBadge(
            registration.recipient,
            registration.title,
            registration.description,
            registration.issuer,
            U256::from(registration.expires_at),
            registration.evidence_url,
            registration.badge_type,
        );
        self.submitter.submit("registerBadge", call).await
    }
}
