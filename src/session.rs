use alloy::primitives::Address;
use std::sync::Arc;
use tracing::{info, warn};

use crate::directory::ContractInfo;
use crate::error::DappError;
use crate::wallet::{BadgeContract, WalletProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Comparable view of the session, without the handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub address: Option<Address>,
    pub is_owner: bool,
    pub has_provider: bool,
    pub has_contract: bool,
}

/// Connection to the user's wallet and the contract handles derived from it.
///
/// Owned by the app and lent to the controllers; only `connect` and
/// `disconnect` mutate it.
pub struct WalletSession {
    wallet: Option<Arc<dyn WalletProvider>>,
    contract_info: Option<ContractInfo>,
    provider: Option<Arc<dyn WalletProvider>>,
    contract: Option<Arc<dyn BadgeContract>>,
    address: Option<Address>,
    is_owner: bool,
    state: SessionState,
}

impl WalletSession {
    /// `wallet` is `None` when the host offers no wallet capability.
    pub fn new(wallet: Option<Arc<dyn WalletProvider>>) -> Self {
        Self {
            wallet,
            contract_info: None,
            provider: None,
            contract: None,
            address: None,
            is_owner: false,
            state: SessionState::Disconnected,
        }
    }

    pub fn set_contract_info(&mut self, info: ContractInfo) {
        self.contract_info = Some(info);
    }

    pub fn contract_info(&self) -> Option<&ContractInfo> {
        self.contract_info.as_ref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    pub fn address(&self) -> Option<Address> {
        self.address
    }

    pub fn is_owner(&self) -> bool {
        self.is_owner
    }

    pub fn has_wallet(&self) -> bool {
        self.wallet.is_some()
    }

    pub(crate) fn provider(&self) -> Option<&Arc<dyn WalletProvider>> {
        self.provider.as_ref()
    }

    pub(crate) fn contract(&self) -> Option<&Arc<dyn BadgeContract>> {
        self.contract.as_ref()
    }

    /// Shortened address for display, e.g. `0x7099...79C8`.
    pub fn display_address(&self) -> Option<String> {
        self.address.map(|address| {
            let full = address.to_checksum(None);
            format!("{}...{}", &full[..6], &full[full.len() - 4..])
        })
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            address: self.address,
            is_owner: self.is_owner,
            has_provider: self.provider.is_some(),
            has_contract: self.contract.is_some(),
        }
    }

    pub async fn connect(&mut self) -> Result<Address, DappError> {
        if self.state != SessionState::Disconnected {
            self.disconnect();
        }

        let wallet = self.wallet.clone().ok_or(DappError::ProviderUnavailable)?;
        let info = self.contract_info.clone().ok_or_else(|| {
            DappError::Configuration("Contract information has not been loaded.".to_string())
        })?;

        self.state = SessionState::Connecting;
        // Reads stay possible through the provider even if a later step fails
        self.provider = Some(wallet.clone());

        match Self::establish(wallet.as_ref(), &info).await {
            Ok((address, contract, is_owner)) => {
                self.address = Some(address);
                self.contract = Some(contract);
                self.is_owner = is_owner;
                self.state = SessionState::Connected;
                info!(address = %address, is_owner, "Wallet connected");
                Ok(address)
            }
            Err(e) => {
                self.state = SessionState::Disconnected;
                warn!(error = %e, origin = ?e.origin(), "Wallet connection failed");
                Err(e)
            }
        }
    }

    async fn establish(
        wallet: &dyn WalletProvider,
        info: &ContractInfo,
    ) -> Result<(Address, Arc<dyn BadgeContract>, bool), DappError> {
        let accounts = wallet.request_accounts().await?;
        let address = *accounts.first().ok_or(DappError::UserRejected)?;

        let contract = wallet.signing_contract(info, address).await?;
        let owner = contract.owner().await?;

        // Address equality is byte equality, so checksum casing does not matter
        Ok((address, contract, owner == address))
    }

    /// Drops local session state; the wallet keeps whatever permission it granted.
    pub fn disconnect(&mut self) {
        self.provider = None;
        self.contract = None;
        self.address = None;
        self.is_owner = false;
        self.state = SessionState::Disconnected;
        info!("Wallet disconnected");
    }
}
