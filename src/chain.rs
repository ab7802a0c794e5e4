//! Alloy-backed wallet: a local private key plays the role of the wallet
//! extension, with an approval prompt standing in for its pop-up.

use alloy::{
    network::EthereumWallet,
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder, WsConnect},
    signers::local::PrivateKeySigner,
};
use async_trait::async_trait;
use badge_contract_clients::{
    BadgeRegistration, BadgeRegistry, BadgeRegistryClient, ContractConfig,
};
use std::io::{BufRead, Write};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::directory::ContractInfo;
use crate::error::DappError;
use crate::types::{BadgeRecord, BadgeType, Expiry, RegistrationRequest};
use crate::wallet::{BadgeContract, SubmittedTransaction, WalletProvider};

/// Decides whether the user grants a wallet request.
#[async_trait]
pub trait Approver: Send + Sync {
    async fn approve(&self, prompt: &str) -> bool;
}

/// Grants every request, for unattended use.
pub struct AutoApprove;

#[async_trait]
impl Approver for AutoApprove {
    async fn approve(&self, _prompt: &str) -> bool {
        true
    }
}

/// Asks on the terminal; anything but `y`/`yes` is a rejection.
pub struct TerminalApprover;

#[async_trait]
impl Approver for TerminalApprover {
    async fn approve(&self, prompt: &str) -> bool {
        let prompt = prompt.to_string();
        let answer = tokio::task::spawn_blocking(move || {
            let mut stderr = std::io::stderr();
            let _ = write!(stderr, "{prompt} [y/N] ");
            let _ = stderr.flush();
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).map(|_| line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            _ => false,
        }
    }
}

/// Wallet holding a single local key and talking to the chain over JSON-RPC.
pub struct RpcWallet {
    rpc_url: String,
    signer: PrivateKeySigner,
    approver: Arc<dyn Approver>,
    tx_lock: Arc<Mutex<()>>,
}

impl RpcWallet {
    pub fn new(
        rpc_url: String,
        private_key: &str,
        approver: Arc<dyn Approver>,
    ) -> Result<Self, DappError> {
        let signer = private_key
            .trim()
            .parse::<PrivateKeySigner>()
            .map_err(|e| DappError::Configuration(format!("invalid private key: {e}")))?;
        Ok(Self {
            rpc_url,
            signer,
            approver,
            tx_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    fn config(&self, contract: &ContractInfo) -> ContractConfig {
        ContractConfig::new(self.rpc_url.clone(), contract.address)
    }
}

#[async_trait]
impl WalletProvider for RpcWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, DappError> {
        let address = self.address();
        let prompt = format!("Allow this app to use account {address}?");
        if !self.approver.approve(&prompt).await {
            return Err(DappError::UserRejected);
        }
        Ok(vec![address])
    }

    async fn signing_contract(
        &self,
        contract: &ContractInfo,
        account: Address,
    ) -> Result<Arc<dyn BadgeContract>, DappError> {
        if account != self.address() {
            return Err(DappError::Unexpected(format!(
                "account {account} is not managed by this wallet"
            )));
        }

        let config = self.config(contract);
        let wallet = EthereumWallet::from(self.signer.clone());

        // Build a provider that can sign transactions, then erase the concrete type
        let provider: DynProvider = ProviderBuilder::new()
            .wallet(wallet)
            .with_simple_nonce_management()
            .with_gas_estimation()
            .connect_ws(WsConnect::new(config.ws_url()))
            .await
            .map_err(|e| DappError::Network(e.to_string()))?
            .erased();

        debug!(contract = %config.contract_address, account = %account, "Built signing contract handle");
        Ok(Arc::new(ChainBadgeContract::new(
            provider,
            config.contract_address,
            self.tx_lock.clone(),
            Some(self.approver.clone()),
        )))
    }

    async fn read_contract(
        &self,
        contract: &ContractInfo,
    ) -> Result<Arc<dyn BadgeContract>, DappError> {
        let config = self.config(contract);
        let provider: DynProvider = ProviderBuilder::new()
            .connect_ws(WsConnect::new(config.ws_url()))
            .await
            .map_err(|e| DappError::Network(e.to_string()))?
            .erased();

        debug!(contract = %config.contract_address, "Built read-only contract handle");
        Ok(Arc::new(ChainBadgeContract::new(
            provider,
            config.contract_address,
            self.tx_lock.clone(),
            None,
        )))
    }
}

/// `BadgeContract` over the generated registry bindings.
///
/// Without an approver the handle is read-only.
pub struct ChainBadgeContract {
    client: BadgeRegistryClient<DynProvider>,
    approver: Option<Arc<dyn Approver>>,
}

impl ChainBadgeContract {
    pub fn new(
        provider: DynProvider,
        address: Address,
        tx_lock: Arc<Mutex<()>>,
        approver: Option<Arc<dyn Approver>>,
    ) -> Self {
        Self {
            client: BadgeRegistryClient::new(provider, address, tx_lock),
            approver,
        }
    }
}

#[async_trait]
impl BadgeContract for ChainBadgeContract {
    async fn owner(&self) -> Result<Address, DappError> {
        Ok(self.client.owner().await?)
    }

    async fn titles(&self, holder: Address) -> Result<Vec<String>, DappError> {
        Ok(self.client.titles(holder).await?)
    }

    async fn badge_by_title(&self, holder: Address, title: &str) -> Result<BadgeRecord, DappError> {
        let badge = self.client.badge_by_title(holder, title.to_string()).await?;
        Ok(badge_record(badge))
    }

    async fn register_badge(
        &self,
        request: &RegistrationRequest,
    ) -> Result<SubmittedTransaction, DappError> {
        let approver = self.approver.as_ref().ok_or(DappError::NotConnected)?;

        let prompt = format!(
            "Sign registerBadge({:?} for {}) on contract {}?",
            request.title,
            request.recipient,
            self.client.address()
        );
        if !approver.approve(&prompt).await {
            return Err(DappError::UserRejected);
        }

        let submission = self.client.register_badge(registration(request)).await?;
        let hash = submission.tx_hash();
        Ok(SubmittedTransaction::new(hash, async move {
            Ok(submission.confirm().await?)
        }))
    }
}

fn registration(request: &RegistrationRequest) -> BadgeRegistration {
    BadgeRegistration {
        recipient: request.recipient,
        title: request.title.clone(),
        description: request.description.clone(),
        issuer: request.issuer.clone(),
        expires_at: request.expiry.as_unix(),
        evidence_url: request.evidence_url.clone(),
        badge_type: request.badge_type.index(),
    }
}

fn badge_record(badge: BadgeRegistry::Badge) -> BadgeRecord {
    let badge_type = BadgeType::from_index(u64::from(badge.badgeType));
    if badge_type.is_none() {
        warn!(title = %badge.title, index = badge.badgeType, "Unknown badge type index");
    }

    BadgeRecord {
        title: badge.title,
        description: badge.description,
        issuer: badge.issuer,
        badge_type,
        issued_at: u64::try_from(badge.issuedAt).unwrap_or(u64::MAX),
        expires_at: Expiry::from_unix(u64::try_from(badge.expiresAt).unwrap_or(u64::MAX)),
        evidence_url: badge.evidenceUrl,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;

    // Anvil account #1
    const PRIVATE_KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    fn wallet(approver: Arc<dyn Approver>) -> RpcWallet {
        RpcWallet::new("http://127.0.0.1:8545".to_string(), PRIVATE_KEY, approver).unwrap()
    }

    #[test]
    fn test_wallet_address_from_key() {
        let expected = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"
            .parse::<Address>()
            .unwrap();
        assert_eq!(wallet(Arc::new(AutoApprove)).address(), expected);
    }

    #[test]
    fn test_invalid_key_is_configuration_error() {
        let result = RpcWallet::new(
            "http://127.0.0.1:8545".to_string(),
            "not-a-key",
            Arc::new(AutoApprove),
        );
        assert!(matches!(result, Err(DappError::Configuration(_))));
    }

    struct Deny;

    #[async_trait]
    impl Approver for Deny {
        async fn approve(&self, _prompt: &str) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn test_account_access_approval() {
        let accounts = wallet(Arc::new(AutoApprove)).request_accounts().await.unwrap();
        assert_eq!(accounts.len(), 1);

        assert_eq!(
            wallet(Arc::new(Deny)).request_accounts().await,
            Err(DappError::UserRejected)
        );
    }

    #[test]
    fn test_badge_record_conversion() {
        let badge = BadgeRegistry::Badge {
            title: "T1".to_string(),
            description: "d".to_string(),
            issuer: "i".to_string(),
            badgeType: 3,
            issuedAt: U256::from(1_735_689_600u64),
            expiresAt: U256::ZERO,
            evidenceUrl: "https://example.org".to_string(),
        };

        let record = badge_record(badge);
        assert_eq!(record.badge_type, Some(BadgeType::Contribution));
        assert_eq!(record.issued_at, 1_735_689_600);
        assert_eq!(record.expires_at, Expiry::Never);
    }

    #[test]
    fn test_unknown_badge_type_and_huge_dates() {
        let badge = BadgeRegistry::Badge {
            title: "T1".to_string(),
            description: String::new(),
            issuer: String::new(),
            badgeType: 9,
            issuedAt: U256::MAX,
            expiresAt: U256::from(42u64),
            evidenceUrl: String::new(),
        };

        let record = badge_record(badge);
        assert_eq!(record.badge_type, None);
        assert_eq!(record.issued_at, u64::MAX);
        assert_eq!(record.expires_at, Expiry::At(42));
    }

    #[test]
    fn test_registration_arguments() {
        let request = RegistrationRequest {
            recipient: Address::repeat_byte(7),
            title: "T1".to_string(),
            description: "d".to_string(),
            issuer: "i".to_string(),
            evidence_url: "u".to_string(),
            badge_type: BadgeType::Event,
            expiry: Expiry::Never,
        };

        let args = registration(&request);
        assert_eq!(args.badge_type, 2);
        assert_eq!(args.expires_at, 0);
        assert_eq!(args.recipient, Address::repeat_byte(7));
    }
}
