//! In-memory wallet and registry used by the controller tests.

use alloy::primitives::{Address, B256, address};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::directory::ContractInfo;
use crate::error::DappError;
use crate::types::{BadgeRecord, BadgeType, Expiry, RegistrationRequest};
use crate::wallet::{BadgeContract, SubmittedTransaction, WalletProvider};

pub const OWNER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
pub const USER: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");

pub fn record(title: &str) -> BadgeRecord {
    BadgeRecord {
        title: title.to_string(),
        description: format!("{title} description"),
        issuer: "Academy".to_string(),
        badge_type: Some(BadgeType::Course),
        issued_at: 1_735_732_800,
        expires_at: Expiry::Never,
        evidence_url: format!("https://example.org/{title}"),
    }
}

#[derive(Default)]
struct RegistryState {
    badges: HashMap<Address, Vec<BadgeRecord>>,
    delays: HashMap<String, u64>,
    calls: usize,
    registered: Vec<RegistrationRequest>,
    titles_error: Option<DappError>,
    submit_error: Option<DappError>,
    confirm_error: Option<DappError>,
    confirm_delay_ms: u64,
    submit_delay_ms: u64,
}

/// Shared fake of the on-chain registry; clones observe the same state.
#[derive(Clone, Default)]
pub struct FakeRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut RegistryState) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    pub fn insert(&self, holder: Address, badge: BadgeRecord) -> &Self {
        self.with_state(|s| s.badges.entry(holder).or_default().push(badge));
        self
    }

    pub fn with_delay_ms(&self, title: &str, ms: u64) -> &Self {
        self.with_state(|s| s.delays.insert(title.to_string(), ms));
        self
    }

    pub fn fail_titles(&self, error: DappError) -> &Self {
        self.with_state(|s| s.titles_error = Some(error));
        self
    }

    pub fn fail_submission(&self, error: DappError) -> &Self {
        self.with_state(|s| s.submit_error = Some(error));
        self
    }

    pub fn fail_confirmation(&self, error: DappError) -> &Self {
        self.with_state(|s| s.confirm_error = Some(error));
        self
    }

    pub fn with_confirm_delay_ms(&self, ms: u64) -> &Self {
        self.with_state(|s| s.confirm_delay_ms = ms);
        self
    }

    pub fn with_submit_delay_ms(&self, ms: u64) -> &Self {
        self.with_state(|s| s.submit_delay_ms = ms);
        self
    }

    pub fn calls(&self) -> usize {
        self.with_state(|s| s.calls)
    }

    pub fn registered(&self) -> Vec<RegistrationRequest> {
        self.with_state(|s| s.registered.clone())
    }

    pub fn handle(&self, signing: bool) -> FakeContract {
        FakeContract {
            registry: self.clone(),
            signing,
        }
    }
}

pub struct FakeContract {
    registry: FakeRegistry,
    signing: bool,
}

#[async_trait]
impl BadgeContract for FakeContract {
    async fn owner(&self) -> Result<Address, DappError> {
        self.registry.with_state(|s| s.calls += 1);
        Ok(OWNER)
    }

    async fn titles(&self, holder: Address) -> Result<Vec<String>, DappError> {
        self.registry.with_state(|s| {
            s.calls += 1;
            if let Some(error) = s.titles_error.clone() {
                return Err(error);
            }
            Ok(s.badges
                .get(&holder)
                .map(|badges| badges.iter().map(|b| b.title.clone()).collect())
                .unwrap_or_default())
        })
    }

    async fn badge_by_title(&self, holder: Address, title: &str) -> Result<BadgeRecord, DappError> {
        let (delay, badge) = self.registry.with_state(|s| {
            s.calls += 1;
            let badge = s
                .badges
                .get(&holder)
                .and_then(|badges| badges.iter().find(|b| b.title == title).cloned());
            (s.delays.get(title).copied().unwrap_or(0), badge)
        });
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        badge.ok_or_else(|| DappError::ContractRevert {
            reason: Some("Badge not found".to_string()),
        })
    }

    async fn register_badge(
        &self,
        request: &RegistrationRequest,
    ) -> Result<SubmittedTransaction, DappError> {
        if !self.signing {
            return Err(DappError::NotConnected);
        }

        let (submit_error, confirm_error, confirm_delay, submit_delay) =
            self.registry.with_state(|s| {
                s.calls += 1;
                (
                    s.submit_error.clone(),
                    s.confirm_error.clone(),
                    s.confirm_delay_ms,
                    s.submit_delay_ms,
                )
            });
        if submit_delay > 0 {
            tokio::time::sleep(Duration::from_millis(submit_delay)).await;
        }
        if let Some(error) = submit_error {
            return Err(error);
        }

        let hash = B256::repeat_byte(0x42);
        let registry = self.registry.clone();
        let request = request.clone();
        Ok(SubmittedTransaction::new(hash, async move {
            if confirm_delay > 0 {
                tokio::time::sleep(Duration::from_millis(confirm_delay)).await;
            }
            if let Some(error) = confirm_error {
                return Err(error);
            }
            registry.with_state(|s| {
                let mut badge = record(&request.title);
                badge.badge_type = Some(request.badge_type);
                badge.expires_at = request.expiry;
                s.badges.entry(request.recipient).or_default().push(badge);
                s.registered.push(request);
            });
            Ok(hash)
        }))
    }
}

/// Wallet that always exposes a single account.
pub struct FakeWallet {
    account: Address,
    registry: FakeRegistry,
    reject_accounts: bool,
}

impl FakeWallet {
    pub fn new(account: Address, registry: FakeRegistry) -> Self {
        Self {
            account,
            registry,
            reject_accounts: false,
        }
    }

    pub fn rejecting_accounts(mut self) -> Self {
        self.reject_accounts = true;
        self
    }
}

#[async_trait]
impl WalletProvider for FakeWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, DappError> {
        if self.reject_accounts {
            return Err(DappError::UserRejected);
        }
        Ok(vec![self.account])
    }

    async fn signing_contract(
        &self,
        _contract: &ContractInfo,
        _account: Address,
    ) -> Result<Arc<dyn BadgeContract>, DappError> {
        Ok(Arc::new(self.registry.handle(true)))
    }

    async fn read_contract(
        &self,
        _contract: &ContractInfo,
    ) -> Result<Arc<dyn BadgeContract>, DappError> {
        Ok(Arc::new(self.registry.handle(false)))
    }
}
