use alloy::primitives::Address;
use futures_util::{Stream, StreamExt, TryStreamExt, stream};
use std::sync::Arc;
use tracing::debug;

use crate::error::DappError;
use crate::session::WalletSession;
use crate::types::{BadgeRecord, RegistrationRequest};
use crate::wallet::{BadgeContract, SubmittedTransaction};

/// Contract operations available through the current session.
pub struct ContractGateway<'a> {
    session: &'a WalletSession,
}

impl<'a> ContractGateway<'a> {
    pub fn new(session: &'a WalletSession) -> Self {
        Self { session }
    }

    /// Fails fast when no handle could ever serve a read.
    pub fn ensure_reader(&self) -> Result<(), DappError> {
        if self.session.contract().is_some() || self.session.provider().is_some() {
            Ok(())
        } else {
            Err(DappError::NoReader)
        }
    }

    /// The signing handle if connected, otherwise a read-only handle from the provider.
    pub async fn reader(&self) -> Result<Arc<dyn BadgeContract>, DappError> {
        if let Some(contract) = self.session.contract() {
            return Ok(contract.clone());
        }
        match (self.session.provider(), self.session.contract_info()) {
            (Some(provider), Some(info)) => provider.read_contract(info).await,
            _ => Err(DappError::NoReader),
        }
    }

    pub fn signer(&self) -> Result<&Arc<dyn BadgeContract>, DappError> {
        self.session.contract().ok_or(DappError::NotConnected)
    }

    /// Sends the registration; the caller awaits confirmation on the returned handle.
    pub async fn register_badge(
        &self,
        request: &RegistrationRequest,
    ) -> Result<SubmittedTransaction, DappError> {
        let signer = self.signer()?;
        debug!(recipient = %request.recipient, title = %request.title, "Submitting registerBadge");
        signer.register_badge(request).await
    }

    /// Every badge `holder` owns, in the order of `getTitles`.
    pub async fn query_badges_for_address(
        &self,
        holder: Address,
    ) -> Result<Vec<BadgeRecord>, DappError> {
        let reader = self.reader().await?;
        let titles = reader.titles(holder).await?;
        badge_stream(reader, holder, titles).try_collect().await
    }
}

/// Lazily fetches one badge per title, one at a time, yielding them in title order.
pub fn badge_stream(
    reader: Arc<dyn BadgeContract>,
    holder: Address,
    titles: Vec<String>,
) -> impl Stream<Item = Result<BadgeRecord, DappError>> {
    stream::iter(titles).then(move |title| {
        let reader = reader.clone();
        async move { reader.badge_by_title(holder, &title).await }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::tests::contract_info;
    use crate::testing::{FakeRegistry, FakeWallet, OWNER, USER, record};
    use crate::types::{BadgeType, Expiry};

    async fn connected(registry: FakeRegistry) -> WalletSession {
        let mut session = WalletSession::new(Some(Arc::new(FakeWallet::new(OWNER, registry))));
        session.set_contract_info(contract_info());
        session.connect().await.unwrap();
        session
    }

    #[tokio::test]
    async fn test_no_reader_without_session() {
        let session = WalletSession::new(None);
        let gateway = ContractGateway::new(&session);

        assert_eq!(gateway.ensure_reader(), Err(DappError::NoReader));
        assert_eq!(
            gateway.query_badges_for_address(USER).await,
            Err(DappError::NoReader)
        );
    }

    #[tokio::test]
    async fn test_register_requires_signer() {
        let session = WalletSession::new(None);
        let gateway = ContractGateway::new(&session);
        let request = RegistrationRequest {
            recipient: USER,
            title: "T1".to_string(),
            description: String::new(),
            issuer: String::new(),
            evidence_url: String::new(),
            badge_type: BadgeType::Course,
            expiry: Expiry::Never,
        };

        assert!(matches!(
            gateway.register_badge(&request).await,
            Err(DappError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_query_preserves_title_order() {
        let registry = FakeRegistry::new();
        // Later titles answer faster; order must still follow getTitles
        registry.insert(USER, record("T1")).with_delay_ms("T1", 30);
        registry.insert(USER, record("T2")).with_delay_ms("T2", 10);
        registry.insert(USER, record("T3"));

        let session = connected(registry).await;
        let badges = ContractGateway::new(&session)
            .query_badges_for_address(USER)
            .await
            .unwrap();

        let titles: Vec<_> = badges.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, ["T1", "T2", "T3"]);
    }

    #[tokio::test]
    async fn test_query_empty_holder() {
        let session = connected(FakeRegistry::new()).await;
        let badges = ContractGateway::new(&session)
            .query_badges_for_address(USER)
            .await
            .unwrap();
        assert!(badges.is_empty());
    }

    #[tokio::test]
    async fn test_read_only_handle_after_failed_connect() {
        let registry = FakeRegistry::new();
        registry.insert(USER, record("T1"));
        let wallet = FakeWallet::new(USER, registry).rejecting_accounts();
        let mut session = WalletSession::new(Some(Arc::new(wallet)));
        session.set_contract_info(contract_info());
        assert!(session.connect().await.is_err());

        let gateway = ContractGateway::new(&session);
        assert!(gateway.signer().is_err());
        let badges = gateway.query_badges_for_address(USER).await.unwrap();
        assert_eq!(badges.len(), 1);
    }

    #[tokio::test]
    async fn test_badge_stream_is_lazy() {
        let registry = FakeRegistry::new();
        registry.insert(USER, record("T1"));
        registry.insert(USER, record("T2"));
        let reader: Arc<dyn BadgeContract> = Arc::new(registry.handle(false));

        let mut badges = Box::pin(badge_stream(
            reader,
            USER,
            vec!["T1".to_string(), "T2".to_string()],
        ));
        assert_eq!(registry.calls(), 0);

        let first = badges.next().await.unwrap().unwrap();
        assert_eq!(first.title, "T1");
        assert_eq!(registry.calls(), 1);
    }
}
