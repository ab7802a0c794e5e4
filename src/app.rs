use alloy::primitives::Address;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::directory::ContractDirectoryClient;
use crate::error::DappError;
use crate::lifecycle::TransactionLifecycle;
use crate::query::{QueryController, QueryView};
use crate::registration::RegistrationController;
use crate::session::WalletSession;
use crate::status::StatusNotifier;
use crate::types::{DateFormat, RegistrationForm};
use crate::wallet::WalletProvider;

pub const CONNECTING_MESSAGE: &str = "Connecting wallet...";

/// Owns the session, the status slot and both controllers, and routes user
/// actions to them.
pub struct App {
    directory: ContractDirectoryClient,
    session: WalletSession,
    notifier: StatusNotifier,
    registration: RegistrationController,
    query: QueryController,
}

impl App {
    pub fn new(
        directory: ContractDirectoryClient,
        wallet: Option<Arc<dyn WalletProvider>>,
        dates: DateFormat,
    ) -> Self {
        Self {
            directory,
            session: WalletSession::new(wallet),
            notifier: StatusNotifier::new(),
            registration: RegistrationController::new(),
            query: QueryController::new(dates),
        }
    }

    /// Loads the contract document. On failure the app stays halted: every
    /// later contract operation fails without reaching the chain.
    pub async fn init(&mut self) -> Result<(), DappError> {
        match self.directory.fetch().await {
            Ok(info) => {
                self.session.set_contract_info(info);
                self.notifier.hide();
                Ok(())
            }
            Err(e) => {
                error!(error = %e, url = %self.directory.url(), "Initialization failed");
                let text = match &e {
                    DappError::Configuration(message) => message.clone(),
                    other => format!(
                        "Critical initialization error: {}. Check that the server is running.",
                        other.message()
                    ),
                };
                self.notifier.error(text);
                Err(e)
            }
        }
    }

    pub async fn connect(&mut self) -> Result<Address, DappError> {
        self.notifier.progress(CONNECTING_MESSAGE);
        match self.session.connect().await {
            Ok(address) => {
                self.notifier.hide();
                Ok(address)
            }
            Err(e @ DappError::ProviderUnavailable) => {
                self.notifier.error(e.message());
                Err(e)
            }
            Err(e) => {
                self.notifier
                    .error(format!("Failed to connect: {}", e.message()));
                Err(e)
            }
        }
    }

    pub fn disconnect(&mut self) {
        self.session.disconnect();
        self.notifier.hide();
    }

    pub async fn register(
        &self,
        form: &mut RegistrationForm,
    ) -> Result<TransactionLifecycle, DappError> {
        if self.session.is_connected() && !self.session.is_owner() {
            // The contract decides; the transaction will most likely revert
            warn!(address = ?self.session.address(), "Connected account is not the contract owner");
        }
        self.registration
            .submit(&self.session, &self.notifier, form)
            .await
    }

    pub async fn query(&self, input: &str) -> Result<QueryView, DappError> {
        let view = self.query.query(&self.session, &self.notifier, input).await?;
        info!(input = %input.trim(), "Query finished");
        Ok(view)
    }

    pub fn session(&self) -> &WalletSession {
        &self.session
    }

    pub fn notifier(&self) -> &StatusNotifier {
        &self.notifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::NOT_CONFIGURED_MESSAGE;
    use crate::directory::tests::abi_json;
    use crate::status::StatusKind;
    use crate::testing::{FakeRegistry, FakeWallet, OWNER, USER, record};
    use httpmock::prelude::*;
    use serde_json::json;

    async fn directory(server: &MockServer, address: &str) {
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/contract");
                then.status(200)
                    .json_body(json!({ "address": address, "abi": abi_json() }));
            })
            .await;
    }

    fn app(server: &MockServer, wallet: Option<Arc<dyn WalletProvider>>) -> App {
        App::new(
            ContractDirectoryClient::new(server.base_url()),
            wallet,
            DateFormat::default(),
        )
    }

    #[tokio::test]
    async fn test_placeholder_address_halts_initialization() {
        let server = MockServer::start_async().await;
        directory(&server, "0x1234567890123456789012345678901234567890").await;
        let registry = FakeRegistry::new();
        let mut app = app(&server, Some(Arc::new(FakeWallet::new(OWNER, registry.clone()))));

        assert!(matches!(app.init().await, Err(DappError::Configuration(_))));
        let status = app.notifier().current().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert_eq!(status.text, NOT_CONFIGURED_MESSAGE);

        assert!(app.connect().await.is_err());
        assert_eq!(registry.calls(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_directory_is_critical() {
        let mut app = App::new(
            ContractDirectoryClient::new("http://127.0.0.1:9"),
            None,
            DateFormat::default(),
        );

        assert!(matches!(app.init().await, Err(DappError::Network(_))));
        assert!(
            app.notifier()
                .current()
                .unwrap()
                .text
                .starts_with("Critical initialization error:")
        );
    }

    #[tokio::test]
    async fn test_connect_without_wallet_shows_provider_message() {
        let server = MockServer::start_async().await;
        directory(&server, "0x5FbDB2315678afecb367f032d93F642f64180aa3").await;
        let mut app = app(&server, None);
        app.init().await.unwrap();
        let before = app.session().snapshot();

        assert_eq!(app.connect().await, Err(DappError::ProviderUnavailable));
        assert_eq!(
            app.notifier().current().unwrap().text,
            "No wallet provider found! Configure a wallet to use this app."
        );
        assert_eq!(app.session().snapshot(), before);
    }

    #[tokio::test]
    async fn test_connect_register_and_query() {
        let server = MockServer::start_async().await;
        directory(&server, "0x5FbDB2315678afecb367f032d93F642f64180aa3").await;
        let registry = FakeRegistry::new();
        registry.insert(USER, record("T1"));
        let mut app = app(&server, Some(Arc::new(FakeWallet::new(OWNER, registry.clone()))));

        app.init().await.unwrap();
        assert_eq!(app.notifier().current(), None);
        assert_eq!(app.connect().await, Ok(OWNER));
        assert!(app.session().is_owner());

        let mut form = RegistrationForm {
            recipient: USER.to_string(),
            title: "T2".to_string(),
            badge_type: "Project".to_string(),
            ..Default::default()
        };
        assert!(app.register(&mut form).await.unwrap().is_confirmed());

        let view = app.query(&USER.to_string()).await.unwrap();
        let QueryView::Populated(badges) = view else {
            panic!("expected populated view");
        };
        let titles: Vec<_> = badges.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, ["T1", "T2"]);
        assert_eq!(badges[1].badge_type, "Project");
    }

    #[tokio::test]
    async fn test_disconnect_clears_status_and_session() {
        let server = MockServer::start_async().await;
        directory(&server, "0x5FbDB2315678afecb367f032d93F642f64180aa3").await;
        let mut app = app(&server, Some(Arc::new(FakeWallet::new(USER, FakeRegistry::new()))));
        app.init().await.unwrap();
        app.connect().await.unwrap();

        app.disconnect();

        assert!(!app.session().is_connected());
        assert_eq!(app.notifier().current(), None);
    }
}
