use tracing::{info, warn};

use crate::error::DappError;
use crate::flight::SingleFlight;
use crate::gateway::ContractGateway;
use crate::lifecycle::{TransactionLifecycle, TxState};
use crate::session::WalletSession;
use crate::status::StatusNotifier;
use crate::types::{RegistrationForm, RegistrationRequest};

pub const PREPARING_MESSAGE: &str = "Preparing transaction...";
pub const APPROVAL_MESSAGE: &str = "Open your wallet to approve the transaction...";
pub const MINING_MESSAGE: &str = "Waiting for the transaction to be mined. This may take a moment...";
pub const SUCCESS_MESSAGE: &str = "Badge registered successfully!";

/// Validates registration forms and drives their transactions to a terminal state.
pub struct RegistrationController {
    flight: SingleFlight,
}

impl RegistrationController {
    pub fn new() -> Self {
        Self {
            flight: SingleFlight::new("badge registration"),
        }
    }

    /// Errors are returned only when no transaction was built; once built, the
    /// returned lifecycle ends in `Confirmed` or `Failed`.
    pub async fn submit(
        &self,
        session: &WalletSession,
        notifier: &StatusNotifier,
        form: &mut RegistrationForm,
    ) -> Result<TransactionLifecycle, DappError> {
        let _guard = self.flight.try_begin().inspect_err(|e| notifier.error(e.message()))?;

        let request = RegistrationRequest::from_form(form).inspect_err(|e| {
            warn!(error = %e, "Registration form rejected");
            notifier.error(e.message());
        })?;

        let gateway = ContractGateway::new(session);
        gateway
            .signer()
            .inspect_err(|e| notifier.error(e.message()))?;

        let mut lifecycle = TransactionLifecycle::new();
        notifier.progress(PREPARING_MESSAGE);

        match Self::drive(&gateway, notifier, &request, &mut lifecycle).await {
            Ok(()) => {
                info!(
                    recipient = %request.recipient,
                    title = %request.title,
                    tx_hash = ?lifecycle.tx_hash(),
                    "Badge registered"
                );
                notifier.success(SUCCESS_MESSAGE);
                form.reset();
            }
            Err(e) => {
                let reason = e.message();
                warn!(error = %e, origin = ?e.origin(), tx_hash = ?lifecycle.tx_hash(), "Badge registration failed");
                // Only fails on an illegal transition, which drive() never leaves behind
                lifecycle.advance(TxState::Failed(reason.clone()))?;
                notifier.error(format!("Failed to register: {reason}"));
            }
        }

        Ok(lifecycle)
    }

    async fn drive(
        gateway: &ContractGateway<'_>,
        notifier: &StatusNotifier,
        request: &RegistrationRequest,
        lifecycle: &mut TransactionLifecycle,
    ) -> Result<(), DappError> {
        lifecycle.advance(TxState::Submitted)?;
        notifier.progress(APPROVAL_MESSAGE);
        let submitted = gateway.register_badge(request).await?;

        let hash = submitted.hash();
        lifecycle.advance(TxState::Pending(hash))?;
        notifier.progress(MINING_MESSAGE);

        let hash = submitted.confirmed().await?;
        lifecycle.advance(TxState::Confirmed(hash))
    }
}

impl Default for RegistrationController {
    fn default() -> Self {
        Self::new()
    }
}
