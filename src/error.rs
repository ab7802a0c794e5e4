use badge_contract_clients::ContractCallError;

/// Where a failure came from, used to tag log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorOrigin {
    /// Rejected locally before anything left the process.
    Local,
    /// The wallet was missing or refused.
    Wallet,
    /// The contract rejected the call.
    Chain,
    /// The backend or the RPC node could not be reached.
    Infrastructure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DappError {
    // Wallet errors
    ProviderUnavailable,
    UserRejected,

    // Local errors - caught before any dispatch
    Validation(String),
    NotConnected,
    NoReader,
    Configuration(String),
    Busy(&'static str),
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    // Remote errors
    ContractRevert { reason: Option<String> },
    Network(String),
    Unexpected(String),
}

impl DappError {
    pub fn origin(&self) -> ErrorOrigin {
        use DappError::*;
        match self {
            ProviderUnavailable | UserRejected => ErrorOrigin::Wallet,
            Validation(_)
            | NotConnected
            | NoReader
            | Configuration(_)
            | Busy(_)
            | InvalidTransition { .. }
            | Unexpected(_) => ErrorOrigin::Local,
            ContractRevert { .. } => ErrorOrigin::Chain,
            Network(_) => ErrorOrigin::Infrastructure,
        }
    }

    /// User-facing text for this error.
    pub fn message(&self) -> String {
        use DappError::*;
        match self {
            ProviderUnavailable => {
                "No wallet provider found! Configure a wallet to use this app.".to_string()
            }
            UserRejected => "Request rejected in the wallet.".to_string(),
            Validation(msg) => msg.clone(),
            NotConnected => "Please connect your wallet first.".to_string(),
            NoReader => {
                "Please connect your wallet, or restart the app if an error occurred.".to_string()
            }
            Configuration(msg) => msg.clone(),
            Busy(operation) => format!("A {operation} is already in progress. Please wait."),
            InvalidTransition { from, to } => {
                format!("invalid transaction state change from {from} to {to}")
            }
            ContractRevert {
                reason: Some(reason),
            } => reason.clone(),
            ContractRevert { reason: None } => "transaction reverted".to_string(),
            Network(e) => format!("network error: {e}"),
            Unexpected(e) => e.clone(),
        }
    }
}

impl std::fmt::Display for DappError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for DappError {}

impl From<ContractCallError> for DappError {
    fn from(error: ContractCallError) -> Self {
        match error {
            ContractCallError::Reverted { reason, .. } => DappError::ContractRevert { reason },
            rpc @ ContractCallError::Rpc { .. } => DappError::Network(rpc.to_string()),
        }
    }
}
