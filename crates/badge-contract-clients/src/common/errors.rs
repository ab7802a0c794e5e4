use alloy::sol_types::{Panic, Revert, SolError, decode_revert_reason};

/// Prefix nodes put in front of a plain-text revert reason.
const EXECUTION_REVERTED: &str = "execution reverted";

/// Short `Name(args)` rendering of a decoded custom contract error.
pub trait CustomErrorReason {
    fn reason(&self) -> String;
}

/// Failure of a contract call, split by whether the chain rejected it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractCallError {
    /// The contract rejected the call, with the decoded reason when there was one.
    Reverted {
        method: &'static str,
        reason: Option<String>,
    },
    /// The node could not be reached or answered with a transport-level error.
    Rpc {
        method: &'static str,
        message: String,
    },
}

impl ContractCallError {
    pub fn from_contract_error(method: &'static str, error: alloy::contract::Error) -> Self {
        if let Some(data) = error.as_revert_data() {
            return ContractCallError::Reverted {
                method,
                reason: decode_reason(&data),
            };
        }

        let message = error.to_string();
        match reason_from_message(&message) {
            Some(reason) => ContractCallError::Reverted { method, reason },
            None => ContractCallError::Rpc { method, message },
        }
    }
}

impl std::fmt::Display for ContractCallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContractCallError::Reverted {
                method,
                reason: Some(reason),
            } => write!(f, "{method} reverted: {reason}"),
            ContractCallError::Reverted {
                method,
                reason: None,
            } => write!(f, "{method} reverted"),
            ContractCallError::Rpc { method, message } => write!(f, "{method} failed: {message}"),
        }
    }
}

impl std::error::Error for ContractCallError {}

/// Readable reason carried by a revert payload.
///
/// `Error(string)` yields the bare message, `Panic(uint256)` its code, and a
/// non-ABI payload whatever text it holds.
pub(crate) fn decode_reason(data: &[u8]) -> Option<String> {
    if data.is_empty() {
        return None;
    }
    if let Ok(revert) = Revert::abi_decode(data) {
        return Some(revert.reason);
    }
    if let Ok(panic) = Panic::abi_decode(data) {
        return Some(format!("panic code {:#x}", panic.code));
    }
    decode_revert_reason(data)
}

/// Looks for a node-formatted revert in an error message.
///
/// Returns `None` if the message is not a revert, `Some(None)` for a revert
/// without reason and `Some(Some(reason))` otherwise.
fn reason_from_message(message: &str) -> Option<Option<String>> {
    let start = message.find(EXECUTION_REVERTED)?;
    let rest = message[start + EXECUTION_REVERTED.len()..]
        .trim_start_matches(':')
        .trim();
    // Nodes sometimes append the raw payload after the reason
    let reason = rest.split(", data: ").next().unwrap_or_default().trim();
    if reason.is_empty() {
        Some(None)
    } else {
        Some(Some(reason.to_string()))
    }
}
