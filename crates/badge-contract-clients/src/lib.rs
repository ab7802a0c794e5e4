use alloy::primitives::Address;

pub mod badge_registry;
pub mod common;

// ============================================================================
// Client Type Re-exports
// ============================================================================

pub use badge_registry::{BadgeRegistration, BadgeRegistry, BadgeRegistryClient};
pub use common::errors::{ContractCallError, CustomErrorReason};
pub use common::tx_submitter::PendingSubmission;

// ============================================================================
// Contract Surface
// ============================================================================

/// Functions the badge registry ABI must declare for this client to work.
pub const REQUIRED_FUNCTIONS: [&str; 4] = ["owner", "registerBadge", "getTitles", "getBadgeByTitle"];

/// Configuration for connecting to the badge registry contract
#[derive(Clone, Debug)]
pub struct ContractConfig {
    pub contract_address: Address,
    pub rpc_url: String,
}

impl ContractConfig {
    /// Create a new configuration for a deployed registry
    ///
    /// # Arguments
    /// * `rpc_url` - Ethereum RPC endpoint (HTTP or WebSocket)
    /// * `contract_address` - Address of the deployed BadgeRegistry contract
    pub fn new(rpc_url: String, contract_address: Address) -> Self {
        Self {
            contract_address,
            rpc_url,
        }
    }

    /// WebSocket form of the RPC endpoint.
    pub fn ws_url(&self) -> String {
        self.rpc_url
            .replace("http://", "ws://")
            .replace("https://", "wss://")
    }
}

// ============================================================================
// Tests
// ============================================================================
