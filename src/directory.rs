use alloy::json_abi::JsonAbi;
use alloy::primitives::Address;
use badge_contract_clients::REQUIRED_FUNCTIONS;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::address::parse_address;
use crate::error::DappError;

/// Path of the contract document on the directory backend.
pub const CONTRACT_PATH: &str = "/api/contract";

/// Address prefix the backend ships with before it is configured.
pub const PLACEHOLDER_ADDRESS_PREFIX: &str = "0x123";

pub const NOT_CONFIGURED_MESSAGE: &str =
    "ERROR: Contract address not found. Check the server configuration and restart it.";

/// Address and ABI of the deployed badge registry.
#[derive(Debug, Clone)]
pub struct ContractInfo {
    pub address: Address,
    pub abi: JsonAbi,
}

impl ContractInfo {
    /// Fails if the ABI lacks one of the functions the gateway calls.
    pub fn ensure_compatible(&self) -> Result<(), DappError> {
        match REQUIRED_FUNCTIONS
            .iter()
            .find(|name| self.abi.function(name).is_none())
        {
            Some(missing) => Err(DappError::Configuration(format!(
                "The contract ABI does not declare `{missing}`."
            ))),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ContractDocument {
    address: Option<String>,
    #[serde(alias = "abiDescriptor")]
    abi: JsonAbi,
}

#[derive(Debug, Deserialize)]
struct DirectoryErrorBody {
    error: String,
}

/// Fetches the contract document from the directory backend.
#[derive(Clone)]
pub struct ContractDirectoryClient {
    http: Client,
    base_url: String,
}

impl ContractDirectoryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self) -> String {
        format!("{}{CONTRACT_PATH}", self.base_url)
    }

    pub async fn fetch(&self) -> Result<ContractInfo, DappError> {
        let url = self.url();
        debug!(url = %url, "Fetching contract information");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| DappError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<DirectoryErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("").to_string());
            return Err(DappError::Network(format!(
                "failed to fetch contract data ({status}): {detail}"
            )));
        }

        let document = response
            .json::<ContractDocument>()
            .await
            .map_err(|e| DappError::Configuration(format!("invalid contract document: {e}")))?;

        let info = document.into_contract_info()?;
        info!(address = %info.address, "Loaded contract information");
        Ok(info)
    }
}

impl ContractDocument {
    fn into_contract_info(self) -> Result<ContractInfo, DappError> {
        let address = match self.address.as_deref().map(str::trim) {
            Some(address) if !address.is_empty() && !is_placeholder(address) => address,
            _ => return Err(DappError::Configuration(NOT_CONFIGURED_MESSAGE.to_string())),
        };
        let address = parse_address(address).ok_or_else(|| {
            DappError::Configuration(format!("Invalid contract address: {address:?}."))
        })?;

        let info = ContractInfo {
            address,
            abi: self.abi,
        };
        info.ensure_compatible()?;
        Ok(info)
    }
}

fn is_placeholder(address: &str) -> bool {
    address.starts_with(PLACEHOLDER_ADDRESS_PREFIX)
}
