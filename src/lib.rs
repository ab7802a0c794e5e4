pub mod address;
pub mod app;
pub mod chain;
pub mod directory;
pub mod error;
pub mod flight;
pub mod gateway;
pub mod lifecycle;
pub mod query;
pub mod registration;
pub mod session;
pub mod status;
pub mod types;
pub mod wallet;

#[cfg(test)]
mod testing;

pub use app::App;
pub use directory::{ContractDirectoryClient, ContractInfo};
pub use error::{DappError, ErrorOrigin};
pub use session::WalletSession;
pub use status::{StatusKind, StatusMessage, StatusNotifier};
