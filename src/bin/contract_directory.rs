use anyhow::Result;
use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use badge_registry::directory::CONTRACT_PATH;
use clap::Parser;
use serde_json::{Value, json};
use std::{path::PathBuf, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const READ_ERROR: &str = "Failed to read contract information.";

/// Contract directory - serves the badge registry address and ABI
#[derive(Parser, Debug, Clone)]
#[command(name = "contract_directory")]
#[command(about = "Serves the badge registry address and ABI to clients", long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Path to the contract ABI JSON file
    #[arg(long, env = "ABI_PATH", default_value = "contract-abi.json")]
    abi_path: PathBuf,

    /// Deployed registry address, passed through as configured
    #[arg(long, env = "CONTRACT_ADDRESS")]
    contract_address: Option<String>,
}

#[derive(Debug)]
struct DirectoryState {
    abi_path: PathBuf,
    contract_address: Option<String>,
}

impl DirectoryState {
    /// The ABI file is read on every request so redeployments only need a file swap.
    async fn document(&self) -> Result<Value> {
        let raw = tokio::fs::read_to_string(&self.abi_path).await?;
        let abi: Value = serde_json::from_str(&raw)?;
        Ok(json!({
            "address": self.contract_address,
            "abi": abi,
        }))
    }
}

async fn contract(State(state): State<Arc<DirectoryState>>) -> (StatusCode, Json<Value>) {
    match state.document().await {
        Ok(document) => (StatusCode::OK, Json(document)),
        Err(e) => {
            error!(error = %e, path = %state.abi_path.display(), "Failed to load contract ABI");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": READ_ERROR })),
            )
        }
    }
}

fn router(state: Arc<DirectoryState>) -> Router {
    Router::new()
        .route(CONTRACT_PATH, get(contract))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy()
        .add_directive("contract_directory=info".parse()?);

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(true))
        .with(filter)
        .init();

    let args = Args::parse();
    if args.contract_address.is_none() {
        warn!("CONTRACT_ADDRESS is not set; clients will report the contract as not configured");
    }

    let state = Arc::new(DirectoryState {
        abi_path: args.abi_path,
        contract_address: args.contract_address,
    });

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, path = CONTRACT_PATH, "Contract directory listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
