use anyhow::{Result, bail};
use badge_registry::{
    App, ContractDirectoryClient, DappError, StatusKind,
    chain::{Approver, AutoApprove, RpcWallet, TerminalApprover},
    lifecycle::TxState,
    types::{DEFAULT_DATE_FORMAT, DateFormat, RegistrationForm},
    wallet::WalletProvider,
};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use term_table::row::Row;
use term_table::table_cell::{Alignment as CellAlignment, TableCell};
use term_table::{Table, TableStyle};
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Badge registry CLI - register and look up on-chain badges
#[derive(Parser)]
#[command(name = "badge_cli")]
#[command(about = "Badge Registry CLI", long_about = None)]
struct Cli {
    /// Base URL of the contract directory server
    #[arg(long, env = "CONTRACT_DIRECTORY_URL", default_value = "http://127.0.0.1:3000")]
    directory_url: String,

    /// Ethereum RPC endpoint
    #[arg(long, env = "RPC_URL", default_value = "http://127.0.0.1:8545")]
    rpc_url: String,

    /// Private key of the wallet account; without it no wallet is available
    #[arg(long, env = "PRIVATE_KEY")]
    private_key: Option<String>,

    /// Approve every wallet request without prompting
    #[arg(long, short = 'y')]
    yes: bool,

    /// strftime pattern used to display badge dates
    #[arg(long, default_value = DEFAULT_DATE_FORMAT)]
    date_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the contract and wallet session
    Info,

    /// Register a badge for a recipient (contract owner only)
    Register {
        /// Recipient address
        #[arg(long)]
        recipient: String,

        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, default_value = "")]
        issuer: String,

        #[arg(long, default_value = "")]
        evidence_url: String,

        /// Course, Project, Event, Contribution or their index 0-3
        #[arg(long, default_value = "Course")]
        badge_type: String,

        /// Unix seconds or YYYY-MM-DD; empty means the badge never expires
        #[arg(long, default_value = "")]
        expiry: String,
    },

    /// List the badges held by an address
    Query {
        /// Holder address
        address: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::ERROR.into())
        .with_default_directive("alloy_transport_ws=off".parse()?)
        .from_env_lossy()
        .add_directive("alloy=warn".parse()?)
        .add_directive("alloy_pubsub=error".parse()?)
        .add_directive("badge_registry=info".parse()?)
        .add_directive("badge_contract_clients=info".parse()?);

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();
    let dates = DateFormat::new(&cli.date_format)?;

    let wallet: Option<Arc<dyn WalletProvider>> = match &cli.private_key {
        Some(key) => {
            let approver: Arc<dyn Approver> = if cli.yes {
                Arc::new(AutoApprove)
            } else {
                Arc::new(TerminalApprover)
            };
            Some(Arc::new(RpcWallet::new(cli.rpc_url.clone(), key, approver)?))
        }
        None => None,
    };

    let mut app = App::new(
        ContractDirectoryClient::new(cli.directory_url.clone()),
        wallet,
        dates,
    );

    // Print status changes as they happen
    let mut status = app.notifier().subscribe();
    let printer = tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let Some(message) = status.borrow_and_update().clone() else {
                continue;
            };
            match message.kind {
                StatusKind::Progress => eprintln!("... {}", message.text),
                StatusKind::Success => eprintln!("OK  {}", message.text),
                StatusKind::Error => eprintln!("ERR {}", message.text),
            }
        }
    });

    let result = run(&mut app, &cli).await;

    // Dropping the app closes the status channel so the printer drains and exits
    drop(app);
    let _ = printer.await;
    result
}

async fn run(app: &mut App, cli: &Cli) -> Result<()> {
    app.init().await?;

    match &cli.command {
        Commands::Info => {
            if app.session().has_wallet()
                && let Err(e) = connect(app).await
            {
                warn!(error = %e, "Continuing without a wallet session");
            }
            println!("{}", session_table(app, cli));
        }
        Commands::Register {
            recipient,
            title,
            description,
            issuer,
            evidence_url,
            badge_type,
            expiry,
        } => {
            connect(app).await?;
            let mut form = RegistrationForm {
                recipient: recipient.clone(),
                title: title.clone(),
                description: description.clone(),
                issuer: issuer.clone(),
                evidence_url: evidence_url.clone(),
                badge_type: badge_type.clone(),
                expiry: expiry.clone(),
            };
            let lifecycle = app.register(&mut form).await?;
            match lifecycle.state() {
                TxState::Confirmed(hash) => println!("Transaction confirmed: {hash}"),
                TxState::Failed(reason) => bail!("registration failed: {reason}"),
                other => bail!("registration stopped in state {}", other.name()),
            }
        }
        Commands::Query { address } => {
            // A rejected connection still leaves a read-only provider
            if app.session().has_wallet()
                && let Err(e) = connect(app).await
            {
                warn!(error = %e, "Querying without a signing session");
            }
            let view = app.query(address).await?;
            println!("{view}");
        }
    }

    Ok(())
}

/// Connects and prints the short account label.
async fn connect(app: &mut App) -> Result<(), DappError> {
    app.connect().await?;
    if let Some(label) = app.session().display_address() {
        let role = if app.session().is_owner() {
            "owner"
        } else {
            "not the owner"
        };
        eprintln!("Connected: {label} ({role})");
    }
    Ok(())
}

fn session_table(app: &App, cli: &Cli) -> String {
    let session = app.session();
    let contract = session
        .contract_info()
        .map(|info| info.address.to_checksum(None))
        .unwrap_or_else(|| "-".to_string());
    let account = session
        .address()
        .map(|address| address.to_checksum(None))
        .unwrap_or_else(|| "-".to_string());
    let header = if session.is_connected() {
        "WALLET CONNECTED"
    } else {
        "NO WALLET SESSION"
    };

    let mut table = Table::new();
    table.style = TableStyle::extended();
    table.add_row(Row::new(vec![
        TableCell::builder(header)
            .col_span(2)
            .alignment(CellAlignment::Center)
            .build(),
    ]));

    let rows = [
        ("Directory", cli.directory_url.clone()),
        ("RPC URL", cli.rpc_url.clone()),
        ("Contract", contract),
        ("Account", account),
        ("Owner", if session.is_owner() { "yes" } else { "no" }.to_string()),
    ];
    for (label, value) in rows {
        table.add_row(Row::new(vec![
            TableCell::builder(label)
                .alignment(CellAlignment::Right)
                .build(),
            TableCell::builder(value)
                .alignment(CellAlignment::Left)
                .build(),
        ]));
    }

    table.render()
}
