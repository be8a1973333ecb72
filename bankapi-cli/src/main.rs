//! BankAPI CLI - account ledger in your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{batch, call, config, doctor, ledger, logs, status};

/// BankAPI - register, deposit, transfer and borrow against a local ledger
#[derive(Parser)]
#[command(name = "bank", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new account
    Register {
        #[arg(short, long)]
        username: String,
        /// Password (prompted when omitted; also read from BANKAPI_PASSWORD)
        #[arg(short, long)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Deposit cash (a fee goes to the bank)
    Add {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        amount: Decimal,
        #[arg(short, long)]
        password: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Transfer cash to another account (a fee goes to the bank)
    Transfer {
        #[arg(short, long)]
        username: String,
        /// Receiving account
        #[arg(short, long)]
        to: String,
        #[arg(short, long)]
        amount: Decimal,
        #[arg(short, long)]
        password: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Show cash and debt
    Balance {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Take a loan (adds to cash and debt)
    #[command(name = "takeloan")]
    TakeLoan {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        amount: Decimal,
        #[arg(short, long)]
        password: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Pay back a loan (subtracts from cash and debt)
    #[command(name = "payloan")]
    PayLoan {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        amount: Decimal,
        #[arg(short, long)]
        password: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Send a raw JSON request to a route
    Call {
        /// Route name (register, add, transfer, balance, takeloan, payloan)
        route: String,
        /// JSON body (read from stdin when omitted)
        #[arg(short, long)]
        body: Option<String>,
    },

    /// Replay a JSON-lines file of requests concurrently
    Batch {
        /// File with one {"route": ..., "body": {...}} object per line
        #[arg(short, long)]
        file: PathBuf,
        /// Number of worker threads
        #[arg(short, long, default_value = "4")]
        workers: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show ledger totals
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run ledger health checks
    Doctor {
        /// Show verbose output
        #[arg(long, short)]
        verbose: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and manage application logs
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },

    /// View and change settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // Diagnostics go to stderr so JSON output on stdout stays parseable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Register { username, password, json } => ledger::register(&username, password, json),
        Commands::Add { username, amount, password, json } => ledger::deposit(&username, amount, password, json),
        Commands::Transfer { username, to, amount, password, json } => {
            ledger::transfer(&username, &to, amount, password, json)
        }
        Commands::Balance { username, password, json } => ledger::balance(&username, password, json),
        Commands::TakeLoan { username, amount, password, json } => {
            ledger::take_loan(&username, amount, password, json)
        }
        Commands::PayLoan { username, amount, password, json } => {
            ledger::pay_loan(&username, amount, password, json)
        }
        Commands::Call { route, body } => call::run(&route, body),
        Commands::Batch { file, workers, json } => batch::run(&file, workers, json),
        Commands::Status { json } => status::run(json).map(|_| ExitCode::SUCCESS),
        Commands::Doctor { verbose, json } => doctor::run(verbose, json),
        Commands::Logs { command } => logs::run(command).map(|_| ExitCode::SUCCESS),
        Commands::Config { command } => config::run(command).map(|_| ExitCode::SUCCESS),
    }
}
