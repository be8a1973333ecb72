//! BankAPI Core - account ledger with fee-collecting transfers and loans
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core entities (Account, Balance, typed requests, errors)
//! - **ports**: Trait definitions for external dependencies (AccountLedger, CredentialStore)
//! - **services**: Business logic orchestration (TransactionEngine, Dispatcher, ...)
//! - **adapters**: Concrete implementations (DuckDB, in-memory, Argon2)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use fs2::FileExt;

use adapters::argon2::Argon2Verifier;
use adapters::duckdb::DuckDbLedger;
use config::Config;
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, Response};
pub use domain::{Account, Balance, BalanceView, Request, Route};

/// Ledger database file name inside the data directory
pub const LEDGER_DB_FILE: &str = "bankapi.duckdb";

/// Lock file held for as long as a context is open
pub const LOCK_FILE: &str = "bankapi.lock";

/// Main context for ledger operations
///
/// This is the primary entry point for all business logic. It owns the
/// ledger handle for its whole lifetime: opening the context migrates the
/// database and creates the fee account, dropping it flushes the database
/// and releases the directory lock.
pub struct BankContext {
    pub config: Config,
    pub ledger: Arc<DuckDbLedger>,
    pub engine: Arc<TransactionEngine>,
    pub dispatcher: Dispatcher,
    pub status_service: StatusService,
    pub doctor_service: DoctorService,
    data_dir: PathBuf,
    lock_file: File,
}

impl BankContext {
    /// Open the ledger in a data directory using its settings.json
    pub fn open(data_dir: &Path) -> Result<Self> {
        let config = Config::load(data_dir)?;
        Self::open_with_config(data_dir, config)
    }

    /// Open the ledger in a data directory with explicit settings
    pub fn open_with_config(data_dir: &Path, config: Config) -> Result<Self> {
        config.validate()?;
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create {}", data_dir.display()))?;

        // One process owns the ledger at a time
        let lock_path = data_dir.join(LOCK_FILE);
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("Failed to open {}", lock_path.display()))?;
        if lock_file.try_lock_exclusive().is_err() {
            bail!("Ledger in {} is in use by another process", data_dir.display());
        }

        let ledger = Arc::new(DuckDbLedger::new(&data_dir.join(LEDGER_DB_FILE))?);
        ledger.ensure_schema()?;

        let verifier = Arc::new(Argon2Verifier::new(&config.argon2)?);
        let gate = CredentialGate::new(ledger.clone(), verifier);
        let engine = Arc::new(
            TransactionEngine::new(ledger.clone(), gate)
                .with_fee(config.fee)
                .with_bank_account(config.bank_account.clone()),
        );
        engine.ensure_bank_account(config.bank_password.as_deref())?;

        let dispatcher = Dispatcher::new(Arc::clone(&engine));
        let status_service = StatusService::new(ledger.clone(), &config.bank_account, config.fee);
        let doctor_service = DoctorService::new(ledger.clone(), &config.bank_account);

        tracing::debug!(dir = %data_dir.display(), "ledger opened");

        Ok(Self {
            config,
            ledger,
            engine,
            dispatcher,
            status_service,
            doctor_service,
            data_dir: data_dir.to_path_buf(),
            lock_file,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl Drop for BankContext {
    fn drop(&mut self) {
        if let Err(e) = self.ledger.checkpoint() {
            tracing::warn!(error = %e, "failed to checkpoint ledger on close");
        }
        if let Err(e) = FileExt::unlock(&self.lock_file) {
            tracing::warn!(error = %e, "failed to release ledger lock");
        }
    }
}
