//! DuckDB ledger implementation

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use duckdb::{params, Connection};
use rust_decimal::Decimal;

use crate::domain::result::{Error, Result};
use crate::domain::{Balance, BalanceView};
use crate::ports::{AccountLedger, CredentialStore, LedgerWrite};
use crate::services::{now_timestamp, MigrationResult, MigrationService};

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
        || lower.contains("could not set lock on file")
}

/// Balances are stored as DECIMAL and read back as text to keep full precision
fn parse_decimal(text: &str) -> Result<Decimal> {
    Decimal::from_str_exact(text)
        .map(|d| d.normalize())
        .map_err(|e| Error::database(format!("Invalid decimal in ledger '{}': {}", text, e)))
}

fn is_constraint_violation(err: &duckdb::Error) -> bool {
    let msg = err.to_string().to_lowercase();
    msg.contains("duplicate key") || msg.contains("primary key")
}

/// DuckDB-backed account ledger
pub struct DuckDbLedger {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DuckDbLedger {
    /// Open (or create) the ledger database
    ///
    /// Includes retry logic with exponential backoff for file locking errors,
    /// which can occur when another process is still releasing the file.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: db_path.to_path_buf(),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        tracing::warn!(
                            delay_ms = delay.as_millis() as u64,
                            attempt = attempt + 1,
                            max = MAX_RETRIES,
                            error = %err_msg,
                            "ledger database busy, retrying"
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::database(format!("Failed to open database after {} retries", MAX_RETRIES))
        }))
    }

    fn try_open_connection(db_path: &Path) -> Result<Connection> {
        // Extension autoloading stays off; nothing here needs an extension
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Ok(Connection::open_with_flags(db_path, config)?)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::database(format!("Lock poisoned: {}", e)))
    }

    /// Run database migrations
    pub fn run_migrations(&self) -> Result<MigrationResult> {
        let conn = self.conn()?;
        MigrationService::new(&conn).run_pending()
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        let result = self.run_migrations()?;
        if !result.applied.is_empty() {
            tracing::info!(applied = ?result.applied, "ledger schema upgraded");
        }
        Ok(())
    }

    /// Flush the write-ahead log into the database file
    pub fn checkpoint(&self) -> Result<()> {
        self.conn()?.execute_batch("CHECKPOINT")?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn get_db_size(&self) -> Result<u64> {
        Ok(std::fs::metadata(&self.db_path)?.len())
    }

    fn write_one(conn: &Connection, write: &LedgerWrite, updated_at: &str) -> Result<()> {
        let changed = match write {
            LedgerWrite::Cash { username, cash } => conn.execute(
                "UPDATE sys_accounts SET cash = CAST(? AS DECIMAL(18, 4)), updated_at = CAST(? AS TIMESTAMP)
                 WHERE username = ?",
                params![cash.to_string(), updated_at, username],
            )?,
            LedgerWrite::Debt { username, debt } => conn.execute(
                "UPDATE sys_accounts SET debt = CAST(? AS DECIMAL(18, 4)), updated_at = CAST(? AS TIMESTAMP)
                 WHERE username = ?",
                params![debt.to_string(), updated_at, username],
            )?,
        };
        if changed == 0 {
            return Err(Error::not_found(write.username()));
        }
        Ok(())
    }
}

impl AccountLedger for DuckDbLedger {
    fn exists(&self, username: &str) -> Result<bool> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sys_accounts WHERE username = ?",
            [username],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn get_balance(&self, username: &str) -> Result<Balance> {
        let conn = self.conn()?;
        let row = conn.query_row(
            "SELECT cash::VARCHAR, debt::VARCHAR FROM sys_accounts WHERE username = ?",
            [username],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        );

        match row {
            Ok((cash, debt)) => Ok(Balance {
                cash: parse_decimal(&cash)?,
                debt: parse_decimal(&debt)?,
            }),
            Err(duckdb::Error::QueryReturnedNoRows) => Err(Error::not_found(username)),
            Err(e) => Err(e.into()),
        }
    }

    fn set_cash(&self, username: &str, cash: Decimal) -> Result<()> {
        let conn = self.conn()?;
        Self::write_one(&conn, &LedgerWrite::cash(username, cash), &now_timestamp())
    }

    fn set_debt(&self, username: &str, debt: Decimal) -> Result<()> {
        let conn = self.conn()?;
        Self::write_one(&conn, &LedgerWrite::debt(username, debt), &now_timestamp())
    }

    fn create(&self, username: &str, password_hash: &str) -> Result<()> {
        let conn = self.conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sys_accounts WHERE username = ?",
            [username],
            |row| row.get(0),
        )?;
        if count > 0 {
            return Err(Error::AlreadyExists(username.to_string()));
        }

        let now = now_timestamp();
        conn.execute(
            "INSERT INTO sys_accounts (username, password_hash, cash, debt, created_at, updated_at)
             VALUES (?, ?, 0, 0, CAST(? AS TIMESTAMP), CAST(? AS TIMESTAMP))",
            params![username, password_hash, now, now],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                Error::AlreadyExists(username.to_string())
            } else {
                e.into()
            }
        })?;

        Ok(())
    }

    fn list_balances(&self) -> Result<Vec<BalanceView>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT username, cash::VARCHAR, debt::VARCHAR FROM sys_accounts ORDER BY username",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut balances = Vec::new();
        for row in rows {
            let (username, cash, debt) = row?;
            balances.push(BalanceView {
                username,
                cash: parse_decimal(&cash)?,
                debt: parse_decimal(&debt)?,
            });
        }
        Ok(balances)
    }

    /// Applies the batch inside one DuckDB transaction
    ///
    /// Any failing write (including a missing account) rolls back the
    /// writes before it.
    fn apply(&self, writes: &[LedgerWrite]) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let updated_at = now_timestamp();
        for write in writes {
            Self::write_one(&tx, write, &updated_at)?;
        }
        tx.commit()?;
        Ok(())
    }
}

impl CredentialStore for DuckDbLedger {
    fn lookup(&self, username: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let row = conn.query_row(
            "SELECT password_hash FROM sys_accounts WHERE username = ?",
            [username],
            |row| row.get::<_, String>(0),
        );

        match row {
            Ok(hash) => Ok(Some(hash)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
