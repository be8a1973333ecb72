//! In-memory ledger implementation
//!
//! Intended for tests and throwaway ledgers. Nothing survives the process.

use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::Utc;
use rust_decimal::Decimal;

use crate::domain::result::{Error, Result};
use crate::domain::{Account, Balance, BalanceView};
use crate::ports::{AccountLedger, CredentialStore, LedgerWrite};

/// In-memory account ledger keyed by username
#[derive(Debug, Default)]
pub struct MemoryLedger {
    accounts: RwLock<BTreeMap<String, Account>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn update<F>(&self, username: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut Account),
    {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| Error::database("ledger lock poisoned"))?;
        let account = accounts
            .get_mut(username)
            .ok_or_else(|| Error::not_found(username))?;
        f(account);
        account.updated_at = Utc::now();
        Ok(())
    }
}

impl AccountLedger for MemoryLedger {
    fn exists(&self, username: &str) -> Result<bool> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| Error::database("ledger lock poisoned"))?;
        Ok(accounts.contains_key(username))
    }

    fn get_balance(&self, username: &str) -> Result<Balance> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| Error::database("ledger lock poisoned"))?;
        accounts
            .get(username)
            .map(Account::balance)
            .ok_or_else(|| Error::not_found(username))
    }

    fn set_cash(&self, username: &str, cash: Decimal) -> Result<()> {
        self.update(username, |a| a.cash = cash)
    }

    fn set_debt(&self, username: &str, debt: Decimal) -> Result<()> {
        self.update(username, |a| a.debt = debt)
    }

    fn create(&self, username: &str, password_hash: &str) -> Result<()> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| Error::database("ledger lock poisoned"))?;
        if accounts.contains_key(username) {
            return Err(Error::AlreadyExists(username.to_string()));
        }
        accounts.insert(username.to_string(), Account::new(username, password_hash));
        Ok(())
    }

    fn list_balances(&self) -> Result<Vec<BalanceView>> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| Error::database("ledger lock poisoned"))?;
        Ok(accounts
            .values()
            .map(|a| BalanceView::new(a.username.clone(), a.balance()))
            .collect())
    }

    /// All-or-nothing: every target is checked before anything is written
    fn apply(&self, writes: &[LedgerWrite]) -> Result<()> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| Error::database("ledger lock poisoned"))?;
        if let Some(missing) = writes.iter().find(|w| !accounts.contains_key(w.username())) {
            return Err(Error::not_found(missing.username()));
        }

        let now = Utc::now();
        for write in writes {
            if let Some(account) = accounts.get_mut(write.username()) {
                match write {
                    LedgerWrite::Cash { cash, .. } => account.cash = *cash,
                    LedgerWrite::Debt { debt, .. } => account.debt = *debt,
                }
                account.updated_at = now;
            }
        }
        Ok(())
    }
}

impl CredentialStore for MemoryLedger {
    fn lookup(&self, username: &str) -> Result<Option<String>> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| Error::database("ledger lock poisoned"))?;
        Ok(accounts.get(username).map(|a| a.password_hash.clone()))
    }
}
